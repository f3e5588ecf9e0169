// Avalanche proof library: wire format, commitments and signatures
// Written in 2022 by
//     The avaproof developers
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the MIT License
// along with this software.
// If not, see <https://opensource.org/licenses/MIT>.

//! Avalanche proofs: a set of signed stakes committed to a master key.
//!
//! The proof commits to its content with two identifiers. The *limited proof
//! id* covers everything except the master key and the signatures:
//!
//! ```text
//! limitedid = sha256d(sequence || expiration || blob(payout) ||
//!                     compact(n) || stake_1 || .. || stake_n)
//! ```
//!
//! and the *proof id* additionally binds the master key:
//!
//! ```text
//! proofid = sha256d(limitedid || blob(master))
//! ```
//!
//! The master key signs the limited proof id; each stake key signs its stake
//! together with the [`StakeCommitment`] of the proof.

use std::io;

use crate::encoding::{
    self, deserialize_blob, deserialize_sequence, serialize_blob,
    serialize_sequence,
};
use crate::keys::{KeyDecodingError, PublicKey};
use crate::schnorr::{Signature, SigningError};
use crate::stake::{HeightOutOfRange, SignedStake, Stake};
use crate::uint256::{LimitedProofId, ProofId, StakeCommitment, StakeId, UInt256};
use crate::{WireDecode, WireEncode};

/// Errors building or verifying proofs
#[derive(Clone, PartialEq, Eq, Debug, Display, From, Error)]
#[display(doc_comments)]
pub enum Error {
    /// {0}
    #[from]
    Height(HeightOutOfRange),

    /// stake {0} is already part of the proof
    DuplicateStake(StakeId),

    /// private key does not correspond to the stake public key {0}
    StakeKeyMismatch(PublicKey),

    /// {0}
    #[from]
    Key(KeyDecodingError),

    /// {0}
    #[from]
    Signing(SigningError),

    /// proof stakes are not sorted by their id or contain duplicates
    UnsortedStakes,

    /// proof master signature is invalid
    InvalidMasterSignature,

    /// signature of stake {0} is invalid
    InvalidStakeSignature(StakeId),
}

impl LimitedProofId {
    /// Computes limited proof id over proof data excluding master key
    pub fn compute<'a, I>(
        sequence: u64,
        expiration_time: i64,
        payout_script: &[u8],
        stakes: I,
    ) -> Self
    where
        I: IntoIterator<Item = &'a Stake>,
        I::IntoIter: ExactSizeIterator,
    {
        let mut engine = vec![];
        engine.extend_from_slice(&sequence.to_le_bytes());
        engine.extend_from_slice(&expiration_time.to_le_bytes());
        // In-memory writer never fails
        let _ = serialize_blob(&mut engine, payout_script);
        let _ = serialize_sequence(&mut engine, stakes);
        LimitedProofId::from(UInt256::hash(engine))
    }

    /// Binds limited proof id to the proof master key
    pub fn compute_proof_id(&self, master: &PublicKey) -> ProofId {
        let mut engine = self.to_byte_array().to_vec();
        let _ = master.wire_encode(&mut engine);
        ProofId::from(UInt256::hash(engine))
    }
}

/// Avalanche proof. Immutable once constructed; both identifiers are
/// computed from the content on construction.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Proof {
    sequence: u64,
    expiration_time: i64,
    master: PublicKey,
    stakes: Vec<SignedStake>,
    payout_script: Vec<u8>,
    signature: Signature,

    limitedid: LimitedProofId,
    proofid: ProofId,
}

impl Proof {
    /// Assembles proof from its parts. Stakes must be already sorted by
    /// their id; use [`crate::ProofBuilder`] to produce signed proofs.
    pub fn with(
        sequence: u64,
        expiration_time: i64,
        master: PublicKey,
        stakes: Vec<SignedStake>,
        payout_script: Vec<u8>,
        signature: Signature,
    ) -> Self {
        let limitedid = LimitedProofId::compute(
            sequence,
            expiration_time,
            &payout_script,
            stakes.iter().map(SignedStake::stake),
        );
        let proofid = limitedid.compute_proof_id(&master);
        Proof {
            sequence,
            expiration_time,
            master,
            stakes,
            payout_script,
            signature,
            limitedid,
            proofid,
        }
    }

    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    #[inline]
    pub fn expiration_time(&self) -> i64 {
        self.expiration_time
    }

    #[inline]
    pub fn master(&self) -> &PublicKey {
        &self.master
    }

    #[inline]
    pub fn stakes(&self) -> &[SignedStake] {
        &self.stakes
    }

    #[inline]
    pub fn payout_script(&self) -> &[u8] {
        &self.payout_script
    }

    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[inline]
    pub fn limitedid(&self) -> LimitedProofId {
        self.limitedid
    }

    #[inline]
    pub fn proofid(&self) -> ProofId {
        self.proofid
    }

    #[inline]
    pub fn stake_commitment(&self) -> StakeCommitment {
        StakeCommitment::new(self.expiration_time, &self.master)
    }

    /// Total amount of all stakes. Saturates instead of overflowing, which
    /// can only happen with invalid amounts.
    pub fn staked_amount(&self) -> i64 {
        self.stakes
            .iter()
            .fold(0i64, |sum, s| sum.saturating_add(s.stake().amount()))
    }

    /// Checks stake ordering, the master signature and all stake signatures
    pub fn verify(&self) -> Result<(), Error> {
        if self
            .stakes
            .windows(2)
            .any(|pair| pair[0].stake_id() >= pair[1].stake_id())
        {
            return Err(Error::UnsortedStakes);
        }

        if !self
            .master
            .verify_schnorr(&self.signature, self.limitedid.as_bytes())
        {
            return Err(Error::InvalidMasterSignature);
        }

        let commitment = self.stake_commitment();
        if let Some(stake) = self.stakes.iter().find(|s| !s.verify(&commitment))
        {
            return Err(Error::InvalidStakeSignature(stake.stake_id()));
        }

        Ok(())
    }
}

impl WireEncode for Proof {
    fn wire_encode<E: io::Write>(&self, mut e: E) -> Result<usize, io::Error> {
        Ok(self.sequence.wire_encode(&mut e)?
            + self.expiration_time.wire_encode(&mut e)?
            + self.master.wire_encode(&mut e)?
            + serialize_sequence(&mut e, &self.stakes)?
            + serialize_blob(&mut e, &self.payout_script)?
            + self.signature.wire_encode(&mut e)?)
    }
}

impl WireDecode for Proof {
    fn wire_decode<D: io::Read>(mut d: D) -> Result<Self, encoding::Error> {
        let sequence = u64::wire_decode(&mut d)?;
        let expiration_time = i64::wire_decode(&mut d)?;
        let master = PublicKey::wire_decode(&mut d)?;
        let stakes = deserialize_sequence(&mut d)?;
        let payout_script = deserialize_blob(&mut d)?;
        let signature = Signature::wire_decode(&mut d)?;
        Ok(Proof::with(
            sequence,
            expiration_time,
            master,
            stakes,
            payout_script,
            signature,
        ))
    }
}

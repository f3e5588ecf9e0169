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

use std::collections::BTreeMap;

use crate::keys::{PrivateKey, PublicKey};
use crate::proof::{Error, Proof};
use crate::stake::{OutPoint, SignedStake, Stake};
use crate::uint256::{LimitedProofId, StakeCommitment, StakeId, TxId};

/// Stake waiting for the proof to be built
#[derive(Clone, Debug)]
enum PendingStake {
    /// Signed on build with the stored key
    Unsigned(Stake, PrivateKey),
    /// Signed by its owner in advance
    Signed(SignedStake),
}

impl PendingStake {
    fn stake(&self) -> &Stake {
        match self {
            PendingStake::Unsigned(stake, _) => stake,
            PendingStake::Signed(signed) => signed.stake(),
        }
    }
}

/// Collects stakes and produces signed [`Proof`]. Stakes are kept sorted by
/// their id; the builder is consumed by [`ProofBuilder::build`].
#[derive(Clone, Debug)]
pub struct ProofBuilder {
    sequence: u64,
    expiration_time: i64,
    master: PrivateKey,
    payout_script: Vec<u8>,
    stakes: BTreeMap<StakeId, PendingStake>,
}

impl ProofBuilder {
    pub fn new(
        sequence: u64,
        expiration_time: i64,
        master: PrivateKey,
        payout_script: Vec<u8>,
    ) -> Self {
        ProofBuilder {
            sequence,
            expiration_time,
            master,
            payout_script,
            stakes: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn master(&self) -> PublicKey {
        self.master.public_key()
    }

    /// Commitment the stakes of the proof being built must be signed over;
    /// to be passed to third parties signing their stakes for
    /// [`ProofBuilder::add_signed_stake`]
    pub fn stake_commitment(&self) -> StakeCommitment {
        StakeCommitment::new(self.expiration_time, &self.master.public_key())
    }

    #[inline]
    pub fn stake_count(&self) -> usize {
        self.stakes.len()
    }

    /// Adds coins in the UTXO staked by the owner of WIF-encoded private
    /// key. Nothing is signed until the proof is built.
    pub fn add_utxo(
        &mut self,
        txid: TxId,
        vout: u32,
        amount: i64,
        height: u32,
        wif_privkey: &str,
        is_coinbase: bool,
    ) -> Result<StakeId, Error> {
        let key = PrivateKey::from_wif(wif_privkey)?;
        let stake = Stake::new(
            OutPoint::new(txid, vout),
            amount,
            height,
            is_coinbase,
            key.public_key(),
        )?;
        self.insert(PendingStake::Unsigned(stake, key))
    }

    /// Adds stake together with its private key
    pub fn add_stake(
        &mut self,
        stake: Stake,
        key: PrivateKey,
    ) -> Result<StakeId, Error> {
        if key.public_key() != *stake.pubkey() {
            return Err(Error::StakeKeyMismatch(stake.pubkey().clone()));
        }
        self.insert(PendingStake::Unsigned(stake, key))
    }

    /// Adds stake signed by its owner. The signature must be valid for the
    /// commitment returned by [`ProofBuilder::stake_commitment`].
    pub fn add_signed_stake(
        &mut self,
        signed: SignedStake,
    ) -> Result<StakeId, Error> {
        if !signed.verify(&self.stake_commitment()) {
            return Err(Error::InvalidStakeSignature(signed.stake_id()));
        }
        self.insert(PendingStake::Signed(signed))
    }

    fn insert(&mut self, pending: PendingStake) -> Result<StakeId, Error> {
        let stake_id = pending.stake().stake_id();
        if self.stakes.contains_key(&stake_id) {
            return Err(Error::DuplicateStake(stake_id));
        }
        trace!(
            "Adding stake {} of {} on {}",
            stake_id,
            pending.stake().amount(),
            pending.stake().utxo()
        );
        self.stakes.insert(stake_id, pending);
        Ok(stake_id)
    }

    /// Signs the proof and all stakes, producing the final proof
    pub fn build(self) -> Result<Proof, Error> {
        let master = self.master.public_key();
        let limitedid = LimitedProofId::compute(
            self.sequence,
            self.expiration_time,
            &self.payout_script,
            self.stakes.values().map(PendingStake::stake),
        );
        debug!(
            "Signing proof {} with {} stakes",
            limitedid.compute_proof_id(&master),
            self.stakes.len()
        );
        let signature = self.master.sign_schnorr(limitedid.as_bytes())?;

        let commitment = StakeCommitment::new(self.expiration_time, &master);
        let stakes = self
            .stakes
            .into_iter()
            .map(|(_, pending)| match pending {
                PendingStake::Unsigned(stake, key) => stake.sign(&key, &commitment),
                PendingStake::Signed(signed) => Ok(signed),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let proof = Proof::with(
            self.sequence,
            self.expiration_time,
            master,
            stakes,
            self.payout_script,
            signature,
        );
        debug!("Proof {} is built", proof.proofid());
        Ok(proof)
    }
}

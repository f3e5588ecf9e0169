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

//! Delegations of the proof master key authority.
//!
//! Each delegation level names the delegated public key and carries the
//! signature of the previous authority (the proof master key for the first
//! level) over the running commitment:
//!
//! ```text
//! h_0 = proofid
//! h_i = sha256d(h_(i-1) || blob(pubkey_i))
//! ```
//!
//! The last value of the running commitment is the delegation id.

use std::io;

use crate::encoding::{self, deserialize_sequence, serialize_sequence};
use crate::keys::PublicKey;
use crate::proof::Proof;
use crate::schnorr::{Signature, SigningError};
use crate::uint256::{DelegationId, LimitedProofId, ProofId, UInt256};
use crate::{WireDecode, WireEncode};

/// Errors building or verifying delegations
#[derive(Clone, PartialEq, Eq, Debug, Display, From, Error)]
#[display(doc_comments)]
pub enum Error {
    /// delegator key {1} does not match the current authority key {0}
    WrongDelegatorKey(PublicKey, PublicKey),

    /// signature of delegation level #{0} is invalid
    InvalidSignature(usize),

    /// {0}
    #[from]
    Signing(SigningError),
}

impl From<ProofId> for DelegationId {
    #[inline]
    fn from(proofid: ProofId) -> Self {
        DelegationId::from(UInt256::from(proofid))
    }
}

impl DelegationId {
    /// Extends the running commitment with the next delegated key
    pub fn chain(&self, pubkey: &PublicKey) -> DelegationId {
        let mut engine = self.to_byte_array().to_vec();
        // In-memory writer never fails
        let _ = pubkey.wire_encode(&mut engine);
        DelegationId::from(UInt256::hash(engine))
    }
}

/// Single delegation level: the delegated key and the signature of the
/// previous authority
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Level {
    pub pubkey: PublicKey,
    pub signature: Signature,
}

impl WireEncode for Level {
    fn wire_encode<E: io::Write>(&self, mut e: E) -> Result<usize, io::Error> {
        Ok(self.pubkey.wire_encode(&mut e)? + self.signature.wire_encode(&mut e)?)
    }
}

impl WireDecode for Level {
    fn wire_decode<D: io::Read>(mut d: D) -> Result<Self, encoding::Error> {
        Ok(Level {
            pubkey: PublicKey::wire_decode(&mut d)?,
            signature: Signature::wire_decode(&mut d)?,
        })
    }
}

/// Anything a delegation chain can be started or continued from
pub trait Delegable {
    fn limitedid(&self) -> LimitedProofId;

    fn proof_master(&self) -> PublicKey;

    /// Already existing levels
    fn levels(&self) -> &[Level] {
        &[]
    }

    /// Current value of the running commitment
    fn delegation_id(&self) -> DelegationId;

    /// Key having the authority to add the next level
    fn delegated_pubkey(&self) -> PublicKey {
        self.levels()
            .last()
            .map(|level| level.pubkey.clone())
            .unwrap_or_else(|| self.proof_master())
    }
}

impl Delegable for Proof {
    #[inline]
    fn limitedid(&self) -> LimitedProofId {
        Proof::limitedid(self)
    }

    #[inline]
    fn proof_master(&self) -> PublicKey {
        self.master().clone()
    }

    #[inline]
    fn delegation_id(&self) -> DelegationId {
        DelegationId::from(self.proofid())
    }
}

impl Delegable for (LimitedProofId, PublicKey) {
    #[inline]
    fn limitedid(&self) -> LimitedProofId {
        self.0
    }

    #[inline]
    fn proof_master(&self) -> PublicKey {
        self.1.clone()
    }

    #[inline]
    fn delegation_id(&self) -> DelegationId {
        DelegationId::from(self.0.compute_proof_id(&self.1))
    }
}

/// Chain of delegation levels attached to a proof, identified by its
/// limited id and master key
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Delegation {
    limitedid: LimitedProofId,
    proof_master: PublicKey,
    levels: Vec<Level>,

    dgid: DelegationId,
}

impl Delegation {
    pub fn with(
        limitedid: LimitedProofId,
        proof_master: PublicKey,
        levels: Vec<Level>,
    ) -> Self {
        let dgid = levels.iter().fold(
            DelegationId::from(limitedid.compute_proof_id(&proof_master)),
            |dgid, level| dgid.chain(&level.pubkey),
        );
        Delegation {
            limitedid,
            proof_master,
            levels,
            dgid,
        }
    }

    #[inline]
    pub fn proofid(&self) -> ProofId {
        self.limitedid.compute_proof_id(&self.proof_master)
    }

    /// Replays the chain checking the signature of every level. Returns the
    /// key the authority is finally delegated to.
    pub fn verify(&self) -> Result<PublicKey, Error> {
        let mut dgid = DelegationId::from(self.proofid());
        let mut authority = &self.proof_master;
        for (index, level) in self.levels.iter().enumerate() {
            dgid = dgid.chain(&level.pubkey);
            if !authority.verify_schnorr(&level.signature, dgid.as_bytes()) {
                return Err(Error::InvalidSignature(index));
            }
            authority = &level.pubkey;
        }
        Ok(authority.clone())
    }
}

impl Delegable for Delegation {
    #[inline]
    fn limitedid(&self) -> LimitedProofId {
        self.limitedid
    }

    #[inline]
    fn proof_master(&self) -> PublicKey {
        self.proof_master.clone()
    }

    #[inline]
    fn levels(&self) -> &[Level] {
        &self.levels
    }

    #[inline]
    fn delegation_id(&self) -> DelegationId {
        self.dgid
    }
}

impl WireEncode for Delegation {
    fn wire_encode<E: io::Write>(&self, mut e: E) -> Result<usize, io::Error> {
        Ok(self.limitedid.wire_encode(&mut e)?
            + self.proof_master.wire_encode(&mut e)?
            + serialize_sequence(&mut e, &self.levels)?)
    }
}

impl WireDecode for Delegation {
    fn wire_decode<D: io::Read>(mut d: D) -> Result<Self, encoding::Error> {
        let limitedid = LimitedProofId::wire_decode(&mut d)?;
        let proof_master = PublicKey::wire_decode(&mut d)?;
        let levels = deserialize_sequence(&mut d)?;
        Ok(Delegation::with(limitedid, proof_master, levels))
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::*;

    const LIMITEDID: &str =
        "6513a4e37605343c7f9e8b782aea6f382f62237570e46f2eb35996827ba99fae";
    const MASTER: &str =
        "0284e18485c926897f3fe16e00cabfa73a8c22d63ff2b9f36a329363a42609f1be";
    const PROOFID: &str =
        "564e582a829ad8f7413bb052f6c04c814fba1edb685853ae73f20df7091d08bc";
    const DELEGATED: &str =
        "0330b510a7325c7f0e8e332bb9b28343b16d00e4a5fe5168e7643e6d9b2c422248";
    const DELEGATION: &str = "ae9fa97b829659b32e6fe4707523622f386fea2a788b9e7f3c340576e3a41365210284e18485c926897f3fe16e00cabfa73a8c22d63ff2b9f36a329363a42609f1be01210330b510a7325c7f0e8e332bb9b28343b16d00e4a5fe5168e7643e6d9b2c4222487dd4f0527d625c59af4155691aaf901966cbedcf7d5075cc27b18cc5ed1e857aff4a6e4f889502208b076b18c20cc2dfa7813b12ffefc8dd54946b531eaa7bb9";
    const DGID: &str =
        "af684b237cc4e0c383b6b3c2272671ea8fe3a77102da720a0ab72fc974320e31";

    #[test]
    fn test_empty() {
        let master = PublicKey::from_str(MASTER).unwrap();
        let source = (LimitedProofId::from_str(LIMITEDID).unwrap(), master.clone());
        assert_eq!(source.delegation_id().to_string(), PROOFID);
        assert_eq!(source.delegated_pubkey(), master);

        let delegation =
            Delegation::with(source.limitedid(), source.proof_master(), vec![]);
        assert_eq!(delegation.delegation_id().to_string(), PROOFID);
        assert_eq!(delegation.proofid().to_string(), PROOFID);
        assert_eq!(delegation.verify(), Ok(master));
        assert_eq!(
            WireEncode::to_hex(&delegation),
            format!("{}21{}00", &DELEGATION[..64], MASTER)
        );
    }

    #[test]
    fn test_decode_verify() {
        let delegation = Delegation::from_hex(DELEGATION).unwrap();
        assert_eq!(delegation.limitedid().to_string(), LIMITEDID);
        assert_eq!(delegation.proof_master().to_string(), MASTER);
        assert_eq!(delegation.levels().len(), 1);
        assert_eq!(delegation.delegation_id().to_string(), DGID);
        assert_eq!(delegation.delegated_pubkey().to_string(), DELEGATED);
        assert_eq!(
            delegation.verify(),
            Ok(PublicKey::from_str(DELEGATED).unwrap())
        );
        assert_eq!(WireEncode::to_hex(&delegation), DELEGATION);
    }

    #[test]
    fn test_verify_invalid() {
        let delegation = Delegation::from_hex(DELEGATION).unwrap();
        let mut level = delegation.levels()[0].clone();
        let mut sig = level.signature.to_byte_array();
        sig[0] ^= 0x01;
        level.signature = Signature::from_byte_array(sig);
        let forged = Delegation::with(
            delegation.limitedid(),
            delegation.proof_master(),
            vec![level],
        );
        assert_eq!(forged.verify(), Err(Error::InvalidSignature(0)));
        // Signature is not a part of the delegation id
        assert_eq!(forged.delegation_id(), delegation.delegation_id());
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(
            Delegation::from_hex(&DELEGATION[..DELEGATION.len() - 2]),
            Err(encoding::Error::MalformedSequence(1, 0))
        );
        assert_eq!(
            Delegation::from_hex(&DELEGATION[..100]),
            Err(encoding::Error::TruncatedInput)
        );
        let bad_key = format!("{}2102{}00", &DELEGATION[..64], "00".repeat(32));
        assert_eq!(
            Delegation::from_hex(&bad_key),
            Err(encoding::Error::InvalidKeyEncoding)
        );
    }
}

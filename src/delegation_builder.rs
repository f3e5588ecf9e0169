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

use crate::delegation::{Delegable, Delegation, Error, Level};
use crate::keys::{PrivateKey, PublicKey};
use crate::uint256::{DelegationId, LimitedProofId};

/// Builds a new delegation or extends an existing one with more levels
#[derive(Clone, Debug)]
pub struct DelegationBuilder {
    limitedid: LimitedProofId,
    proof_master: PublicKey,
    levels: Vec<Level>,
    dgid: DelegationId,
    authority: PublicKey,
}

impl DelegationBuilder {
    /// Starts delegation of the proof identified by its limited id and
    /// master key
    #[inline]
    pub fn new(limitedid: LimitedProofId, proof_master: PublicKey) -> Self {
        Self::from_delegable(&(limitedid, proof_master))
    }

    /// Starts a new delegation of a proof or continues an existing one
    pub fn from_delegable(source: &impl Delegable) -> Self {
        DelegationBuilder {
            limitedid: source.limitedid(),
            proof_master: source.proof_master(),
            levels: source.levels().to_vec(),
            dgid: source.delegation_id(),
            authority: source.delegated_pubkey(),
        }
    }

    /// Key which must sign the next level
    #[inline]
    pub fn authority(&self) -> &PublicKey {
        &self.authority
    }

    #[inline]
    pub fn delegation_id(&self) -> DelegationId {
        self.dgid
    }

    /// Delegates the current authority to `delegated_pubkey`. Fails without
    /// modifying the builder if `delegator_key` is not the current
    /// authority key.
    pub fn add_level(
        &mut self,
        delegator_key: &PrivateKey,
        delegated_pubkey: PublicKey,
    ) -> Result<DelegationId, Error> {
        let delegator = delegator_key.public_key();
        if delegator != self.authority {
            return Err(Error::WrongDelegatorKey(self.authority.clone(), delegator));
        }

        let dgid = self.dgid.chain(&delegated_pubkey);
        let signature = delegator_key.sign_schnorr(dgid.as_bytes())?;
        debug!(
            "Delegating {} to {}, delegation id {}",
            self.authority, delegated_pubkey, dgid
        );

        self.levels.push(Level {
            pubkey: delegated_pubkey.clone(),
            signature,
        });
        self.authority = delegated_pubkey;
        self.dgid = dgid;
        Ok(dgid)
    }

    pub fn build(self) -> Delegation {
        Delegation::with(self.limitedid, self.proof_master, self.levels)
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::*;
    use crate::keys::test::{PUB_UNCOMPRESSED, WIF_UNCOMPRESSED};
    use crate::{WireDecode, WireEncode};

    const LIMITEDID: &str =
        "6513a4e37605343c7f9e8b782aea6f382f62237570e46f2eb35996827ba99fae";
    const MASTER_WIF: &str =
        "KzrNHHEZUVDtXYvxGVWMrL5Tpzk9LWfjPMkNBdZHsAV5NdFiLoCB";
    const DELEGATED_WIF: &str =
        "L53BMYrX3AdxEea4NMFUd797MdMcQf9eY4tLaLJ3ckcNfT2Jadjf";
    const ONE_LEVEL: &str = "ae9fa97b829659b32e6fe4707523622f386fea2a788b9e7f3c340576e3a41365210284e18485c926897f3fe16e00cabfa73a8c22d63ff2b9f36a329363a42609f1be01210330b510a7325c7f0e8e332bb9b28343b16d00e4a5fe5168e7643e6d9b2c4222487dd4f0527d625c59af4155691aaf901966cbedcf7d5075cc27b18cc5ed1e857aff4a6e4f889502208b076b18c20cc2dfa7813b12ffefc8dd54946b531eaa7bb9";
    const TWO_LEVELS: &str = "ae9fa97b829659b32e6fe4707523622f386fea2a788b9e7f3c340576e3a41365210284e18485c926897f3fe16e00cabfa73a8c22d63ff2b9f36a329363a42609f1be02210330b510a7325c7f0e8e332bb9b28343b16d00e4a5fe5168e7643e6d9b2c4222487dd4f0527d625c59af4155691aaf901966cbedcf7d5075cc27b18cc5ed1e857aff4a6e4f889502208b076b18c20cc2dfa7813b12ffefc8dd54946b531eaa7bb94104d0de0aaeaefad02b8bdc8a01a1b8b11c696bd3d66a2c5f10780d95b7df42645cd85228a6fb29940e858e7e55842ae2bd115d1ed7cc0e82d934e929c97648cb0ade17cb845dcaa07eeabeed9b1b4537c76aa0864e574869503d665ca70ca3a07437c4c93935b328874a226bdaf6b5290f43652bfca57fd7b6c0a0a8b08cd79e02";

    fn master() -> PrivateKey {
        PrivateKey::from_wif(MASTER_WIF).unwrap()
    }

    fn delegated() -> PrivateKey {
        PrivateKey::from_wif(DELEGATED_WIF).unwrap()
    }

    fn builder() -> DelegationBuilder {
        DelegationBuilder::new(
            LimitedProofId::from_str(LIMITEDID).unwrap(),
            master().public_key(),
        )
    }

    #[test]
    fn test_one_level() {
        let mut builder = builder();
        let dgid = builder
            .add_level(&master(), delegated().public_key())
            .unwrap();
        assert_eq!(
            dgid.to_string(),
            "af684b237cc4e0c383b6b3c2272671ea8fe3a77102da720a0ab72fc974320e31"
        );
        let delegation = builder.build();
        assert_eq!(WireEncode::to_hex(&delegation), ONE_LEVEL);
        assert_eq!(delegation.delegation_id(), dgid);
    }

    #[test]
    fn test_two_levels_in_one_pass() {
        let mut builder = builder();
        builder
            .add_level(&master(), delegated().public_key())
            .unwrap();
        builder
            .add_level(&delegated(), PublicKey::from_str(PUB_UNCOMPRESSED).unwrap())
            .unwrap();
        let delegation = builder.build();
        assert_eq!(WireEncode::to_hex(&delegation), TWO_LEVELS);
        assert_eq!(
            delegation.delegation_id().to_string(),
            "73517ef14a164e0f4818c742766caf3c60e492a42c8235dd70a737a24fc138b8"
        );
        assert_eq!(
            delegation.verify(),
            Ok(PublicKey::from_str(PUB_UNCOMPRESSED).unwrap())
        );
    }

    #[test]
    fn test_extend_existing() {
        let existing = Delegation::from_hex(ONE_LEVEL).unwrap();
        let mut builder = DelegationBuilder::from_delegable(&existing);
        assert_eq!(builder.authority(), &delegated().public_key());
        builder
            .add_level(&delegated(), PublicKey::from_str(PUB_UNCOMPRESSED).unwrap())
            .unwrap();
        assert_eq!(WireEncode::to_hex(&builder.build()), TWO_LEVELS);
    }

    #[test]
    fn test_wrong_delegator() {
        let mut builder = builder();
        let before = builder.clone().build();
        let wrong = PrivateKey::from_wif(WIF_UNCOMPRESSED).unwrap();
        assert_eq!(
            builder.add_level(&wrong, delegated().public_key()),
            Err(Error::WrongDelegatorKey(
                master().public_key(),
                wrong.public_key()
            ))
        );
        assert_eq!(builder.authority(), &master().public_key());
        assert_eq!(builder.build(), before);
    }
}

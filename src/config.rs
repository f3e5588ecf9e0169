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

//! TOML descriptions of proofs and delegations to be built.
//!
//! ```toml
//! sequence = 42
//! expiration-time = 1699999999
//! master-key = "5HueCGU8rMjxEXxiPuD5BDku4MkFqeZyd4dZ1jvhTVqvbTLvyTJ"
//! payout-script = ""
//!
//! [[utxo]]
//! txid = "24ae50f5d4e81e340b29708ab11cab48364e2ae2c53f8439cbe983257919fcb7"
//! vout = 0
//! amount = 10000
//! height = 672828
//! key = "5HueCGU8rMjxEXxiPuD5BDku4MkFqeZyd4dZ1jvhTVqvbTLvyTJ"
//! coinbase = false
//! ```

use std::fs;
use std::io;
use std::path::Path;

use bitcoin_hashes::hex::{self, FromHex};

use crate::delegation;
use crate::encoding;
use crate::keys::{KeyDecodingError, PrivateKey, PublicKey};
use crate::proof::{self, Proof};
use crate::uint256::{LimitedProofId, TxId};
use crate::{Delegation, DelegationBuilder, ProofBuilder, WireDecode};

/// Error happening during config initialization
#[derive(Clone, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum ConfigInitError {
    /// I/O error during config file processing:
    /// {0}
    Io(String),

    /// Unable to parse TOML format of the config file:
    /// {0}
    #[from]
    Toml(toml::de::Error),
}

impl From<io::Error> for ConfigInitError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Errors in the configuration content
#[derive(Clone, PartialEq, Eq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum ConfigError {
    /// {0}
    #[from]
    Key(KeyDecodingError),

    /// invalid payout script hex: {0}
    #[from]
    PayoutScript(hex::Error),

    /// unable to decode delegation source: {0}
    #[from]
    Source(encoding::Error),

    /// {0}
    #[from]
    Proof(proof::Error),

    /// {0}
    #[from]
    Delegation(delegation::Error),

    /// delegation must start from exactly one of a proof, a delegation or a
    /// pair of limited proof id and master key
    AmbiguousSource,
}

fn read_toml<T>(path: impl AsRef<Path>) -> Result<T, ConfigInitError>
where
    T: serde::de::DeserializeOwned,
{
    let data = fs::read_to_string(path)?;
    Ok(toml::from_str(&data)?)
}

/// Coins staked into a proof
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(crate = "serde_crate", rename_all = "kebab-case")]
pub struct UtxoConfig {
    pub txid: TxId,
    pub vout: u32,
    pub amount: i64,
    pub height: u32,
    /// WIF-encoded private key owning the coins
    pub key: String,
    #[serde(default)]
    pub coinbase: bool,
}

/// Proof to be built
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(crate = "serde_crate", rename_all = "kebab-case")]
pub struct ProofConfig {
    pub sequence: u64,
    pub expiration_time: i64,
    /// WIF-encoded proof master key
    pub master_key: String,
    /// Hex-encoded payout script
    #[serde(default)]
    pub payout_script: String,
    #[serde(default, rename = "utxo")]
    pub utxos: Vec<UtxoConfig>,
}

impl ProofConfig {
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self, ConfigInitError> {
        read_toml(path)
    }

    /// Creates builder with all the configured stakes added
    pub fn into_builder(self) -> Result<ProofBuilder, ConfigError> {
        let master = PrivateKey::from_wif(&self.master_key)?;
        let payout_script = Vec::<u8>::from_hex(self.payout_script.trim())?;
        let mut builder = ProofBuilder::new(
            self.sequence,
            self.expiration_time,
            master,
            payout_script,
        );
        for utxo in self.utxos {
            builder.add_utxo(
                utxo.txid,
                utxo.vout,
                utxo.amount,
                utxo.height,
                &utxo.key,
                utxo.coinbase,
            )?;
        }
        Ok(builder)
    }
}

/// Next delegation level
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(crate = "serde_crate", rename_all = "kebab-case")]
pub struct LevelConfig {
    /// WIF-encoded key of the current authority
    pub delegator_key: String,
    pub delegated_pubkey: PublicKey,
}

/// Delegation to be built or extended
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(crate = "serde_crate", rename_all = "kebab-case")]
pub struct DelegationConfig {
    /// Hex-encoded proof to delegate
    pub proof: Option<String>,
    /// Hex-encoded delegation to extend
    pub delegation: Option<String>,
    pub limitedid: Option<LimitedProofId>,
    pub master: Option<PublicKey>,
    #[serde(default, rename = "level")]
    pub levels: Vec<LevelConfig>,
}

impl DelegationConfig {
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self, ConfigInitError> {
        read_toml(path)
    }

    /// Creates builder from the configured source with all the configured
    /// levels added
    pub fn into_builder(self) -> Result<DelegationBuilder, ConfigError> {
        let mut builder =
            match (self.proof, self.delegation, self.limitedid, self.master) {
                (Some(proof), None, None, None) => {
                    DelegationBuilder::from_delegable(&Proof::from_hex(&proof)?)
                }
                (None, Some(delegation), None, None) => {
                    DelegationBuilder::from_delegable(&Delegation::from_hex(
                        &delegation,
                    )?)
                }
                (None, None, Some(limitedid), Some(master)) => {
                    DelegationBuilder::new(limitedid, master)
                }
                _ => return Err(ConfigError::AmbiguousSource),
            };
        for level in self.levels {
            let key = PrivateKey::from_wif(&level.delegator_key)?;
            builder.add_level(&key, level.delegated_pubkey)?;
        }
        Ok(builder)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::delegation::Delegable;
    use crate::WireEncode;

    const PROOF_TOML: &str = r#"
sequence = 42
expiration-time = 1699999999
master-key = "5HueCGU8rMjxEXxiPuD5BDku4MkFqeZyd4dZ1jvhTVqvbTLvyTJ"

[[utxo]]
txid = "24ae50f5d4e81e340b29708ab11cab48364e2ae2c53f8439cbe983257919fcb7"
vout = 0
amount = 10000
height = 672828
key = "5HueCGU8rMjxEXxiPuD5BDku4MkFqeZyd4dZ1jvhTVqvbTLvyTJ"
"#;

    const DELEGATION_TOML: &str = r#"
limitedid = "6513a4e37605343c7f9e8b782aea6f382f62237570e46f2eb35996827ba99fae"
master = "0284e18485c926897f3fe16e00cabfa73a8c22d63ff2b9f36a329363a42609f1be"

[[level]]
delegator-key = "KzrNHHEZUVDtXYvxGVWMrL5Tpzk9LWfjPMkNBdZHsAV5NdFiLoCB"
delegated-pubkey = "0330b510a7325c7f0e8e332bb9b28343b16d00e4a5fe5168e7643e6d9b2c422248"
"#;

    #[test]
    fn test_proof_config() {
        let config: ProofConfig = toml::from_str(PROOF_TOML).unwrap();
        assert_eq!(config.utxos.len(), 1);
        assert!(!config.utxos[0].coinbase);
        assert_eq!(config.payout_script, "");
        let proof = config.into_builder().unwrap().build().unwrap();
        assert_eq!(
            proof.proofid().to_string(),
            "c197d2d7e59cfb0a15f3107b9510cae58291626c354e21f5e38437510246b4a6"
        );
    }

    #[test]
    fn test_delegation_config() {
        let config: DelegationConfig = toml::from_str(DELEGATION_TOML).unwrap();
        let delegation = config.into_builder().unwrap().build();
        assert_eq!(
            delegation.delegation_id().to_string(),
            "af684b237cc4e0c383b6b3c2272671ea8fe3a77102da720a0ab72fc974320e31"
        );
        assert!(delegation.verify().is_ok());

        let extended = DelegationConfig {
            delegation: Some(WireEncode::to_hex(&delegation)),
            ..Default::default()
        };
        assert_eq!(extended.into_builder().unwrap().build(), delegation);
    }

    #[test]
    fn test_config_errors() {
        assert_eq!(
            DelegationConfig::default().into_builder().unwrap_err(),
            ConfigError::AmbiguousSource
        );
        let config = DelegationConfig {
            proof: Some(s!("00")),
            ..Default::default()
        };
        assert_eq!(
            config.into_builder().unwrap_err(),
            ConfigError::Source(encoding::Error::TruncatedInput)
        );

        let mut config: ProofConfig = toml::from_str(PROOF_TOML).unwrap();
        config.payout_script = s!("0");
        assert!(matches!(
            config.into_builder(),
            Err(ConfigError::PayoutScript(_))
        ));

        assert!(toml::from_str::<ProofConfig>("sequence = 1").is_err());
        assert!(matches!(
            ProofConfig::read_file("/nonexistent/avaproof.toml"),
            Err(ConfigInitError::Io(_))
        ));
    }
}

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

use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::io;
use std::str::FromStr;

use bitcoin_hashes::hex::{FromHex, ToHex};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use zeroize::{Zeroize, Zeroizing};

use crate::encoding::{self, deserialize_blob, serialize_blob};
use crate::schnorr::{self, Signature, SigningError};
use crate::{WireDecode, WireEncode};

/// Errors decoding private or public keys
#[derive(Clone, PartialEq, Eq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum KeyDecodingError {
    /// invalid WIF private key: {0}
    Wif(String),

    /// private key is not a valid secp256k1 scalar
    InvalidScalar,

    /// public key is not a valid SEC1-encoded secp256k1 point
    InvalidPoint,

    /// public key hex string is invalid
    InvalidHex,
}

/// Public key as it is committed into proofs and delegations: a valid
/// secp256k1 point in its original (compressed or uncompressed) SEC1
/// encoding
#[derive(Clone)]
pub struct PublicKey {
    bytes: Vec<u8>,
    point: k256::PublicKey,
}

impl PublicKey {
    /// Parses SEC1 encoding, validating that it describes a curve point
    pub fn from_slice(data: &[u8]) -> Result<Self, KeyDecodingError> {
        let point = k256::PublicKey::from_sec1_bytes(data)
            .map_err(|_| KeyDecodingError::InvalidPoint)?;
        Ok(PublicKey {
            bytes: data.to_vec(),
            point,
        })
    }

    fn with_point(point: k256::PublicKey, compressed: bool) -> Self {
        PublicKey {
            bytes: point.to_encoded_point(compressed).as_bytes().to_vec(),
            point,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn is_compressed(&self) -> bool {
        self.bytes.len() == 33
    }

    /// Verifies Schnorr signature over the 32-byte message
    #[inline]
    pub fn verify_schnorr(&self, signature: &Signature, msg: &[u8; 32]) -> bool {
        schnorr::verify(&self.point, signature, msg)
    }
}

impl PartialEq for PublicKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for PublicKey {}

impl Hash for PublicKey {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state)
    }
}

impl PartialOrd for PublicKey {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PublicKey {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

impl AsRef<[u8]> for PublicKey {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.bytes[..].to_hex())
    }
}

impl Debug for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

impl FromStr for PublicKey {
    type Err = KeyDecodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = <Vec<u8> as FromHex>::from_hex(s)
            .map_err(|_| KeyDecodingError::InvalidHex)?;
        PublicKey::from_slice(&bytes)
    }
}

impl WireEncode for PublicKey {
    #[inline]
    fn wire_encode<E: io::Write>(&self, e: E) -> Result<usize, io::Error> {
        serialize_blob(e, &self.bytes)
    }
}

impl WireDecode for PublicKey {
    fn wire_decode<D: io::Read>(d: D) -> Result<Self, encoding::Error> {
        let bytes = deserialize_blob(d)?;
        PublicKey::from_slice(&bytes)
            .map_err(|_| encoding::Error::InvalidKeyEncoding)
    }
}

#[cfg(feature = "serde")]
crate::impl_serde_display!(PublicKey);

/// Private key for signing proofs, stakes and delegation levels. Keeps the
/// compression flag from its WIF encoding, which defines the encoding of the
/// derived public key.
#[derive(Clone)]
pub struct PrivateKey {
    secret: k256::SecretKey,
    compressed: bool,
}

impl PrivateKey {
    /// Decodes key in wallet import format, for any network
    pub fn from_wif(wif: &str) -> Result<Self, KeyDecodingError> {
        let key = bitcoin::PrivateKey::from_wif(wif.trim())
            .map_err(|err| KeyDecodingError::Wif(err.to_string()))?;
        Self::from_bytes(&key.key[..], key.compressed)
    }

    /// Constructs key from a big-endian 32-byte scalar
    pub fn from_bytes(
        secret: &[u8],
        compressed: bool,
    ) -> Result<Self, KeyDecodingError> {
        if secret.len() != 32 {
            return Err(KeyDecodingError::InvalidScalar);
        }
        let secret = k256::SecretKey::from_slice(secret)
            .map_err(|_| KeyDecodingError::InvalidScalar)?;
        Ok(PrivateKey { secret, compressed })
    }

    #[inline]
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Derives public key, compressed or not according to the key flag
    pub fn public_key(&self) -> PublicKey {
        PublicKey::with_point(self.secret.public_key(), self.compressed)
    }

    /// Produces deterministic Schnorr signature over the 32-byte message
    pub fn sign_schnorr(&self, msg: &[u8; 32]) -> Result<Signature, SigningError> {
        let mut bytes = self.secret.to_bytes();
        let mut secret = Zeroizing::new([0u8; 32]);
        secret.copy_from_slice(&bytes);
        bytes[..].zeroize();
        schnorr::sign(&secret, msg)
    }
}

impl Debug for PrivateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key())
            .finish()
    }
}

impl FromStr for PrivateKey {
    type Err = KeyDecodingError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrivateKey::from_wif(s)
    }
}

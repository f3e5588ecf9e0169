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

//! Schnorr signatures over secp256k1 in the form used by avalanche (the
//! 2019 Bitcoin Cash scheme): 64-byte `r || s` signatures, with `R` chosen
//! to have a quadratic residue Y coordinate and the challenge committing to
//! the compressed public key. Nonces are derived deterministically with
//! RFC6979 (HMAC-SHA256) extended with the `"Schnorr+SHA256  "` algorithm
//! tag, so signing the same message with the same key always produces the
//! same signature.

use std::fmt::{self, Debug, Display, Formatter};
use std::io;
use std::str::FromStr;

use bitcoin_hashes::hex::{self, FromHex, ToHex};
use bitcoin_hashes::{sha256, Hash, HashEngine, Hmac, HmacEngine};
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::PrimeField;
use k256::{AffinePoint, FieldBytes, FieldElement, ProjectivePoint, Scalar, U256};
use zeroize::Zeroizing;

use crate::encoding::{self, read_array, WireDecode, WireEncode};

/// Algorithm tag mixed into the RFC6979 nonce derivation
const ALGO16: &[u8; 16] = b"Schnorr+SHA256  ";

/// Signing failures
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum SigningError {
    /// secret key is not a valid secp256k1 scalar (it is zero or exceeds the
    /// curve order)
    InvalidSecretKey,
}

/// 64-byte Schnorr signature
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; 64]);

impl Signature {
    pub const LEN: usize = 64;

    #[inline]
    pub const fn from_byte_array(bytes: [u8; 64]) -> Self {
        Signature(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    #[inline]
    pub fn to_byte_array(self) -> [u8; 64] {
        self.0
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0[..].to_hex())
    }
}

impl Debug for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self)
    }
}

impl FromStr for Signature {
    type Err = hex::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = <Vec<u8> as FromHex>::from_hex(s)?;
        if bytes.len() != Self::LEN {
            return Err(hex::Error::InvalidLength(Self::LEN * 2, s.len()));
        }
        let mut inner = [0u8; 64];
        inner.copy_from_slice(&bytes);
        Ok(Signature(inner))
    }
}

impl WireEncode for Signature {
    #[inline]
    fn wire_encode<E: io::Write>(&self, mut e: E) -> Result<usize, io::Error> {
        e.write_all(&self.0)?;
        Ok(Self::LEN)
    }
}

impl WireDecode for Signature {
    #[inline]
    fn wire_decode<D: io::Read>(d: D) -> Result<Self, encoding::Error> {
        Ok(Signature(read_array(d)?))
    }
}

#[cfg(feature = "serde")]
crate::impl_serde_display!(Signature);

/// Signs 32-byte message with the given 32-byte secret key
pub fn sign(secret: &[u8; 32], msg: &[u8; 32]) -> Result<Signature, SigningError> {
    let x = scalar_from_bytes(secret)
        .filter(|x| !bool::from(x.is_zero()))
        .ok_or(SigningError::InvalidSecretKey)?;
    let pubkey = AffinePoint::from(ProjectivePoint::GENERATOR * x);

    let mut k = nonce_rfc6979(secret, msg);
    let nonce_point = AffinePoint::from(ProjectivePoint::GENERATOR * k);
    if !has_square_y(&nonce_point) {
        k = -k;
    }
    // The nonce is never zero, so R is never the point at infinity
    let encoded = nonce_point.to_encoded_point(false);
    let r = encoded.x().ok_or(SigningError::InvalidSecretKey)?;

    let e = challenge(r, pubkey.to_encoded_point(true).as_bytes(), msg);
    let s = k + e * x;

    let mut sig = [0u8; 64];
    sig[..32].copy_from_slice(r);
    sig[32..].copy_from_slice(&s.to_bytes());
    Ok(Signature(sig))
}

/// Verifies signature for the 32-byte message against the public key.
/// Uncompressed keys are accepted; the challenge always commits to the
/// compressed form.
pub fn verify(
    pubkey: &k256::PublicKey,
    signature: &Signature,
    msg: &[u8; 32],
) -> bool {
    let mut r_bytes = [0u8; 32];
    r_bytes.copy_from_slice(&signature.0[..32]);
    let r = FieldBytes::from(r_bytes);
    if bool::from(FieldElement::from_bytes(&r).is_none()) {
        return false;
    }
    let mut s_bytes = [0u8; 32];
    s_bytes.copy_from_slice(&signature.0[32..]);
    let s = match scalar_from_bytes(&s_bytes) {
        Some(s) => s,
        None => return false,
    };

    let e = challenge(&r, pubkey.to_encoded_point(true).as_bytes(), msg);
    let point = AffinePoint::from(
        ProjectivePoint::GENERATOR * s - pubkey.to_projective() * e,
    );

    // Point at infinity has no coordinates
    let encoded = point.to_encoded_point(false);
    match encoded.x() {
        Some(x) => has_square_y(&point) && x[..] == r[..],
        None => false,
    }
}

/// `e = sha256(r || compressed pubkey || msg)` reduced modulo curve order
fn challenge(r: &FieldBytes, compressed_pubkey: &[u8], msg: &[u8; 32]) -> Scalar {
    let mut engine = sha256::Hash::engine();
    engine.input(&r[..]);
    engine.input(compressed_pubkey);
    engine.input(msg);
    let hash = sha256::Hash::from_engine(engine).into_inner();
    <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::from(hash))
}

/// Whether the Y coordinate of the point is a quadratic residue modulo the
/// field prime
fn has_square_y(point: &AffinePoint) -> bool {
    let encoded = point.to_encoded_point(false);
    let y = match encoded.y() {
        Some(y) => y,
        None => return false,
    };
    Option::<FieldElement>::from(FieldElement::from_bytes(y))
        .map(|y| bool::from(y.sqrt().is_some()))
        .unwrap_or(false)
}

/// Parses big-endian scalar, failing on values not below the curve order
fn scalar_from_bytes(bytes: &[u8; 32]) -> Option<Scalar> {
    Scalar::from_repr(FieldBytes::from(*bytes)).into()
}

fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let mut engine = HmacEngine::<sha256::Hash>::new(key);
    for part in parts {
        engine.input(part);
    }
    Hmac::<sha256::Hash>::from_engine(engine).into_inner()
}

/// RFC6979 nonce derivation over `secret || msg || ALGO16`
fn nonce_rfc6979(secret: &[u8; 32], msg: &[u8; 32]) -> Scalar {
    let mut data = Zeroizing::new([0u8; 80]);
    data[..32].copy_from_slice(secret);
    data[32..64].copy_from_slice(msg);
    data[64..].copy_from_slice(ALGO16);

    let mut v = [0x01u8; 32];
    let mut k = [0x00u8; 32];
    k = hmac_sha256(&k, &[&v, &[0x00], &data[..]]);
    v = hmac_sha256(&k, &[&v]);
    k = hmac_sha256(&k, &[&v, &[0x01], &data[..]]);
    v = hmac_sha256(&k, &[&v]);

    loop {
        v = hmac_sha256(&k, &[&v]);
        if let Some(nonce) =
            scalar_from_bytes(&v).filter(|nonce| !bool::from(nonce.is_zero()))
        {
            return nonce;
        }
        k = hmac_sha256(&k, &[&v, &[0x00]]);
        v = hmac_sha256(&k, &[&v]);
    }
}

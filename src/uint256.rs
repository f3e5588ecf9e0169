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

//! 256-bit blobs used for transaction ids and for all avalanche identifiers.
//!
//! The blob keeps the bytes in the order they are hashed and serialized; the
//! hex representation and the ordering treat them as a little-endian number,
//! i.e. they operate on the reversed bytes, as the node does.
//!
//! Two hex forms therefore exist for every identifier. `Display`/`FromStr`
//! use the reversed one, which is what users see and type in. The
//! [`WireEncode::to_hex`]/[`WireDecode::from_hex`] pair works with the
//! serialized byte order and is meant for embedding ids into wire data.
//! Passing a displayed id to [`WireDecode::from_hex`] yields a different id.

use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter};
use std::io;
use std::str::FromStr;

use bitcoin_hashes::hex::{self, FromHex, ToHex};
use bitcoin_hashes::{sha256d, Hash};

use crate::encoding::{read_array, Error, WireDecode, WireEncode};

/// Bitcoin's 256-bit hash (double SHA-256) of the data
pub fn sha256d(data: impl AsRef<[u8]>) -> [u8; 32] {
    sha256d::Hash::hash(data.as_ref()).into_inner()
}

/// Wrapper type for all 256-bit identifiers, implementing the node ordering
/// and hex representation so types based on it can simply reuse them.
///
/// Parse user-provided hex with [`FromStr`]; [`WireDecode::from_hex`]
/// expects the bytes in serialization order, not reversed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UInt256([u8; 32]);

impl UInt256 {
    /// Width of the blob in bytes
    pub const LEN: usize = 32;

    #[inline]
    pub const fn from_byte_array(bytes: [u8; 32]) -> Self {
        UInt256(bytes)
    }

    /// Constructs blob from a slice which must be exactly 32 bytes long
    pub fn from_slice(slice: &[u8]) -> Result<Self, bitcoin_hashes::Error> {
        if slice.len() != Self::LEN {
            return Err(bitcoin_hashes::Error::InvalidLength(
                Self::LEN,
                slice.len(),
            ));
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);
        Ok(UInt256(bytes))
    }

    /// Double SHA-256 hash of the data
    #[inline]
    pub fn hash(data: impl AsRef<[u8]>) -> Self {
        UInt256(sha256d(data))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[inline]
    pub fn to_byte_array(self) -> [u8; 32] {
        self.0
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.0.iter().all(|byte| *byte == 0)
    }
}

impl From<[u8; 32]> for UInt256 {
    #[inline]
    fn from(bytes: [u8; 32]) -> Self {
        UInt256(bytes)
    }
}

impl AsRef<[u8]> for UInt256 {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl Ord for UInt256 {
    // The bytes are compared backwards
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.iter().rev().cmp(other.0.iter().rev())
    }
}

impl PartialOrd for UInt256 {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for UInt256 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        if f.alternate() {
            write!(f, "{}..{}", reversed[..4].to_hex(), reversed[28..].to_hex())
        } else {
            f.write_str(&reversed[..].to_hex())
        }
    }
}

impl Debug for UInt256 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "UInt256({})", self)
    }
}

impl FromStr for UInt256 {
    type Err = hex::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = <Vec<u8> as FromHex>::from_hex(s)?;
        if bytes.len() != Self::LEN {
            return Err(hex::Error::InvalidLength(Self::LEN * 2, s.len()));
        }
        bytes.reverse();
        let mut inner = [0u8; 32];
        inner.copy_from_slice(&bytes);
        Ok(UInt256(inner))
    }
}

impl WireEncode for UInt256 {
    #[inline]
    fn wire_encode<E: io::Write>(&self, mut e: E) -> Result<usize, io::Error> {
        e.write_all(&self.0)?;
        Ok(Self::LEN)
    }
}

impl WireDecode for UInt256 {
    #[inline]
    fn wire_decode<D: io::Read>(d: D) -> Result<Self, Error> {
        Ok(UInt256(read_array(d)?))
    }
}

/// Implements serde for types with `Display` and `FromStr` implementations,
/// using their string representation
#[cfg(feature = "serde")]
#[macro_export]
macro_rules! impl_serde_display {
    ($ty:ty) => {
        impl ::serde_crate::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: ::serde_crate::Serializer,
            {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> ::serde_crate::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde_crate::Deserializer<'de>,
            {
                use ::serde_crate::de::Error;
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(D::Error::custom)
            }
        }
    };
}

#[cfg(feature = "serde")]
impl_serde_display!(UInt256);

/// Defines distinct 256-bit identifier type backed by [`UInt256`]
macro_rules! uint256_newtype {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[doc = ""]
        #[doc = "Displayed and parsed with `FromStr` as reversed hex; \
                 `WireDecode::from_hex` reads serialization byte order \
                 instead and must not be fed a displayed id."]
        #[derive(
            Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
        )]
        pub struct $name(UInt256);

        impl $name {
            #[inline]
            pub const fn from_byte_array(bytes: [u8; 32]) -> Self {
                $name(UInt256::from_byte_array(bytes))
            }

            #[inline]
            pub fn as_uint256(&self) -> &UInt256 {
                &self.0
            }

            #[inline]
            pub fn as_bytes(&self) -> &[u8; 32] {
                self.0.as_bytes()
            }

            #[inline]
            pub fn to_byte_array(self) -> [u8; 32] {
                self.0.to_byte_array()
            }
        }

        impl From<UInt256> for $name {
            #[inline]
            fn from(inner: UInt256) -> Self {
                $name(inner)
            }
        }

        impl From<$name> for UInt256 {
            #[inline]
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<[u8]> for $name {
            #[inline]
            fn as_ref(&self) -> &[u8] {
                self.0.as_ref()
            }
        }

        impl ::std::fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ::bitcoin_hashes::hex::Error;

            #[inline]
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                UInt256::from_str(s).map($name)
            }
        }

        impl $crate::encoding::WireEncode for $name {
            #[inline]
            fn wire_encode<E: ::std::io::Write>(
                &self,
                e: E,
            ) -> Result<usize, ::std::io::Error> {
                self.0.wire_encode(e)
            }
        }

        impl $crate::encoding::WireDecode for $name {
            #[inline]
            fn wire_decode<D: ::std::io::Read>(
                d: D,
            ) -> Result<Self, $crate::encoding::Error> {
                UInt256::wire_decode(d).map($name)
            }
        }

        #[cfg(feature = "serde")]
        impl_serde_display!($name);
    };
}

uint256_newtype!(TxId, "Transaction id, as displayed by block explorers");
uint256_newtype!(
    StakeId,
    "Hash of a serialized stake; used only as a sort key for proof stakes"
);
uint256_newtype!(
    StakeCommitment,
    "Commitment to the proof expiration time and master key signed together \
     with each stake"
);
uint256_newtype!(
    LimitedProofId,
    "Proof commitment excluding the master key: sequence, expiration time, \
     payout script and stakes"
);
uint256_newtype!(
    ProofId,
    "Proof identifier: limited proof id committed together with the proof \
     master key"
);
uint256_newtype!(
    DelegationId,
    "Running commitment of a delegation chain; equals to the proof id for a \
     delegation without levels"
);

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

//! Binary encoding used by the avalanche consensus node for proofs,
//! delegations and all their building blocks.
//!
//! All integers are little-endian. Variable-length data (byte blobs and
//! homogeneous sequences) are prefixed with a *compact size*: values below
//! 253 take a single byte, larger values are written as a marker byte
//! (253, 254 or 255) followed by a 2, 4 or 8-byte little-endian integer.

use std::io::{self, Read};

use amplify::IoError;
use bitcoin_hashes::hex::{self, FromHex, ToHex};

/// Maximum size of a blob or a sequence the node accepts during decoding.
pub const MAX_SIZE: u64 = 0x0200_0000;

/// Binary encoding according to the node wire format. Implemented by every
/// value type that can be a part of a proof or a delegation.
pub trait WireEncode {
    /// Encode with the given [`std::io::Write`] instance; must return result
    /// with the amount of bytes encoded.
    fn wire_encode<E: io::Write>(&self, e: E) -> Result<usize, io::Error>;

    /// Serializes data as a byte array using [`WireEncode::wire_encode`]
    fn wire_serialize(&self) -> Vec<u8> {
        let mut e = vec![];
        // In-memory writer never fails
        let _ = self.wire_encode(&mut e);
        e
    }

    /// Hex string of the serialized data
    fn to_hex(&self) -> String {
        ToHex::to_hex(&self.wire_serialize()[..])
    }
}

/// Binary decoding according to the node wire format.
pub trait WireDecode: Sized {
    /// Decode with the given [`std::io::Read`] instance; must either
    /// construct an instance or return a decoding error.
    fn wire_decode<D: io::Read>(d: D) -> Result<Self, Error>;

    /// Tries to deserialize byte array into the current type. Fails if the
    /// data are not consumed entirely.
    fn wire_deserialize(data: impl AsRef<[u8]>) -> Result<Self, Error> {
        let mut decoder = io::Cursor::new(data.as_ref());
        let rv = Self::wire_decode(&mut decoder)?;
        let consumed = decoder.position() as usize;

        if consumed == data.as_ref().len() {
            Ok(rv)
        } else {
            Err(Error::DataNotEntirelyConsumed)
        }
    }

    /// Parses hex string with the serialized data
    fn from_hex(s: &str) -> Result<Self, Error> {
        let data = <Vec<u8> as FromHex>::from_hex(s.trim())?;
        Self::wire_deserialize(data)
    }
}

/// Errors happening during decoding of the wire format data, either from a
/// stream or from a hex string
#[derive(Clone, PartialEq, Eq, Debug, Display, From, Error)]
#[display(doc_comments)]
pub enum Error {
    /// I/O error during data decoding: {0}
    Io(IoError),

    /// Data ended before a declared length was satisfied
    TruncatedInput,

    /// Sequence declares {0} items, but item #{1} overruns the available data
    MalformedSequence(u64, u64),

    /// Compact size value {0} is not encoded with the smallest possible
    /// marker
    NonCanonicalCompactSize(u64),

    /// Declared size {0} exceeds the maximum of 33554432 bytes or items
    SizeTooLarge(u64),

    /// Public key data are not a valid secp256k1 point encoding
    InvalidKeyEncoding,

    /// Invalid hex string: {0}
    #[from]
    InvalidHex(hex::Error),

    /// Data were not consumed entirely during decoding procedure
    DataNotEntirelyConsumed,
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::TruncatedInput
        } else {
            Error::Io(err.into())
        }
    }
}

/// Writes compact size representation of `size`, returning number of bytes
/// written.
pub fn write_compact_size<E: io::Write>(
    mut e: E,
    size: u64,
) -> Result<usize, io::Error> {
    Ok(match size {
        0..=0xFC => {
            e.write_all(&[size as u8])?;
            1
        }
        0xFD..=0xFFFF => {
            e.write_all(&[0xFD])?;
            e.write_all(&(size as u16).to_le_bytes())?;
            3
        }
        0x1_0000..=0xFFFF_FFFF => {
            e.write_all(&[0xFE])?;
            e.write_all(&(size as u32).to_le_bytes())?;
            5
        }
        _ => {
            e.write_all(&[0xFF])?;
            e.write_all(&size.to_le_bytes())?;
            9
        }
    })
}

/// Reads compact size value. Values not encoded with the smallest marker are
/// rejected.
pub fn read_compact_size<D: io::Read>(mut d: D) -> Result<u64, Error> {
    let marker = u8::wire_decode(&mut d)?;
    let (size, min) = match marker {
        0xFD => (u16::wire_decode(&mut d)? as u64, 0xFD),
        0xFE => (u32::wire_decode(&mut d)? as u64, 0x1_0000),
        0xFF => (u64::wire_decode(&mut d)?, 0x1_0000_0000),
        small => return Ok(small as u64),
    };
    if size < min {
        return Err(Error::NonCanonicalCompactSize(size));
    }
    Ok(size)
}

/// Reads compact size value used as a length prefix, checking it against
/// [`MAX_SIZE`]
fn read_size<D: io::Read>(d: D) -> Result<u64, Error> {
    let size = read_compact_size(d)?;
    if size > MAX_SIZE {
        return Err(Error::SizeTooLarge(size));
    }
    Ok(size)
}

/// Writes variable-length byte string prefixed with its compact size length
pub fn serialize_blob<E: io::Write>(
    mut e: E,
    blob: &[u8],
) -> Result<usize, io::Error> {
    let len = write_compact_size(&mut e, blob.len() as u64)?;
    e.write_all(blob)?;
    Ok(len + blob.len())
}

/// Reads byte string prefixed with its compact size length
pub fn deserialize_blob<D: io::Read>(mut d: D) -> Result<Vec<u8>, Error> {
    let len = read_size(&mut d)?;
    let mut blob = Vec::new();
    d.take(len).read_to_end(&mut blob)?;
    if blob.len() as u64 != len {
        return Err(Error::TruncatedInput);
    }
    Ok(blob)
}

/// Writes compact size number of items followed by each item encoding
pub fn serialize_sequence<'a, E, T, I>(
    mut e: E,
    items: I,
) -> Result<usize, io::Error>
where
    E: io::Write,
    T: 'a + WireEncode,
    I: IntoIterator<Item = &'a T>,
    I::IntoIter: ExactSizeIterator,
{
    let items = items.into_iter();
    let mut len = write_compact_size(&mut e, items.len() as u64)?;
    for item in items {
        len += item.wire_encode(&mut e)?;
    }
    Ok(len)
}

/// Reads exactly the declared number of items. An item which runs out of
/// data is reported as [`Error::MalformedSequence`].
pub fn deserialize_sequence<D, T>(mut d: D) -> Result<Vec<T>, Error>
where
    D: io::Read,
    T: WireDecode,
{
    let count = read_size(&mut d)?;
    // Do not trust the declared count for the allocation
    let mut items = Vec::with_capacity(count.min(0x100) as usize);
    for index in 0..count {
        match T::wire_decode(&mut d) {
            Ok(item) => items.push(item),
            Err(Error::TruncatedInput) => {
                return Err(Error::MalformedSequence(count, index))
            }
            Err(err) => return Err(err),
        }
    }
    Ok(items)
}

/// Reads fixed-size byte array
pub(crate) fn read_array<D: io::Read, const LEN: usize>(
    mut d: D,
) -> Result<[u8; LEN], Error> {
    let mut buf = [0u8; LEN];
    d.read_exact(&mut buf)?;
    Ok(buf)
}

/// Taking implementation of little-endian integer encoding
mod number_little_endian {
    use std::io;

    use super::{read_array, Error, WireDecode, WireEncode};

    macro_rules! impl_wire_number {
        ($($ty:ty),+) => { $(
            impl WireEncode for $ty {
                #[inline]
                fn wire_encode<E: io::Write>(
                    &self,
                    mut e: E,
                ) -> Result<usize, io::Error> {
                    e.write_all(&self.to_le_bytes())?;
                    Ok(core::mem::size_of::<$ty>())
                }
            }

            impl WireDecode for $ty {
                #[inline]
                fn wire_decode<D: io::Read>(d: D) -> Result<Self, Error> {
                    Ok(<$ty>::from_le_bytes(read_array(d)?))
                }
            }
        )+ };
    }

    impl_wire_number!(u8, u16, u32, u64, i32, i64);
}

#[cfg(test)]
pub mod test {
    use super::*;
    use std::fmt::Debug;

    /// Test suite function to test against the vectors
    pub fn test_suite<T: WireEncode + WireDecode + PartialEq + Debug>(
        object: &T,
        test_vec: &[u8],
        test_size: usize,
    ) -> T {
        let mut encoded_object: Vec<u8> = vec![];
        let write_1 = object.wire_encode(&mut encoded_object).unwrap();
        let decoded_object = T::wire_decode(&encoded_object[..]).unwrap();
        assert_eq!(write_1, test_size);
        assert_eq!(decoded_object, *object);
        encoded_object.clear();
        let write_2 = decoded_object.wire_encode(&mut encoded_object).unwrap();
        assert_eq!(encoded_object, test_vec);
        assert_eq!(write_2, test_size);
        decoded_object
    }

    fn compact(size: u64) -> Vec<u8> {
        let mut buf = vec![];
        write_compact_size(&mut buf, size).unwrap();
        buf
    }

    #[test]
    fn test_compact_size_boundaries() {
        let vectors: Vec<(u64, Vec<u8>)> = vec![
            (0, vec![0x00]),
            (252, vec![0xFC]),
            (253, vec![0xFD, 0xFD, 0x00]),
            (0xFFFF, vec![0xFD, 0xFF, 0xFF]),
            (0x1_0000, vec![0xFE, 0x00, 0x00, 0x01, 0x00]),
            (0xFFFF_FFFF, vec![0xFE, 0xFF, 0xFF, 0xFF, 0xFF]),
            (0x1_0000_0000, vec![0xFF, 0, 0, 0, 0, 0x01, 0, 0, 0]),
            (u64::MAX, vec![0xFF; 9]),
        ];
        for (value, bytes) in vectors {
            assert_eq!(compact(value), bytes);
            let mut reader = &bytes[..];
            assert_eq!(read_compact_size(&mut reader).unwrap(), value);
            assert!(reader.is_empty());
        }
    }

    #[test]
    fn test_compact_size_non_canonical() {
        assert_eq!(
            read_compact_size(&[0xFD, 0xFC, 0x00][..]),
            Err(Error::NonCanonicalCompactSize(0xFC))
        );
        assert_eq!(
            read_compact_size(&[0xFE, 0xFF, 0xFF, 0x00, 0x00][..]),
            Err(Error::NonCanonicalCompactSize(0xFFFF))
        );
        assert_eq!(
            read_compact_size(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0][..]),
            Err(Error::NonCanonicalCompactSize(0xFFFF_FFFF))
        );
    }

    #[test]
    fn test_compact_size_truncated() {
        assert_eq!(read_compact_size(&[][..]), Err(Error::TruncatedInput));
        assert_eq!(
            read_compact_size(&[0xFD, 0x00][..]),
            Err(Error::TruncatedInput)
        );
        assert_eq!(
            read_compact_size(&[0xFE, 0x00, 0x00, 0x01][..]),
            Err(Error::TruncatedInput)
        );
        assert_eq!(
            read_compact_size(&[0xFF, 0, 0, 0, 0, 1, 0, 0][..]),
            Err(Error::TruncatedInput)
        );
    }

    #[test]
    fn test_blob() {
        let mut buf = vec![];
        assert_eq!(serialize_blob(&mut buf, b"avalanche").unwrap(), 10);
        assert_eq!(buf[0], 9);
        assert_eq!(deserialize_blob(&buf[..]).unwrap(), b"avalanche");

        let mut buf = vec![];
        let long = vec![0xAB; 300];
        assert_eq!(serialize_blob(&mut buf, &long).unwrap(), 303);
        assert_eq!(&buf[..3], &[0xFD, 0x2C, 0x01]);
        assert_eq!(deserialize_blob(&buf[..]).unwrap(), long);

        assert_eq!(
            deserialize_blob(&[0x05, 0x01, 0x02][..]),
            Err(Error::TruncatedInput)
        );
        assert_eq!(
            deserialize_blob(&[0xFE, 0x01, 0x00, 0x00, 0x02][..]),
            Err(Error::SizeTooLarge(0x0200_0001))
        );
    }

    #[test]
    fn test_sequence() {
        let items: Vec<u32> = vec![1, 0xDEADBEEF, 3];
        let mut buf = vec![];
        assert_eq!(serialize_sequence(&mut buf, &items).unwrap(), 13);
        assert_eq!(
            buf,
            vec![3, 1, 0, 0, 0, 0xEF, 0xBE, 0xAD, 0xDE, 3, 0, 0, 0]
        );
        assert_eq!(deserialize_sequence::<_, u32>(&buf[..]).unwrap(), items);

        // Stops exactly at the declared count
        buf.extend_from_slice(&[0xFF, 0xFF]);
        let mut reader = &buf[..];
        assert_eq!(deserialize_sequence::<_, u32>(&mut reader).unwrap(), items);
        assert_eq!(reader, &[0xFF, 0xFF]);
    }

    #[test]
    fn test_sequence_overrun() {
        assert_eq!(
            deserialize_sequence::<_, u32>(&[2, 1, 0, 0, 0, 2, 0][..]),
            Err(Error::MalformedSequence(2, 1))
        );
        assert_eq!(
            deserialize_sequence::<_, u64>(&[1][..]),
            Err(Error::MalformedSequence(1, 0))
        );
    }

    #[test]
    fn test_numbers() {
        test_suite(&0x2Au64, &[0x2A, 0, 0, 0, 0, 0, 0, 0], 8);
        test_suite(&-42i64, &[0xD6, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF], 8);
        test_suite(&0x0014_8878u32, &[0x78, 0x88, 0x14, 0x00], 4);
        assert_eq!(WireEncode::to_hex(&0x2Au64), "2a00000000000000");
        assert_eq!(
            <u32 as WireDecode>::from_hex("78881400").unwrap(),
            0x0014_8878
        );
    }

    #[test]
    fn test_consumation() {
        assert_eq!(
            u32::wire_deserialize(&[1, 0, 0, 0, 0]),
            Err(Error::DataNotEntirelyConsumed)
        );
        assert_eq!(
            <u32 as WireDecode>::from_hex("010000"),
            Err(Error::TruncatedInput)
        );
        assert!(matches!(
            <u32 as WireDecode>::from_hex("0g000000"),
            Err(Error::InvalidHex(_))
        ));
    }
}

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

//! Stakes: coins locked in UTXOs and signed over to a proof.

use std::fmt::{self, Display, Formatter};
use std::io;

use crate::encoding::{self, serialize_blob};
use crate::keys::{PrivateKey, PublicKey};
use crate::schnorr::{Signature, SigningError};
use crate::uint256::{sha256d, StakeCommitment, StakeId, TxId, UInt256};
use crate::{WireDecode, WireEncode};

/// Largest block height which fits into the packed height field
pub const MAX_HEIGHT: u32 = 0x7FFF_FFFF;

/// Error constructing stake with a block height not fitting into 31 bits
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display, Error)]
#[display("block height {0} does not fit into 31 bits")]
pub struct HeightOutOfRange(pub u32);

/// Reference to a transaction output
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct OutPoint {
    pub txid: TxId,
    pub vout: u32,
}

impl OutPoint {
    #[inline]
    pub fn new(txid: TxId, vout: u32) -> Self {
        OutPoint { txid, vout }
    }
}

impl Display for OutPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

impl WireEncode for OutPoint {
    fn wire_encode<E: io::Write>(&self, mut e: E) -> Result<usize, io::Error> {
        Ok(self.txid.wire_encode(&mut e)? + self.vout.wire_encode(&mut e)?)
    }
}

impl WireDecode for OutPoint {
    fn wire_decode<D: io::Read>(mut d: D) -> Result<Self, encoding::Error> {
        Ok(OutPoint {
            txid: TxId::wire_decode(&mut d)?,
            vout: u32::wire_decode(&mut d)?,
        })
    }
}

impl StakeCommitment {
    /// Commits to the proof expiration time and master key; stakes signed
    /// over it can't be moved into a proof with other values of these
    pub fn new(expiration_time: i64, master: &PublicKey) -> Self {
        let mut engine = Vec::with_capacity(8 + 66);
        engine.extend_from_slice(&expiration_time.to_le_bytes());
        // In-memory writer never fails
        let _ = serialize_blob(&mut engine, master.as_bytes());
        StakeCommitment::from(UInt256::hash(engine))
    }
}

/// Coins in a single UTXO staked by the owner of `pubkey`.
///
/// The stake id is computed on construction and kept with the data, since
/// it is the sort key of proof stakes.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Stake {
    utxo: OutPoint,
    amount: i64,
    height: u32,
    is_coinbase: bool,
    pubkey: PublicKey,
    stake_id: StakeId,
}

impl Stake {
    /// Constructs stake, failing if `height` does not fit into 31 bits
    pub fn new(
        utxo: OutPoint,
        amount: i64,
        height: u32,
        is_coinbase: bool,
        pubkey: PublicKey,
    ) -> Result<Self, HeightOutOfRange> {
        if height > MAX_HEIGHT {
            return Err(HeightOutOfRange(height));
        }
        Ok(Stake::from_parts(utxo, amount, height, is_coinbase, pubkey))
    }

    /// Height must already fit into 31 bits
    fn from_parts(
        utxo: OutPoint,
        amount: i64,
        height: u32,
        is_coinbase: bool,
        pubkey: PublicKey,
    ) -> Self {
        let mut stake = Stake {
            utxo,
            amount,
            height,
            is_coinbase,
            pubkey,
            stake_id: StakeId::default(),
        };
        stake.stake_id = StakeId::from(UInt256::hash(stake.wire_serialize()));
        stake
    }

    #[inline]
    pub fn utxo(&self) -> OutPoint {
        self.utxo
    }

    #[inline]
    pub fn amount(&self) -> i64 {
        self.amount
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn is_coinbase(&self) -> bool {
        self.is_coinbase
    }

    #[inline]
    pub fn pubkey(&self) -> &PublicKey {
        &self.pubkey
    }

    #[inline]
    pub fn stake_id(&self) -> StakeId {
        self.stake_id
    }

    /// Message signed by the stake key: the stake bound to the proof it is
    /// committed into
    pub fn signature_hash(&self, commitment: &StakeCommitment) -> [u8; 32] {
        let mut data = commitment.to_byte_array().to_vec();
        data.extend(self.wire_serialize());
        sha256d(data)
    }

    /// Signs stake with its private key. The key is not checked against the
    /// stake pubkey here.
    pub fn sign(
        self,
        key: &PrivateKey,
        commitment: &StakeCommitment,
    ) -> Result<SignedStake, SigningError> {
        let signature = key.sign_schnorr(&self.signature_hash(commitment))?;
        Ok(SignedStake::new(self, signature))
    }

    #[inline]
    fn packed_height(&self) -> u32 {
        (self.height << 1) | self.is_coinbase as u32
    }
}

impl WireEncode for Stake {
    fn wire_encode<E: io::Write>(&self, mut e: E) -> Result<usize, io::Error> {
        Ok(self.utxo.wire_encode(&mut e)?
            + self.amount.wire_encode(&mut e)?
            + self.packed_height().wire_encode(&mut e)?
            + self.pubkey.wire_encode(&mut e)?)
    }
}

impl WireDecode for Stake {
    fn wire_decode<D: io::Read>(mut d: D) -> Result<Self, encoding::Error> {
        let utxo = OutPoint::wire_decode(&mut d)?;
        let amount = i64::wire_decode(&mut d)?;
        let packed = u32::wire_decode(&mut d)?;
        let pubkey = PublicKey::wire_decode(&mut d)?;
        Ok(Stake::from_parts(
            utxo,
            amount,
            packed >> 1,
            packed & 1 == 1,
            pubkey,
        ))
    }
}

/// Stake together with the signature of its key over the stake commitment
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct SignedStake {
    stake: Stake,
    signature: Signature,
}

impl SignedStake {
    #[inline]
    pub fn new(stake: Stake, signature: Signature) -> Self {
        SignedStake { stake, signature }
    }

    #[inline]
    pub fn stake(&self) -> &Stake {
        &self.stake
    }

    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[inline]
    pub fn stake_id(&self) -> StakeId {
        self.stake.stake_id
    }

    /// Checks the signature against the stake pubkey and the commitment of
    /// the proof containing the stake
    pub fn verify(&self, commitment: &StakeCommitment) -> bool {
        self.stake.pubkey.verify_schnorr(
            &self.signature,
            &self.stake.signature_hash(commitment),
        )
    }
}

impl WireEncode for SignedStake {
    fn wire_encode<E: io::Write>(&self, mut e: E) -> Result<usize, io::Error> {
        Ok(self.stake.wire_encode(&mut e)? + self.signature.wire_encode(&mut e)?)
    }
}

impl WireDecode for SignedStake {
    fn wire_decode<D: io::Read>(mut d: D) -> Result<Self, encoding::Error> {
        Ok(SignedStake {
            stake: Stake::wire_decode(&mut d)?,
            signature: Signature::wire_decode(&mut d)?,
        })
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use bitcoin_hashes::hex::{FromHex, ToHex};

    use super::*;
    use crate::encoding::test::test_suite;
    use crate::keys::test::{PUB_UNCOMPRESSED, WIF_UNCOMPRESSED};

    const TXID: &str =
        "24ae50f5d4e81e340b29708ab11cab48364e2ae2c53f8439cbe983257919fcb7";
    const STAKE: &str = "b7fc19792583e9cb39843fc5e22a4e3648ab1cb18a70290b341ee8d4f550ae24000000001027000000000000788814004104d0de0aaeaefad02b8bdc8a01a1b8b11c696bd3d66a2c5f10780d95b7df42645cd85228a6fb29940e858e7e55842ae2bd115d1ed7cc0e82d934e929c97648cb0a";
    const SIGNATURE: &str = "384e94a4cf49995842e6b2a1f868b3c1f1b4d4f69851764ae8eb14dae617159c86d05c7ea829587fb837a67113dee62d897730619d4dfc21df7327fbeea5ac0a";

    fn stake(is_coinbase: bool) -> Stake {
        Stake::new(
            OutPoint::new(TxId::from_str(TXID).unwrap(), 0),
            10000,
            672828,
            is_coinbase,
            PublicKey::from_str(PUB_UNCOMPRESSED).unwrap(),
        )
        .unwrap()
    }

    fn commitment() -> StakeCommitment {
        StakeCommitment::new(
            1699999999,
            &PublicKey::from_str(PUB_UNCOMPRESSED).unwrap(),
        )
    }

    #[test]
    fn test_stake_encoding() {
        let stake = stake(false);
        let bytes = Vec::<u8>::from_hex(STAKE).unwrap();
        test_suite(&stake, &bytes, 114);
        assert_eq!(
            stake.stake_id().to_string(),
            "6a7c6d1790a370ba1324e3d49e23d7eaf5850988437111a0a1b51433ceb4183e"
        );
    }

    #[test]
    fn test_coinbase_flag() {
        let stake = stake(true);
        let bytes = stake.wire_serialize();
        // (672828 << 1) | 1
        assert_eq!(&bytes[44..48], &[0x79, 0x88, 0x14, 0x00]);
        let decoded = Stake::wire_deserialize(&bytes).unwrap();
        assert!(decoded.is_coinbase());
        assert_eq!(decoded.height(), 672828);
        assert_eq!(
            decoded.stake_id().to_string(),
            "e33ec3ca70ce882d9c350030b2764b81f2cb09637fd3e351fec05e4b1c363f97"
        );
    }

    #[test]
    fn test_height_range() {
        let utxo = OutPoint::new(TxId::default(), 0);
        let pubkey = PublicKey::from_str(PUB_UNCOMPRESSED).unwrap();
        assert!(Stake::new(utxo, 1, MAX_HEIGHT, true, pubkey.clone()).is_ok());
        assert_eq!(
            Stake::new(utxo, 1, MAX_HEIGHT + 1, false, pubkey).unwrap_err(),
            HeightOutOfRange(0x8000_0000)
        );
    }

    #[test]
    fn test_max_packed_height() {
        let mut bytes = Vec::<u8>::from_hex(STAKE).unwrap();
        bytes[44..48].copy_from_slice(&[0xFF; 4]);
        let decoded = Stake::wire_deserialize(&bytes).unwrap();
        assert_eq!(decoded.height(), MAX_HEIGHT);
        assert!(decoded.is_coinbase());
        assert_eq!(decoded.wire_serialize(), bytes);
        assert_eq!(
            decoded,
            Stake::new(
                decoded.utxo(),
                10000,
                MAX_HEIGHT,
                true,
                decoded.pubkey().clone()
            )
            .unwrap()
        );
    }

    #[test]
    fn test_commitment() {
        assert_eq!(
            commitment().to_string(),
            "21c4ea5b6eb0a05db9261f46d7f5280ad47c4baa4f75768c543b5d46f3063433"
        );
        assert_eq!(
            stake(false).signature_hash(&commitment())[..].to_hex(),
            "253b20d3c79f0164dd4c3d1d48db6ebbb35c9efefc1ffbc4f7ecaff90068d6cd"
        );
    }

    #[test]
    fn test_sign_verify() {
        let key = PrivateKey::from_wif(WIF_UNCOMPRESSED).unwrap();
        let signed = stake(false).sign(&key, &commitment()).unwrap();
        assert_eq!(signed.signature().to_string(), SIGNATURE);
        assert!(signed.verify(&commitment()));

        let other = StakeCommitment::new(
            1700000000,
            &PublicKey::from_str(PUB_UNCOMPRESSED).unwrap(),
        );
        assert!(!signed.verify(&other));

        let bytes =
            Vec::<u8>::from_hex(&format!("{}{}", STAKE, SIGNATURE)).unwrap();
        test_suite(&signed, &bytes, 114 + 64);
    }

    #[test]
    fn test_truncated() {
        let bytes = Vec::<u8>::from_hex(STAKE).unwrap();
        assert_eq!(
            Stake::wire_deserialize(&bytes[..100]),
            Err(encoding::Error::TruncatedInput)
        );
        assert_eq!(
            SignedStake::wire_deserialize(&bytes),
            Err(encoding::Error::TruncatedInput)
        );
    }
}

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

//! Avalanche proofs and delegations: the structures committing coins to an
//! avalanche participant key, their node-compatible binary encoding,
//! identifiers and Schnorr signatures.
//!
//! Proofs are assembled with [`ProofBuilder`] and delegations with
//! [`DelegationBuilder`]; both produce immutable values which serialize with
//! [`WireEncode`] and parse back with [`WireDecode`].

#![recursion_limit = "256"]
// Coding conventions
#![deny(
    non_upper_case_globals,
    non_camel_case_types,
    non_snake_case,
    unused_mut,
    unused_imports,
    dead_code
)]

#[cfg_attr(all(test, feature = "serde"), macro_use)]
extern crate amplify;
#[macro_use]
extern crate amplify_derive;
#[macro_use]
extern crate log;

#[cfg(feature = "serde")]
#[macro_use]
extern crate serde_crate as serde;

pub mod encoding;
pub mod uint256;
pub mod keys;
pub mod schnorr;
pub mod stake;
pub mod proof;
mod proof_builder;
pub mod delegation;
mod delegation_builder;
#[cfg(feature = "serde")]
pub mod config;
#[cfg(feature = "cli")]
pub mod shell;

pub use delegation::{Delegable, Delegation, Level};
pub use delegation_builder::DelegationBuilder;
pub use encoding::{Error as DeserializationError, WireDecode, WireEncode};
pub use keys::{KeyDecodingError, PrivateKey, PublicKey};
pub use proof::Proof;
pub use proof_builder::ProofBuilder;
pub use schnorr::{Signature, SigningError};
pub use stake::{HeightOutOfRange, OutPoint, SignedStake, Stake};
pub use uint256::{
    DelegationId, LimitedProofId, ProofId, StakeCommitment, StakeId, TxId,
    UInt256,
};

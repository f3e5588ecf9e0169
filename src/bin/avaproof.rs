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

#[macro_use]
extern crate log;

use std::io::{self, Read};
use std::path::PathBuf;

use bitcoin_hashes::hex::ToHex;
use clap::{Parser, Subcommand};

use avaproof::config::{DelegationConfig, ProofConfig};
use avaproof::shell::LogLevel;
use avaproof::{Delegable, Delegation, Proof, WireDecode, WireEncode};

#[derive(Parser, Clone, Debug)]
#[clap(
    name = "avaproof",
    bin_name = "avaproof",
    author,
    version,
    about = "Command-line tool for building and inspecting avalanche proofs \
             and delegations"
)]
pub struct Opts {
    /// Set verbosity level; may be used multiple times
    #[clap(short, long, global = true, parse(from_occurrences))]
    pub verbose: u8,

    /// Command to execute
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Command {
    /// Builds and signs proof described by a TOML file
    BuildProof {
        /// Proof configuration file
        config: PathBuf,
    },

    /// Builds or extends delegation described by a TOML file
    BuildDelegation {
        /// Delegation configuration file
        config: PathBuf,
    },

    /// Decodes and verifies hex-encoded proof
    DecodeProof {
        /// Proof hex; if none is given reads from STDIN
        proof: Option<String>,
    },

    /// Decodes and verifies hex-encoded delegation
    DecodeDelegation {
        /// Delegation hex; if none is given reads from STDIN
        delegation: Option<String>,
    },
}

fn input_read<T>(data: Option<String>) -> Result<T, String>
where
    T: WireDecode,
{
    let data = match data {
        Some(data) => data,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|err| err.to_string())?;
            buf
        }
    };
    T::from_hex(&data).map_err(|err| format!("Deserialization error: {}", err))
}

fn print_proof(proof: &Proof) {
    println!("proofid: {}", proof.proofid());
    println!("limitedid: {}", proof.limitedid());
    println!("sequence: {}", proof.sequence());
    println!("expiration-time: {}", proof.expiration_time());
    println!("master: {}", proof.master());
    println!("payout-script: {}", proof.payout_script().to_hex());
    println!("staked-amount: {}", proof.staked_amount());
    println!("stakes:");
    for signed in proof.stakes() {
        let stake = signed.stake();
        println!("  - stakeid: {}", stake.stake_id());
        println!("    utxo: {}", stake.utxo());
        println!("    amount: {}", stake.amount());
        println!("    height: {}", stake.height());
        println!("    coinbase: {}", stake.is_coinbase());
        println!("    pubkey: {}", stake.pubkey());
    }
    match proof.verify() {
        Ok(()) => println!("verification: valid"),
        Err(err) => println!("verification: {}", err),
    }
}

fn print_delegation(delegation: &Delegation) {
    println!("delegationid: {}", delegation.delegation_id());
    println!("proofid: {}", delegation.proofid());
    println!("limitedid: {}", delegation.limitedid());
    println!("master: {}", delegation.proof_master());
    println!("levels:");
    for level in delegation.levels() {
        println!("  - pubkey: {}", level.pubkey);
        println!("    signature: {}", level.signature);
    }
    match delegation.verify() {
        Ok(pubkey) => println!("verification: valid, delegated to {}", pubkey),
        Err(err) => println!("verification: {}", err),
    }
}

fn main() -> Result<(), String> {
    let opts = Opts::parse();
    LogLevel::from(opts.verbose).apply();
    trace!("Command-line arguments: {:?}", opts);

    match opts.command {
        Command::BuildProof { config } => {
            let proof = ProofConfig::read_file(&config)
                .map_err(|err| err.to_string())?
                .into_builder()
                .map_err(|err| err.to_string())?
                .build()
                .map_err(|err| err.to_string())?;
            info!("Proof {} is built", proof.proofid());
            println!("{}", WireEncode::to_hex(&proof));
        }

        Command::BuildDelegation { config } => {
            let delegation = DelegationConfig::read_file(&config)
                .map_err(|err| err.to_string())?
                .into_builder()
                .map_err(|err| err.to_string())?
                .build();
            info!("Delegation {} is built", delegation.delegation_id());
            println!("{}", WireEncode::to_hex(&delegation));
        }

        Command::DecodeProof { proof } => {
            let proof: Proof = input_read(proof)?;
            print_proof(&proof);
        }

        Command::DecodeDelegation { delegation } => {
            let delegation: Delegation = input_read(delegation)?;
            print_delegation(&delegation);
        }
    }

    Ok(())
}

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

//! Logging setup for the command-line tool

use std::env;
use std::str::FromStr;

use log::LevelFilter;

/// Logging verbosity, selected with repeated `-v` flags
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Display)]
pub enum LogLevel {
    /// Errors only; no `-v` flags
    #[display("error")]
    Error = 0,

    /// `-v`
    #[display("warn")]
    Warn,

    /// `-vv`
    #[display("info")]
    Info,

    /// `-vvv`: builder milestones, like signed proofs and added levels
    #[display("debug")]
    Debug,

    /// `-vvvv` and more: every added stake
    #[display("trace")]
    Trace,
}

/// Unknown log level `{0}`; use one of `error`, `warn`, `info`, `debug` or
/// `trace`
#[derive(Clone, PartialEq, Eq, Debug, Display, Error)]
#[display(doc_comments)]
pub struct LogLevelParseError(String);

impl FromStr for LogLevel {
    type Err = LogLevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "error" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            other => return Err(LogLevelParseError(other.to_owned())),
        })
    }
}

impl From<u8> for LogLevel {
    fn from(verbosity: u8) -> Self {
        match verbosity {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

impl LogLevel {
    /// Initializes `env_logger` with this level unless `RUST_LOG` is set.
    /// Must be called once per process.
    pub fn apply(self) {
        log::set_max_level(LevelFilter::Trace);
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", self.to_string());
        }
        env_logger::init();
    }
}

// Licensed under the Apache-2.0 license

use ota_partition::PartitionError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Malformed user input, rejected before any layout is computed.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("flash base address is empty")]
    EmptyAddress,
    #[error("address {0:?} must start with 0x or 0X")]
    MissingHexPrefix(String),
    #[error("address {0:?} has no digits after the 0x prefix")]
    MissingHexDigits(String),
    #[error("address {input:?} contains non-hex character {ch:?}")]
    InvalidHexDigit { input: String, ch: char },
    #[error("address {0:?} does not fit in 32 bits")]
    AddressTooLarge(String),
    #[error("invalid region size {0:?}; expected a byte count or a K/KB suffix")]
    InvalidSize(String),
    #[error("invalid firmware version {0:?}; expected MAJOR.MINOR in 0..=255")]
    InvalidVersion(String),
    #[error("unknown update strategy {0:?}; expected in-position or ping-pong")]
    UnknownStrategy(String),
    #[error("no {0} given on the command line or in the manifest")]
    MissingField(&'static str),
    #[error("cannot read manifest {}: {source}", .path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed manifest {}: {source}", .path.display())]
    ManifestFormat {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
}

/// Failure of a partition table run. Each variant is a distinct category the
/// caller can report separately.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("invalid input: {0}")]
    Input(#[from] ParseError),
    #[error("invalid partition table: {0}")]
    Layout(#[from] PartitionError),
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BuildError {
    /// Process exit code for this error category.
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::Input(_) => 2,
            BuildError::Layout(_) => 3,
            BuildError::Write { .. } | BuildError::Read { .. } => 4,
        }
    }
}

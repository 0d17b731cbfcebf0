// Licensed under the Apache-2.0 license

use thiserror::Error;

use crate::table::{Region, UpdateStrategy};

/// Errors produced while computing, validating, encoding or decoding a
/// partition table.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionError {
    #[error("partition {index} has an invalid address range")]
    InvalidRange { index: usize },
    #[error("size of the {region} region does not fit in 32 bits")]
    SizeOverflow { region: Region },
    #[error("{region} region extends past the end of the 32-bit address space")]
    AddressOverflow { region: Region },
    #[error("{strategy} layout requires a {region} region size")]
    MissingRegion {
        strategy: UpdateStrategy,
        region: Region,
    },
    #[error("buffer holds {actual} bytes but {required} are required")]
    BufferTooSmall { required: usize, actual: usize },
    #[error("{0} bytes does not match the size of any partition table")]
    UnexpectedLength(usize),
    #[error("bad magic number 0x{0:04x}")]
    BadMagic(u16),
    #[error("checksum mismatch: stored 0x{stored:02x}, computed 0x{computed:02x}")]
    ChecksumMismatch { stored: u8, computed: u8 },
}

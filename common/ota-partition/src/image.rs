// Licensed under the Apache-2.0 license

use core::mem::{offset_of, size_of};

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::checksum::crc8;
use crate::error::PartitionError;
use crate::table::{
    FirmwareVersion, InPositionPartitions, PartitionTable, PingPongPartitions, UpdateStrategy,
};

pub const OTA_PARTITION_MAGIC: u16 = 0x6420;
pub const HEADER_SIZE: usize = size_of::<PartitionHeader>();
pub const MAX_IMAGE_SIZE: usize = HEADER_SIZE + size_of::<PingPongPartitions>();

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct PartitionHeader {
    pub magic: u16,
    pub version: FirmwareVersion,
    /// CRC-8 over `magic`, `version` and the whole region table.
    pub checksum: u8,
    pub reserved: [u8; 3],
}

impl PartitionHeader {
    pub fn new(version: FirmwareVersion) -> Self {
        Self {
            magic: OTA_PARTITION_MAGIC,
            version,
            checksum: 0,
            reserved: [0; 3],
        }
    }

    /// Checksum of this header's magic and version continued over `table`.
    pub fn compute_checksum(&self, table: &PartitionTable) -> u8 {
        let covered = &self.as_bytes()[..offset_of!(PartitionHeader, checksum)];
        crc8(crc8(0, covered), table.as_bytes())
    }
}

/// A checksummed partition table ready to be written to flash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionImage {
    header: PartitionHeader,
    table: PartitionTable,
}

/// Validates `table` and wraps it with a checksummed header.
pub fn encode(
    version: FirmwareVersion,
    table: PartitionTable,
) -> Result<PartitionImage, PartitionError> {
    PartitionImage::new(version, table)
}

impl PartitionImage {
    pub fn new(version: FirmwareVersion, table: PartitionTable) -> Result<Self, PartitionError> {
        table.validate()?;
        let mut header = PartitionHeader::new(version);
        header.checksum = header.compute_checksum(&table);
        Ok(Self { header, table })
    }

    pub fn header(&self) -> &PartitionHeader {
        &self.header
    }

    pub fn table(&self) -> &PartitionTable {
        &self.table
    }

    pub fn strategy(&self) -> UpdateStrategy {
        self.table.strategy()
    }

    /// Number of bytes the serialized image occupies.
    pub fn encoded_len(&self) -> usize {
        self.strategy().image_len()
    }

    /// Header bytes followed by table bytes; concatenated they form the image.
    pub fn chunks(&self) -> [&[u8]; 2] {
        [self.header.as_bytes(), self.table.as_bytes()]
    }

    /// Serializes the image into the front of `out` and returns its length.
    pub fn write_to_slice(&self, out: &mut [u8]) -> Result<usize, PartitionError> {
        let len = self.encoded_len();
        if out.len() < len {
            return Err(PartitionError::BufferTooSmall {
                required: len,
                actual: out.len(),
            });
        }
        let (header, table) = out[..len].split_at_mut(HEADER_SIZE);
        header.copy_from_slice(self.header.as_bytes());
        table.copy_from_slice(self.table.as_bytes());
        Ok(len)
    }

    /// Parses and verifies a table read back from flash or a file.
    ///
    /// Without a `strategy` the image must be exactly the size of one of the
    /// two layouts. With one, trailing bytes after the table are ignored.
    pub fn parse(bytes: &[u8], strategy: Option<UpdateStrategy>) -> Result<Self, PartitionError> {
        let strategy = match strategy {
            Some(strategy) if bytes.len() >= strategy.image_len() => strategy,
            Some(_) => return Err(PartitionError::UnexpectedLength(bytes.len())),
            None => UpdateStrategy::from_image_len(bytes.len())
                .ok_or(PartitionError::UnexpectedLength(bytes.len()))?,
        };
        let bytes = &bytes[..strategy.image_len()];

        let (header, rest) = PartitionHeader::read_from_prefix(bytes)
            .map_err(|_| PartitionError::UnexpectedLength(bytes.len()))?;
        if header.magic != OTA_PARTITION_MAGIC {
            return Err(PartitionError::BadMagic(header.magic));
        }

        let table = match strategy {
            UpdateStrategy::InPosition => PartitionTable::InPosition(
                InPositionPartitions::read_from_bytes(rest)
                    .map_err(|_| PartitionError::UnexpectedLength(bytes.len()))?,
            ),
            UpdateStrategy::PingPong => PartitionTable::PingPong(
                PingPongPartitions::read_from_bytes(rest)
                    .map_err(|_| PartitionError::UnexpectedLength(bytes.len()))?,
            ),
        };

        let computed = header.compute_checksum(&table);
        if computed != header.checksum {
            return Err(PartitionError::ChecksumMismatch {
                stored: header.checksum,
                computed,
            });
        }
        table.validate()?;

        Ok(Self { header, table })
    }
}

// Licensed under the Apache-2.0 license

use core::fmt;
use core::mem::size_of;

use arrayvec::ArrayVec;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::PartitionError;
use crate::image::HEADER_SIZE;

/// Largest number of entries any strategy stores in the table.
pub const MAX_PARTITIONS: usize = 4;

const UNSET_ADDRESS: u32 = 0;
const ERASED_ADDRESS: u32 = u32::MAX;

/// Logical flash regions, in the order they are laid out in flash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Bootloader,
    ActiveApp,
    BackupApp,
    Ota,
    Kv,
}

impl Region {
    pub const fn name(self) -> &'static str {
        match self {
            Region::Bootloader => "bootloader",
            Region::ActiveApp => "active_app",
            Region::BackupApp => "backup_app",
            Region::Ota => "ota",
            Region::Kv => "kv",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the bootloader applies a downloaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateStrategy {
    /// The new image overwrites the active application in place.
    InPosition,
    /// The device alternates between an active and a backup application.
    PingPong,
}

impl UpdateStrategy {
    /// Regions stored in the table for this strategy, in on-disk order.
    pub const fn regions(self) -> &'static [Region] {
        match self {
            UpdateStrategy::InPosition => &[Region::ActiveApp, Region::Ota, Region::Kv],
            UpdateStrategy::PingPong => &[
                Region::ActiveApp,
                Region::BackupApp,
                Region::Ota,
                Region::Kv,
            ],
        }
    }

    pub const fn partition_count(self) -> usize {
        self.regions().len()
    }

    /// Size in bytes of a complete table (header included) for this strategy.
    pub const fn image_len(self) -> usize {
        HEADER_SIZE + self.partition_count() * size_of::<AddressRange>()
    }

    /// The file carries no strategy marker, so the only thing that tells the
    /// two layouts apart is their length.
    pub fn from_image_len(len: usize) -> Option<Self> {
        [UpdateStrategy::InPosition, UpdateStrategy::PingPong]
            .into_iter()
            .find(|s| s.image_len() == len)
    }

    pub const fn name(self) -> &'static str {
        match self {
            UpdateStrategy::InPosition => "in-position",
            UpdateStrategy::PingPong => "ping-pong",
        }
    }
}

impl fmt::Display for UpdateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[repr(C)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
}

impl FirmwareVersion {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Half-open flash address range `[start, end)`.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct AddressRange {
    pub start: u32,
    pub end: u32,
}

impl AddressRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Zero and all-ones mark unset or erased flash and are never valid bounds.
    pub const fn is_valid(&self) -> bool {
        self.start != UNSET_ADDRESS
            && self.start != ERASED_ADDRESS
            && self.end != UNSET_ADDRESS
            && self.end != ERASED_ADDRESS
            && self.start < self.end
    }

    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[repr(C)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct InPositionPartitions {
    pub active_app: AddressRange,
    pub ota: AddressRange,
    pub kv: AddressRange,
}

#[repr(C)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct PingPongPartitions {
    pub active_app: AddressRange,
    pub backup_app: AddressRange,
    pub ota: AddressRange,
    pub kv: AddressRange,
}

/// Region table, shaped by the update strategy that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionTable {
    InPosition(InPositionPartitions),
    PingPong(PingPongPartitions),
}

impl PartitionTable {
    pub fn strategy(&self) -> UpdateStrategy {
        match self {
            PartitionTable::InPosition(_) => UpdateStrategy::InPosition,
            PartitionTable::PingPong(_) => UpdateStrategy::PingPong,
        }
    }

    /// Serialized table: every range's start then end, in table order.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            PartitionTable::InPosition(p) => p.as_bytes(),
            PartitionTable::PingPong(p) => p.as_bytes(),
        }
    }

    pub fn ranges(&self) -> ArrayVec<AddressRange, MAX_PARTITIONS> {
        match self {
            PartitionTable::InPosition(p) => [p.active_app, p.ota, p.kv].into_iter().collect(),
            PartitionTable::PingPong(p) => [p.active_app, p.backup_app, p.ota, p.kv]
                .into_iter()
                .collect(),
        }
    }

    /// Labelled ranges in table order.
    pub fn regions(&self) -> impl Iterator<Item = (Region, AddressRange)> {
        self.strategy()
            .regions()
            .iter()
            .copied()
            .zip(self.ranges())
    }

    pub fn range(&self, region: Region) -> Option<AddressRange> {
        self.regions()
            .find(|(r, _)| *r == region)
            .map(|(_, range)| range)
    }

    pub fn validate(&self) -> Result<(), PartitionError> {
        validate(&self.ranges())
    }
}

/// Checks every range on its own and reports the first one that is
/// degenerate, inverted, or bounded by an unset/erased address.
///
/// Overlap between ranges is not checked.
pub fn validate(ranges: &[AddressRange]) -> Result<(), PartitionError> {
    match ranges.iter().position(|range| !range.is_valid()) {
        Some(index) => Err(PartitionError::InvalidRange { index }),
        None => Ok(()),
    }
}

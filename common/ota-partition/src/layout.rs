// Licensed under the Apache-2.0 license

use crate::error::PartitionError;
use crate::table::{
    AddressRange, InPositionPartitions, PartitionTable, PingPongPartitions, Region,
    UpdateStrategy,
};

const KILOBYTE: u32 = 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SizeUnit {
    #[default]
    Bytes,
    Kilobytes,
}

/// Region size as entered by the user, before normalization to bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionSize {
    pub magnitude: u32,
    pub unit: SizeUnit,
}

impl RegionSize {
    pub const fn bytes(magnitude: u32) -> Self {
        Self {
            magnitude,
            unit: SizeUnit::Bytes,
        }
    }

    pub const fn kilobytes(magnitude: u32) -> Self {
        Self {
            magnitude,
            unit: SizeUnit::Kilobytes,
        }
    }

    /// Size in bytes, or `None` if it does not fit in 32 bits.
    pub const fn in_bytes(&self) -> Option<u32> {
        match self.unit {
            SizeUnit::Bytes => Some(self.magnitude),
            SizeUnit::Kilobytes => self.magnitude.checked_mul(KILOBYTE),
        }
    }
}

/// Sizes of every region, in flash order.
///
/// `backup_app` is only consumed by the ping-pong strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionSizes {
    pub bootloader: RegionSize,
    pub active_app: RegionSize,
    pub backup_app: Option<RegionSize>,
    pub ota: RegionSize,
    pub kv: RegionSize,
}

/// Result of laying the regions out from a base address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Reported for display only; it is not part of the serialized table.
    pub bootloader: AddressRange,
    pub table: PartitionTable,
    /// First address past the last region.
    pub next_address: u32,
}

struct Cursor(u32);

impl Cursor {
    fn take(&mut self, region: Region, size: RegionSize) -> Result<AddressRange, PartitionError> {
        let len = size
            .in_bytes()
            .ok_or(PartitionError::SizeOverflow { region })?;
        let end = self
            .0
            .checked_add(len)
            .ok_or(PartitionError::AddressOverflow { region })?;
        let range = AddressRange::new(self.0, end);
        self.0 = end;
        Ok(range)
    }
}

/// Lays the regions of `strategy` out back to back starting at
/// `base_address`, with the bootloader first.
///
/// Ranges are not validated here; a zero-sized region comes back as an empty
/// range and is rejected by [`crate::validate`].
pub fn compute_layout(
    strategy: UpdateStrategy,
    base_address: u32,
    sizes: &RegionSizes,
) -> Result<Layout, PartitionError> {
    let mut cursor = Cursor(base_address);
    let bootloader = cursor.take(Region::Bootloader, sizes.bootloader)?;
    let active_app = cursor.take(Region::ActiveApp, sizes.active_app)?;

    let table = match strategy {
        UpdateStrategy::InPosition => PartitionTable::InPosition(InPositionPartitions {
            active_app,
            ota: cursor.take(Region::Ota, sizes.ota)?,
            kv: cursor.take(Region::Kv, sizes.kv)?,
        }),
        UpdateStrategy::PingPong => {
            let backup_size = sizes.backup_app.ok_or(PartitionError::MissingRegion {
                strategy,
                region: Region::BackupApp,
            })?;
            PartitionTable::PingPong(PingPongPartitions {
                active_app,
                backup_app: cursor.take(Region::BackupApp, backup_size)?,
                ota: cursor.take(Region::Ota, sizes.ota)?,
                kv: cursor.take(Region::Kv, sizes.kv)?,
            })
        }
    };

    Ok(Layout {
        bootloader,
        table,
        next_address: cursor.0,
    })
}

// Licensed under the Apache-2.0 license

//! OTA partition table format shared by the host-side generator and the
//! bootloader that consumes it.
//!
//! The table is a fixed 8-byte [`PartitionHeader`] followed by three
//! (in-position) or four (ping-pong) [`AddressRange`] entries. All fields use
//! the native byte order of the machine that produced the table.

#![cfg_attr(not(test), no_std)]

mod checksum;
mod error;
mod image;
mod layout;
mod table;

pub use checksum::crc8;
pub use error::PartitionError;
pub use image::{
    encode, PartitionHeader, PartitionImage, HEADER_SIZE, MAX_IMAGE_SIZE, OTA_PARTITION_MAGIC,
};
pub use layout::{compute_layout, Layout, RegionSize, RegionSizes, SizeUnit};
pub use table::{
    validate, AddressRange, FirmwareVersion, InPositionPartitions, PartitionTable,
    PingPongPartitions, Region, UpdateStrategy, MAX_PARTITIONS,
};

// Licensed under the Apache-2.0 license

use crate::{BuildError, ParseError};
use log::{debug, info};
use ota_partition::{
    compute_layout, encode, FirmwareVersion, Layout, PartitionImage, RegionSize, RegionSizes,
    UpdateStrategy,
};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Everything needed to produce one partition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionRequest {
    pub base_address: u32,
    pub strategy: UpdateStrategy,
    pub version: FirmwareVersion,
    pub sizes: RegionSizes,
}

/// Request fields gathered from a manifest and/or the command line, any of
/// which may still be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialRequest {
    pub base_address: Option<u32>,
    pub strategy: Option<UpdateStrategy>,
    pub version: Option<FirmwareVersion>,
    pub bootloader: Option<RegionSize>,
    pub active_app: Option<RegionSize>,
    pub backup_app: Option<RegionSize>,
    pub ota: Option<RegionSize>,
    pub kv: Option<RegionSize>,
}

impl PartialRequest {
    /// Fields set in `overrides` replace the ones in `self`.
    pub fn merge(self, overrides: PartialRequest) -> PartialRequest {
        PartialRequest {
            base_address: overrides.base_address.or(self.base_address),
            strategy: overrides.strategy.or(self.strategy),
            version: overrides.version.or(self.version),
            bootloader: overrides.bootloader.or(self.bootloader),
            active_app: overrides.active_app.or(self.active_app),
            backup_app: overrides.backup_app.or(self.backup_app),
            ota: overrides.ota.or(self.ota),
            kv: overrides.kv.or(self.kv),
        }
    }

    pub fn into_request(self) -> Result<PartitionRequest, ParseError> {
        let strategy = self
            .strategy
            .ok_or(ParseError::MissingField("update strategy"))?;
        let backup_app = match strategy {
            UpdateStrategy::PingPong => Some(
                self.backup_app
                    .ok_or(ParseError::MissingField("backup_app size"))?,
            ),
            UpdateStrategy::InPosition => None,
        };
        Ok(PartitionRequest {
            base_address: self
                .base_address
                .ok_or(ParseError::MissingField("flash base address"))?,
            strategy,
            version: self
                .version
                .ok_or(ParseError::MissingField("firmware version"))?,
            sizes: RegionSizes {
                bootloader: self
                    .bootloader
                    .ok_or(ParseError::MissingField("bootloader size"))?,
                active_app: self
                    .active_app
                    .ok_or(ParseError::MissingField("active_app size"))?,
                backup_app,
                ota: self.ota.ok_or(ParseError::MissingField("ota size"))?,
                kv: self.kv.ok_or(ParseError::MissingField("kv size"))?,
            },
        })
    }
}

/// A validated, checksummed table together with the layout it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionTableBuild {
    pub layout: Layout,
    pub image: PartitionImage,
}

impl PartitionTableBuild {
    /// Address right after the last region, where the table itself is
    /// suggested to be flashed.
    pub fn recommended_address(&self) -> u32 {
        self.layout.next_address
    }
}

pub fn build_partition_table(request: PartitionRequest) -> Result<PartitionTableBuild, BuildError> {
    info!("Flash base address: 0x{:08x}", request.base_address);
    info!("Update strategy: {}", request.strategy);
    info!("Firmware version: {}", request.version);

    let layout = compute_layout(request.strategy, request.base_address, &request.sizes)?;
    info!(
        "{:<12} start: 0x{:08x}    end: 0x{:08x}",
        "bootloader", layout.bootloader.start, layout.bootloader.end
    );
    for (region, range) in layout.table.regions() {
        info!(
            "{:<12} start: 0x{:08x}    end: 0x{:08x}",
            region.name(),
            range.start,
            range.end
        );
    }

    let image = encode(request.version, layout.table)?;
    debug!("Partition table checksum: 0x{:02x}", image.header().checksum);

    Ok(PartitionTableBuild { layout, image })
}

/// Writes `image` to `path`.
///
/// The bytes go to a temporary file in the destination directory which is
/// only renamed over `path` once fully written and synced, so a failed run
/// never leaves a truncated table behind.
pub fn write_partition_table(image: &PartitionImage, path: &Path) -> Result<(), BuildError> {
    let write_err = |source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(write_err)?;
    for chunk in image.chunks() {
        file.write_all(chunk).map_err(write_err)?;
    }
    file.as_file().sync_all().map_err(write_err)?;
    file.persist(path).map_err(|e| write_err(e.error))?;

    debug!("Wrote {} bytes to {}", image.encoded_len(), path.display());
    Ok(())
}

/// Computes, validates and writes a partition table, returning the build so
/// the caller can show the recommended flash address.
pub fn partition_table_create(
    request: PartitionRequest,
    output_path: &Path,
) -> Result<PartitionTableBuild, BuildError> {
    let build = build_partition_table(request)?;
    write_partition_table(&build.image, output_path)?;
    info!(
        "Partition table written to {}; recommended flash address: 0x{:08x}",
        output_path.display(),
        build.recommended_address()
    );
    Ok(build)
}

/// Reads a partition table from `path` starting at `offset` and verifies it.
pub fn partition_table_verify(
    path: &Path,
    offset: usize,
    strategy: Option<UpdateStrategy>,
) -> Result<PartitionImage, BuildError> {
    let data = fs::read(path).map_err(|source| BuildError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let bytes = data.get(offset..).ok_or_else(|| BuildError::Read {
        path: path.to_path_buf(),
        source: io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "offset 0x{offset:x} is past the end of the {}-byte file",
                data.len()
            ),
        ),
    })?;
    let image = PartitionImage::parse(bytes, strategy)?;
    info!(
        "{} holds a valid {} partition table",
        path.display(),
        image.strategy()
    );
    Ok(image)
}

/// Human-readable dump of a partition table.
pub fn describe(image: &PartitionImage) -> String {
    let header = image.header();
    let mut out = format!(
        "magic:    0x{:04x}\nversion:  {}\nchecksum: 0x{:02x}\nstrategy: {}\n",
        header.magic,
        header.version,
        header.checksum,
        image.strategy()
    );
    for (region, range) in image.table().regions() {
        out.push_str(&format!(
            "{:<12} 0x{:08x}..0x{:08x} ({} bytes)\n",
            region.name(),
            range.start,
            range.end,
            range.len()
        ));
    }
    out
}

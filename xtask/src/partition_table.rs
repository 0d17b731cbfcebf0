// Licensed under the Apache-2.0 license

use anyhow::Result;
use clap::Args;
use clap_num::maybe_hex;
use ota_builder::input::{parse_hex_address, parse_region_size, parse_strategy, parse_version};
use ota_builder::{
    describe, partition_table_create, partition_table_verify, BuildError, LayoutManifest,
    PartialRequest, PartitionRequest, DEFAULT_OUTPUT,
};
use ota_partition::{FirmwareVersion, RegionSize, UpdateStrategy};
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct CreateArgs {
    /// TOML layout manifest; values given on the command line override it
    #[arg(long, value_name = "MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Flash base address, e.g. 0x08008000
    #[arg(long, value_name = "ADDRESS", value_parser = parse_hex_address)]
    pub base_address: Option<u32>,

    /// Update strategy: in-position or ping-pong
    #[arg(long, value_name = "STRATEGY", value_parser = parse_strategy)]
    pub strategy: Option<UpdateStrategy>,

    /// Initial firmware version
    #[arg(long, value_name = "MAJOR.MINOR", value_parser = parse_version)]
    pub fw_version: Option<FirmwareVersion>,

    /// Bootloader size in bytes, or kilobytes with a K suffix (e.g. 32K)
    #[arg(long, value_name = "SIZE", value_parser = parse_region_size)]
    pub bootloader_size: Option<RegionSize>,

    /// Active application size
    #[arg(long, value_name = "SIZE", value_parser = parse_region_size)]
    pub active_app_size: Option<RegionSize>,

    /// Backup application size (ping-pong only)
    #[arg(long, value_name = "SIZE", value_parser = parse_region_size)]
    pub backup_app_size: Option<RegionSize>,

    /// OTA download region size
    #[arg(long, value_name = "SIZE", value_parser = parse_region_size)]
    pub ota_size: Option<RegionSize>,

    /// Key-value store size
    #[arg(long, value_name = "SIZE", value_parser = parse_region_size)]
    pub kv_size: Option<RegionSize>,

    /// Path to the output partition table
    #[arg(long, value_name = "OUTPUT", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,
}

impl CreateArgs {
    fn overrides(&self) -> PartialRequest {
        PartialRequest {
            base_address: self.base_address,
            strategy: self.strategy,
            version: self.fw_version,
            bootloader: self.bootloader_size,
            active_app: self.active_app_size,
            backup_app: self.backup_app_size,
            ota: self.ota_size,
            kv: self.kv_size,
        }
    }

    fn request(&self) -> Result<PartitionRequest, BuildError> {
        let base = match &self.manifest {
            Some(path) => LayoutManifest::load(path)?.to_partial()?,
            None => PartialRequest::default(),
        };
        Ok(base.merge(self.overrides()).into_request()?)
    }
}

#[derive(Args, Debug)]
pub(crate) struct ReadArgs {
    /// Path to the partition table file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Offset of the partition table in the file
    #[arg(long, value_name = "OFFSET", default_value_t = 0, value_parser = maybe_hex::<usize>)]
    pub offset: usize,

    /// Update strategy the table was built for; inferred from the size when omitted
    #[arg(long, value_name = "STRATEGY", value_parser = parse_strategy)]
    pub strategy: Option<UpdateStrategy>,
}

pub(crate) fn create(args: &CreateArgs) -> Result<()> {
    let request = args.request()?;
    let build = partition_table_create(request, &args.output)?;
    println!("Partition table written to {}", args.output.display());
    println!(
        "Recommended flash address: 0x{:08x}",
        build.recommended_address()
    );
    Ok(())
}

pub(crate) fn verify(args: &ReadArgs) -> Result<()> {
    partition_table_verify(&args.file, args.offset, args.strategy)?;
    println!("Partition table is valid!");
    Ok(())
}

pub(crate) fn show(args: &ReadArgs) -> Result<()> {
    let image = partition_table_verify(&args.file, args.offset, args.strategy)?;
    print!("{}", describe(&image));
    Ok(())
}

/// Exit code for a failed command: the category of a [`BuildError`], or 1.
pub(crate) fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<BuildError>()
        .map_or(1, BuildError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ota_builder::ParseError;
    use std::fs;
    use tempfile::TempDir;

    fn in_position_args(output: PathBuf) -> CreateArgs {
        CreateArgs {
            base_address: Some(0x0800_8000),
            strategy: Some(UpdateStrategy::InPosition),
            fw_version: Some(FirmwareVersion::new(1, 0)),
            bootloader_size: Some(RegionSize::kilobytes(32)),
            active_app_size: Some(RegionSize::kilobytes(256)),
            ota_size: Some(RegionSize::kilobytes(256)),
            kv_size: Some(RegionSize::kilobytes(16)),
            output,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_verify_show() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let output = dir.path().join("pt_tbl.bin");
        create(&in_position_args(output.clone())).expect("Failed to create partition table");
        assert_eq!(fs::read(&output).unwrap().len(), 32);

        let read_args = ReadArgs {
            file: output,
            offset: 0,
            strategy: None,
        };
        verify(&read_args).unwrap();
        show(&read_args).unwrap();
    }

    #[test]
    fn test_manifest_with_override() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let manifest = dir.path().join("layout.toml");
        fs::write(
            &manifest,
            r#"
base_address = "0x08008000"
strategy = "ping-pong"
version = { major = 1, minor = 0 }

[regions]
bootloader = { size = 32, unit = "kb" }
active_app = { size = 256, unit = "kb" }
backup_app = { size = 256, unit = "kb" }
ota = { size = 256, unit = "kb" }
kv = { size = 16, unit = "kb" }
"#,
        )
        .unwrap();

        let args = CreateArgs {
            manifest: Some(manifest),
            fw_version: Some(FirmwareVersion::new(4, 2)),
            output: dir.path().join("pt_tbl.bin"),
            ..Default::default()
        };
        let request = args.request().unwrap();
        assert_eq!(request.strategy, UpdateStrategy::PingPong);
        assert_eq!(request.version, FirmwareVersion::new(4, 2));
        assert_eq!(request.sizes.backup_app, Some(RegionSize::kilobytes(256)));
    }

    #[test]
    fn test_error_categories() {
        let dir = TempDir::new().expect("Failed to create temp dir");

        let missing = CreateArgs {
            output: dir.path().join("pt_tbl.bin"),
            ..Default::default()
        };
        let err = create(&missing).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::Input(ParseError::MissingField(_)))
        ));
        assert_eq!(exit_code(&err), 2);

        let mut zero = in_position_args(dir.path().join("pt_tbl.bin"));
        zero.ota_size = Some(RegionSize::bytes(0));
        assert_eq!(exit_code(&create(&zero).unwrap_err()), 3);

        let unwritable = in_position_args(dir.path().join("missing").join("pt_tbl.bin"));
        assert_eq!(exit_code(&create(&unwritable).unwrap_err()), 4);

        assert_eq!(exit_code(&anyhow::anyhow!("other")), 1);
    }
}

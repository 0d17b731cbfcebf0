// Licensed under the Apache-2.0 license

//! TOML layout manifest.
//!
//! ```toml
//! base_address = "0x08008000"
//! strategy = "ping-pong"
//!
//! [version]
//! major = 1
//! minor = 0
//!
//! [regions]
//! bootloader = { size = 32, unit = "kb" }
//! active_app = { size = 256, unit = "kb" }
//! backup_app = { size = 256, unit = "kb" }
//! ota = { size = 256, unit = "kb" }
//! kv = { size = 16384 }
//! ```

use crate::input::parse_hex_address;
use crate::partition_table::PartialRequest;
use crate::ParseError;
use ota_partition::{FirmwareVersion, RegionSize, SizeUnit, UpdateStrategy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LayoutManifest {
    pub base_address: Option<String>,
    pub strategy: Option<StrategyName>,
    pub version: Option<VersionEntry>,
    #[serde(default)]
    pub regions: RegionEntries,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyName {
    InPosition,
    PingPong,
}

impl From<StrategyName> for UpdateStrategy {
    fn from(name: StrategyName) -> Self {
        match name {
            StrategyName::InPosition => UpdateStrategy::InPosition,
            StrategyName::PingPong => UpdateStrategy::PingPong,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct VersionEntry {
    pub major: u8,
    pub minor: u8,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RegionEntries {
    pub bootloader: Option<RegionEntry>,
    pub active_app: Option<RegionEntry>,
    pub backup_app: Option<RegionEntry>,
    pub ota: Option<RegionEntry>,
    pub kv: Option<RegionEntry>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RegionEntry {
    pub size: u32,
    #[serde(default)]
    pub unit: UnitName,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnitName {
    #[default]
    Bytes,
    #[serde(alias = "kilobytes", alias = "k")]
    Kb,
}

impl From<RegionEntry> for RegionSize {
    fn from(entry: RegionEntry) -> Self {
        RegionSize {
            magnitude: entry.size,
            unit: match entry.unit {
                UnitName::Bytes => SizeUnit::Bytes,
                UnitName::Kb => SizeUnit::Kilobytes,
            },
        }
    }
}

impl LayoutManifest {
    pub fn load(path: &Path) -> Result<Self, ParseError> {
        let contents = fs::read_to_string(path).map_err(|source| ParseError::ManifestRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ParseError::ManifestFormat {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
    }

    /// Converts the manifest into request fields, parsing the base address.
    pub fn to_partial(&self) -> Result<PartialRequest, ParseError> {
        let base_address = self
            .base_address
            .as_deref()
            .map(parse_hex_address)
            .transpose()?;
        Ok(PartialRequest {
            base_address,
            strategy: self.strategy.map(Into::into),
            version: self
                .version
                .map(|v| FirmwareVersion::new(v.major, v.minor)),
            bootloader: self.regions.bootloader.map(Into::into),
            active_app: self.regions.active_app.map(Into::into),
            backup_app: self.regions.backup_app.map(Into::into),
            ota: self.regions.ota.map(Into::into),
            kv: self.regions.kv.map(Into::into),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PING_PONG: &str = r#"
base_address = "0x08008000"
strategy = "ping-pong"

[version]
major = 1
minor = 0

[regions]
bootloader = { size = 32, unit = "kb" }
active_app = { size = 256, unit = "kb" }
backup_app = { size = 256, unit = "kilobytes" }
ota = { size = 256, unit = "kb" }
kv = { size = 16384 }
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest: LayoutManifest = toml::from_str(PING_PONG).unwrap();
        let partial = manifest.to_partial().unwrap();

        assert_eq!(partial.base_address, Some(0x0800_8000));
        assert_eq!(partial.strategy, Some(UpdateStrategy::PingPong));
        assert_eq!(partial.version, Some(FirmwareVersion::new(1, 0)));
        assert_eq!(partial.bootloader, Some(RegionSize::kilobytes(32)));
        assert_eq!(partial.backup_app, Some(RegionSize::kilobytes(256)));
        assert_eq!(partial.kv, Some(RegionSize::bytes(16384)));
    }

    #[test]
    fn test_partial_manifest() {
        let manifest: LayoutManifest = toml::from_str("strategy = \"in-position\"").unwrap();
        let partial = manifest.to_partial().unwrap();
        assert_eq!(partial.strategy, Some(UpdateStrategy::InPosition));
        assert_eq!(partial.base_address, None);
        assert_eq!(partial.active_app, None);
    }

    #[test]
    fn test_manifest_rejects_unknown_fields() {
        assert!(toml::from_str::<LayoutManifest>("flash_size = 4").is_err());
        assert!(toml::from_str::<LayoutManifest>("[regions]\nbootlaoder = { size = 1 }").is_err());
        assert!(toml::from_str::<LayoutManifest>("strategy = \"a-b\"").is_err());
    }

    #[test]
    fn test_manifest_bad_address() {
        let manifest: LayoutManifest = toml::from_str("base_address = \"1234\"").unwrap();
        assert!(matches!(
            manifest.to_partial(),
            Err(ParseError::MissingHexPrefix(_))
        ));
    }

    #[test]
    fn test_load_manifest() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(PING_PONG.as_bytes())
            .expect("Failed to write manifest");
        let manifest = LayoutManifest::load(file.path()).unwrap();
        assert_eq!(manifest.strategy, Some(StrategyName::PingPong));

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            LayoutManifest::load(&missing),
            Err(ParseError::ManifestRead { .. })
        ));

        let mut broken = NamedTempFile::new().expect("Failed to create temp file");
        broken
            .write_all(b"base_address = ")
            .expect("Failed to write manifest");
        assert!(matches!(
            LayoutManifest::load(broken.path()),
            Err(ParseError::ManifestFormat { .. })
        ));
    }
}

// Licensed under the Apache-2.0 license

mod error;
pub mod input;
pub mod manifest;
pub mod partition_table;

pub use error::{BuildError, ParseError};
pub use manifest::LayoutManifest;
pub use partition_table::{
    build_partition_table, describe, partition_table_create, partition_table_verify,
    write_partition_table, PartialRequest, PartitionRequest, PartitionTableBuild,
};

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// File name the table is written to when no output path is given.
pub const DEFAULT_OUTPUT: &str = "pt_tbl.bin";

pub static PROJECT_ROOT: LazyLock<PathBuf> = LazyLock::new(|| {
    let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    option_env!("CARGO_MANIFEST_DIR")
        .map(|s| {
            let p = Path::new(&s);
            if p.exists() {
                p.parent()
                    .unwrap_or(current_dir.as_path())
                    .to_path_buf()
            } else {
                current_dir.clone()
            }
        })
        .unwrap_or(current_dir)
});

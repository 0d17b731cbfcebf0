// Licensed under the Apache-2.0 license

use anyhow::{bail, Context, Result};
use ota_builder::PROJECT_ROOT;
use std::process::Command;

fn cargo(args: &[&str]) -> Result<()> {
    println!("Running: cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .current_dir(&*PROJECT_ROOT)
        .args(args)
        .status()
        .context("failed to run cargo")?;

    if !status.success() {
        bail!("cargo {} failed", args[0]);
    }
    Ok(())
}

pub(crate) fn clippy() -> Result<()> {
    cargo(&[
        "clippy",
        "--workspace",
        "--all-targets",
        "--",
        "-D",
        "warnings",
        "--no-deps",
    ])
}

pub(crate) fn format() -> Result<()> {
    cargo(&["fmt", "--check", "--all"])
}

pub(crate) fn test() -> Result<()> {
    cargo(&["test", "--workspace"])
}

pub(crate) fn precheckin() -> Result<()> {
    format()?;
    clippy()?;
    crate::header::check()?;
    test()
}

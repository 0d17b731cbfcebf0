// Licensed under the Apache-2.0 license

use anyhow::{bail, Result};
use ota_builder::PROJECT_ROOT;
use std::{
    fs::File,
    io::{BufRead, BufReader, Error},
    path::{Path, PathBuf},
};
use walkdir::DirEntry;

const REQUIRED_TEXT: &str = "Licensed under the Apache-2.0 license";
const EXTENSIONS: &[&str] = &["rs", "toml", "sh", "py", "yml", "yaml"];
const IGNORED_DIRS: &[&str] = &[".git", "examples", "target"];
const HEADER_LINES: usize = 3;

pub(crate) fn fix() -> Result<()> {
    println!("Running: license header fix");

    let mut failed = false;
    for file in find_files(&PROJECT_ROOT, EXTENSIONS)? {
        if check_file(&file).is_err() {
            println!("Fixing header in {}", remove_root(&file));
            fix_file(&file)?;
        }
        if let Err(e) = check_file(&file) {
            println!("{e}");
            failed = true;
        }
    }
    if failed {
        bail!("License header fix failed; please fix the above files manually.");
    }
    Ok(())
}

pub(crate) fn check() -> Result<()> {
    println!("Running: license header check");

    let mut failed = false;
    for file in find_files(&PROJECT_ROOT, EXTENSIONS)? {
        if let Err(e) = check_file(&file) {
            println!("{e}");
            failed = true;
        }
    }
    if failed {
        bail!("Some files are missing the license header; run \"cargo xtask header-fix\" from the repo root");
    }
    Ok(())
}

fn remove_root(path: &Path) -> String {
    path.strip_prefix(&*PROJECT_ROOT)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn with_path(path: &Path) -> impl Fn(Error) -> Error + Copy + '_ {
    move |e: Error| Error::new(e.kind(), format!("{:?}: {e}", remove_root(path)))
}

fn check_file_contents(path: &Path, contents: impl BufRead) -> Result<(), Error> {
    let wrap_err = with_path(path);

    for line in contents.lines().take(HEADER_LINES) {
        if line.map_err(wrap_err)?.contains(REQUIRED_TEXT) {
            return Ok(());
        }
    }
    Err(Error::other(format!(
        "File {:?} doesn't contain {REQUIRED_TEXT:?} in the first {HEADER_LINES} lines",
        remove_root(path)
    )))
}

fn check_file(path: &Path) -> Result<(), Error> {
    check_file_contents(path, BufReader::new(File::open(path).map_err(with_path(path))?))
}

fn header_line(path: &Path) -> Result<String, Error> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("rs") => Ok(format!("// {REQUIRED_TEXT}\n")),
        Some("toml" | "sh" | "py" | "yaml" | "yml") => Ok(format!("# {REQUIRED_TEXT}\n")),
        other => Err(Error::other(format!("Unknown extension {other:?}"))),
    }
}

fn fix_file(path: &Path) -> Result<(), Error> {
    let mut contents = header_line(path)?.into_bytes();
    let mut prev_contents = std::fs::read(path).map_err(with_path(path))?;
    if prev_contents.first() != Some(&b'\n') {
        contents.push(b'\n');
    }
    contents.append(&mut prev_contents);
    std::fs::write(path, contents).map_err(with_path(path))
}

fn allow(entry: &DirEntry) -> bool {
    !(entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| IGNORED_DIRS.contains(&name)))
}

fn find_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut result = vec![];
    for entry in walkdir::WalkDir::new(dir).into_iter().filter_entry(allow) {
        let entry = entry?;
        let matches = entry
            .path()
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| extensions.contains(&ext));
        if entry.file_type().is_file() && matches {
            result.push(entry.into_path());
        }
    }
    result.sort();
    Ok(result)
}

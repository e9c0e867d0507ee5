//! Bundle extraction
//!
//! Writes every script of a bundle, except the loader, to its own file. The
//! bundle file itself is only read.

use std::fs;
use std::path::{Path, PathBuf};

use crate::bundle::read_bundle;
use crate::error::{Error, Result};
use crate::naming::format_script_name;
use crate::script::{ensure_encoding_pragma, ScriptEntry};

/// Whether a bundle still holds scripts to extract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractability {
    /// At least one entry besides the loader exists
    NotYetExtracted,
    /// The bundle is empty or only holds the loader
    AlreadyExtracted,
}

/// Result of an extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// Paths of the written files, in bundle order
    Extracted(Vec<PathBuf>),
    NothingToExtract,
}

/// Options for extraction
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Replace files that already exist in the target directory
    pub overwrite: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { overwrite: true }
    }
}

fn extractability(entries: &[ScriptEntry]) -> Extractability {
    if entries.iter().any(|entry| !entry.is_loader()) {
        Extractability::NotYetExtracted
    } else {
        Extractability::AlreadyExtracted
    }
}

/// Check whether extracting `bundle_path` would write anything
pub fn check_extractable(bundle_path: &Path) -> Result<Extractability> {
    let entries = read_bundle(bundle_path)?;
    Ok(extractability(&entries))
}

/// Extract all scripts of a bundle into `target_dir`
///
/// Files are named `"{index:04} - {name}.rb"` with the entry's 1-based
/// position in the bundle as index, and start with the encoding pragma.
pub fn extract_bundle(bundle_path: &Path, target_dir: &Path) -> Result<ExtractOutcome> {
    extract_bundle_with(bundle_path, target_dir, &ExtractOptions::default())
}

/// Extract with explicit options
///
/// Files written before a failure stay on disk.
pub fn extract_bundle_with(
    bundle_path: &Path,
    target_dir: &Path,
    options: &ExtractOptions,
) -> Result<ExtractOutcome> {
    let entries = read_bundle(bundle_path)?;
    if extractability(&entries) == Extractability::AlreadyExtracted {
        tracing::info!("Nothing to extract from {}", bundle_path.display());
        return Ok(ExtractOutcome::NothingToExtract);
    }

    fs::create_dir_all(target_dir)?;

    let mut written = Vec::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        if entry.is_loader() {
            tracing::debug!("Skipping loader entry '{}'", entry.name);
            continue;
        }

        let path = target_dir.join(format_script_name(&entry.name, position + 1));
        if !options.overwrite && path.exists() {
            return Err(Error::WriteConflict(path));
        }

        fs::write(&path, ensure_encoding_pragma(&entry.code).as_bytes())?;
        tracing::debug!("Extracted section {} to {}", entry.section, path.display());
        written.push(path);
    }

    tracing::info!(
        "Extracted {} scripts from {} into {}",
        written.len(),
        bundle_path.display(),
        target_dir.display()
    );
    Ok(ExtractOutcome::Extracted(written))
}

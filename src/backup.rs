//! Timestamped backups
//!
//! Backups are named `"{file name} - {yyyy-MM-dd_HH.mm.ss}.bak"`. A second
//! backup of the same file within the same second gets `" (1)"`, `" (2)"`, ...
//! appended to the stem instead of replacing the first.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::{Error, Result};

/// Timestamp layout used in backup names
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H.%M.%S";

/// Extension of backup files
pub const BACKUP_EXTENSION: &str = "bak";

/// Backup file name for `file_name` taken at `time`
pub fn backup_file_name(file_name: &str, time: &DateTime<Local>) -> String {
    format!(
        "{} - {}.{}",
        file_name,
        time.format(BACKUP_TIMESTAMP_FORMAT),
        BACKUP_EXTENSION
    )
}

/// Copy `source` into `backup_dir` under a timestamped name
///
/// Creates `backup_dir` if needed and returns the backup path.
pub fn create_backup(source: &Path, backup_dir: &Path) -> Result<PathBuf> {
    create_backup_at(source, backup_dir, &Local::now())
}

fn create_backup_at(source: &Path, backup_dir: &Path, time: &DateTime<Local>) -> Result<PathBuf> {
    if !source.is_file() {
        return Err(Error::NotFound(source.to_path_buf()));
    }
    let file_name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::NotFound(source.to_path_buf()))?;

    fs::create_dir_all(backup_dir)?;

    let mut destination = backup_dir.join(backup_file_name(&file_name, time));
    let stem = format!("{} - {}", file_name, time.format(BACKUP_TIMESTAMP_FORMAT));
    let mut counter = 1u32;
    while destination.exists() {
        destination = backup_dir.join(format!("{} ({}).{}", stem, counter, BACKUP_EXTENSION));
        counter += 1;
    }

    fs::copy(source, &destination).map_err(|e| Error::from_io(e, source))?;
    tracing::info!("Backed up {} to {}", source.display(), destination.display());
    Ok(destination)
}

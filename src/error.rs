//! Error types for rgss-scripts

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for bundle operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid bundle format: {0}")]
    Format(String),

    #[error("Decompression error: {0}")]
    Decompression(String),

    #[error("Destination already exists: {}", .0.display())]
    WriteConflict(PathBuf),

    #[error("No free section identifier left")]
    SectionsExhausted,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No script bundle found in project: {}", .0.display())]
    UnknownProject(PathBuf),
}

impl Error {
    /// Map an IO error on `path` to `NotFound` when the path is missing
    pub(crate) fn from_io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(path.into())
        } else {
            Error::Io(err)
        }
    }
}

/// Result type alias for bundle operations
pub type Result<T> = std::result::Result<T, Error>;

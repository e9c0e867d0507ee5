//! Per-project settings
//!
//! Read from `rgss-scripts.toml` in the project root:
//!
//! ```toml
//! scripts_folder = "Scripts"
//! backups_folder = "Backups"
//! rgss_version = "rgss3"
//! ```
//!
//! Every key is optional.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::project::RgssVersion;

/// Name of the settings file in the project root
pub const CONFIG_FILE: &str = "rgss-scripts.toml";

pub const DEFAULT_SCRIPTS_FOLDER: &str = "Scripts";
pub const DEFAULT_BACKUPS_FOLDER: &str = "Backups";

/// Editor settings for one project
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Scripts folder, relative to the project root
    pub scripts_folder: String,
    /// Backups folder, relative to the project root
    pub backups_folder: String,
    /// Skip bundle detection and use this engine version
    pub rgss_version: Option<RgssVersion>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            scripts_folder: DEFAULT_SCRIPTS_FOLDER.to_string(),
            backups_folder: DEFAULT_BACKUPS_FOLDER.to_string(),
            rgss_version: None,
        }
    }
}

impl EditorConfig {
    /// Parse settings from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `rgss-scripts.toml` from `project`, or defaults if absent
    pub fn load(project: &Path) -> Result<Self> {
        let path = project.join(CONFIG_FILE);
        if !path.is_file() {
            tracing::debug!("No {} in {}, using defaults", CONFIG_FILE, project.display());
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path).map_err(|e| Error::from_io(e, &path))?;
        let config = Self::from_toml(&text).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("scripts_folder", &self.scripts_folder),
            ("backups_folder", &self.backups_folder),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{} must not be empty", key)));
            }
            if Path::new(value).is_absolute() {
                return Err(Error::Config(format!(
                    "{} must be relative to the project, got {}",
                    key, value
                )));
            }
        }
        Ok(())
    }
}

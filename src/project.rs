//! Game project layout
//!
//! Maps a project root to the bundle of its engine version and to the
//! folders configured in [`EditorConfig`].

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::bundle::WriteOptions;
use crate::config::EditorConfig;
use crate::error::{Error, Result};
use crate::load_order::LOAD_ORDER_FILE;
use crate::utils::to_engine_path;

/// Folder holding the bundle inside a project
pub const DATA_FOLDER: &str = "Data";

/// Engine generation of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RgssVersion {
    /// RPG Maker XP
    Rgss1,
    /// RPG Maker VX
    Rgss2,
    /// RPG Maker VX Ace
    Rgss3,
}

impl RgssVersion {
    /// Newest first; detection picks the first bundle that exists
    pub const ALL: [RgssVersion; 3] = [RgssVersion::Rgss3, RgssVersion::Rgss2, RgssVersion::Rgss1];

    pub fn bundle_file_name(self) -> &'static str {
        match self {
            RgssVersion::Rgss1 => "Scripts.rxdata",
            RgssVersion::Rgss2 => "Scripts.rvdata",
            RgssVersion::Rgss3 => "Scripts.rvdata2",
        }
    }

    pub fn engine_name(self) -> &'static str {
        match self {
            RgssVersion::Rgss1 => "RPG Maker XP",
            RgssVersion::Rgss2 => "RPG Maker VX",
            RgssVersion::Rgss3 => "RPG Maker VX Ace",
        }
    }

    /// Bundle path relative to the project root
    pub fn bundle_path(self, project: &Path) -> PathBuf {
        project.join(DATA_FOLDER).join(self.bundle_file_name())
    }

    /// Encoding options matching the engine's Ruby
    pub fn write_options(self) -> WriteOptions {
        WriteOptions {
            utf8_names: self == RgssVersion::Rgss3,
        }
    }

    /// Detect the version from the bundle present in `project`
    pub fn detect(project: &Path) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|version| version.bundle_path(project).is_file())
            .ok_or_else(|| Error::UnknownProject(project.to_path_buf()))
    }
}

impl fmt::Display for RgssVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RgssVersion::Rgss1 => "RGSS1",
            RgssVersion::Rgss2 => "RGSS2",
            RgssVersion::Rgss3 => "RGSS3",
        };
        write!(f, "{} ({})", name, self.engine_name())
    }
}

/// Resolved paths of one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub version: RgssVersion,
    pub bundle: PathBuf,
    pub scripts_dir: PathBuf,
    pub backups_dir: PathBuf,
    /// Scripts folder as the loader sees it, relative with `/` separators
    pub scripts_folder: String,
}

impl ProjectLayout {
    /// Resolve the layout of `project`
    ///
    /// Uses the configured version if set, else detects it from the bundle.
    pub fn open(project: &Path, config: &EditorConfig) -> Result<Self> {
        if !project.is_dir() {
            return Err(Error::NotFound(project.to_path_buf()));
        }
        let version = match config.rgss_version {
            Some(version) => version,
            None => RgssVersion::detect(project)?,
        };

        Ok(Self {
            root: project.to_path_buf(),
            version,
            bundle: version.bundle_path(project),
            scripts_dir: project.join(&config.scripts_folder),
            backups_dir: project.join(&config.backups_folder),
            scripts_folder: to_engine_path(Path::new(&config.scripts_folder)),
        })
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.scripts_dir.join(LOAD_ORDER_FILE)
    }

    pub fn write_options(&self) -> WriteOptions {
        self.version.write_options()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn project_with(bundles: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(DATA_FOLDER)).unwrap();
        for name in bundles {
            fs::write(dir.path().join(DATA_FOLDER).join(name), b"").unwrap();
        }
        dir
    }

    #[test]
    fn test_detect() {
        let xp = project_with(&["Scripts.rxdata"]);
        assert_eq!(RgssVersion::detect(xp.path()).unwrap(), RgssVersion::Rgss1);

        let vx = project_with(&["Scripts.rvdata"]);
        assert_eq!(RgssVersion::detect(vx.path()).unwrap(), RgssVersion::Rgss2);

        let mixed = project_with(&["Scripts.rxdata", "Scripts.rvdata2"]);
        assert_eq!(RgssVersion::detect(mixed.path()).unwrap(), RgssVersion::Rgss3);

        let empty = project_with(&[]);
        assert!(matches!(
            RgssVersion::detect(empty.path()),
            Err(Error::UnknownProject(_))
        ));
    }

    #[test]
    fn test_write_options() {
        assert!(RgssVersion::Rgss3.write_options().utf8_names);
        assert!(!RgssVersion::Rgss2.write_options().utf8_names);
        assert!(!RgssVersion::Rgss1.write_options().utf8_names);
    }

    #[test]
    fn test_open() {
        let dir = project_with(&["Scripts.rvdata2"]);
        let config = EditorConfig {
            scripts_folder: "Source/Scripts".to_string(),
            ..EditorConfig::default()
        };
        let layout = ProjectLayout::open(dir.path(), &config).unwrap();

        assert_eq!(layout.version, RgssVersion::Rgss3);
        assert_eq!(layout.bundle, dir.path().join("Data/Scripts.rvdata2"));
        assert_eq!(layout.scripts_dir, dir.path().join("Source/Scripts"));
        assert_eq!(layout.backups_dir, dir.path().join("Backups"));
        assert_eq!(layout.scripts_folder, "Source/Scripts");
        assert_eq!(
            layout.manifest_path(),
            dir.path().join("Source/Scripts/load_order.txt")
        );
    }

    #[test]
    fn test_open_with_override() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig {
            rgss_version: Some(RgssVersion::Rgss1),
            ..EditorConfig::default()
        };
        let layout = ProjectLayout::open(dir.path(), &config).unwrap();
        assert_eq!(layout.bundle, dir.path().join("Data/Scripts.rxdata"));
        assert!(!layout.write_options().utf8_names);
    }

    #[test]
    fn test_open_missing_project() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ProjectLayout::open(&dir.path().join("nope"), &EditorConfig::default()),
            Err(Error::NotFound(_))
        ));
    }
}

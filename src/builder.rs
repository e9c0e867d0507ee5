//! Bundle building
//!
//! Turns a directory of script files back into a bundle. Every file gets a
//! fresh section; the destination is overwritten without a backup, so callers
//! that care about the previous bundle must copy it first.

use std::fs;
use std::path::Path;

use crate::bundle::{write_bundle, WriteOptions};
use crate::error::{Error, Result};
use crate::naming::deformat_script_name;
use crate::script::{ensure_encoding_pragma, ScriptEntry};
use crate::section::SectionAllocator;
use crate::utils::collect_script_files;

/// Result of a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Built { entries: usize },
}

/// Read every script under `scripts_dir` into entries, in listing order
pub fn collect_entries(scripts_dir: &Path) -> Result<Vec<ScriptEntry>> {
    if !scripts_dir.is_dir() {
        return Err(Error::NotFound(scripts_dir.to_path_buf()));
    }

    let mut sections = SectionAllocator::new();
    let mut entries = Vec::new();
    for path in collect_script_files(scripts_dir, false)? {
        let code = fs::read_to_string(&path).map_err(|e| Error::from_io(e, &path))?;
        let entry = ScriptEntry {
            section: sections.allocate()?,
            name: deformat_script_name(&path),
            code: ensure_encoding_pragma(&code).into_owned(),
        };
        tracing::debug!("Packed {} as section {}", path.display(), entry.section);
        entries.push(entry);
    }
    Ok(entries)
}

/// Build a bundle at `destination` from the scripts in `scripts_dir`
pub fn build_bundle(scripts_dir: &Path, destination: &Path) -> Result<BuildOutcome> {
    build_bundle_with(scripts_dir, destination, &WriteOptions::default())
}

/// Build with explicit encoding options
pub fn build_bundle_with(
    scripts_dir: &Path,
    destination: &Path,
    options: &WriteOptions,
) -> Result<BuildOutcome> {
    let entries = collect_entries(scripts_dir)?;
    write_bundle(destination, &entries, options)?;

    tracing::info!(
        "Built {} with {} scripts from {}",
        destination.display(),
        entries.len(),
        scripts_dir.display()
    );
    Ok(BuildOutcome::Built {
        entries: entries.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::read_bundle;
    use crate::section::LOADER_SECTION;
    use std::collections::HashSet;

    #[test]
    fn test_build_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = build_bundle(&dir.path().join("Scripts"), &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_build_entries() {
        let dir = tempfile::tempdir().unwrap();
        let scripts = dir.path().join("Scripts");
        fs::create_dir_all(scripts.join("Sub")).unwrap();
        fs::write(scripts.join("0001 - Main.rb"), "puts 1").unwrap();
        fs::write(scripts.join("0002 - Util.RB"), "# encoding: utf-8\nputs 2").unwrap();
        fs::write(scripts.join("Sub/Extra.rb"), "puts 3").unwrap();
        fs::write(scripts.join("load_order.txt"), "0001 - Main.rb\n").unwrap();

        let destination = dir.path().join("Scripts.rvdata2");
        fs::write(&destination, "old contents").unwrap();
        assert_eq!(
            build_bundle(&scripts, &destination).unwrap(),
            BuildOutcome::Built { entries: 3 }
        );

        let entries = read_bundle(&destination).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Main", "Util", "Extra"]);
        assert_eq!(entries[0].code, "# encoding: utf-8\nputs 1");
        assert_eq!(entries[1].code, "# encoding: utf-8\nputs 2");

        let sections: HashSet<i64> = entries.iter().map(|e| e.section).collect();
        assert_eq!(sections.len(), 3);
        assert!(!sections.contains(&LOADER_SECTION));
    }

    #[test]
    fn test_build_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("Scripts.rxdata");
        assert_eq!(
            build_bundle(dir.path(), &destination).unwrap(),
            BuildOutcome::Built { entries: 0 }
        );
        assert!(read_bundle(&destination).unwrap().is_empty());
    }
}

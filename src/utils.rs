//! General utility functions
//!
//! Directory listing, size formatting and glob filters shared by the
//! operations and the command line front end.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{Glob, GlobMatcher};

use crate::error::{Error, Result};
use crate::naming::is_script_file;

/// Format a file size in human-readable form (B, KB, MB, GB)
pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} B", size)
    }
}

/// Create a glob matcher from a pattern string
///
/// Handles common patterns:
/// - `*.ext` becomes `**/*.ext`
/// - Plain text without wildcards becomes `*text*` (substring search)
pub fn create_glob_matcher(pattern: &str) -> anyhow::Result<GlobMatcher> {
    let pattern = if pattern.starts_with("*.") {
        format!("**/{}", pattern)
    } else if !pattern.contains('*') && !pattern.contains('?') {
        format!("*{}*", pattern)
    } else {
        pattern.to_string()
    };

    let glob = Glob::new(&pattern).with_context(|| format!("Invalid pattern: {}", pattern))?;
    Ok(glob.compile_matcher())
}

/// Check if a name matches the optional filter
pub fn matches_filter(name: &str, matcher: Option<&GlobMatcher>) -> bool {
    match matcher {
        Some(m) => m.is_match(name),
        None => true,
    }
}

/// Recursively collect all files in a directory
///
/// Entries are visited depth-first in name order, a directory's files in
/// place of the directory itself. With `relative` set, paths are relative to
/// `dir`. Entries that cannot be read are skipped; only a failure to read
/// `dir` itself is an error.
pub fn collect_files(dir: &Path, relative: bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::NotFound(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    let entries = sorted_entries(dir).map_err(|e| Error::from_io(e, dir))?;
    for path in entries {
        visit(&path, &mut files);
    }

    if relative {
        files = files
            .into_iter()
            .filter_map(|path| path.strip_prefix(dir).ok().map(Path::to_path_buf))
            .collect();
    }
    Ok(files)
}

/// Recursively collect script files (`*.rb`, any case)
pub fn collect_script_files(dir: &Path, relative: bool) -> Result<Vec<PathBuf>> {
    Ok(collect_files(dir, relative)?
        .into_iter()
        .filter(|path| is_script_file(path))
        .collect())
}

/// Convert a relative path to the `/` separated form the engine expects
pub fn to_engine_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn sorted_entries(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)?
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                None
            }
        })
        .collect::<Vec<_>>();
    paths.sort_by_cached_key(|path| listing_key(path));
    Ok(paths)
}

/// Sort key for directory listings
///
/// Names with a numeric prefix come first, ordered by its value, so
/// `"10000 - X.rb"` follows `"9999 - Y.rb"`. Everything else follows by name.
fn listing_key(path: &Path) -> (bool, u64, OsString) {
    let name = path.file_name().map(OsStr::to_os_string).unwrap_or_default();
    let text = name.to_string_lossy();
    let digits = text.len() - text.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    match text[..digits].parse::<u64>() {
        Ok(number) => (false, number, name),
        Err(_) => (true, 0, name),
    }
}

fn visit(path: &Path, files: &mut Vec<PathBuf>) {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::warn!("Skipping {}: {}", path.display(), e);
            return;
        }
    };

    if metadata.is_dir() {
        match sorted_entries(path) {
            Ok(children) => {
                for child in children {
                    visit(&child, files);
                }
            }
            Err(e) => tracing::warn!("Skipping directory {}: {}", path.display(), e),
        }
    } else if metadata.is_file() {
        files.push(path.to_path_buf());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_glob_matcher() {
        let m = create_glob_matcher("Scene").unwrap();
        assert!(matches_filter("Scene_Map", Some(&m)));
        assert!(!matches_filter("Game_Map", Some(&m)));
        assert!(matches_filter("anything", None));

        let m = create_glob_matcher("*.rb").unwrap();
        assert!(m.is_match("dir/0001 - Main.rb"));
    }

    #[test]
    fn test_collect_files_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b_dir/nested")).unwrap();
        fs::write(root.join("c.rb"), "").unwrap();
        fs::write(root.join("a.rb"), "").unwrap();
        fs::write(root.join("b_dir/z.rb"), "").unwrap();
        fs::write(root.join("b_dir/nested/y.rb"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();

        let files = collect_files(root, true).unwrap();
        let names: Vec<String> = files.iter().map(|p| to_engine_path(p)).collect();
        assert_eq!(
            names,
            vec!["a.rb", "b_dir/nested/y.rb", "b_dir/z.rb", "c.rb", "notes.txt"]
        );

        let scripts = collect_script_files(root, false).unwrap();
        assert_eq!(scripts.len(), 4);
        assert!(scripts.iter().all(|p| p.is_absolute() || p.starts_with(root)));
    }

    #[test]
    fn test_collect_files_numeric_prefix_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for name in [
            "10000 - Last.rb",
            "1001 - B.rb",
            "1000 - A.rb",
            "9999 - C.rb",
            "0002 - Second.rb",
            "Extra.rb",
        ] {
            fs::write(root.join(name), "").unwrap();
        }

        let names: Vec<String> = collect_files(root, true)
            .unwrap()
            .iter()
            .map(|p| to_engine_path(p))
            .collect();
        assert_eq!(
            names,
            vec![
                "0002 - Second.rb",
                "1000 - A.rb",
                "1001 - B.rb",
                "9999 - C.rb",
                "10000 - Last.rb",
                "Extra.rb",
            ]
        );
    }

    #[test]
    fn test_collect_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_files(&dir.path().join("missing"), false).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_to_engine_path() {
        let path: PathBuf = ["Scenes", "Battle", "0001 - Scene_Battle.rb"].iter().collect();
        assert_eq!(to_engine_path(&path), "Scenes/Battle/0001 - Scene_Battle.rb");
    }
}

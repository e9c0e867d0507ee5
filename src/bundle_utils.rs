//! Project-level bundle operations
//!
//! Front-end operations combining the library steps for a whole project:
//! extracting, rebuilding, regenerating the loader or manifest, listing and
//! inspecting bundles. Results are reported on stdout.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::{
    backup::create_backup,
    builder::{build_bundle_with, BuildOutcome},
    bundle::read_bundle,
    config::EditorConfig,
    extract::{check_extractable, extract_bundle, ExtractOutcome, Extractability},
    load_order::write_load_order,
    loader::{generate_loader_bundle_with, LoaderOutcome},
    project::ProjectLayout,
    utils::{collect_script_files, create_glob_matcher, format_size, matches_filter},
};

fn open_project(project: &Path, config: &EditorConfig) -> Result<ProjectLayout> {
    let layout = ProjectLayout::open(project, config)
        .with_context(|| format!("Failed to open project {}", project.display()))?;
    println!(
        "Project {} ({})",
        layout.root.display(),
        layout.version
    );
    Ok(layout)
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {msg}",
    )?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Extract a project's scripts and replace its bundle with the loader
///
/// Writes the scripts and `load_order.txt` into the scripts folder, backs up
/// the bundle and swaps in the loader bundle.
pub fn extract_project(project: &Path, config: &EditorConfig) -> Result<()> {
    let layout = open_project(project, config)?;

    let state = check_extractable(&layout.bundle)
        .with_context(|| format!("Failed to read {}", layout.bundle.display()))?;
    if state == Extractability::AlreadyExtracted {
        println!("Nothing to extract, {} only holds the loader", layout.bundle.display());
        return Ok(());
    }

    let pb = spinner("Extracting scripts")?;
    let outcome = extract_bundle(&layout.bundle, &layout.scripts_dir)
        .with_context(|| format!("Failed to extract {}", layout.bundle.display()));
    pb.finish_and_clear();

    let files = match outcome? {
        ExtractOutcome::Extracted(files) => files,
        ExtractOutcome::NothingToExtract => {
            println!("Nothing to extract");
            return Ok(());
        }
    };
    println!("Extracted: {} scripts to {}", files.len(), layout.scripts_dir.display());

    let manifest = write_load_order(&layout.scripts_dir)?;
    println!("Load order: {}", manifest.display());

    let LoaderOutcome::Created { backup } = generate_loader_bundle_with(
        &layout.bundle,
        &layout.backups_dir,
        &layout.scripts_folder,
        &layout.write_options(),
    )
    .with_context(|| format!("Failed to write loader bundle {}", layout.bundle.display()))?;
    println!("Backup: {}", backup.display());
    println!("Loader bundle written to {}", layout.bundle.display());

    Ok(())
}

/// Rebuild a full bundle from the scripts folder
///
/// Writes to `output` or, by default, the project's bundle. An existing
/// destination is backed up first.
pub fn build_project(project: &Path, config: &EditorConfig, output: Option<&Path>) -> Result<()> {
    let layout = open_project(project, config)?;
    let destination = output.unwrap_or(&layout.bundle);

    if destination.is_file() {
        let backup = create_backup(destination, &layout.backups_dir)
            .with_context(|| format!("Failed to back up {}", destination.display()))?;
        println!("Backup: {}", backup.display());
    }

    let pb = spinner("Building bundle")?;
    let outcome = build_bundle_with(&layout.scripts_dir, destination, &layout.write_options())
        .with_context(|| format!("Failed to build from {}", layout.scripts_dir.display()));
    pb.finish_and_clear();

    let BuildOutcome::Built { entries } = outcome?;
    let size = fs::metadata(destination).map(|m| m.len()).unwrap_or(0);
    println!(
        "Built: {} scripts into {} ({})",
        entries,
        destination.display(),
        format_size(size)
    );

    Ok(())
}

/// Back up the project's bundle and replace it with the loader bundle
pub fn create_loader(project: &Path, config: &EditorConfig) -> Result<()> {
    let layout = open_project(project, config)?;

    let LoaderOutcome::Created { backup } = generate_loader_bundle_with(
        &layout.bundle,
        &layout.backups_dir,
        &layout.scripts_folder,
        &layout.write_options(),
    )
    .with_context(|| format!("Failed to write loader bundle {}", layout.bundle.display()))?;

    println!("Backup: {}", backup.display());
    println!("Loader bundle written to {}", layout.bundle.display());
    Ok(())
}

/// Regenerate `load_order.txt` from the scripts folder
pub fn write_manifest(project: &Path, config: &EditorConfig) -> Result<()> {
    let layout = open_project(project, config)?;

    let manifest = write_load_order(&layout.scripts_dir)
        .with_context(|| format!("Failed to list {}", layout.scripts_dir.display()))?;
    let count = fs::read_to_string(&manifest)?.lines().count();
    println!("Load order: {} scripts written to {}", count, manifest.display());
    Ok(())
}

/// List the entries of a bundle with optional name filtering
pub fn list_scripts(bundle_path: &Path, filter: Option<&str>) -> Result<()> {
    println!("Opening {}...", bundle_path.display());

    let entries = read_bundle(bundle_path)
        .with_context(|| format!("Failed to open {}", bundle_path.display()))?;

    let matcher = filter.map(create_glob_matcher).transpose()?;

    let mut count = 0usize;
    let mut total_size = 0u64;

    for (position, entry) in entries.iter().enumerate() {
        if !matches_filter(&entry.name, matcher.as_ref()) {
            continue;
        }

        let kind = if entry.is_loader() { "Loader" } else { "Script" };
        println!(
            "{:>5} {:>10} {:>10} {:>7} {}",
            position + 1,
            entry.section,
            format_size(entry.code.len() as u64),
            kind,
            entry.name
        );

        count += 1;
        total_size += entry.code.len() as u64;
    }

    println!();
    println!("Total: {} scripts, {}", count, format_size(total_size));

    Ok(())
}

/// Show version, paths and contents of a project
pub fn show_info(project: &Path, config: &EditorConfig) -> Result<()> {
    let layout = open_project(project, config)?;

    println!("Bundle:   {}", layout.bundle.display());
    match read_bundle(&layout.bundle) {
        Ok(entries) => {
            let loader = entries.iter().any(|entry| entry.is_loader());
            let code_size: u64 = entries.iter().map(|entry| entry.code.len() as u64).sum();
            let file_size = fs::metadata(&layout.bundle).map(|m| m.len()).unwrap_or(0);
            println!(
                "          {} entries, {} on disk, {} of code",
                entries.len(),
                format_size(file_size),
                format_size(code_size)
            );
            println!(
                "          {}",
                if loader {
                    "holds the loader script"
                } else {
                    "holds no loader script"
                }
            );
        }
        Err(e) => println!("          unreadable: {}", e),
    }

    println!("Scripts:  {}", layout.scripts_dir.display());
    match collect_script_files(&layout.scripts_dir, true) {
        Ok(files) => println!("          {} script files", files.len()),
        Err(_) => println!("          not extracted yet"),
    }

    let manifest = layout.manifest_path();
    if manifest.is_file() {
        println!("Manifest: {}", manifest.display());
    } else {
        println!("Manifest: missing");
    }

    println!("Backups:  {}", layout.backups_dir.display());
    if let Ok(dir) = fs::read_dir(&layout.backups_dir) {
        println!("          {} backups", dir.filter_map(|e| e.ok()).count());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{write_bundle, WriteOptions};
    use crate::script::ScriptEntry;
    use crate::section::LOADER_SECTION;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("Data")).unwrap();
        write_bundle(
            dir.path().join("Data/Scripts.rvdata"),
            &[
                ScriptEntry::new(1, "Main", "main"),
                ScriptEntry::new(2, "Util", "util"),
            ],
            &WriteOptions { utf8_names: false },
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_extract_project() {
        let dir = project();
        let config = EditorConfig::default();
        extract_project(dir.path(), &config).unwrap();

        let scripts = dir.path().join("Scripts");
        assert!(scripts.join("0001 - Main.rb").is_file());
        assert!(scripts.join("0002 - Util.rb").is_file());
        assert_eq!(
            fs::read_to_string(scripts.join("load_order.txt")).unwrap(),
            "0001 - Main.rb\n0002 - Util.rb\n"
        );

        let entries = read_bundle(dir.path().join("Data/Scripts.rvdata")).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].section, LOADER_SECTION);
        assert_eq!(fs::read_dir(dir.path().join("Backups")).unwrap().count(), 1);

        // second run finds only the loader
        extract_project(dir.path(), &config).unwrap();
        assert_eq!(fs::read_dir(dir.path().join("Backups")).unwrap().count(), 1);
    }

    #[test]
    fn test_build_project_backs_up() {
        let dir = project();
        let config = EditorConfig::default();
        extract_project(dir.path(), &config).unwrap();
        build_project(dir.path(), &config, None).unwrap();

        let entries = read_bundle(dir.path().join("Data/Scripts.rvdata")).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Main", "Util"]);
        assert_eq!(fs::read_dir(dir.path().join("Backups")).unwrap().count(), 2);
    }

    #[test]
    fn test_list_scripts_filter() {
        let dir = project();
        list_scripts(&dir.path().join("Data/Scripts.rvdata"), Some("Ma")).unwrap();
        assert!(list_scripts(&dir.path().join("Data/missing"), None).is_err());
    }
}

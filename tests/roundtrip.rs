use std::fs;
use std::path::Path;

use rgss_scripts::extract::{check_extractable, extract_bundle, ExtractOutcome, Extractability};
use rgss_scripts::loader::{generate_loader_bundle, LoaderOutcome, LOADER_SCRIPT_NAME};
use rgss_scripts::naming::deformat_script_name;
use rgss_scripts::{
    build_bundle, read_bundle, write_bundle, write_load_order, ScriptEntry, WriteOptions,
    LOADER_SECTION,
};

fn write_scripts(dir: &Path, files: &[(&str, &str)]) {
    fs::create_dir_all(dir).unwrap();
    for (name, code) in files {
        fs::write(dir.join(name), code).unwrap();
    }
}

fn extracted(outcome: ExtractOutcome) -> Vec<std::path::PathBuf> {
    match outcome {
        ExtractOutcome::Extracted(files) => files,
        ExtractOutcome::NothingToExtract => panic!("expected extracted files"),
    }
}

#[test]
fn build_then_extract_keeps_scripts() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("Source");
    write_scripts(
        &source,
        &[
            ("Main.rb", "puts 1"),
            ("Util.rb", "puts 2"),
            ("Core.rb", "puts 3"),
        ],
    );

    let bundle = dir.path().join("Scripts.rvdata2");
    build_bundle(&source, &bundle).unwrap();

    let target = dir.path().join("Scripts");
    let files = extracted(extract_bundle(&bundle, &target).unwrap());
    assert_eq!(files.len(), 3);

    let mut scripts: Vec<(String, String)> = files
        .iter()
        .map(|path| (deformat_script_name(path), fs::read_to_string(path).unwrap()))
        .collect();
    scripts.sort();
    assert_eq!(
        scripts,
        vec![
            ("Core".to_string(), "# encoding: utf-8\nputs 3".to_string()),
            ("Main".to_string(), "# encoding: utf-8\nputs 1".to_string()),
            ("Util".to_string(), "# encoding: utf-8\nputs 2".to_string()),
        ]
    );
}

#[test]
fn pragma_is_not_duplicated() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("Source");
    let code = "# encoding: utf-8\nclass Foo\nend\n";
    write_scripts(&source, &[("0001 - Foo.rb", code)]);

    let bundle = dir.path().join("Scripts.rvdata2");
    build_bundle(&source, &bundle).unwrap();
    let entries = read_bundle(&bundle).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Foo");
    assert_eq!(entries[0].code, code);

    let files = extracted(extract_bundle(&bundle, &dir.path().join("Scripts")).unwrap());
    assert_eq!(fs::read_to_string(&files[0]).unwrap(), code);
}

#[test]
fn empty_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = dir.path().join("Scripts.rxdata");
    write_bundle(
        &bundle,
        &[ScriptEntry::new(LOADER_SECTION, LOADER_SCRIPT_NAME, "ScriptLoader.run")],
        &WriteOptions { utf8_names: false },
    )
    .unwrap();

    assert_eq!(check_extractable(&bundle).unwrap(), Extractability::AlreadyExtracted);
    let target = dir.path().join("Scripts");
    assert_eq!(
        extract_bundle(&bundle, &target).unwrap(),
        ExtractOutcome::NothingToExtract
    );
    assert!(!target.exists());
}

#[test]
fn extraction_excludes_loader() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = dir.path().join("Scripts.rvdata");
    let mut entries = vec![ScriptEntry::new(LOADER_SECTION, LOADER_SCRIPT_NAME, "")];
    entries.extend((0..5).map(|i| ScriptEntry::new(100 + i, format!("Script {}", i), "p 1")));
    write_bundle(&bundle, &entries, &WriteOptions { utf8_names: false }).unwrap();

    assert_eq!(check_extractable(&bundle).unwrap(), Extractability::NotYetExtracted);
    assert_eq!(check_extractable(&bundle).unwrap(), Extractability::NotYetExtracted);

    let target = dir.path().join("Scripts");
    let files = extracted(extract_bundle(&bundle, &target).unwrap());
    assert_eq!(files.len(), 5);
    assert_eq!(fs::read_dir(&target).unwrap().count(), 5);
    assert!(files
        .iter()
        .all(|path| deformat_script_name(path) != LOADER_SCRIPT_NAME));
}

#[test]
fn full_workflow_with_loader() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = dir.path().join("Data/Scripts.rvdata2");
    fs::create_dir_all(bundle.parent().unwrap()).unwrap();
    write_bundle(
        &bundle,
        &[
            ScriptEntry::new(7, "Vocab", "module Vocab; end"),
            ScriptEntry::new(9, "Main", "rgss_main { SceneManager.run }"),
        ],
        &WriteOptions::default(),
    )
    .unwrap();
    let original = fs::read(&bundle).unwrap();

    let scripts = dir.path().join("Scripts");
    extract_bundle(&bundle, &scripts).unwrap();
    let manifest = write_load_order(&scripts).unwrap();
    assert_eq!(
        fs::read_to_string(manifest).unwrap(),
        "0001 - Vocab.rb\n0002 - Main.rb\n"
    );

    let backups = dir.path().join("Backups");
    let LoaderOutcome::Created { backup } =
        generate_loader_bundle(&bundle, &backups, "Scripts").unwrap();
    assert_eq!(fs::read_dir(&backups).unwrap().count(), 1);
    assert_eq!(fs::read(&backup).unwrap(), original);

    let entries = read_bundle(&bundle).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].section, LOADER_SECTION);
    assert_eq!(check_extractable(&bundle).unwrap(), Extractability::AlreadyExtracted);

    // rebuilding from the extracted files restores the scripts
    build_bundle(&scripts, &bundle).unwrap();
    let rebuilt = read_bundle(&bundle).unwrap();
    let names: Vec<&str> = rebuilt.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Vocab", "Main"]);
    assert_eq!(rebuilt[1].code, "# encoding: utf-8\nrgss_main { SceneManager.run }");
}

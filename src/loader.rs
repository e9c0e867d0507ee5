//! Loader bundle generation
//!
//! After extraction the original bundle is replaced by a bundle holding a
//! single script: a small Ruby loader that reads the load order file from the
//! scripts folder and loads the external files at game start.
//!
//! The loader source is plain template substitution, see
//! [`loader_script_source`].

use std::path::{Path, PathBuf};

use crate::backup::create_backup;
use crate::bundle::{write_bundle, WriteOptions};
use crate::error::Result;
use crate::script::ScriptEntry;
use crate::section::LOADER_SECTION;

/// Display name of the loader entry
pub const LOADER_SCRIPT_NAME: &str = "Script Loader";

const SCRIPTS_FOLDER_PLACEHOLDER: &str = "{{SCRIPTS_FOLDER}}";
const LOAD_ORDER_PLACEHOLDER: &str = "{{LOAD_ORDER_FILE}}";

/// Ruby source of the loader; runs unchanged on RGSS1, RGSS2 and RGSS3
const LOADER_TEMPLATE: &str = r##"# encoding: utf-8
#==============================================================================
# ** Script Loader
#------------------------------------------------------------------------------
#  Generated file. Loads the scripts listed in the load order file of the
#  scripts folder instead of the scripts stored in this bundle.
#==============================================================================

module ScriptLoader
  SCRIPTS_FOLDER = '{{SCRIPTS_FOLDER}}'
  LOAD_ORDER_FILE = '{{LOAD_ORDER_FILE}}'
  SCRIPT_EXTENSION = '.rb'
  COMMENT_MARKER = '#'

  @loaded = {}

  def self.rgss_version
    return 3 if RUBY_VERSION >= '1.9'
    return 2 if Graphics.respond_to?(:resize_screen)
    1
  end

  # RGSS1 and RGSS2 open a message box for every print call
  def self.log(message)
    return unless rgss_version == 3
    print("[ScriptLoader] #{message}\n")
  end

  def self.run
    @loaded = {}
    order = File.join(SCRIPTS_FOLDER, LOAD_ORDER_FILE)
    log("RGSS#{rgss_version} detected, reading '#{order}'")
    File.open(order, 'r') do |file|
      file.each_line do |line|
        entry = line.strip
        next if entry.empty?
        next if entry[0, 1] == COMMENT_MARKER
        load_path(File.join(SCRIPTS_FOLDER, entry))
      end
    end
    if @loaded.empty?
      raise "No scripts were loaded, check the load order file '#{order}'"
    end
    log("#{@loaded.size} scripts loaded")
  end

  def self.load_path(path)
    path = File.expand_path(path, Dir.pwd)
    return if @loaded[path]
    if File.directory?(path)
      Dir.entries(path).sort.each do |child|
        next if child == '.' || child == '..'
        child_path = File.join(path, child)
        next unless File.directory?(child_path) ||
                    File.extname(child).downcase == SCRIPT_EXTENSION
        load_path(child_path)
      end
    else
      load_script(path)
    end
  end

  def self.load_script(path)
    @loaded[path] = true
    log("Loading '#{path}'")
    Kernel.send(:load, path)
  end
end

ScriptLoader.run
"##;

/// Result of replacing a bundle with the loader bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderOutcome {
    /// The bundle was replaced; `backup` holds the previous contents
    Created { backup: PathBuf },
}

/// Quote a value as a single-quoted Ruby string body
fn escape_ruby_single_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Render the loader script for a scripts folder and manifest name
///
/// `scripts_folder` is relative to the game executable and uses `/`.
pub fn loader_script_source(scripts_folder: &str, manifest_name: &str) -> String {
    LOADER_TEMPLATE
        .replace(
            SCRIPTS_FOLDER_PLACEHOLDER,
            &escape_ruby_single_quoted(scripts_folder),
        )
        .replace(LOAD_ORDER_PLACEHOLDER, &escape_ruby_single_quoted(manifest_name))
}

/// The single entry of a loader bundle
pub fn loader_entry(scripts_folder: &str, manifest_name: &str) -> ScriptEntry {
    ScriptEntry::new(
        LOADER_SECTION,
        LOADER_SCRIPT_NAME,
        loader_script_source(scripts_folder, manifest_name),
    )
}

/// Back up `bundle_path` and replace it with the loader bundle
///
/// The backup is written to `backup_dir` first; if it fails the bundle is
/// left untouched.
pub fn generate_loader_bundle(
    bundle_path: &Path,
    backup_dir: &Path,
    scripts_dir_relative: &str,
) -> Result<LoaderOutcome> {
    generate_loader_bundle_with(
        bundle_path,
        backup_dir,
        scripts_dir_relative,
        &WriteOptions::default(),
    )
}

/// Generate the loader bundle with explicit encoding options
pub fn generate_loader_bundle_with(
    bundle_path: &Path,
    backup_dir: &Path,
    scripts_dir_relative: &str,
    options: &WriteOptions,
) -> Result<LoaderOutcome> {
    let backup = create_backup(bundle_path, backup_dir)?;

    let entry = loader_entry(scripts_dir_relative, crate::load_order::LOAD_ORDER_FILE);
    write_bundle(bundle_path, std::slice::from_ref(&entry), options)?;

    tracing::info!(
        "Replaced {} with loader bundle for '{}'",
        bundle_path.display(),
        scripts_dir_relative
    );
    Ok(LoaderOutcome::Created { backup })
}

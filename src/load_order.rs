//! Load order manifest
//!
//! The loader script reads `load_order.txt` from the scripts folder and loads
//! every listed path in order. Lines starting with `#` are skipped by the
//! loader, so users can disable a script by commenting it out; the file is
//! still regenerated wholesale on every extraction or rebuild.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::utils::{collect_script_files, to_engine_path};

/// File name of the manifest inside the scripts folder
pub const LOAD_ORDER_FILE: &str = "load_order.txt";

/// Render the manifest contents for a list of relative script paths
pub fn render_load_order<P: AsRef<Path>>(scripts: &[P]) -> String {
    scripts
        .iter()
        .map(|path| format!("{}\n", to_engine_path(path.as_ref())))
        .collect()
}

/// Write `load_order.txt` listing every script under `scripts_dir`
///
/// Returns the manifest path. Any previous manifest is replaced.
pub fn write_load_order(scripts_dir: &Path) -> Result<PathBuf> {
    let scripts = collect_script_files(scripts_dir, true)?;
    let manifest = scripts_dir.join(LOAD_ORDER_FILE);
    fs::write(&manifest, render_load_order(&scripts))?;

    tracing::info!(
        "Wrote load order with {} scripts to {}",
        scripts.len(),
        manifest.display()
    );
    Ok(manifest)
}

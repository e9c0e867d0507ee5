//! # rgss-scripts
//!
//! A Rust library for editing RPG Maker XP, VX and VX Ace scripts as plain
//! files.
//!
//! ## Overview
//!
//! RPG Maker stores all Ruby scripts of a game in one bundle
//! (`Data/Scripts.rxdata`, `Scripts.rvdata` or `Scripts.rvdata2`): a Marshal
//! dump of `[section, name, zlib(code)]` triples. This library provides:
//!
//! - Reading and writing bundles, including a Marshal 4.8 codec
//! - Extracting every script to its own `.rb` file
//! - Rebuilding a bundle from a folder of script files
//! - A loader bundle that loads the external files at game start, in the
//!   order given by `load_order.txt`
//! - Timestamped backups before a bundle is replaced
//!
//! ## Example - Extracting
//!
//! ```rust,no_run
//! use std::path::Path;
//! use rgss_scripts::{extract_bundle, generate_loader_bundle, write_load_order};
//!
//! fn main() -> anyhow::Result<()> {
//!     let bundle = Path::new("Game/Data/Scripts.rvdata2");
//!     let scripts = Path::new("Game/Scripts");
//!
//!     extract_bundle(bundle, scripts)?;
//!     write_load_order(scripts)?;
//!     generate_loader_bundle(bundle, Path::new("Game/Backups"), "Scripts")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Example - Rebuilding
//!
//! ```rust,no_run
//! use std::path::Path;
//! use rgss_scripts::build_bundle;
//!
//! fn main() -> anyhow::Result<()> {
//!     build_bundle(Path::new("Game/Scripts"), Path::new("Game/Data/Scripts.rvdata2"))?;
//!     Ok(())
//! }
//! ```
//!
//! ## Example - Projects
//!
//! ```rust,no_run
//! use std::path::Path;
//! use rgss_scripts::{EditorConfig, ProjectLayout};
//!
//! fn main() -> anyhow::Result<()> {
//!     let project = Path::new("Game");
//!     let layout = ProjectLayout::open(project, &EditorConfig::load(project)?)?;
//!     println!("{} at {}", layout.version, layout.bundle.display());
//!     Ok(())
//! }
//! ```

pub mod backup;
pub mod builder;
pub mod bundle;
pub mod bundle_utils;
pub mod compression;
pub mod config;
pub mod error;
pub mod extract;
pub mod load_order;
pub mod loader;
pub mod marshal;
pub mod naming;
pub mod project;
pub mod script;
pub mod section;
pub mod utils;

pub use backup::create_backup;
pub use builder::{build_bundle, build_bundle_with, BuildOutcome};
pub use bundle::{read_bundle, write_bundle, WriteOptions};
pub use config::EditorConfig;
pub use error::{Error, Result};
pub use extract::{
    check_extractable, extract_bundle, extract_bundle_with, ExtractOptions, ExtractOutcome,
    Extractability,
};
pub use load_order::{write_load_order, LOAD_ORDER_FILE};
pub use loader::{generate_loader_bundle, generate_loader_bundle_with, LoaderOutcome};
pub use naming::{deformat_script_name, format_script_name};
pub use project::{ProjectLayout, RgssVersion};
pub use script::ScriptEntry;
pub use section::{generate_section_id, SectionAllocator, LOADER_SECTION};
pub use utils::{collect_files, create_glob_matcher, format_size, matches_filter};

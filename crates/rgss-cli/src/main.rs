//! rgss-scripts - Edit RPG Maker script bundles as plain files
//!
//! Usage:
//!   rgss-scripts extract <project>           - Extract scripts and install the loader
//!   rgss-scripts build <project> [-o out]    - Rebuild a full bundle from the scripts folder
//!   rgss-scripts loader <project>            - Replace the bundle with the loader bundle
//!   rgss-scripts load-order <project>        - Regenerate load_order.txt
//!   rgss-scripts list <bundle> [filter]      - List scripts in a bundle
//!   rgss-scripts info <project>              - Show project information

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use rgss_scripts::bundle_utils::{
    build_project, create_loader, extract_project, list_scripts, show_info, write_manifest,
};
use rgss_scripts::EditorConfig;

#[derive(Parser)]
#[command(name = "rgss-scripts")]
#[command(version)]
#[command(about = "Extract, rebuild and load RPG Maker XP/VX/VX Ace scripts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log every processed script
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract all scripts and replace the bundle with the loader
    Extract {
        /// Project root (folder holding Game.exe)
        project: PathBuf,
    },
    /// Rebuild a full bundle from the scripts folder
    Build {
        /// Project root
        project: PathBuf,
        /// Output bundle (default: the project's bundle, backed up first)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Back up the bundle and replace it with the loader bundle
    Loader {
        /// Project root
        project: PathBuf,
    },
    /// Regenerate load_order.txt from the scripts folder
    LoadOrder {
        /// Project root
        project: PathBuf,
    },
    /// List scripts in a bundle
    List {
        /// Path to Scripts.rxdata/.rvdata/.rvdata2
        bundle: PathBuf,
        /// Filter pattern on script names (e.g., Scene_*, Window)
        filter: Option<String>,
    },
    /// Show project information
    Info {
        /// Project root
        project: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_target(false)
        .init();
}

fn load_config(project: &Path) -> Result<EditorConfig> {
    Ok(EditorConfig::load(project)?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Extract { project } => {
            extract_project(&project, &load_config(&project)?)?;
        }
        Commands::Build { project, output } => {
            build_project(&project, &load_config(&project)?, output.as_deref())?;
        }
        Commands::Loader { project } => {
            create_loader(&project, &load_config(&project)?)?;
        }
        Commands::LoadOrder { project } => {
            write_manifest(&project, &load_config(&project)?)?;
        }
        Commands::List { bundle, filter } => {
            list_scripts(&bundle, filter.as_deref())?;
        }
        Commands::Info { project } => {
            show_info(&project, &load_config(&project)?)?;
        }
    }

    Ok(())
}

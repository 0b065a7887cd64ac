//! Command line arguments

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Settings file location relative to the vault root
pub(crate) const DEFAULT_SETTINGS: &str = ".longform/settings.json";

/// Discover drafts, inspect workflows and compile manuscripts
#[derive(Parser, Debug)]
#[command(name = "longform", version, about)]
pub(crate) struct Cli {
    /// Vault root directory
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub(crate) vault: PathBuf,

    /// Settings file (defaults to <vault>/.longform/settings.json)
    #[arg(long, value_name = "FILE")]
    pub(crate) settings: Option<PathBuf>,

    /// Folder of user scripts, overriding the settings
    #[arg(long, value_name = "FOLDER")]
    pub(crate) scripts: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    pub(crate) log_json: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

impl Cli {
    pub(crate) fn settings_path(&self) -> PathBuf {
        self.settings
            .clone()
            .unwrap_or_else(|| self.vault.join(DEFAULT_SETTINGS))
    }
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// List drafts and their scenes
    Drafts {
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// List workflows and their steps
    Workflows,
    /// Check every workflow against the available steps
    Validate,
    /// Compile a draft into one manuscript
    Compile {
        /// Index note of the draft, relative to the vault
        #[arg(long)]
        draft: String,

        /// Workflow name (defaults to the draft's own or the format default)
        #[arg(long)]
        workflow: Option<String>,

        /// Write the manuscript here instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CONFIG_FILE;

/// Bundle, prefix, minify and fingerprint styles and scripts.
///
/// Without a subcommand: build everything, lint, then watch for changes.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, searched upward from the current directory
    #[arg(short = 'C', long, global = true, default_value = CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Exit non-zero on compile errors and lint findings
    #[arg(long, global = true)]
    pub strict: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build the stylesheet
    #[command(visible_alias = "css")]
    Style,

    /// Build script bundles
    #[command(visible_alias = "js")]
    Script {
        /// Only build the bundle with this name
        name: Option<String>,
    },

    /// Check scripts and the config file
    Lint,

    /// Rebuild on changes until Ctrl+C
    #[command(visible_alias = "w")]
    Watch,

    /// Write a starter config file
    Init {
        /// Print the config template instead of writing it
        #[arg(long)]
        dry: bool,

        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}

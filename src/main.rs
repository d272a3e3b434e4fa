//! bustle - cache-busting asset pipeline for styles and scripts.

mod asset;
mod cli;
mod config;
mod core;
mod lint;
mod logger;
mod record;
mod utils;
mod watch;

use std::sync::Arc;

use anyhow::{Result, bail};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PipelineConfig;
use record::RecordWriter;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let ok = match &cli.command {
        Some(Commands::Init { dry, force }) => {
            cli::init::init_project(&cli.config, *dry, *force)?;
            true
        }
        Some(Commands::Style) => {
            let (config, records) = load(&cli)?;
            let results = cli::build::run_style(&config, &records).into_iter().collect();
            cli::build::report(results, &config)?
        }
        Some(Commands::Script { name }) => {
            let (config, records) = load(&cli)?;
            let results = cli::build::run_scripts(&config, &records, name.as_deref())?;
            cli::build::report(results, &config)?
        }
        Some(Commands::Lint) => {
            let (config, _) = load(&cli)?;
            cli::lint::run_lint(&config)
        }
        Some(Commands::Watch) => {
            let (config, records) = load(&cli)?;
            cli::watch::watch(Arc::new(config), records)?;
            true
        }
        None => {
            let (config, records) = load(&cli)?;
            run_default(config, records)?
        }
    };

    if cli.strict && !ok {
        bail!("finished with errors");
    }
    Ok(())
}

/// Find and load the config, then start the record writer.
fn load(cli: &Cli) -> Result<(PipelineConfig, RecordWriter)> {
    let config = PipelineConfig::discover(&cli.config)?;
    logger::set_beep(config.alert.beep);
    debug!("config"; "loaded {}", config.config_path.display());
    Ok((config, RecordWriter::spawn()?))
}

/// Build everything and lint once, then watch.
///
/// A failed initial build is logged; watching starts regardless.
fn run_default(config: PipelineConfig, records: RecordWriter) -> Result<bool> {
    let built = cli::build::report(cli::build::run_all(&config, &records), &config)
        .unwrap_or_else(|e| {
            log!("error"; "{e:#}");
            false
        });
    let clean = cli::lint::run_lint(&config);
    cli::watch::watch(Arc::new(config), records)?;
    Ok(built && clean)
}

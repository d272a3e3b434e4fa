//! Watch command: rebuild on change until Ctrl+C.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use rayon::prelude::*;

use super::build::{report_watch, run_script, run_style};
use crate::config::PipelineConfig;
use crate::logger::status_detach;
use crate::record::RecordWriter;
use crate::watch::{Target, WatchRegistry};
use crate::{core, log};

/// Watch until Ctrl+C, then stop the registry.
pub fn watch(config: Arc<PipelineConfig>, records: RecordWriter) -> Result<()> {
    let shutdown = core::shutdown_signal();

    let handler_config = Arc::clone(&config);
    let mut registry = WatchRegistry::start(&config, move |targets| {
        rebuild(&handler_config, &records, targets);
    })
    .context("failed to start watching")?;

    let roots: Vec<_> = registry
        .roots()
        .iter()
        .map(|r| config.root_relative(r).display().to_string())
        .map(|r| if r.is_empty() { ".".to_string() } else { r })
        .collect();
    log!("watch"; "watching {} (Ctrl+C to stop)", roots.join(", "));

    // Sender lives in a static, so this only returns on Ctrl+C.
    let _ = shutdown.recv();
    registry.stop();
    log!("watch"; "stopped");
    Ok(())
}

/// Build every asset target of one batch in parallel, then lint.
///
/// Lint prints to stderr, so it runs after the status updates of the builds.
fn rebuild(config: &PipelineConfig, records: &RecordWriter, targets: &BTreeSet<Target>) {
    if core::is_shutdown() {
        return;
    }
    targets.par_iter().for_each(|target| match target {
        Target::Style => report_watch(run_style(config, records).into_iter().collect(), config),
        Target::Script(name) => {
            report_watch(run_script(config, records, name).into_iter().collect(), config)
        }
        Target::Lint => {}
    });
    if targets.contains(&Target::Lint) {
        status_detach();
        super::lint::run_lint(config);
    }
}

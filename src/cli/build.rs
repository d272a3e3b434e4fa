//! Style and script builds, shared by one-shot commands and watch mode.

use anyhow::{Result, bail};
use rayon::prelude::*;

use crate::asset::{BuildReport, Pipeline, PipelineError};
use crate::config::{PipelineConfig, StyleConfig};
use crate::logger::{alert, status_error, status_success, status_unchanged};
use crate::record::RecordWriter;
use crate::{debug, log};

/// Outcome of building one asset class.
pub struct ClassResult {
    pub name: String,
    pub result: Result<BuildReport, PipelineError>,
}

/// Build the stylesheet, or `None` when no style sources are configured.
pub fn run_style(config: &PipelineConfig, records: &RecordWriter) -> Option<ClassResult> {
    if !config.style.is_enabled() {
        debug!("style"; "no sources configured, skipping");
        return None;
    }
    let result = Pipeline::style(config, records.clone()).and_then(|p| p.run());
    Some(ClassResult {
        name: StyleConfig::NAME.into(),
        result,
    })
}

/// Build one named script bundle.
pub fn run_script(config: &PipelineConfig, records: &RecordWriter, name: &str) -> Option<ClassResult> {
    let bundle = config.script(name)?;
    let result = Pipeline::script_bundle(bundle, config, records.clone()).run();
    Some(ClassResult {
        name: bundle.name.clone(),
        result,
    })
}

/// Build every script bundle in parallel, or just `only`.
pub fn run_scripts(
    config: &PipelineConfig,
    records: &RecordWriter,
    only: Option<&str>,
) -> Result<Vec<ClassResult>> {
    if let Some(name) = only {
        return match run_script(config, records, name) {
            Some(result) => Ok(vec![result]),
            None => {
                let known: Vec<_> = config.scripts.iter().map(|s| s.name.as_str()).collect();
                bail!("no script bundle named `{name}` (configured: {})", known.join(", "))
            }
        };
    }

    if config.scripts.is_empty() {
        debug!("script"; "no bundles configured, skipping");
    }
    Ok(config
        .scripts
        .par_iter()
        .map(|bundle| ClassResult {
            name: bundle.name.clone(),
            result: Pipeline::script_bundle(bundle, config, records.clone()).run(),
        })
        .collect())
}

/// Style and all scripts, side by side.
pub fn run_all(config: &PipelineConfig, records: &RecordWriter) -> Vec<ClassResult> {
    let (style, scripts) = rayon::join(
        || run_style(config, records),
        || run_scripts(config, records, None),
    );
    // Without a name filter `run_scripts` cannot fail.
    style.into_iter().chain(scripts.unwrap_or_default()).collect()
}

/// Counts from logging a batch of results.
#[derive(Default)]
pub struct BuildSummary {
    pub built: usize,
    /// Classes that hit a compile error.
    pub failed: usize,
    /// Filesystem, record and target errors, in result order.
    pub fatal: Vec<anyhow::Error>,
}

/// Log every result: successes as lines, compile errors as alerts.
///
/// Fatal errors are collected, not logged, so the caller decides how
/// to surface them.
pub fn log_results(results: Vec<ClassResult>, config: &PipelineConfig) -> BuildSummary {
    let mut summary = BuildSummary::default();
    for ClassResult { name, result } in results {
        match result {
            Ok(report) => {
                log!(report.kind.label(); "{}", describe(&report, config));
                summary.built += 1;
            }
            Err(e) if e.is_recoverable() => {
                alert(&name, &e.to_string());
                summary.failed += 1;
            }
            Err(e) => summary
                .fatal
                .push(anyhow::Error::new(e).context(format!("{name} failed"))),
        }
    }
    summary
}

/// Log results of a one-shot build.
///
/// Every result is reported before the first filesystem or record error is
/// returned; later ones are logged. Returns whether every class built.
pub fn report(results: Vec<ClassResult>, config: &PipelineConfig) -> Result<bool> {
    let summary = log_results(results, config);
    let mut fatal = summary.fatal.into_iter();
    match fatal.next() {
        Some(first) => {
            for e in fatal {
                log!("error"; "{e:#}");
            }
            Err(first)
        }
        None => Ok(summary.failed == 0),
    }
}

/// Show results on the watch status line. Nothing here stops watching.
pub fn report_watch(results: Vec<ClassResult>, config: &PipelineConfig) {
    for ClassResult { name, result } in results {
        match result {
            Ok(report) if report.changed() => status_success(&describe(&report, config)),
            Ok(report) => status_unchanged(&format!("{}: unchanged ({})", report.name, report.fingerprint)),
            Err(e) => {
                status_error(&format!("{name} failed"), &e.to_string());
                if e.is_recoverable() {
                    alert(&name, "build failed, keeping previous artifacts");
                }
            }
        }
    }
}

fn describe(report: &BuildReport, config: &PipelineConfig) -> String {
    let minified = report
        .minified
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!(
        "{} -> {}, {} ({}{}) in {}ms",
        report.name,
        config.root_relative(&report.artifact).display(),
        minified,
        report.fingerprint,
        if report.changed() { "" } else { ", unchanged" },
        report.elapsed.as_millis()
    )
}

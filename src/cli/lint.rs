//! Lint command.

use crate::config::PipelineConfig;
use crate::lint::lint_project;
use crate::log;

/// Lint once and print findings. Returns whether everything was clean.
pub fn run_lint(config: &PipelineConfig) -> bool {
    let report = lint_project(config);
    report.print();
    log!("lint"; "{}", report.summary());
    report.is_clean()
}

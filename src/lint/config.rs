//! Checks for the pipeline config file itself.

use std::path::Path;

use super::Finding;
use crate::config::{ConfigError, PipelineConfig};

/// Report TOML errors, unknown keys and validation problems.
pub fn check_config(content: &str, root: &Path) -> Vec<Finding> {
    let ignored = match PipelineConfig::parse_with_ignored(content) {
        Ok((_, ignored)) => ignored,
        Err(e) => {
            let offset = e.span().map_or(0, |span| span.start);
            return vec![Finding::at(content, offset, e.message().trim(), "toml")];
        }
    };

    let mut findings: Vec<Finding> = ignored
        .iter()
        .map(|key| {
            let line = locate_key(content, key).unwrap_or(1);
            Finding::new(line, 1, format!("unknown key `{key}`"), "unknown-key")
        })
        .collect();

    if let Err(ConfigError::Diagnostics(diag)) = PipelineConfig::from_str(content, root) {
        for error in diag.errors() {
            let line = locate_key(content, error.field.as_str()).unwrap_or(1);
            findings.push(Finding::new(
                line,
                1,
                format!("`{}` {}", error.field.as_str(), error.message),
                "config",
            ));
        }
    }

    findings.sort_by_key(|f| f.line);
    findings
}

/// Best-effort line of the last segment of a dotted key path.
fn locate_key(content: &str, path: &str) -> Option<usize> {
    let leaf = path.rsplit('.').next()?;
    let leaf = leaf.split('[').next().unwrap_or(leaf);
    content.lines().position(|line| {
        let line = line.trim_start().trim_start_matches('[');
        line.strip_prefix(leaf)
            .is_some_and(|rest| rest.trim_start().starts_with(['=', ']']))
    })
    .map(|i| i + 1)
}

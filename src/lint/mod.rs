//! Advisory lint of script sources and the pipeline config.
//!
//! Lint never blocks a build: findings are printed and counted, and only
//! `--strict` turns them into a failing exit status.

mod config;
mod report;
mod script;

pub use config::check_config;
pub use report::LintReport;
pub use script::check_script;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobSet, GlobSetBuilder};
use jwalk::WalkDir;
use rayon::prelude::*;

use crate::config::PipelineConfig;
use crate::utils::path::{compile_glob, to_slash};

/// A single lint finding, 1-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub line: usize,
    pub column: usize,
    pub message: String,
    pub rule: &'static str,
}

impl Finding {
    pub fn new(line: usize, column: usize, message: impl Into<String>, rule: &'static str) -> Self {
        Self {
            line,
            column,
            message: message.into(),
            rule,
        }
    }

    /// Finding at a byte offset of `source`.
    pub fn at(source: &str, offset: usize, message: impl Into<String>, rule: &'static str) -> Self {
        let (line, column) = position(source, offset);
        Self::new(line, column, message, rule)
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {} [{}]", self.line, self.column, self.message, self.rule)
    }
}

/// Convert a byte offset to a 1-based line and column (in chars).
pub fn position(source: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

/// Lint every configured script plus (optionally) the config file.
pub fn lint_project(config: &PipelineConfig) -> LintReport {
    let files = collect_files(config.get_root(), &config.lint.files, &config.output.build_dir);
    let rules = config.lint.rules;

    let mut results: Vec<(PathBuf, Vec<Finding>)> = files
        .par_iter()
        .map(|path| {
            let findings = match fs::read_to_string(path) {
                Ok(source) => check_script(&source, rules),
                Err(e) => vec![Finding::new(1, 1, format!("cannot read file: {e}"), "io")],
            };
            (path.clone(), findings)
        })
        .collect();

    if config.lint.config && config.config_path.is_file() {
        let findings = match fs::read_to_string(&config.config_path) {
            Ok(content) => check_config(&content, config.get_root()),
            Err(e) => vec![Finding::new(1, 1, format!("cannot read file: {e}"), "io")],
        };
        results.push((config.config_path.clone(), findings));
    }

    let mut report = LintReport::default();
    for (path, findings) in results {
        report.add(config.root_relative(&path), findings);
    }
    report
}

/// Files under `root` whose root-relative path matches any pattern.
///
/// Hidden entries and the build directory are skipped. Results are sorted.
pub fn collect_files(root: &Path, patterns: &[String], build_dir: &Path) -> Vec<PathBuf> {
    let Some(globs) = build_globset(patterns) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .skip_hidden(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .filter(|path| !path.starts_with(build_dir))
        .filter(|path| {
            path.strip_prefix(root)
                .is_ok_and(|rel| globs.is_match(to_slash(rel)))
        })
        .collect();
    files.sort();
    files
}

/// Compile glob patterns, skipping invalid ones (config validation reports them).
pub fn build_globset(patterns: &[String]) -> Option<GlobSet> {
    if patterns.is_empty() {
        return None;
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        if let Ok(glob) = compile_glob(pattern) {
            builder.add(glob);
        }
    }
    builder.build().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_position() {
        let source = "var a;\nvar b = 1;\n  debugger;";
        assert_eq!(position(source, 0), (1, 1));
        assert_eq!(position(source, 7), (2, 1));
        assert_eq!(position(source, 13), (2, 7));
        assert_eq!(position(source, 20), (3, 3));
        assert_eq!(position(source, 999), (3, 12));
    }

    #[test]
    fn test_position_multibyte() {
        let source = "// é\nx";
        assert_eq!(position(source, 4), (1, 4));
        assert_eq!(position(source, 6), (2, 1));
    }

    #[test]
    fn test_finding_display() {
        let finding = Finding::new(3, 5, "unexpected `debugger` statement", "debugger");
        assert_eq!(finding.to_string(), "3:5 unexpected `debugger` statement [debugger]");
    }

    #[test]
    fn test_collect_files_matches_globs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        for rel in ["js/script.js", "js/plugins.js", "js/libs/observer.js", "build/app.js", "css/a.css"] {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }

        let files = collect_files(root, &["js/*.js".into()], &root.join("build"));
        assert_eq!(files, vec![root.join("js/plugins.js"), root.join("js/script.js")]);

        let all = collect_files(root, &["**/*.js".into()], &root.join("build"));
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_lint_project_reports_per_file() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("js")).unwrap();
        fs::write(root.join("js/clean.js"), "var a = 1;\n").unwrap();
        fs::write(root.join("js/dirty.js"), "if (a == 1) { debugger; }\n").unwrap();
        fs::write(root.join(crate::config::CONFIG_FILE), "[lint]\nfiles = [\"js/*.js\"]\n").unwrap();

        let config = PipelineConfig::load(&root.join(crate::config::CONFIG_FILE)).unwrap();
        let report = lint_project(&config);
        assert_eq!(report.file_count(), 3);
        assert_eq!(report.finding_count(), 2);
        assert!(!report.is_clean());
    }
}

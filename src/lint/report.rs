//! Lint report: findings grouped by file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use owo_colors::OwoColorize;

use super::Finding;

#[derive(Debug, Default)]
pub struct LintReport {
    /// Findings per checked file, root-relative. Clean files map to an empty list.
    files: BTreeMap<PathBuf, Vec<Finding>>,
}

impl LintReport {
    pub fn add(&mut self, path: PathBuf, findings: Vec<Finding>) {
        self.files.entry(path).or_default().extend(findings);
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn finding_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.finding_count() == 0
    }

    /// `path:line:col message [rule]`, one per line.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.files.iter().flat_map(|(path, findings)| {
            findings
                .iter()
                .map(move |f| format!("{}:{f}", path.display()))
        })
    }

    /// Print findings to stderr, grouped by file.
    pub fn print(&self) {
        for (path, findings) in &self.files {
            if findings.is_empty() {
                continue;
            }
            eprintln!("{}{}{}", "[".dimmed(), path.display().cyan(), "]".dimmed());
            for f in findings {
                eprintln!(
                    "{} {}:{}:{} {} {}",
                    "→".magenta(),
                    path.display(),
                    f.line,
                    f.column,
                    f.message,
                    format!("[{}]", f.rule).dimmed()
                );
            }
        }
    }

    /// One-line summary, e.g. `2 findings in 1 of 3 files`.
    pub fn summary(&self) -> String {
        let dirty = self.files.values().filter(|f| !f.is_empty()).count();
        let findings = self.finding_count();
        if findings == 0 {
            format!("{} clean", count(self.file_count(), "file"))
        } else {
            format!(
                "{} in {dirty} of {}",
                count(findings, "finding"),
                count(self.file_count(), "file")
            )
        }
    }
}

fn count(n: usize, noun: &str) -> String {
    if n == 1 { format!("1 {noun}") } else { format!("{n} {noun}s") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_and_lines() {
        let mut report = LintReport::default();
        report.add("js/clean.js".into(), vec![]);
        report.add(
            "js/dirty.js".into(),
            vec![Finding::new(2, 5, "expected `===` instead of `==`", "eqeqeq")],
        );

        assert_eq!(report.summary(), "1 finding in 1 of 2 files");
        let lines: Vec<_> = report.lines().collect();
        assert_eq!(lines, ["js/dirty.js:2:5 expected `===` instead of `==` [eqeqeq]"]);
    }

    #[test]
    fn test_clean_summary() {
        let mut report = LintReport::default();
        report.add("js/a.js".into(), vec![]);
        assert!(report.is_clean());
        assert_eq!(report.summary(), "1 file clean");
    }
}

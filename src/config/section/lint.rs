//! `[lint]` section: advisory script checks.
//!
//! # Example
//!
//! ```toml
//! [lint]
//! files = ["js/*.js"]
//! config = true
//!
//! [lint.rules]
//! eqeqeq = true
//! debugger = true
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Globs (relative to the project root) of scripts to check.
    pub files: Vec<String>,
    /// Also check the configuration file itself.
    pub config: bool,
    pub rules: LintRules,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            files: vec!["js/*.js".into()],
            config: true,
            rules: LintRules::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LintRules {
    /// Flag loose `==` / `!=` comparisons.
    pub eqeqeq: bool,
    /// Flag `debugger` statements.
    pub debugger: bool,
}

impl Default for LintRules {
    fn default() -> Self {
        Self {
            eqeqeq: true,
            debugger: true,
        }
    }
}

impl LintConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        super::validate_globs(diag, FieldPath::new("lint.files"), &self.files);
    }
}

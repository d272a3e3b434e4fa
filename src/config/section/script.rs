//! `[[script]]` entries: one per script bundle.
//!
//! # Example
//!
//! ```toml
//! [[script]]
//! name = "app"
//! sources = [
//!     "js/libs/fontfaceobserver.standalone.js",
//!     "js/plugins.js",
//!     "js/script.js",
//! ]
//! dest = "app.js"
//! record = "js_hashsum.yml"
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// Bundle name, used on the command line and as default record key.
    pub name: String,
    /// Source files, concatenated in this order.
    pub sources: Vec<PathBuf>,
    pub dest: String,
    pub record: String,
    pub key: Option<String>,
    pub separator: String,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            name: "app".into(),
            sources: Vec::new(),
            dest: "app.js".into(),
            record: "js_hashsum.yml".into(),
            key: None,
            separator: "\n".into(),
        }
    }
}

impl ScriptConfig {
    pub fn key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.name)
    }

    fn validate(&self, index: usize, diag: &mut ConfigDiagnostics) {
        if self.name.trim().is_empty() {
            diag.error(FieldPath::script(index, "name"), "must not be empty");
        }
        if self.sources.is_empty() {
            diag.error_with_hint(
                FieldPath::script(index, "sources"),
                "is empty",
                "list the files to bundle, in concatenation order",
            );
        }
        super::validate_filename(diag, FieldPath::script(index, "dest"), &self.dest);
        super::validate_filename(diag, FieldPath::script(index, "record"), &self.record);
    }

    fn normalize(&mut self, root: &Path) {
        self.sources = self.sources.iter().map(|p| root.join(p)).collect();
    }
}

/// Validate every bundle, then check names and destinations are unique.
pub fn validate_scripts(scripts: &[ScriptConfig], diag: &mut ConfigDiagnostics) {
    let mut names = FxHashSet::default();
    let mut dests = FxHashSet::default();

    for (index, script) in scripts.iter().enumerate() {
        script.validate(index, diag);

        if !names.insert(script.name.as_str()) {
            diag.error(
                FieldPath::script(index, "name"),
                format!("duplicate bundle name `{}`", script.name),
            );
        }
        if !dests.insert(script.dest.as_str()) {
            diag.error_with_hint(
                FieldPath::script(index, "dest"),
                format!("`{}` is already written by another bundle", script.dest),
                "each bundle needs its own destination",
            );
        }
    }
}

pub fn normalize_scripts(scripts: &mut [ScriptConfig], root: &Path) {
    for script in scripts {
        script.normalize(root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(name: &str, dest: &str) -> ScriptConfig {
        ScriptConfig {
            name: name.into(),
            sources: vec![format!("js/{name}.js").into()],
            dest: dest.into(),
            ..ScriptConfig::default()
        }
    }

    #[test]
    fn test_key_defaults_to_name() {
        let script = bundle("vendor", "vendor.js");
        assert_eq!(script.key(), "vendor");
    }

    #[test]
    fn test_duplicate_names_and_dests() {
        let scripts = vec![bundle("app", "app.js"), bundle("app", "app.js")];
        let mut diag = ConfigDiagnostics::new();
        validate_scripts(&scripts, &mut diag);
        let fields: Vec<_> = diag.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["script[1].name", "script[1].dest"]);
    }

    #[test]
    fn test_empty_sources() {
        let scripts = vec![ScriptConfig::default()];
        let mut diag = ConfigDiagnostics::new();
        validate_scripts(&scripts, &mut diag);
        assert_eq!(diag.errors()[0].field.as_str(), "script[0].sources");
    }
}

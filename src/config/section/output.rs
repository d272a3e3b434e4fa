//! `[output]` section: where artifacts and fingerprint records land.
//!
//! # Example
//!
//! ```toml
//! [output]
//! build_dir = "build"
//! hash_dir = "../templates/_data"
//! minify_suffix = ".min"
//! record_format = "yaml"
//! hash_length = 8
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Serialization of fingerprint record files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// One `key: hash` line per asset class.
    #[default]
    Yaml,
    /// A flat JSON object.
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for unminified and minified artifacts.
    pub build_dir: PathBuf,
    /// Directory for fingerprint record files (read by the templating layer).
    pub hash_dir: PathBuf,
    /// Inserted before the final extension of minified artifacts.
    pub minify_suffix: String,
    pub record_format: RecordFormat,
    /// Number of hex characters kept from the content digest.
    pub hash_length: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            build_dir: "build".into(),
            hash_dir: "../templates/_data".into(),
            minify_suffix: ".min".into(),
            record_format: RecordFormat::Yaml,
            hash_length: 8,
        }
    }
}

impl OutputConfig {
    pub const MIN_HASH_LENGTH: usize = 4;
    pub const MAX_HASH_LENGTH: usize = 64;

    /// Validate output settings. Directories must already be resolved against `root`.
    pub fn validate(&self, root: &Path, diag: &mut ConfigDiagnostics) {
        if self.minify_suffix.is_empty() {
            diag.error_with_hint(
                FieldPath::new("output.minify_suffix"),
                "must not be empty",
                "minified artifacts would overwrite the unminified ones",
            );
        } else if self.minify_suffix.contains(['/', '\\']) {
            diag.error(
                FieldPath::new("output.minify_suffix"),
                "must not contain path separators",
            );
        }

        if !(Self::MIN_HASH_LENGTH..=Self::MAX_HASH_LENGTH).contains(&self.hash_length) {
            diag.error(
                FieldPath::new("output.hash_length"),
                format!(
                    "must be between {} and {}, got {}",
                    Self::MIN_HASH_LENGTH,
                    Self::MAX_HASH_LENGTH,
                    self.hash_length
                ),
            );
        }

        if self.build_dir.as_os_str().is_empty() {
            diag.error(FieldPath::new("output.build_dir"), "must not be empty");
        }

        // Changes under the output directories never trigger a rebuild, so
        // they must not swallow the sources.
        let root = lexical(root);
        for (field, dir) in [
            ("output.build_dir", &self.build_dir),
            ("output.hash_dir", &self.hash_dir),
        ] {
            if !dir.as_os_str().is_empty() && root.starts_with(lexical(dir)) {
                diag.error_with_hint(
                    FieldPath::new(field),
                    format!("`{}` contains the project root", dir.display()),
                    "use a subdirectory such as `build`",
                );
            }
        }
    }

    /// Resolve directories against the project root (expanding `~`).
    pub fn normalize(&mut self, root: &Path) {
        self.build_dir = crate::config::util::resolve_dir(root, &self.build_dir);
        self.hash_dir = crate::config::util::resolve_dir(root, &self.hash_dir);
    }
}

/// Collapse `.` and `..` without touching the filesystem.
fn lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

//! `[style]` section: the stylesheet asset class.
//!
//! # Example
//!
//! ```toml
//! [style]
//! sources = [
//!     "css/libs/normalize.css",
//!     "css/libs/helpers.css",
//!     "css/main.less",
//!     "css/libs/print.css",
//! ]
//! dest = "style.css"
//! record = "css_hashsum.yml"
//! compiler = ["lessc", "-"]
//! browsers = ["last 3 version", "> 1%", "ie 8"]
//! compatibility = ["ie 7"]
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Source files, concatenated in this order.
    pub sources: Vec<PathBuf>,
    /// Artifact filename inside `output.build_dir`.
    pub dest: String,
    /// Fingerprint record filename inside `output.hash_dir`.
    pub record: String,
    /// Record key; defaults to `style`.
    pub key: Option<String>,
    /// Joined between concatenated sources.
    pub separator: String,
    /// Globs (relative to the project root) that re-trigger the style build.
    pub watch: Vec<String>,
    /// Preprocessor command reading stdin and writing CSS to stdout.
    /// When absent, sources are treated as plain CSS.
    pub compiler: Option<Vec<String>>,
    /// Browserslist queries used for vendor prefixing.
    pub browsers: Vec<String>,
    /// Browserslist queries the minified output must stay compatible with.
    pub compatibility: Vec<String>,
    /// Insert px fallbacks before declarations using rem units.
    pub rem_fallback: bool,
    /// Pixels per rem for the fallback.
    pub rem_root: f32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            dest: "style.css".into(),
            record: "css_hashsum.yml".into(),
            key: None,
            separator: "\n".into(),
            watch: vec!["css/**/*.{less,css}".into()],
            compiler: None,
            browsers: [
                "last 3 version",
                "> 1%",
                "> 1% in IN",
                "ie 8",
                "ie 7",
                "iOS 5",
            ]
            .map(String::from)
            .to_vec(),
            compatibility: vec!["ie 7".into()],
            rem_fallback: true,
            rem_root: 16.0,
        }
    }
}

impl StyleConfig {
    pub const NAME: &'static str = "style";

    /// Record key for this class.
    pub fn key(&self) -> &str {
        self.key.as_deref().unwrap_or(Self::NAME)
    }

    /// Whether a style class is configured at all.
    pub fn is_enabled(&self) -> bool {
        !self.sources.is_empty()
    }

    /// Validate style configuration.
    ///
    /// # Checks
    /// - `dest` and `record` are plain filenames
    /// - `watch` globs compile
    /// - `compiler` is non-empty and its program is installed
    /// - `browsers` and `compatibility` are valid browserslist queries
    /// - `rem_root` is positive
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.is_enabled() {
            return;
        }

        super::validate_filename(diag, FieldPath::new("style.dest"), &self.dest);
        super::validate_filename(diag, FieldPath::new("style.record"), &self.record);
        super::validate_globs(diag, FieldPath::new("style.watch"), &self.watch);

        if let Some(command) = &self.compiler {
            match command.first() {
                None => diag.error_with_hint(
                    FieldPath::new("style.compiler"),
                    "is empty",
                    "remove it to treat sources as plain CSS",
                ),
                Some(program) if which::which(program).is_err() => diag.error_with_hint(
                    FieldPath::new("style.compiler"),
                    format!("`{program}` not found"),
                    "install the preprocessor or update style.compiler",
                ),
                Some(_) => {}
            }
        }

        for (field, queries) in [
            ("style.browsers", &self.browsers),
            ("style.compatibility", &self.compatibility),
        ] {
            if let Err(e) = crate::asset::style::resolve_targets(queries) {
                diag.error_with_hint(
                    FieldPath::new(field),
                    format!("invalid browserslist query: {e}"),
                    "see https://browsersl.ist for the query syntax",
                );
            }
        }

        if self.rem_fallback && !(self.rem_root.is_finite() && self.rem_root > 0.0) {
            diag.error(
                FieldPath::new("style.rem_root"),
                format!("must be a positive number, got {}", self.rem_root),
            );
        }
    }

    pub fn normalize(&mut self, root: &Path) {
        self.sources = self.sources.iter().map(|p| root.join(p)).collect();
    }
}

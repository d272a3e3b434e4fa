//! Pipeline configuration management for `bustle.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── output     # [output]
//! │   ├── style      # [style]
//! │   ├── script     # [[script]]
//! │   ├── lint       # [lint]
//! │   └── watch      # [watch], [alert]
//! ├── types/         # ConfigError, diagnostics, field paths
//! ├── util.rs        # Config discovery, directory resolution
//! └── mod.rs         # PipelineConfig (this file)
//! ```
//!
//! The loaded [`PipelineConfig`] is immutable and passed explicitly to every
//! pipeline; several configurations can live in one process.

pub mod section;
pub mod types;
pub mod util;

pub use section::{
    AlertConfig, LintConfig, LintRules, OutputConfig, RecordFormat, ScriptConfig, StyleConfig,
    WatchConfig,
};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name.
pub const CONFIG_FILE: &str = "bustle.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing bustle.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub style: StyleConfig,

    #[serde(default, rename = "script")]
    pub scripts: Vec<ScriptConfig>,

    #[serde(default)]
    pub lint: LintConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub alert: AlertConfig,
}

impl PipelineConfig {
    /// Locate the config file (searching upward from cwd) and load it.
    pub fn discover(config_name: &Path) -> Result<Self, ConfigError> {
        let path = util::find_config_file(config_name)
            .ok_or_else(|| ConfigError::NotFound(config_name.to_path_buf()))?;
        Self::load(&path)
    }

    /// Load, normalize and validate configuration from a file.
    ///
    /// Unknown keys are reported as warnings; validation problems are
    /// collected and returned together.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;

        let mut diag = ConfigDiagnostics::new();
        for key in ignored {
            diag.unknown(key);
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        diag.print_warnings(&file_name);

        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        config.config_path = path.to_path_buf();
        config.finalize(&root);
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from a TOML string rooted at `root`, then validate it.
    pub fn from_str(content: &str, root: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.config_path = root.join(CONFIG_FILE);
        config.finalize(root);
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    pub fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), toml::de::Error> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Set the root and resolve every relative path against it.
    fn finalize(&mut self, root: &Path) {
        self.root = root.to_path_buf();
        self.output.normalize(root);
        self.style.normalize(root);
        section::normalize_scripts(&mut self.scripts, root);
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();
        self.output.validate(&self.root, &mut diag);
        self.style.validate(&mut diag);
        section::validate_scripts(&self.scripts, &mut diag);
        self.validate_record_keys(&mut diag);
        self.lint.validate(&mut diag);
        diag.into_result().map_err(ConfigError::Diagnostics)
    }

    /// Each class owns exactly one `(record, key)` slot.
    fn validate_record_keys(&self, diag: &mut ConfigDiagnostics) {
        let style = self.style.is_enabled().then(|| {
            (
                FieldPath::new("style.key"),
                StyleConfig::NAME,
                self.style.record.as_str(),
                self.style.key(),
            )
        });
        let scripts = self.scripts.iter().enumerate().map(|(index, script)| {
            (
                FieldPath::script(index, "key"),
                script.name.as_str(),
                script.record.as_str(),
                script.key(),
            )
        });

        let mut owners: FxHashMap<(&str, &str), &str> = FxHashMap::default();
        for (field, name, record, key) in style.into_iter().chain(scripts) {
            if let Some(owner) = owners.insert((record, key), name) {
                diag.error_with_hint(
                    field,
                    format!("key `{key}` in `{record}` is already written by `{owner}`"),
                    "set a distinct `key` or `record` for this class",
                );
            }
        }
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Join a path with the root directory.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Get path relative to the project root
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    /// Find a script bundle by name.
    pub fn script(&self, name: &str) -> Option<&ScriptConfig> {
        self.scripts.iter().find(|s| s.name == name)
    }
}

/// Parse a config string for tests, rooted at `root`.
#[cfg(test)]
pub fn test_parse_config(content: &str, root: &Path) -> PipelineConfig {
    PipelineConfig::from_str(content, root).expect("config should parse")
}

//! Asset classes and artifact naming.

use std::fs;
use std::path::PathBuf;

use super::PipelineError;
use crate::config::StyleConfig;

/// What an asset class is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Style,
    Script,
}

impl AssetKind {
    /// Log prefix for this kind.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Style => "style",
            Self::Script => "script",
        }
    }
}

/// A named build target: ordered sources in, one artifact out.
#[derive(Debug, Clone)]
pub struct AssetClass {
    pub name: String,
    pub kind: AssetKind,
    /// Concatenation order is significant.
    pub sources: Vec<PathBuf>,
    /// Artifact filename inside the build directory.
    pub dest: String,
    /// Record filename inside the hash directory.
    pub record: String,
    /// Stable key this class is stored under in its record.
    pub key: String,
    pub separator: String,
}

impl AssetClass {
    pub fn style(config: &StyleConfig) -> Self {
        Self {
            name: StyleConfig::NAME.into(),
            kind: AssetKind::Style,
            sources: config.sources.clone(),
            dest: config.dest.clone(),
            record: config.record.clone(),
            key: config.key().to_string(),
            separator: config.separator.clone(),
        }
    }

    /// Read every source in configured order and join them with the separator.
    pub fn concatenate(&self) -> Result<Vec<u8>, PipelineError> {
        let mut out = Vec::new();
        for (i, source) in self.sources.iter().enumerate() {
            if i > 0 {
                out.extend_from_slice(self.separator.as_bytes());
            }
            let bytes =
                fs::read(source).map_err(|e| PipelineError::Source(source.clone(), e))?;
            out.extend_from_slice(&bytes);
        }
        Ok(out)
    }
}

/// Naming rule for minified artifacts: the suffix goes before the final extension.
///
/// ```text
/// style.css   -> style.min.css
/// app.js      -> app.min.js
/// app         -> app.min
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinifyRule {
    suffix: String,
}

impl MinifyRule {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    pub fn apply(&self, name: &str) -> String {
        match split_extension(name) {
            Some((stem, ext)) => format!("{stem}{}{ext}", self.suffix),
            None => format!("{name}{}", self.suffix),
        }
    }

    /// Recover the unminified name, or `None` if `name` was not produced by this rule.
    pub fn revert(&self, name: &str) -> Option<String> {
        if let Some((stem, ext)) = split_extension(name)
            && let Some(original) = stem.strip_suffix(self.suffix.as_str())
            && !original.is_empty()
        {
            return Some(format!("{original}{ext}"));
        }
        name.strip_suffix(self.suffix.as_str())
            .filter(|original| !original.is_empty())
            .map(str::to_string)
    }
}

/// Split `name` into stem and `.ext`; dotfiles without another dot have no extension.
fn split_extension(name: &str) -> Option<(&str, &str)> {
    match name.rfind('.') {
        Some(i) if i > 0 => Some(name.split_at(i)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rule() -> MinifyRule {
        MinifyRule::new(".min")
    }

    #[test]
    fn test_minify_rule_inserts_before_extension() {
        assert_eq!(rule().apply("style.css"), "style.min.css");
        assert_eq!(rule().apply("app.bundle.js"), "app.bundle.min.js");
        assert_eq!(rule().apply("app"), "app.min");
        assert_eq!(rule().apply(".htaccess"), ".htaccess.min");
    }

    #[test]
    fn test_minify_rule_is_reversible() {
        for name in ["style.css", "app.js", "app", "app.min", "a.b.c", ".htaccess"] {
            let minified = rule().apply(name);
            assert_eq!(rule().revert(&minified).as_deref(), Some(name), "{name}");
        }
    }

    #[test]
    fn test_revert_rejects_foreign_names() {
        assert_eq!(rule().revert("style.css"), None);
        assert_eq!(rule().revert(".min"), None);
    }

    #[test]
    fn test_concatenate_follows_list_order() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("z_first.css");
        let b = dir.path().join("a_second.css");
        fs::write(&a, ".a{}").unwrap();
        fs::write(&b, ".b{}").unwrap();

        let class = AssetClass {
            name: "style".into(),
            kind: AssetKind::Style,
            sources: vec![a, b],
            dest: "style.css".into(),
            record: "css_hashsum.yml".into(),
            key: "style".into(),
            separator: "\n".into(),
        };
        assert_eq!(class.concatenate().unwrap(), b".a{}\n.b{}");
    }

    #[test]
    fn test_concatenate_missing_source() {
        let class = AssetClass {
            name: "app".into(),
            kind: AssetKind::Script,
            sources: vec![PathBuf::from("/nonexistent/app.js")],
            dest: "app.js".into(),
            record: "js_hashsum.yml".into(),
            key: "app".into(),
            separator: "\n".into(),
        };
        assert!(matches!(
            class.concatenate(),
            Err(PipelineError::Source(path, _)) if path.ends_with("app.js")
        ));
    }
}

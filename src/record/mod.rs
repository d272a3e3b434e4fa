//! Fingerprint records consumed by the templating layer.
//!
//! A record file maps asset class keys to content fingerprints:
//!
//! ```text
//! # yaml                     # json
//! style: 3fa9c01e            { "style": "3fa9c01e", "app": "77b0d2aa" }
//! app: 77b0d2aa
//! ```
//!
//! Writes go through [`RecordWriter`], a single writer thread that replaces
//! only the key being written.

mod fingerprint;
mod writer;

pub use fingerprint::Fingerprint;
pub use writer::RecordWriter;

use crate::config::RecordFormat;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to access fingerprint record `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid YAML fingerprint record")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON fingerprint record")]
    Json(#[from] serde_json::Error),

    #[error("fingerprint record must be a flat key/value mapping, found {0}")]
    Shape(String),

    #[error("fingerprint record writer has shut down")]
    Closed,
}

/// Ordered key → fingerprint mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FingerprintRecord {
    entries: Vec<(String, String)>,
}

impl FingerprintRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(content: &str, format: RecordFormat) -> Result<Self, RecordError> {
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        match format {
            RecordFormat::Yaml => Self::parse_yaml(content),
            RecordFormat::Json => Self::parse_json(content),
        }
    }

    fn parse_yaml(content: &str) -> Result<Self, RecordError> {
        let mapping = match serde_yaml::from_str::<serde_yaml::Value>(content)? {
            serde_yaml::Value::Null => return Ok(Self::new()),
            serde_yaml::Value::Mapping(mapping) => mapping,
            other => return Err(RecordError::Shape(yaml_kind(&other).into())),
        };
        let mut record = Self::new();
        for (key, value) in mapping {
            record.set(&yaml_scalar(key)?, &yaml_scalar(value)?);
        }
        Ok(record)
    }

    fn parse_json(content: &str) -> Result<Self, RecordError> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)?;
        let mut record = Self::new();
        for (key, value) in map {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            record.set(&key, &value);
        }
        Ok(record)
    }

    /// Serialize in entry order. Every value is written as a string, so a
    /// fingerprint made only of digits stays a string for the reader.
    pub fn render(&self, format: RecordFormat) -> Result<String, RecordError> {
        match format {
            RecordFormat::Yaml => {
                let mapping: serde_yaml::Mapping = self
                    .entries
                    .iter()
                    .map(|(k, v)| (serde_yaml::Value::from(k.as_str()), serde_yaml::Value::from(v.as_str())))
                    .collect();
                Ok(serde_yaml::to_string(&mapping)?)
            }
            RecordFormat::Json => {
                let map: serde_json::Map<String, serde_json::Value> = self
                    .entries
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect();
                let mut out = serde_json::to_string_pretty(&map)?;
                out.push('\n');
                Ok(out)
            }
        }
    }

    /// Insert or replace `key`, returning the previous fingerprint.
    ///
    /// Existing keys keep their position; new keys are appended.
    pub fn set(&mut self, key: &str, value: &str) -> Option<String> {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            return Some(std::mem::replace(&mut entry.1, value.to_string()));
        }
        self.entries.push((key.to_string(), value.to_string()));
        None
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Scalars written by other tools (unquoted numbers, booleans) read back as text.
fn yaml_scalar(value: serde_yaml::Value) -> Result<String, RecordError> {
    match value {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(RecordError::Shape(yaml_kind(&other).into())),
    }
}

fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a nested mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_parse_and_render() {
        let record =
            FingerprintRecord::parse("# generated\nstyle: 3fa9c01e\napp: \"77b0d2aa\"\n", RecordFormat::Yaml)
                .unwrap();
        assert_eq!(record.get("style"), Some("3fa9c01e"));
        assert_eq!(record.get("app"), Some("77b0d2aa"));
        assert_eq!(
            record.render(RecordFormat::Yaml).unwrap(),
            "style: 3fa9c01e\napp: 77b0d2aa\n"
        );
    }

    #[test]
    fn test_yaml_malformed_content() {
        let err = FingerprintRecord::parse("style: [3fa9c01e\n", RecordFormat::Yaml).unwrap_err();
        assert!(matches!(err, RecordError::Yaml(_)));

        let err = FingerprintRecord::parse("- style\n- app\n", RecordFormat::Yaml).unwrap_err();
        assert!(matches!(err, RecordError::Shape(_)));
    }

    #[test]
    fn test_yaml_key_with_colon_round_trips() {
        let mut record = FingerprintRecord::new();
        record.set("site:app", "aaaa1111");
        let rendered = record.render(RecordFormat::Yaml).unwrap();

        let mut parsed = FingerprintRecord::parse(&rendered, RecordFormat::Yaml).unwrap();
        assert_eq!(parsed.get("site:app"), Some("aaaa1111"));
        assert_eq!(parsed.set("site:app", "bbbb2222").as_deref(), Some("aaaa1111"));
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_yaml_numeric_fingerprint_stays_string() {
        let mut record = FingerprintRecord::new();
        record.set("style", "12345678");
        let rendered = record.render(RecordFormat::Yaml).unwrap();

        let value: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(value["style"], serde_yaml::Value::String("12345678".into()));
    }

    #[test]
    fn test_yaml_unquoted_number_reads_as_text() {
        let record = FingerprintRecord::parse("style: 1234\n", RecordFormat::Yaml).unwrap();
        assert_eq!(record.get("style"), Some("1234"));
    }

    #[test]
    fn test_set_replaces_only_own_key() {
        let mut record = FingerprintRecord::new();
        assert_eq!(record.set("style", "aaaa"), None);
        assert_eq!(record.set("app", "bbbb"), None);
        assert_eq!(record.set("style", "cccc"), Some("aaaa".to_string()));
        assert_eq!(record.get("app"), Some("bbbb"));
        assert_eq!(record.render(RecordFormat::Yaml).unwrap(), "style: cccc\napp: bbbb\n");
    }

    #[test]
    fn test_json_preserves_order() {
        let mut record = FingerprintRecord::new();
        record.set("zeta", "1111");
        record.set("alpha", "2222");
        let rendered = record.render(RecordFormat::Json).unwrap();
        assert!(rendered.find("zeta").unwrap() < rendered.find("alpha").unwrap());

        let parsed = FingerprintRecord::parse(&rendered, RecordFormat::Json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_empty_json_is_empty_record() {
        let record = FingerprintRecord::parse("  \n", RecordFormat::Json).unwrap();
        assert!(record.is_empty());
    }
}

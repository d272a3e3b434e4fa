//! Transform stages: consume bytes, produce bytes or a diagnostic.
//!
//! Pipelines are assembled from an ordered list of stages; each stage only
//! sees the output of the previous one.

use thiserror::Error;

/// A stage rejected its input.
#[derive(Debug, Clone, Error)]
#[error("{stage}: {message}")]
pub struct StageError {
    pub stage: &'static str,
    pub message: String,
}

impl StageError {
    pub fn new(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

pub trait Stage: Send + Sync {
    /// Short name used in diagnostics (`compile`, `prefix`, ...).
    fn name(&self) -> &'static str;

    fn apply(&self, input: &[u8]) -> Result<Vec<u8>, StageError>;
}

/// Decode stage input as UTF-8.
pub(crate) fn utf8<'a>(stage: &'static str, input: &'a [u8]) -> Result<&'a str, StageError> {
    std::str::from_utf8(input)
        .map_err(|e| StageError::new(stage, format!("input is not valid UTF-8 ({e})")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_display() {
        let err = StageError::new("compile", "unexpected `}`");
        assert_eq!(err.to_string(), "compile: unexpected `}`");
    }

    #[test]
    fn test_utf8_rejects_invalid_bytes() {
        assert!(utf8("minify-js", b"var a;").is_ok());
        let err = utf8("minify-js", &[0xff, 0xfe]).unwrap_err();
        assert_eq!(err.stage, "minify-js");
    }
}

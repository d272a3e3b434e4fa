//! Minifier stages.
//!
//! Uses oxc for JavaScript and lightningcss for CSS. Both reject input they
//! cannot parse instead of passing it through.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::Targets;
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use super::stage::{Stage, StageError, utf8};

/// CSS minifier that keeps output valid for the compatibility targets.
///
/// Only whitespace, comments and redundant syntax are dropped; fallback
/// declarations inserted by earlier stages survive.
pub struct CssMinifier {
    compatibility: Targets,
}

impl CssMinifier {
    pub fn new(compatibility: Targets) -> Self {
        Self { compatibility }
    }
}

impl Stage for CssMinifier {
    fn name(&self) -> &'static str {
        "minify-css"
    }

    fn apply(&self, input: &[u8]) -> Result<Vec<u8>, StageError> {
        let source = utf8(self.name(), input)?;
        let sheet = StyleSheet::parse(source, ParserOptions::default())
            .map_err(|e| StageError::new(self.name(), e.to_string()))?;
        let result = sheet
            .to_css(PrinterOptions {
                minify: true,
                targets: self.compatibility.clone(),
                ..PrinterOptions::default()
            })
            .map_err(|e| StageError::new(self.name(), e.to_string()))?;
        Ok(result.code.into_bytes())
    }
}

/// JavaScript minifier: compress, mangle local names, strip comments.
///
/// Bundles are classic browser scripts, so top-level names are kept.
pub struct JsMinifier;

impl Stage for JsMinifier {
    fn name(&self) -> &'static str {
        "minify-js"
    }

    fn apply(&self, input: &[u8]) -> Result<Vec<u8>, StageError> {
        let source = utf8(self.name(), input)?;
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
        if let Some(error) = ret.errors.first() {
            let more = ret.errors.len() - 1;
            let message = if more > 0 {
                format!("{error} (and {more} more)")
            } else {
                error.to_string()
            };
            return Err(StageError::new(self.name(), message));
        }

        let mut program = ret.program;
        let options = MinifierOptions {
            mangle: Some(MangleOptions::default()),
            compress: Some(CompressOptions::smallest()),
        };
        let ret = Minifier::new(options).minify(&allocator, &mut program);
        let code = Codegen::new()
            .with_options(CodegenOptions {
                minify: true,
                comments: CommentOptions::disabled(),
                ..CodegenOptions::default()
            })
            .with_scoping(ret.scoping)
            .build(&program)
            .code;
        Ok(code.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::style::resolve_targets;

    #[test]
    fn test_css_minify_strips_whitespace_and_comments() {
        let out = CssMinifier::new(Targets::default())
            .apply(b"/* header */\n.x {\n  color: red;\n}\n")
            .unwrap();
        assert_eq!(out, b".x{color:red}");
    }

    #[test]
    fn test_css_minify_keeps_rem_fallback() {
        let targets = resolve_targets(&["ie 7".into()]).unwrap();
        let out = CssMinifier::new(targets)
            .apply(b".a { font-size: 24px; font-size: 1.5rem; }")
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("24px"));
        assert!(out.contains("1.5rem"));
    }

    #[test]
    fn test_css_minify_rejects_invalid_selector() {
        let err = CssMinifier::new(Targets::default())
            .apply(b".x{color:red} ..broken{color:blue}")
            .unwrap_err();
        assert_eq!(err.stage, "minify-css");
    }

    #[test]
    fn test_js_minify_shrinks_output() {
        let source = b"// comment\nfunction add(first, second) {\n  return first + second;\n}\nwindow.add = add;\n";
        let out = JsMinifier.apply(source).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.len() < source.len());
        assert!(!out.contains("comment"));
        assert!(out.contains("window.add"));
    }

    #[test]
    fn test_js_minify_reports_syntax_error() {
        let err = JsMinifier.apply(b"function ( {").unwrap_err();
        assert_eq!(err.stage, "minify-js");
        assert!(!err.message.is_empty());
    }
}

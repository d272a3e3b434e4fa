//! Stylesheet stages: preprocessing, vendor prefixing and rem fallbacks.
//!
//! All CSS handling goes through lightningcss; an external preprocessor
//! (e.g. `lessc -`) can replace the plain-CSS compile step.

use std::convert::Infallible;
use std::path::PathBuf;

use lightningcss::properties::Property;
use lightningcss::rules::{CssRule, CssRuleList};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use lightningcss::values::length::LengthValue;
use lightningcss::visit_types;
use lightningcss::visitor::{Visit, VisitTypes, Visitor};

use super::stage::{Stage, StageError, utf8};
use crate::utils::exec::Cmd;

/// Resolve browserslist queries into lightningcss targets.
///
/// An empty query list means "no particular targets".
pub fn resolve_targets(queries: &[String]) -> Result<Targets, String> {
    if queries.is_empty() {
        return Ok(Targets::default());
    }
    let browsers = Browsers::from_browserslist(queries.iter().map(String::as_str))
        .map_err(|e| format!("{e} (in {queries:?})"))?;
    Ok(Targets {
        browsers,
        ..Targets::default()
    })
}

fn parse<'i>(stage: &'static str, source: &'i str) -> Result<StyleSheet<'i>, StageError> {
    StyleSheet::parse(
        source,
        ParserOptions {
            error_recovery: false,
            ..ParserOptions::default()
        },
    )
    .map_err(|e| StageError::new(stage, e.to_string()))
}

fn print(stage: &'static str, sheet: &StyleSheet, options: PrinterOptions) -> Result<Vec<u8>, StageError> {
    sheet
        .to_css(options)
        .map(|result| result.code.into_bytes())
        .map_err(|e| StageError::new(stage, e.to_string()))
}

// ============================================================================
// Compile
// ============================================================================

/// Plain CSS "compiler": rejects malformed syntax, otherwise passes bytes through.
pub struct PlainCss;

impl Stage for PlainCss {
    fn name(&self) -> &'static str {
        "compile"
    }

    fn apply(&self, input: &[u8]) -> Result<Vec<u8>, StageError> {
        let source = utf8(self.name(), input)?;
        parse(self.name(), source)?;
        Ok(input.to_vec())
    }
}

/// Preprocessor run as an external command: source on stdin, CSS on stdout.
pub struct ExternalCompiler {
    command: Vec<String>,
    cwd: PathBuf,
}

impl ExternalCompiler {
    pub fn new(command: Vec<String>, cwd: PathBuf) -> Self {
        Self { command, cwd }
    }
}

impl Stage for ExternalCompiler {
    fn name(&self) -> &'static str {
        "compile"
    }

    fn apply(&self, input: &[u8]) -> Result<Vec<u8>, StageError> {
        let cmd = Cmd::from_slice(&self.command).cwd(&self.cwd).stdin(input);
        let program = cmd.program_name();
        let output = cmd
            .run()
            .map_err(|e| StageError::new(self.name(), format!("failed to run `{program}`: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stderr.trim().is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(StageError::new(
                self.name(),
                format!("`{program}` exited with {}\n{detail}", output.status),
            ));
        }
        Ok(output.stdout)
    }
}

// ============================================================================
// Prefix
// ============================================================================

/// Adds vendor prefixes required by the configured browser targets.
pub struct Prefix {
    targets: Targets,
}

impl Prefix {
    pub fn new(targets: Targets) -> Self {
        Self { targets }
    }
}

impl Stage for Prefix {
    fn name(&self) -> &'static str {
        "prefix"
    }

    fn apply(&self, input: &[u8]) -> Result<Vec<u8>, StageError> {
        let source = utf8(self.name(), input)?;
        let mut sheet = parse(self.name(), source)?;
        sheet
            .minify(MinifyOptions {
                targets: self.targets.clone(),
                ..MinifyOptions::default()
            })
            .map_err(|e| StageError::new(self.name(), e.to_string()))?;
        print(
            self.name(),
            &sheet,
            PrinterOptions {
                targets: self.targets.clone(),
                ..PrinterOptions::default()
            },
        )
    }
}

// ============================================================================
// Rem fallback
// ============================================================================

/// Inserts a px declaration before every declaration that uses rem units,
/// for browsers without rem support.
pub struct RemFallback {
    root_px: f32,
}

impl RemFallback {
    pub fn new(root_px: f32) -> Self {
        Self { root_px }
    }
}

impl Stage for RemFallback {
    fn name(&self) -> &'static str {
        "rem-fallback"
    }

    fn apply(&self, input: &[u8]) -> Result<Vec<u8>, StageError> {
        let source = utf8(self.name(), input)?;
        let mut sheet = parse(self.name(), source)?;
        add_fallbacks(&mut sheet.rules, self.root_px);
        print(self.name(), &sheet, PrinterOptions::default())
    }
}

fn add_fallbacks(rules: &mut CssRuleList<'_>, root_px: f32) {
    for rule in rules.0.iter_mut() {
        match rule {
            CssRule::Style(style) => {
                add_to_declarations(&mut style.declarations.declarations, root_px);
                add_to_declarations(&mut style.declarations.important_declarations, root_px);
                add_fallbacks(&mut style.rules, root_px);
            }
            CssRule::Media(media) => add_fallbacks(&mut media.rules, root_px),
            CssRule::Supports(supports) => add_fallbacks(&mut supports.rules, root_px),
            _ => {}
        }
    }
}

fn add_to_declarations(declarations: &mut Vec<Property<'_>>, root_px: f32) {
    let mut out = Vec::with_capacity(declarations.len());
    for property in declarations.drain(..) {
        let mut fallback = property.clone();
        let mut visitor = RemToPx {
            root_px,
            changed: false,
        };
        if fallback.visit(&mut visitor).is_ok() && visitor.changed {
            out.push(fallback);
        }
        out.push(property);
    }
    *declarations = out;
}

struct RemToPx {
    root_px: f32,
    changed: bool,
}

impl<'i> Visitor<'i> for RemToPx {
    type Error = Infallible;

    fn visit_types(&self) -> VisitTypes {
        visit_types!(LENGTHS)
    }

    fn visit_length(&mut self, length: &mut LengthValue) -> Result<(), Self::Error> {
        if let LengthValue::Rem(value) = length {
            *length = LengthValue::Px(*value * self.root_px);
            self.changed = true;
        }
        Ok(())
    }
}

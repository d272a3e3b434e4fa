//! Script checks: syntax, semantic errors and a few opt-in rules.

use oxc::allocator::Allocator;
use oxc::ast::AstKind;
use oxc::diagnostics::OxcDiagnostic;
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::syntax::operator::BinaryOperator;

use super::Finding;
use crate::config::LintRules;

/// Check one script source.
///
/// Syntax errors short-circuit the rule checks since the tree is incomplete.
pub fn check_script(source: &str, rules: LintRules) -> Vec<Finding> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if !ret.errors.is_empty() {
        return ret
            .errors
            .iter()
            .map(|e| diagnostic(source, e, "syntax"))
            .collect();
    }

    let semantic = SemanticBuilder::new()
        .with_check_syntax_error(true)
        .build(&ret.program);

    let mut findings: Vec<Finding> = semantic
        .errors
        .iter()
        .map(|e| diagnostic(source, e, "syntax"))
        .collect();

    for node in semantic.semantic.nodes().iter() {
        match node.kind() {
            AstKind::DebuggerStatement(stmt) if rules.debugger => {
                findings.push(Finding::at(
                    source,
                    stmt.span.start as usize,
                    "unexpected `debugger` statement",
                    "debugger",
                ));
            }
            AstKind::BinaryExpression(expr) if rules.eqeqeq => {
                let strict = match expr.operator {
                    BinaryOperator::Equality => "===",
                    BinaryOperator::Inequality => "!==",
                    _ => continue,
                };
                findings.push(Finding::at(
                    source,
                    expr.span.start as usize,
                    format!("expected `{strict}` instead of `{}`", expr.operator.as_str()),
                    "eqeqeq",
                ));
            }
            _ => {}
        }
    }

    findings.sort_by_key(|f| (f.line, f.column));
    findings
}

fn diagnostic(source: &str, error: &OxcDiagnostic, rule: &'static str) -> Finding {
    let offset = error
        .labels
        .as_ref()
        .and_then(|labels| labels.first())
        .map_or(0, |label| label.offset());
    Finding::at(source, offset, error.message.to_string(), rule)
}

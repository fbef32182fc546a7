//! Post-compile check of user expressions.
//!
//! Expressions in bindings, conditions, directives and interpolations end up
//! verbatim in render code. Catching a malformed one here gives the author a
//! message pointing at the template instead of a render-code syntax error.

use crate::ast::{AstElement, AstNode, TextPart};
use crate::compiler::{Diagnostics, ErrorDetector};
use crate::runtime::{Expr, parse_code};
use crate::span::{SourceRange, Span};

const PROHIBITED_KEYWORDS: &[&str] = &[
    "do", "if", "for", "let", "new", "try", "var", "case", "else", "with", "await", "break",
    "catch", "class", "const", "super", "throw", "while", "yield", "delete", "export", "import",
    "return", "switch", "default", "extends", "finally", "continue", "debugger", "function",
    "arguments", "typeof", "instanceof", "in",
];

/// Directives whose values are not plain expressions.
const UNCHECKED_DIRECTIVES: &[&str] = &["on", "for", "slot", "else", "once", "pre", "cloak"];

/// [`ErrorDetector`] running [`detect_errors`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ExpressionChecker;

impl ErrorDetector<AstElement> for ExpressionChecker {
    fn detect(&self, ast: &AstElement, diags: &mut Diagnostics) {
        detect_errors(ast, diags);
    }
}

/// Reports every malformed expression under `ast`.
pub fn detect_errors(ast: &AstElement, diags: &mut Diagnostics) {
    check_element(ast, diags);
}

fn check_element(el: &AstElement, diags: &mut Diagnostics) {
    for binding in &el.bindings {
        let raw = format!("{}=\"{}\"", binding.raw_name, binding.expr);
        if binding.dynamic_name {
            check_expression(&binding.name, &raw, binding.span, diags);
        }
        check_expression(&binding.expr, &raw, binding.span, diags);
    }
    if let Some(cond) = &el.condition {
        let span = el.raw_attr("v-if").and_then(|attr| attr.span);
        check_expression(cond, &format!("v-if=\"{cond}\""), span, diags);
    }
    for directive in &el.directives {
        if UNCHECKED_DIRECTIVES.contains(&directive.name.as_str()) || directive.value.is_empty() {
            continue;
        }
        let raw = format!("{}=\"{}\"", directive.raw_name, directive.value);
        check_expression(&directive.value, &raw, directive.span, diags);
    }
    for child in &el.children {
        match child {
            AstNode::Element(child) => check_element(child, diags),
            AstNode::Text(text) => {
                for part in &text.parts {
                    if let TextPart::Expr(expr) = part {
                        check_expression(expr, &text.text, text.span, diags);
                    }
                }
            }
            AstNode::Comment(_) => {}
        }
    }
}

fn check_expression(expr: &str, raw: &str, span: Option<Span>, diags: &mut Diagnostics) {
    let Err(reason) = validate(expr) else {
        return;
    };
    let range = span.map(SourceRange::from).unwrap_or(SourceRange::NONE);
    let msg = match find_keyword(expr) {
        Some(keyword) => format!(
            "avoid using JavaScript keyword as property name: \"{keyword}\"\n  Raw expression: {}",
            raw.trim()
        ),
        None => format!(
            "invalid expression: {reason} in\n\n    {expr}\n\n  Raw expression: {}\n",
            raw.trim()
        ),
    };
    diags.error(msg, range);
}

/// Template expressions are literals, arrays and property paths. Calls are
/// reserved for render helpers.
fn validate(expr: &str) -> Result<(), String> {
    let parsed = parse_code(expr).map_err(|err| err.message)?;
    check_tree(&parsed)
}

fn check_tree(expr: &Expr) -> Result<(), String> {
    match expr {
        Expr::Literal(_) => Ok(()),
        Expr::Path(segments) => match segments.first() {
            Some(first) if PROHIBITED_KEYWORDS.contains(&first.as_str()) => {
                Err(format!("unexpected keyword `{first}`"))
            }
            _ => Ok(()),
        },
        Expr::Array(items) => items.iter().try_for_each(check_tree),
        Expr::Call { helper, .. } => Err(format!("call to `{helper}` is not allowed")),
    }
}

/// First prohibited keyword used as a word outside string literals.
fn find_keyword(expr: &str) -> Option<&'static str> {
    let mut in_string: Option<char> = None;
    let mut word = String::new();
    let mut found = None;
    let mut flush = |word: &mut String| {
        if found.is_none() {
            found = PROHIBITED_KEYWORDS.iter().copied().find(|kw| *kw == word.as_str());
        }
        word.clear();
    };
    let mut prev = '\0';
    for ch in expr.chars() {
        if let Some(quote) = in_string {
            if ch == quote && prev != '\\' {
                in_string = None;
            }
        } else if ch == '"' || ch == '\'' || ch == '`' {
            flush(&mut word);
            in_string = Some(ch);
        } else if ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' {
            word.push(ch);
        } else {
            flush(&mut word);
        }
        prev = ch;
    }
    flush(&mut word);
    found
}

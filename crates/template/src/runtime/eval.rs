//! Evaluation of parsed render code against a render context.

use serde_json::Value;

use super::expr::Expr;
use crate::render::{RenderContext, RenderError};

/// Intermediate value while evaluating render code.
#[derive(Clone, Debug, PartialEq)]
enum Val {
    /// Finished markup; inserted without escaping.
    Html(String),
    Data(Value),
    List(Vec<Val>),
    /// Rendered attribute text including its leading space, or nothing.
    Attr(Option<String>),
}

const EMPTY_NODE: &str = "<!---->";

/// Arity range for each helper the interpreter knows. `None` as the upper
/// bound means any number of arguments.
pub(crate) fn helper_arity(name: &str) -> Option<(usize, Option<usize>)> {
    let arity = match name {
        "_c" => (2, Some(3)),
        "_a" | "_i" => (2, Some(2)),
        "_v" | "_s" | "_h" | "_m" | "_cm" => (1, Some(1)),
        "_e" => (0, Some(0)),
        "_j" => (0, None),
        _ => return None,
    };
    Some(arity)
}

pub(crate) fn render(expr: &Expr, ctx: &RenderContext<'_>) -> Result<String, RenderError> {
    let value = eval(expr, ctx)?;
    Ok(match value {
        Val::Html(html) => html,
        other => escape_html(&display(&other)),
    })
}

fn eval(expr: &Expr, ctx: &RenderContext<'_>) -> Result<Val, RenderError> {
    match expr {
        Expr::Literal(value) => Ok(Val::Data(value.clone())),
        Expr::Path(segments) => Ok(Val::Data(lookup(ctx.data(), segments))),
        Expr::Array(items) => items
            .iter()
            .map(|item| eval(item, ctx))
            .collect::<Result<Vec<_>, _>>()
            .map(Val::List),
        Expr::Call { helper, args, .. } => call(helper, args, ctx),
    }
}

fn call(helper: &str, args: &[Expr], ctx: &RenderContext<'_>) -> Result<Val, RenderError> {
    // `_i` evaluates its node only when the condition holds.
    if helper == "_i" {
        let cond = eval(arg(helper, args, 0)?, ctx)?;
        return if truthy(&cond) {
            eval(arg(helper, args, 1)?, ctx)
        } else {
            Ok(Val::Html(EMPTY_NODE.to_string()))
        };
    }

    let values = args
        .iter()
        .map(|a| eval(a, ctx))
        .collect::<Result<Vec<_>, _>>()?;
    let nth = |i: usize| {
        values.get(i).ok_or_else(|| RenderError::TypeMismatch {
            helper: helper.to_string(),
            message: format!("missing argument {}", i + 1),
        })
    };

    match helper {
        "_e" => Ok(Val::Html(EMPTY_NODE.to_string())),
        "_v" => Ok(Val::Html(escape_html(&display(nth(0)?)))),
        "_s" => Ok(Val::Data(Value::String(display(nth(0)?)))),
        "_h" => Ok(Val::Html(display(nth(0)?))),
        "_j" => Ok(Val::Data(Value::String(values.iter().map(display).collect()))),
        "_cm" => Ok(Val::Html(format!("<!--{}-->", display(nth(0)?)))),
        "_m" => {
            let index = match nth(0)? {
                Val::Data(Value::Number(n)) => n.as_u64(),
                _ => None,
            };
            let index = index.ok_or_else(|| mismatch(helper, "index must be a non-negative integer"))?;
            let index = usize::try_from(index).map_err(|_| mismatch(helper, "index out of range"))?;
            ctx.render_static(index).map(Val::Html)
        }
        "_a" => Ok(Val::Attr(render_attr(&display(nth(0)?), nth(1)?))),
        "_c" => {
            let tag = display(nth(0)?);
            let attrs = match nth(1)? {
                Val::List(items) => items,
                _ => return Err(mismatch(helper, "attributes must be a list")),
            };
            let mut out = format!("<{tag}");
            for attr in attrs {
                match attr {
                    Val::Attr(Some(text)) => out.push_str(text),
                    Val::Attr(None) => {}
                    _ => return Err(mismatch(helper, "attribute list holds a non-attribute")),
                }
            }
            out.push('>');
            let Some(children) = values.get(2) else {
                return Ok(Val::Html(out));
            };
            let Val::List(children) = children else {
                return Err(mismatch(helper, "children must be a list"));
            };
            for child in children {
                match child {
                    Val::Html(html) => out.push_str(html),
                    Val::Attr(_) => return Err(mismatch(helper, "attribute in child list")),
                    other => out.push_str(&escape_html(&display(other))),
                }
            }
            out.push_str("</");
            out.push_str(&tag);
            out.push('>');
            Ok(Val::Html(out))
        }
        _ => Err(mismatch(helper, "unknown helper")),
    }
}

fn arg<'e>(helper: &str, args: &'e [Expr], i: usize) -> Result<&'e Expr, RenderError> {
    args.get(i).ok_or_else(|| RenderError::TypeMismatch {
        helper: helper.to_string(),
        message: format!("missing argument {}", i + 1),
    })
}

fn mismatch(helper: &str, message: &str) -> RenderError {
    RenderError::TypeMismatch {
        helper: helper.to_string(),
        message: message.to_string(),
    }
}

fn lookup(data: &Value, segments: &[String]) -> Value {
    segments
        .iter()
        .try_fold(data, |value, key| value.get(key.as_str()))
        .cloned()
        .unwrap_or(Value::Null)
}

/// `null` and `false` drop the attribute, `true` renders it bare.
fn render_attr(name: &str, value: &Val) -> Option<String> {
    match value {
        Val::Data(Value::Null) | Val::Data(Value::Bool(false)) => None,
        Val::Data(Value::Bool(true)) => Some(format!(" {name}")),
        other => Some(format!(" {name}=\"{}\"", escape_html(&display(other)))),
    }
}

/// String form of a value as it appears in output.
fn display(value: &Val) -> String {
    match value {
        Val::Html(html) => html.clone(),
        Val::Data(Value::Null) => String::new(),
        Val::Data(Value::String(s)) => s.clone(),
        Val::Data(data @ (Value::Array(_) | Value::Object(_))) => {
            serde_json::to_string_pretty(data).unwrap_or_default()
        }
        Val::Data(other) => other.to_string(),
        Val::List(items) => items.iter().map(display).collect(),
        Val::Attr(_) => String::new(),
    }
}

fn truthy(value: &Val) -> bool {
    match value {
        Val::Data(Value::Null) | Val::Data(Value::Bool(false)) => false,
        Val::Data(Value::String(s)) => !s.is_empty(),
        Val::Data(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Val::Html(html) => !html.is_empty(),
        _ => true,
    }
}

fn escape_html(text: &str) -> String {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

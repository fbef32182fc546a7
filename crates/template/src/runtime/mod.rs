//! Default materializer: render code is parsed once into an expression tree
//! and interpreted on every render.
//!
//! Render code only ever calls the fixed helper set emitted by code
//! generation (`_c`, `_a`, `_v`, `_s`, `_h`, `_j`, `_i`, `_m`, `_e`, `_cm`),
//! so every call is checked against that set when the procedure is built,
//! not when it runs.

mod eval;
mod expr;

use std::sync::Arc;

pub use expr::{Expr, ParseError, parse_code};

use crate::compiler::{MaterializeError, Materializer};
use crate::render::RenderFn;

#[derive(Clone, Debug, Default)]
pub struct Interpreter {
    restricted: bool,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// An interpreter that refuses to build procedures, as a host that
    /// forbids runtime code construction would.
    pub fn restricted() -> Self {
        Self { restricted: true }
    }
}

impl Materializer for Interpreter {
    fn create_function(&self, code: &str) -> Result<RenderFn, MaterializeError> {
        if self.restricted {
            return Err(MaterializeError::Restricted);
        }
        let expr = parse_code(code).map_err(|err| MaterializeError::Syntax {
            offset: err.offset,
            message: err.message,
        })?;
        check_helpers(&expr)?;
        let expr = Arc::new(expr);
        Ok(RenderFn::new(move |ctx| eval::render(&expr, ctx)))
    }
}

fn check_helpers(expr: &Expr) -> Result<(), MaterializeError> {
    match expr {
        Expr::Literal(_) | Expr::Path(_) => Ok(()),
        Expr::Array(items) => items.iter().try_for_each(check_helpers),
        Expr::Call {
            helper,
            args,
            offset,
        } => {
            let Some((min, max)) = eval::helper_arity(helper) else {
                return Err(MaterializeError::UnknownHelper {
                    name: helper.clone(),
                    offset: *offset,
                });
            };
            if args.len() < min || max.is_some_and(|max| args.len() > max) {
                return Err(MaterializeError::Arity {
                    helper: helper.clone(),
                    expected: describe_arity(min, max),
                    found: args.len(),
                });
            }
            args.iter().try_for_each(check_helpers)
        }
    }
}

fn describe_arity(min: usize, max: Option<usize>) -> &'static str {
    match (min, max) {
        (0, Some(0)) => "0",
        (1, Some(1)) => "1",
        (2, Some(2)) => "2",
        (2, Some(3)) => "2 or 3",
        (_, None) => "any number of",
        _ => "a different number of",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn build(code: &str) -> Result<RenderFn, MaterializeError> {
        Interpreter::new().create_function(code)
    }

    #[test]
    fn builds_and_runs_render_code() {
        let procedure = build(r#"_c("span",[],[_v(_s(msg))])"#).expect("valid code");
        let data = json!({ "msg": "a & b" });
        let ctx = crate::render::RenderContext::new(&data, &[]);
        assert_eq!(procedure.call(&ctx), Ok("<span>a &amp; b</span>".to_string()));
    }

    #[test]
    fn unknown_helper_is_rejected_up_front() {
        assert_eq!(
            build(r#"_c("div",[],[_x(1)])"#).map(|_| ()),
            Err(MaterializeError::UnknownHelper {
                name: "_x".into(),
                offset: 13,
            })
        );
    }

    #[test]
    fn arity_is_checked() {
        assert_eq!(
            build("_v()").map(|_| ()),
            Err(MaterializeError::Arity {
                helper: "_v".into(),
                expected: "1",
                found: 0,
            })
        );
        assert!(build(r#"_c("a",[],[],[])"#).is_err());
        assert!(build(r#"_j()"#).is_ok());
    }

    #[test]
    fn syntax_errors_carry_offset() {
        let err = build(r#"_c("div",)"#).map(|_| ()).expect_err("dangling comma");
        assert!(matches!(err, MaterializeError::Syntax { offset: 9, .. }));
    }

    #[test]
    fn restricted_interpreter_refuses_everything() {
        let interpreter = Interpreter::restricted();
        assert_eq!(
            interpreter.probe(),
            Err(MaterializeError::Restricted)
        );
        assert!(Interpreter::new().probe().is_ok());
    }

    #[test]
    fn empty_render_is_placeholder() {
        let procedure = build("_e()").expect("valid code");
        let ctx = crate::render::RenderContext::new(&Value::Null, &[]);
        assert_eq!(procedure.call(&ctx), Ok("<!---->".to_string()));
    }
}

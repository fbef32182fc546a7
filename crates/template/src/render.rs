//! Executable render procedures and what they run against.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderError {
    /// `_m(i)` named a hoisted subtree that doesn't exist.
    MissingStatic { index: usize },
    /// A helper got an argument of the wrong shape.
    TypeMismatch { helper: String, message: String },
    /// Nesting of static procedures or code went past its limit.
    TooDeep { depth: usize },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::MissingStatic { index } => {
                write!(f, "no static render procedure at index {index}")
            }
            RenderError::TypeMismatch { helper, message } => write!(f, "{helper}: {message}"),
            RenderError::TooDeep { depth } => {
                write!(f, "render nesting exceeds {depth} levels")
            }
        }
    }
}

impl Error for RenderError {}

const MAX_STATIC_NESTING: usize = 64;

/// Scope a render procedure runs in: the caller's data plus the hoisted
/// static procedures compiled alongside it.
#[derive(Clone, Copy, Debug)]
pub struct RenderContext<'a> {
    data: &'a Value,
    static_render_fns: &'a [RenderFn],
    nesting: usize,
}

impl<'a> RenderContext<'a> {
    pub fn new(data: &'a Value, static_render_fns: &'a [RenderFn]) -> Self {
        Self {
            data,
            static_render_fns,
            nesting: 0,
        }
    }

    pub fn data(&self) -> &'a Value {
        self.data
    }

    /// Runs the hoisted procedure at `index` in this same context.
    pub fn render_static(&self, index: usize) -> Result<String, RenderError> {
        let procedure = self
            .static_render_fns
            .get(index)
            .ok_or(RenderError::MissingStatic { index })?;
        if self.nesting >= MAX_STATIC_NESTING {
            return Err(RenderError::TooDeep {
                depth: MAX_STATIC_NESTING,
            });
        }
        let nested = RenderContext {
            nesting: self.nesting + 1,
            ..*self
        };
        procedure.call(&nested)
    }
}

type RenderCallable = dyn Fn(&RenderContext<'_>) -> Result<String, RenderError> + Send + Sync;

/// A materialized render procedure. Cheap to clone.
#[derive(Clone)]
pub struct RenderFn(Arc<RenderCallable>);

impl RenderFn {
    pub fn new(
        f: impl Fn(&RenderContext<'_>) -> Result<String, RenderError> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(f))
    }

    /// Procedure that renders nothing; stands in for code that failed to
    /// materialize.
    pub fn noop() -> Self {
        Self::new(|_| Ok(String::new()))
    }

    pub fn call(&self, ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for RenderFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RenderFn(..)")
    }
}

/// Main render procedure plus its hoisted static subtrees.
#[derive(Clone, Debug)]
pub struct CompiledFunctions {
    pub render: RenderFn,
    pub static_render_fns: Vec<RenderFn>,
}

impl CompiledFunctions {
    pub fn render(&self, data: &Value) -> Result<String, RenderError> {
        let ctx = RenderContext::new(data, &self.static_render_fns);
        self.render.call(&ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn noop_renders_empty() {
        let functions = CompiledFunctions {
            render: RenderFn::noop(),
            static_render_fns: Vec::new(),
        };
        assert_eq!(functions.render(&Value::Null), Ok(String::new()));
    }

    #[test]
    fn static_procedures_share_context() {
        let functions = CompiledFunctions {
            render: RenderFn::new(|ctx| {
                let inner = ctx.render_static(0)?;
                Ok(format!("<div>{inner}</div>"))
            }),
            static_render_fns: vec![RenderFn::new(|ctx| {
                Ok(ctx.data()["name"].as_str().unwrap_or_default().to_string())
            })],
        };
        assert_eq!(
            functions.render(&json!({ "name": "x" })),
            Ok("<div>x</div>".to_string())
        );
    }

    #[test]
    fn self_referencing_static_is_cut_off() {
        let functions = CompiledFunctions {
            render: RenderFn::new(|ctx| ctx.render_static(0)),
            static_render_fns: vec![RenderFn::new(|ctx| ctx.render_static(0))],
        };
        assert!(matches!(
            functions.render(&Value::Null),
            Err(RenderError::TooDeep { .. })
        ));
    }

    #[test]
    fn missing_static_is_an_error() {
        let ctx_data = Value::Null;
        let ctx = RenderContext::new(&ctx_data, &[]);
        assert_eq!(
            ctx.render_static(2),
            Err(RenderError::MissingStatic { index: 2 })
        );
    }
}

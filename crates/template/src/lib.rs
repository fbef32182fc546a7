//! Template compilation pipeline: markup parser, compiler driver and
//! render-procedure materialization with caching.
//!
//! [`web::create_compiler`] gives a ready-to-use compiler for HTML
//! templates. The pieces it is built from ([`parser`], [`compiler`],
//! [`runtime`]) are public so other platforms can swap in their own base
//! compile or materializer.

pub mod ast;
pub mod compiler;
mod entities;
pub mod parser;
pub mod render;
pub mod runtime;
pub mod span;
pub mod tags;
pub mod web;

pub use compiler::{
    BaseCompile, CompileOptions, CompiledResult, Compiler, CompilerOptions, CompilerWarning, DiagnosticKind,
    DiagnosticSink, TemplateCompiler, create_compiler,
};
pub use parser::{Attribute, ParseHandler, ParseOptions, parse};
pub use render::{CompiledFunctions, RenderContext, RenderError, RenderFn};
pub use span::{SourceRange, Span};
pub use tags::TagPredicate;

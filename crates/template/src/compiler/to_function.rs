//! Front end that turns templates into cached render procedures.

use std::error::Error;
use std::fmt;
use std::sync::{Arc, OnceLock};

use super::cache::{CompileCache, cache_key};
use super::codeframe::generate_code_frame;
use super::diagnostics::{DiagnosticKind, DiagnosticSink, LogSink};
use super::options::{CompileOptions, CompilerOptions};
use super::{BaseCompile, CompiledResult, Compiler};
use crate::render::{CompiledFunctions, RenderFn};

/// Why render code couldn't become a callable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MaterializeError {
    /// The host doesn't allow constructing procedures at runtime.
    Restricted,
    Syntax { offset: usize, message: String },
    UnknownHelper { name: String, offset: usize },
    Arity { helper: String, expected: &'static str, found: usize },
}

impl fmt::Display for MaterializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterializeError::Restricted => {
                f.write_str("constructing render procedures is not allowed in this environment")
            }
            MaterializeError::Syntax { offset, message } => {
                write!(f, "SyntaxError: {message} at offset {offset}")
            }
            MaterializeError::UnknownHelper { name, offset } => {
                write!(f, "ReferenceError: {name} is not a render helper (offset {offset})")
            }
            MaterializeError::Arity {
                helper,
                expected,
                found,
            } => write!(f, "TypeError: {helper} expects {expected} argument(s), got {found}"),
        }
    }
}

impl Error for MaterializeError {}

/// Turns render code into callables.
pub trait Materializer: Send + Sync {
    fn create_function(&self, code: &str) -> Result<RenderFn, MaterializeError>;

    /// Checks once whether the host permits materialization at all.
    fn probe(&self) -> Result<(), MaterializeError> {
        self.create_function("_e()").map(|_| ())
    }
}

const RESTRICTED_ADVISORY: &str = "It seems you are using the standalone build of the template \
compiler in an environment that does not allow constructing render procedures at runtime. \
The template compiler cannot work in this environment. Consider relaxing the policy to allow \
runtime code construction, or pre-compiling your templates into render procedures.";

/// Compiler plus materializer plus cache: the public entry point for
/// turning templates into render procedures.
pub struct TemplateCompiler<B: BaseCompile, M> {
    compiler: Compiler<B>,
    materializer: M,
    cache: CompileCache,
    probed: OnceLock<bool>,
    sink: Arc<dyn DiagnosticSink>,
}

/// Builds a [`TemplateCompiler`] from platform pieces.
pub fn create_compiler<B: BaseCompile, M: Materializer>(
    base_options: CompilerOptions,
    base_compile: B,
    materializer: M,
) -> TemplateCompiler<B, M> {
    TemplateCompiler::new(Compiler::new(base_options, base_compile), materializer)
}

impl<B: BaseCompile, M: Materializer> TemplateCompiler<B, M> {
    pub fn new(compiler: Compiler<B>, materializer: M) -> Self {
        Self {
            compiler,
            materializer,
            cache: CompileCache::new(),
            probed: OnceLock::new(),
            sink: Arc::new(LogSink),
        }
    }

    /// Default report destination when a call doesn't bring its own.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn compiler(&self) -> &Compiler<B> {
        &self.compiler
    }

    pub fn cache(&self) -> &CompileCache {
        &self.cache
    }

    /// Compiles to render code without materializing.
    pub fn compile(&self, template: &str, options: Option<&CompileOptions>) -> CompiledResult<B::Ast> {
        self.compiler.compile(template, options)
    }

    /// Compiles `template` and materializes the result, reusing a cached
    /// entry when the same template and delimiters were seen before.
    ///
    /// Problems are reported to the sink, never returned: a template that
    /// fails to compile or materialize still yields callables, with no-op
    /// procedures standing in for code that couldn't be built. `context`
    /// names the caller in reports.
    pub fn compile_to_functions(
        &self,
        template: &str,
        options: Option<&CompileOptions>,
        context: Option<&str>,
    ) -> Arc<CompiledFunctions> {
        let sink = options
            .and_then(|o| o.warn.clone())
            .unwrap_or_else(|| Arc::clone(&self.sink));
        self.probe_once(sink.as_ref(), context);

        let key = cache_key(template, options.and_then(|o| o.delimiters.as_ref()));
        if let Some(hit) = self.cache.get(&key) {
            log::debug!(target: "template.cache", "cache hit: key_bytes={}", key.len());
            return hit;
        }

        let compiled = self.compiler.compile(template, options);
        let with_ranges = self.compiler.resolve_options(options).output_source_range;
        report_diagnostics(sink.as_ref(), template, &compiled, with_ranges, context);

        let mut failures = Vec::new();
        let render = self.materialize(&compiled.render, &mut failures);
        let static_render_fns = compiled
            .static_render_fns
            .iter()
            .map(|code| self.materialize(code, &mut failures))
            .collect();
        if compiled.errors.is_empty() && !failures.is_empty() {
            let list: Vec<String> = failures
                .iter()
                .map(|(err, code)| format!("{err} in\n\n{code}\n"))
                .collect();
            sink.report(
                &format!("Failed to generate render function:\n\n{}", list.join("\n")),
                DiagnosticKind::Error,
                context,
            );
        }

        log::debug!(
            target: "template.cache",
            "cache store: key_bytes={} failures={}",
            key.len(),
            failures.len()
        );
        self.cache.insert(
            key,
            CompiledFunctions {
                render,
                static_render_fns,
            },
        )
    }

    fn probe_once(&self, sink: &dyn DiagnosticSink, context: Option<&str>) {
        self.probed.get_or_init(|| match self.materializer.probe() {
            Err(MaterializeError::Restricted) => {
                sink.report(RESTRICTED_ADVISORY, DiagnosticKind::Error, context);
                false
            }
            _ => true,
        });
    }

    fn materialize(&self, code: &str, failures: &mut Vec<(MaterializeError, String)>) -> RenderFn {
        match self.materializer.create_function(code) {
            Ok(procedure) => procedure,
            Err(err) => {
                log::trace!(target: "template.compiler", "materialize failed: {err}");
                failures.push((err, code.to_string()));
                RenderFn::noop()
            }
        }
    }
}

fn report_diagnostics<A>(
    sink: &dyn DiagnosticSink,
    template: &str,
    compiled: &CompiledResult<A>,
    with_ranges: bool,
    context: Option<&str>,
) {
    if !compiled.errors.is_empty() {
        if with_ranges {
            for error in &compiled.errors {
                let frame = generate_code_frame(
                    template,
                    error.start.unwrap_or(0),
                    error.end.unwrap_or(template.len()),
                );
                sink.report(
                    &format!("Error compiling template:\n\n{}\n\n{frame}", error.msg),
                    DiagnosticKind::Error,
                    context,
                );
            }
        } else {
            let list: Vec<String> = compiled
                .errors
                .iter()
                .map(|error| format!("- {}", error.msg))
                .collect();
            sink.report(
                &format!("Error compiling template:\n\n{template}\n\n{}\n", list.join("\n")),
                DiagnosticKind::Error,
                context,
            );
        }
    }
    for tip in &compiled.tips {
        sink.report(&tip.msg, DiagnosticKind::Tip, context);
    }
}

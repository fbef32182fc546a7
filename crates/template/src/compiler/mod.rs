//! Compiler driver: option layering, diagnostics collection and the
//! function-materializing front end.
//!
//! The driver is platform-neutral. A [`BaseCompile`] turns a trimmed
//! template into render code; everything around that step (merging
//! options, offsetting diagnostic ranges, optional error detection,
//! materializing code into callables and caching them) lives here.

mod cache;
mod codeframe;
mod diagnostics;
mod options;
mod to_function;

pub use cache::{CompileCache, cache_key};
pub use codeframe::generate_code_frame;
pub use diagnostics::{CompilerWarning, DiagnosticKind, DiagnosticSink, Diagnostics, LogSink};
pub use options::{CompileOptions, CompilerModule, CompilerOptions, Delimiters, Directive};
pub use to_function::{MaterializeError, Materializer, TemplateCompiler, create_compiler};

/// What a base compile hands back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseCompileOutput<A> {
    pub ast: Option<A>,
    pub render: String,
    pub static_render_fns: Vec<String>,
}

/// Platform-specific compile step: trimmed template in, render code out.
pub trait BaseCompile: Send + Sync {
    type Ast;

    fn compile(
        &self,
        template: &str,
        options: &CompilerOptions,
        diags: &mut Diagnostics,
    ) -> BaseCompileOutput<Self::Ast>;
}

/// Extra validation over a finished AST.
pub trait ErrorDetector<A>: Send + Sync {
    fn detect(&self, ast: &A, diags: &mut Diagnostics);
}

/// Result of [`Compiler::compile`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledResult<A> {
    pub ast: Option<A>,
    pub render: String,
    pub static_render_fns: Vec<String>,
    pub errors: Vec<CompilerWarning>,
    pub tips: Vec<CompilerWarning>,
}

/// Base options plus a base compile; produces render code.
pub struct Compiler<B: BaseCompile> {
    base_options: CompilerOptions,
    base_compile: B,
    detector: Option<Box<dyn ErrorDetector<B::Ast>>>,
}

impl<B: BaseCompile> Compiler<B> {
    pub fn new(base_options: CompilerOptions, base_compile: B) -> Self {
        Self {
            base_options,
            base_compile,
            detector: None,
        }
    }

    pub fn with_error_detector(mut self, detector: impl ErrorDetector<B::Ast> + 'static) -> Self {
        self.detector = Some(Box::new(detector));
        self
    }

    pub fn base_options(&self) -> &CompilerOptions {
        &self.base_options
    }

    /// Options for one compile: the base options with `overrides` layered on.
    pub fn resolve_options(&self, overrides: Option<&CompileOptions>) -> CompilerOptions {
        match overrides {
            Some(overrides) => self.base_options.merge(overrides),
            None => self.base_options.clone(),
        }
    }

    /// Compiles `template` into render code. Never fails; problems come back
    /// in `errors` and `tips`.
    ///
    /// The template is trimmed before the base compile sees it. With source
    /// ranges on, diagnostic offsets are shifted back so they point into the
    /// untrimmed text.
    pub fn compile(&self, template: &str, overrides: Option<&CompileOptions>) -> CompiledResult<B::Ast> {
        let options = self.resolve_options(overrides);
        let leading_ws = options
            .output_source_range
            .then(|| template.len() - template.trim_start().len());
        let mut diags = Diagnostics::new(leading_ws);

        let output = self
            .base_compile
            .compile(template.trim(), &options, &mut diags);
        if let (Some(detector), Some(ast)) = (&self.detector, &output.ast) {
            detector.detect(ast, &mut diags);
        }

        let (errors, tips) = diags.into_parts();
        log::debug!(
            target: "template.compiler",
            "compiled template: bytes={} static_fns={} errors={} tips={}",
            template.len(),
            output.static_render_fns.len(),
            errors.len(),
            tips.len()
        );
        CompiledResult {
            ast: output.ast,
            render: output.render,
            static_render_fns: output.static_render_fns,
            errors,
            tips,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::SourceRange;

    /// Reports an error covering the whole (trimmed) template and echoes it
    /// back as code.
    struct Echo;

    impl BaseCompile for Echo {
        type Ast = String;

        fn compile(
            &self,
            template: &str,
            options: &CompilerOptions,
            diags: &mut Diagnostics,
        ) -> BaseCompileOutput<String> {
            diags.error(
                "whole template",
                SourceRange {
                    start: Some(0),
                    end: Some(template.len()),
                },
            );
            if options.comments {
                diags.tip("comments kept", SourceRange::NONE);
            }
            BaseCompileOutput {
                ast: Some(template.to_string()),
                render: template.to_string(),
                static_render_fns: vec!["_e()".into()],
            }
        }
    }

    struct RejectAll;

    impl ErrorDetector<String> for RejectAll {
        fn detect(&self, ast: &String, diags: &mut Diagnostics) {
            diags.error(format!("rejected {ast}"), SourceRange::NONE);
        }
    }

    #[test]
    fn template_is_trimmed_and_ranges_shifted() {
        let compiler = Compiler::new(CompilerOptions::default(), Echo);
        let result = compiler.compile(
            "  \n<a/>  ",
            Some(&CompileOptions {
                output_source_range: Some(true),
                ..CompileOptions::default()
            }),
        );
        assert_eq!(result.render, "<a/>");
        assert_eq!(result.ast.as_deref(), Some("<a/>"));
        assert_eq!(result.static_render_fns, ["_e()"]);
        assert_eq!((result.errors[0].start, result.errors[0].end), (Some(3), Some(7)));
    }

    #[test]
    fn ranges_dropped_without_source_range() {
        let compiler = Compiler::new(CompilerOptions::default(), Echo);
        let result = compiler.compile("  <a/>", None);
        assert_eq!(result.errors[0].msg, "whole template");
        assert!(result.errors[0].range().is_none());
    }

    #[test]
    fn overrides_reach_base_compile() {
        let compiler = Compiler::new(CompilerOptions::default(), Echo);
        let result = compiler.compile(
            "<a/>",
            Some(&CompileOptions {
                comments: Some(true),
                ..CompileOptions::default()
            }),
        );
        assert_eq!(result.tips.len(), 1);
        assert_eq!(result.tips[0].kind, DiagnosticKind::Tip);
        assert!(compiler.compile("<a/>", None).tips.is_empty());
    }

    #[test]
    fn detector_runs_over_ast() {
        let compiler = Compiler::new(CompilerOptions::default(), Echo).with_error_detector(RejectAll);
        let result = compiler.compile("<a/>", None);
        let messages: Vec<_> = result.errors.iter().map(|e| e.msg.as_str()).collect();
        assert_eq!(messages, ["whole template", "rejected <a/>"]);
    }
}

//! Web platform compiler: HTML vocabulary, the tree builder, class and style
//! modules, `v-text`/`v-html`, the optimizer and render code generation.

mod builder;
mod codegen;
mod detector;
mod modules;
mod optimizer;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub use builder::parse_text;
pub use detector::{ExpressionChecker, detect_errors};
pub use modules::{ClassModule, HtmlDirective, StyleModule, TextDirective};

use crate::ast::AstElement;
use crate::compiler::{
    BaseCompile, BaseCompileOutput, Compiler, CompilerModule, CompilerOptions, Diagnostics, Directive,
    TemplateCompiler,
};
use crate::runtime::Interpreter;
use crate::tags::{self, TagPredicate};

/// Base configuration of the web platform.
pub fn base_options() -> CompilerOptions {
    let modules: Vec<Arc<dyn CompilerModule>> = vec![Arc::new(ClassModule), Arc::new(StyleModule)];
    let mut directives: BTreeMap<String, Arc<dyn Directive>> = BTreeMap::new();
    directives.insert("text".to_string(), Arc::new(TextDirective));
    directives.insert("html".to_string(), Arc::new(HtmlDirective));
    let static_keys: BTreeSet<String> = ["tag", "children", "attrs"]
        .iter()
        .map(|key| key.to_string())
        .collect();

    CompilerOptions {
        expect_html: true,
        is_unary_tag: TagPredicate::new(tags::is_unary_tag),
        can_be_left_open_tag: TagPredicate::new(tags::can_be_left_open_tag),
        is_pre_tag: TagPredicate::new(tags::is_pre_tag),
        static_keys,
        modules,
        directives,
        ..CompilerOptions::default()
    }
}

/// Parse, optimize and generate for the web platform.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebBaseCompile;

impl BaseCompile for WebBaseCompile {
    type Ast = AstElement;

    fn compile(
        &self,
        template: &str,
        options: &CompilerOptions,
        diags: &mut Diagnostics,
    ) -> BaseCompileOutput<AstElement> {
        let Some(mut root) = builder::build_ast(template, options, diags) else {
            return BaseCompileOutput {
                ast: None,
                render: "_e()".to_string(),
                static_render_fns: Vec::new(),
            };
        };
        if options.optimize {
            optimizer::optimize(&mut root, options);
        }
        let code = codegen::generate(&root, options);
        BaseCompileOutput {
            ast: Some(root),
            render: code.render,
            static_render_fns: code.static_render_fns,
        }
    }
}

pub type WebCompiler = TemplateCompiler<WebBaseCompile, Interpreter>;

/// Web compiler backed by the render-code interpreter. Debug builds also
/// check every user expression after compiling.
pub fn create_compiler() -> WebCompiler {
    let mut compiler = Compiler::new(base_options(), WebBaseCompile);
    if cfg!(debug_assertions) {
        compiler = compiler.with_error_detector(ExpressionChecker);
    }
    TemplateCompiler::new(compiler, Interpreter::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompileOptions;
    use serde_json::json;

    #[test]
    fn compiles_and_renders() {
        let compiler = create_compiler();
        let functions = compiler.compile_to_functions(
            r#"<div id="app"><h1>Title</h1><p v-if="show">{{ user.name }}</p></div>"#,
            None,
            None,
        );
        assert_eq!(functions.static_render_fns.len(), 0);
        assert_eq!(
            functions.render(&json!({ "show": true, "user": { "name": "<Ada>" } })),
            Ok(r#"<div id="app"><h1>Title</h1><p>&lt;Ada&gt;</p></div>"#.to_string())
        );
        assert_eq!(
            functions.render(&json!({})),
            Ok(r#"<div id="app"><h1>Title</h1><!----></div>"#.to_string())
        );
    }

    #[test]
    fn hoisted_statics_render_through_main_procedure() {
        let compiler = create_compiler();
        let functions = compiler.compile_to_functions(
            "<section><ul><li>a</li><li>b</li></ul><span>{{ n }}</span></section>",
            None,
            None,
        );
        assert_eq!(functions.static_render_fns.len(), 1);
        assert_eq!(
            functions.render(&json!({ "n": 2 })),
            Ok("<section><ul><li>a</li><li>b</li></ul><span>2</span></section>".to_string())
        );
    }

    #[test]
    fn empty_template_renders_placeholder() {
        let compiler = create_compiler();
        let result = compiler.compile("   ", None);
        assert!(result.ast.is_none());
        assert_eq!(result.render, "_e()");
    }

    #[test]
    fn optimize_off_keeps_everything_inline() {
        let compiler = create_compiler();
        let options = CompileOptions {
            optimize: Some(false),
            ..CompileOptions::default()
        };
        let result = compiler.compile("<div><p><b>x</b></p></div>", Some(&options));
        assert!(result.static_render_fns.is_empty());
        assert_eq!(result.render, r#"_c("div",[],[_c("p",[],[_c("b",[],[_v("x")])])])"#);
    }

    #[test]
    fn custom_delimiters() {
        let compiler = create_compiler();
        let options = CompileOptions {
            delimiters: Some(crate::compiler::Delimiters::new("${", "}")),
            ..CompileOptions::default()
        };
        let functions = compiler.compile_to_functions("<p>${ a } {{ b }}</p>", Some(&options), None);
        assert_eq!(
            functions.render(&json!({ "a": 1 })),
            Ok("<p>1 {{ b }}</p>".to_string())
        );
    }
}

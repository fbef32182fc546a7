//! Render code generation.
//!
//! Output is a single expression in the render-code language understood by
//! [`crate::runtime`]. User expressions from bindings, conditions and
//! interpolations are spliced in verbatim.

use serde_json::Value;

use crate::ast::{AstElement, AstNode, AstText, Binding, TextPart};
use crate::compiler::CompilerOptions;

pub(crate) struct GeneratedCode {
    pub render: String,
    pub static_render_fns: Vec<String>,
}

pub(crate) fn generate(root: &AstElement, options: &CompilerOptions) -> GeneratedCode {
    let mut state = CodegenState {
        options,
        static_render_fns: Vec::new(),
    };
    let render = state.gen_element(root);
    GeneratedCode {
        render,
        static_render_fns: state.static_render_fns,
    }
}

fn string_literal(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

struct CodegenState<'a> {
    options: &'a CompilerOptions,
    static_render_fns: Vec<String>,
}

impl CodegenState<'_> {
    fn gen_element(&mut self, el: &AstElement) -> String {
        if el.static_root {
            let body = self.gen_plain(el);
            let index = self.static_render_fns.len();
            self.static_render_fns.push(body);
            return format!("_m({index})");
        }
        match &el.condition {
            Some(cond) => format!("_i({cond},{})", self.gen_plain(el)),
            None => self.gen_plain(el),
        }
    }

    fn gen_plain(&mut self, el: &AstElement) -> String {
        let tag = string_literal(&el.tag);
        let attrs = gen_attrs(el);
        let directive_children = el.directives.iter().find_map(|dir| {
            self.options
                .directives
                .get(&dir.name)
                .and_then(|directive| directive.gen_children(dir))
        });
        if let Some(children) = directive_children {
            return format!("_c({tag},{attrs},{children})");
        }
        if el.unary {
            return format!("_c({tag},{attrs})");
        }
        let children: Vec<String> = el.children.iter().map(|child| self.gen_node(child)).collect();
        format!("_c({tag},{attrs},[{}])", children.join(","))
    }

    fn gen_node(&mut self, node: &AstNode) -> String {
        match node {
            AstNode::Element(el) => self.gen_element(el),
            AstNode::Text(text) => gen_text(text),
            AstNode::Comment(comment) => format!("_cm({})", string_literal(&comment.text)),
        }
    }
}

fn gen_text(text: &AstText) -> String {
    let parts: Vec<String> = text
        .parts
        .iter()
        .map(|part| match part {
            TextPart::Static(s) => string_literal(s),
            TextPart::Expr(expr) => format!("_s({expr})"),
        })
        .collect();
    match parts.as_slice() {
        [] => "_v(\"\")".to_string(),
        [single] => format!("_v({single})"),
        many => format!("_v(_j({}))", many.join(",")),
    }
}

fn find_binding<'a>(el: &'a AstElement, name: &str) -> Option<&'a Binding> {
    el.bindings
        .iter()
        .find(|binding| !binding.dynamic_name && binding.name == name)
}

/// Static and bound values of one attribute merged into a single `_a`.
fn gen_merged(name: &str, fixed: Option<&str>, bound: Option<&Binding>, separator: &str) -> Option<String> {
    let name = string_literal(name);
    match (fixed, bound) {
        (Some(fixed), Some(bound)) => Some(format!(
            "_a({name},_j({},_s({})))",
            string_literal(&format!("{fixed}{separator}")),
            bound.expr
        )),
        (Some(fixed), None) => Some(format!("_a({name},{})", string_literal(fixed))),
        (None, Some(bound)) => Some(format!("_a({name},{})", bound.expr)),
        (None, None) => None,
    }
}

fn gen_attrs(el: &AstElement) -> String {
    let mut attrs = Vec::new();
    attrs.extend(gen_merged("class", el.static_class.as_deref(), find_binding(el, "class"), " "));
    attrs.extend(gen_merged("style", el.static_style.as_deref(), find_binding(el, "style"), ""));
    for (name, value) in &el.attrs {
        attrs.push(format!("_a({},{})", string_literal(name), string_literal(value)));
    }
    for binding in &el.bindings {
        if binding.dynamic_name {
            attrs.push(format!("_a({},{})", binding.name, binding.expr));
        } else if binding.name != "class" && binding.name != "style" {
            attrs.push(format!("_a({},{})", string_literal(&binding.name), binding.expr));
        }
    }
    format!("[{}]", attrs.join(","))
}

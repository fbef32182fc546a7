//! Web compiler modules and directives.

use crate::ast::{AstElement, DirectiveBinding};
use crate::compiler::{CompilerModule, CompilerOptions, Diagnostics, Directive};
use crate::span::SourceRange;

use super::builder::has_interpolation;

/// Moves the static `class` attribute into `static_class`.
#[derive(Debug, Default)]
pub struct ClassModule;

impl CompilerModule for ClassModule {
    fn static_keys(&self) -> &[&'static str] {
        &["staticClass"]
    }

    fn transform_node(&self, el: &mut AstElement, options: &CompilerOptions, diags: &mut Diagnostics) {
        let Some(class) = el.take_attr("class") else {
            return;
        };
        if has_interpolation(&class, &options.delimiters) {
            report_interpolation(el, "class", &class, diags);
        }
        let collapsed = class.split_whitespace().collect::<Vec<_>>().join(" ");
        el.static_class = Some(collapsed);
    }
}

/// Moves the static `style` attribute into `static_style`, normalized to
/// `prop:value;` pairs.
#[derive(Debug, Default)]
pub struct StyleModule;

impl CompilerModule for StyleModule {
    fn static_keys(&self) -> &[&'static str] {
        &["staticStyle"]
    }

    fn transform_node(&self, el: &mut AstElement, options: &CompilerOptions, diags: &mut Diagnostics) {
        let Some(style) = el.take_attr("style") else {
            return;
        };
        if has_interpolation(&style, &options.delimiters) {
            report_interpolation(el, "style", &style, diags);
        }
        el.static_style = Some(normalize_style(&style));
    }
}

fn report_interpolation(el: &AstElement, name: &str, value: &str, diags: &mut Diagnostics) {
    let range = el
        .raw_attr(name)
        .and_then(|attr| attr.span)
        .map(SourceRange::from)
        .unwrap_or(SourceRange::NONE);
    diags.error(
        format!(
            "{name}=\"{value}\": Interpolation inside attributes has been removed. \
             Use v-bind or the colon shorthand instead. For example, instead of \
             <div {name}=\"{{{{ val }}}}\">, use <div :{name}=\"val\">."
        ),
        range,
    );
}

/// Splits declarations on `;` outside parentheses, so `url(a;b)` survives.
fn normalize_style(style: &str) -> String {
    let mut out = String::with_capacity(style.len());
    let mut depth = 0usize;
    let mut start = 0;
    let push_decl = |decl: &str, out: &mut String| {
        if let Some((prop, value)) = decl.split_once(':') {
            let (prop, value) = (prop.trim(), value.trim());
            if !prop.is_empty() {
                out.push_str(prop);
                out.push(':');
                out.push_str(value);
                out.push(';');
            }
        }
    };
    for (i, b) in style.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b';' if depth == 0 => {
                push_decl(&style[start..i], &mut out);
                start = i + 1;
            }
            _ => {}
        }
    }
    push_decl(&style[start..], &mut out);
    out
}

/// `v-text`: children become the escaped expression value.
#[derive(Debug, Default)]
pub struct TextDirective;

impl Directive for TextDirective {
    fn gen_children(&self, binding: &DirectiveBinding) -> Option<String> {
        Some(format!("[_v(_s({}))]", binding.value))
    }
}

/// `v-html`: children become the raw expression value.
#[derive(Debug, Default)]
pub struct HtmlDirective;

impl Directive for HtmlDirective {
    fn gen_children(&self, binding: &DirectiveBinding) -> Option<String> {
        Some(format!("[_h({})]", binding.value))
    }
}

//! Builds the element tree from parser events.

use crate::ast::{AstComment, AstElement, AstNode, AstText, Binding, DirectiveBinding, TextPart};
use crate::compiler::{CompilerOptions, Delimiters, Diagnostics};
use crate::entities::decode_text;
use crate::parser::{self, Attribute, ParseHandler};
use crate::span::{SourceRange, Span};

/// Deepest element nesting kept in the tree. Elements below it are dropped
/// with a single error.
pub(crate) const MAX_NESTING: usize = 128;

/// Parses `template` and builds its tree. `None` when the template has no
/// root element.
pub(crate) fn build_ast(
    template: &str,
    options: &CompilerOptions,
    diags: &mut Diagnostics,
) -> Option<AstElement> {
    let mut builder = TreeBuilder {
        template,
        options,
        diags,
        root: None,
        root_seen: false,
        stack: Vec::new(),
        pre_depth: 0,
        warned: false,
        skipped_depth: 0,
        nesting_warned: false,
    };
    parser::parse(template, &options.parse_options(), &mut builder);
    log::trace!(
        target: "template.compiler",
        "tree built: root={:?}",
        builder.root.as_ref().map(|el| el.tag.as_str())
    );
    builder.root
}

/// Splits `text` on `delimiters` into static runs and trimmed expressions.
/// An open delimiter without a close stays static.
pub fn parse_text(text: &str, delimiters: &Delimiters) -> Vec<TextPart> {
    let (open, close) = (delimiters.open.as_str(), delimiters.close.as_str());
    let mut parts = Vec::new();
    let mut rest = text;
    while !open.is_empty() && !close.is_empty() {
        let Some(at) = rest.find(open) else { break };
        let inner_start = at + open.len();
        let Some(len) = rest[inner_start..].find(close) else { break };
        if len == 0 {
            // `{{}}` holds nothing; keep the delimiters as text.
            push_static(&mut parts, &rest[..inner_start + close.len()]);
            rest = &rest[inner_start + close.len()..];
            continue;
        }
        push_static(&mut parts, &rest[..at]);
        parts.push(TextPart::Expr(rest[inner_start..inner_start + len].trim().to_string()));
        rest = &rest[inner_start + len + close.len()..];
    }
    push_static(&mut parts, rest);
    parts
}

fn push_static(parts: &mut Vec<TextPart>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(TextPart::Static(last)) = parts.last_mut() {
        last.push_str(text);
    } else {
        parts.push(TextPart::Static(text.to_string()));
    }
}

pub(crate) fn has_interpolation(text: &str, delimiters: &Delimiters) -> bool {
    parse_text(text, delimiters)
        .iter()
        .any(|part| matches!(part, TextPart::Expr(_)))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Placement {
    Root,
    Child,
    /// Built for diagnostics, then dropped.
    Detached,
}

struct Frame {
    el: AstElement,
    placement: Placement,
}

struct TreeBuilder<'a> {
    template: &'a str,
    options: &'a CompilerOptions,
    diags: &'a mut Diagnostics,
    root: Option<AstElement>,
    root_seen: bool,
    stack: Vec<Frame>,
    pre_depth: usize,
    /// Root-level complaints are reported once per template.
    warned: bool,
    /// Open elements currently being dropped for exceeding `MAX_NESTING`.
    skipped_depth: usize,
    nesting_warned: bool,
}

impl TreeBuilder<'_> {
    fn warn_once(&mut self, msg: String, range: SourceRange) {
        if !self.warned {
            self.warned = true;
            self.diags.error(msg, range);
        }
    }

    fn process_attrs(&mut self, el: &mut AstElement) {
        let mut seen: Vec<&str> = Vec::with_capacity(el.attrs_list.len());
        let attrs = std::mem::take(&mut el.attrs_list);
        for attr in &attrs {
            let range = attr_range(attr);
            if seen.contains(&attr.name.as_str()) {
                self.diags.error(format!("duplicate attribute: {}", attr.name), range);
                continue;
            }
            seen.push(&attr.name);

            let name = attr.name.as_str();
            if let Some(arg) = name.strip_prefix("v-bind:").or_else(|| name.strip_prefix(':')) {
                let arg = strip_modifiers(arg);
                if attr.value.trim().is_empty() {
                    self.diags.error(
                        format!("The value for a v-bind expression cannot be empty. Found in \"v-bind:{arg}\""),
                        range,
                    );
                }
                let (name, dynamic_name) = match arg.strip_prefix('[').and_then(|a| a.strip_suffix(']')) {
                    Some(inner) => (inner.to_string(), true),
                    None => (arg.to_string(), false),
                };
                el.bindings.push(Binding {
                    name,
                    raw_name: attr.name.clone(),
                    dynamic_name,
                    expr: attr.value.trim().to_string(),
                    span: attr.span,
                });
            } else if name == "v-if" {
                el.condition = Some(attr.value.trim().to_string());
            } else if is_directive(name) {
                let directive = parse_directive(attr);
                if !self.options.directives.contains_key(&directive.name) {
                    self.diags.tip(
                        format!("Directive \"{}\" has no code generator here and will be ignored.", attr.name),
                        range,
                    );
                }
                el.directives.push(directive);
            } else {
                el.attrs.push((attr.name.clone(), attr.value.clone()));
            }
        }
        el.attrs_list = attrs;
    }

    fn check_plain_attrs(&mut self, el: &AstElement) {
        for (name, value) in &el.attrs {
            if has_interpolation(value, &self.options.delimiters) {
                let range = el.raw_attr(name).map(attr_range).unwrap_or(SourceRange::NONE);
                self.diags.error(
                    format!(
                        "{name}=\"{value}\": Interpolation inside attributes has been removed. \
                         Use v-bind or the colon shorthand instead. For example, instead of \
                         <div id=\"{{{{ val }}}}\">, use <div :id=\"val\">."
                    ),
                    range,
                );
            }
        }
    }

    fn placement_for(&mut self, el: &AstElement) -> Placement {
        if is_forbidden(el) {
            self.diags.error(
                format!(
                    "Templates should only be responsible for mapping the state to the UI. \
                     Avoid placing tags with side-effects in your templates, such as <{}>, \
                     as they will not be parsed.",
                    el.tag
                ),
                el.span.into(),
            );
            if !self.stack.is_empty() {
                return Placement::Detached;
            }
        }
        if !self.stack.is_empty() {
            return Placement::Child;
        }
        if self.root_seen {
            self.warn_once(
                "Component template should contain exactly one root element.".to_string(),
                el.span.into(),
            );
            return Placement::Detached;
        }
        self.root_seen = true;
        if el.tag == "slot" || el.tag == "template" {
            self.warn_once(
                format!(
                    "Cannot use <{}> as component root element because it may contain multiple nodes.",
                    el.tag
                ),
                SourceRange::at(el.span.start),
            );
        }
        Placement::Root
    }

    fn skip_nested(&mut self, unary: bool, span: Span) {
        if !self.nesting_warned {
            self.nesting_warned = true;
            self.diags.error(
                format!("Elements nested deeper than {MAX_NESTING} levels are ignored."),
                span.into(),
            );
        }
        if !unary {
            self.skipped_depth += 1;
        }
    }

    fn close(&mut self, frame: Frame) {
        let Frame { mut el, placement } = frame;
        if self.pre_depth == 0 {
            while let Some(AstNode::Text(text)) = el.children.last() {
                if text.text != " " {
                    break;
                }
                el.children.pop();
            }
        }
        if self.options.is_pre_tag.test(&el.tag) {
            self.pre_depth = self.pre_depth.saturating_sub(1);
        }
        match placement {
            Placement::Root => self.root = Some(el),
            Placement::Child => {
                if let Some(parent) = self.stack.last_mut() {
                    parent.el.children.push(AstNode::Element(el));
                }
            }
            Placement::Detached => {}
        }
    }
}

impl ParseHandler for TreeBuilder<'_> {
    fn start(&mut self, tag: &str, attrs: &[Attribute], unary: bool, span: Span) {
        if self.skipped_depth > 0 || self.stack.len() >= MAX_NESTING {
            self.skip_nested(unary, span);
            return;
        }
        let mut el = AstElement::new(tag, attrs.to_vec(), unary, span);
        self.process_attrs(&mut el);
        let options = self.options;
        for module in &options.modules {
            module.transform_node(&mut el, options, self.diags);
        }
        self.check_plain_attrs(&el);

        let placement = self.placement_for(&el);
        if options.is_pre_tag.test(tag) {
            self.pre_depth += 1;
        }
        let frame = Frame { el, placement };
        if unary {
            self.close(frame);
        } else {
            self.stack.push(frame);
        }
    }

    fn end(&mut self, _tag: &str, span: Span) {
        if self.skipped_depth > 0 {
            self.skipped_depth -= 1;
            return;
        }
        if let Some(mut frame) = self.stack.pop() {
            frame.el.span.end = span.end;
            self.close(frame);
        }
    }

    fn chars(&mut self, text: &str, span: Option<Span>) {
        if self.skipped_depth > 0 {
            return;
        }
        let range = span.map(SourceRange::from).unwrap_or(SourceRange::NONE);
        let in_pre = self.pre_depth > 0;
        let options = self.options;
        let Some(parent) = self.stack.last_mut() else {
            if text == self.template {
                self.warn_once(
                    "Component template requires a root element, rather than just text.".to_string(),
                    range,
                );
            } else if !text.trim().is_empty() {
                self.warn_once(
                    format!("text \"{}\" outside root element will be ignored.", text.trim()),
                    range,
                );
            }
            return;
        };

        let children = &mut parent.el.children;
        let text = if in_pre || !text.trim().is_empty() {
            if is_text_tag(&parent.el.tag) {
                text.to_string()
            } else {
                decode_text(text)
            }
        } else if children.is_empty() {
            return;
        } else {
            " ".to_string()
        };

        if text == " " {
            let last_is_space = matches!(children.last(), Some(AstNode::Text(t)) if t.text == " ");
            if last_is_space {
                return;
            }
        }
        let parts = if text == " " {
            vec![TextPart::Static(text.clone())]
        } else {
            parse_text(&text, &options.delimiters)
        };
        children.push(AstNode::Text(AstText { text, parts, span }));
    }

    fn comment(&mut self, text: &str, span: Span) {
        if self.skipped_depth > 0 {
            return;
        }
        if let Some(parent) = self.stack.last_mut() {
            parent.el.children.push(AstNode::Comment(AstComment {
                text: text.to_string(),
                span,
            }));
        }
    }

    fn warn(&mut self, msg: String, range: SourceRange) {
        self.diags.error(msg, range);
    }
}

fn attr_range(attr: &Attribute) -> SourceRange {
    attr.span.map(SourceRange::from).unwrap_or(SourceRange::NONE)
}

fn is_directive(name: &str) -> bool {
    name.starts_with("v-") || name.starts_with('@') || name.starts_with('#')
}

/// Script and style content is never entity-decoded.
fn is_text_tag(tag: &str) -> bool {
    tag == "script" || tag == "style"
}

fn is_forbidden(el: &AstElement) -> bool {
    match el.tag.as_str() {
        "style" => true,
        "script" => el
            .attrs
            .iter()
            .find(|(name, _)| name == "type")
            .is_none_or(|(_, ty)| ty.is_empty() || ty == "text/javascript"),
        _ => false,
    }
}

/// Drops `.modifier` suffixes outside a bracketed dynamic argument.
fn strip_modifiers(name: &str) -> &str {
    let search_from = name.rfind(']').unwrap_or(0);
    match name[search_from..].find('.') {
        Some(dot) => &name[..search_from + dot],
        None => name,
    }
}

fn modifiers_of(name: &str) -> Vec<String> {
    let search_from = name.rfind(']').unwrap_or(0);
    name[search_from..]
        .split('.')
        .skip(1)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_directive(attr: &Attribute) -> DirectiveBinding {
    let raw = attr.name.as_str();
    let modifiers = modifiers_of(raw);
    let bare = strip_modifiers(raw);
    let (name, arg) = if let Some(arg) = bare.strip_prefix('@') {
        ("on".to_string(), Some(arg))
    } else if let Some(arg) = bare.strip_prefix('#') {
        ("slot".to_string(), Some(arg))
    } else {
        let body = bare.strip_prefix("v-").unwrap_or(bare);
        match body.split_once(':') {
            Some((name, arg)) => (name.to_string(), Some(arg)),
            None => (body.to_string(), None),
        }
    };
    DirectiveBinding {
        name,
        raw_name: raw.to_string(),
        arg: arg.filter(|a| !a.is_empty()).map(str::to_string),
        modifiers,
        value: attr.value.trim().to_string(),
        span: attr.span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::DiagnosticKind;
    use crate::web::base_options;

    fn build(template: &str) -> (Option<AstElement>, Vec<String>, Vec<String>) {
        let options = base_options();
        let mut diags = Diagnostics::new(None);
        let root = build_ast(template, &options, &mut diags);
        let (errors, tips) = diags.into_parts();
        (
            root,
            errors.into_iter().map(|e| e.msg).collect(),
            tips.into_iter().map(|t| t.msg).collect(),
        )
    }

    fn texts(el: &AstElement) -> Vec<&str> {
        el.children
            .iter()
            .filter_map(|child| match child {
                AstNode::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn splits_interpolation() {
        let parts = parse_text("Hi {{ name }}!{{x}}", &Delimiters::default());
        assert_eq!(
            parts,
            [
                TextPart::Static("Hi ".into()),
                TextPart::Expr("name".into()),
                TextPart::Static("!".into()),
                TextPart::Expr("x".into()),
            ]
        );
        assert_eq!(
            parse_text("a {{ b", &Delimiters::default()),
            [TextPart::Static("a {{ b".into())]
        );
        assert_eq!(
            parse_text("[[x]]{{y}}", &Delimiters::new("[[", "]]")),
            [TextPart::Expr("x".into()), TextPart::Static("{{y}}".into())]
        );
    }

    #[test]
    fn classifies_attributes() {
        let (root, errors, tips) =
            build(r#"<div id="a" :title="t" v-bind:[k]="v" v-if="ok" v-text="msg" @click.stop="go"></div>"#);
        let root = root.expect("root");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(root.attrs, [("id".to_string(), "a".to_string())]);
        assert_eq!(root.bindings.len(), 2);
        assert_eq!((root.bindings[0].name.as_str(), root.bindings[0].dynamic_name), ("title", false));
        assert_eq!((root.bindings[1].name.as_str(), root.bindings[1].dynamic_name), ("k", true));
        assert_eq!(root.condition.as_deref(), Some("ok"));
        assert_eq!(root.directives[0].name, "text");
        let on = &root.directives[1];
        assert_eq!((on.name.as_str(), on.arg.as_deref()), ("on", Some("click")));
        assert_eq!(on.modifiers, ["stop"]);
        assert_eq!(tips.len(), 1);
        assert!(tips[0].contains("@click.stop"));
    }

    #[test]
    fn single_root_enforced() {
        let (root, errors, _) = build("<a></a><b></b><c></c>");
        assert_eq!(root.map(|r| r.tag), Some("a".to_string()));
        assert_eq!(errors, ["Component template should contain exactly one root element."]);
    }

    #[test]
    fn text_only_template() {
        let (root, errors, _) = build("hello");
        assert!(root.is_none());
        assert_eq!(errors, ["Component template requires a root element, rather than just text."]);
    }

    #[test]
    fn text_outside_root_is_reported_once() {
        let (_, errors, _) = build("<div></div> tail <p></p>");
        assert_eq!(errors, ["text \"tail\" outside root element will be ignored."]);
    }

    #[test]
    fn whitespace_is_condensed_and_trailing_removed() {
        let (root, _, _) = build("<div>\n  <span>a</span>\n  <span>b</span>\n</div>");
        let root = root.expect("root");
        assert_eq!(texts(&root), [" "]);
        assert_eq!(root.children.len(), 3);
    }

    #[test]
    fn pre_keeps_whitespace() {
        let (root, _, _) = build("<pre>  a  \n</pre>");
        assert_eq!(texts(&root.expect("root")), ["  a  \n"]);
    }

    #[test]
    fn entities_decoded_in_text() {
        let (root, _, _) = build("<p>a &amp; b &lt;</p>");
        assert_eq!(texts(&root.expect("root")), ["a & b <"]);
    }

    #[test]
    fn duplicate_and_empty_bind_are_errors() {
        let (_, errors, _) = build(r#"<div id="a" id="b" :x=""></div>"#);
        assert_eq!(
            errors,
            [
                "duplicate attribute: id",
                "The value for a v-bind expression cannot be empty. Found in \"v-bind:x\"",
            ]
        );
    }

    #[test]
    fn interpolation_in_plain_attribute_is_error() {
        let (_, errors, _) = build(r#"<div title="{{ t }}"></div>"#);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("title=\"{{ t }}\": Interpolation inside attributes"));
    }

    #[test]
    fn forbidden_elements_are_dropped() {
        let (root, errors, _) = build("<div><style>a{}</style><script type=\"text/x-template\"></script></div>");
        let root = root.expect("root");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("such as <style>"));
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn template_root_is_reported() {
        let (_, errors, _) = build("<template><a></a></template>");
        assert_eq!(
            errors,
            ["Cannot use <template> as component root element because it may contain multiple nodes."]
        );
    }

    #[test]
    fn parser_warnings_become_errors() {
        let mut diags = Diagnostics::new(Some(0));
        let options = base_options();
        build_ast("<div><span></div>", &options, &mut diags);
        let errors = diags.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].msg, "tag <span> has no matching end tag.");
        assert_eq!(errors[0].kind, DiagnosticKind::Error);
        assert_eq!((errors[0].start, errors[0].end), (Some(5), Some(11)));
    }

    #[test]
    fn directive_names_and_modifiers() {
        let attr = |name: &str| Attribute {
            name: name.to_string(),
            value: " x ".to_string(),
            span: None,
        };
        let d = parse_directive(&attr("v-model.trim.lazy"));
        assert_eq!((d.name.as_str(), d.arg.as_deref()), ("model", None));
        assert_eq!(d.modifiers, ["trim", "lazy"]);
        assert_eq!(d.value, "x");
        let d = parse_directive(&attr("v-on:[ev.name].once"));
        assert_eq!((d.name.as_str(), d.arg.as_deref()), ("on", Some("[ev.name]")));
        assert_eq!(d.modifiers, ["once"]);
        let d = parse_directive(&attr("#header"));
        assert_eq!((d.name.as_str(), d.arg.as_deref()), ("slot", Some("header")));
    }

    #[test]
    fn nesting_below_the_limit_is_dropped_once() {
        let depth = 300;
        let template = format!(
            "<main>{}x{}<p>y</p></main>",
            "<div>".repeat(depth),
            "</div>".repeat(depth)
        );
        let (root, errors, _) = build(&template);
        assert_eq!(
            errors,
            [format!("Elements nested deeper than {MAX_NESTING} levels are ignored.")]
        );
        let root = root.expect("root");
        let tags: Vec<&str> = root
            .children
            .iter()
            .filter_map(|child| match child {
                AstNode::Element(el) => Some(el.tag.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(tags, ["div", "p"]);

        let mut levels = 1;
        let mut el = &root;
        while let Some(AstNode::Element(child)) = el.children.first() {
            levels += 1;
            el = child;
        }
        assert_eq!(levels, MAX_NESTING);
        assert!(el.children.is_empty());
    }
}

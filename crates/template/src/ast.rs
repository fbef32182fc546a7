//! Element tree produced by the web base compile and consumed by modules,
//! directives, the optimizer, code generation and the error detector.

use crate::parser::Attribute;
use crate::span::Span;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AstNode {
    Element(AstElement),
    Text(AstText),
    Comment(AstComment),
}

impl AstNode {
    pub fn is_static(&self) -> bool {
        match self {
            AstNode::Element(el) => el.is_static,
            AstNode::Text(text) => text.is_static(),
            AstNode::Comment(_) => true,
        }
    }
}

/// `:name="expr"` or `v-bind:name="expr"`. A bracketed name, `:[key]`,
/// is itself an expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    /// Attribute name as written, e.g. `v-bind:[key]`.
    pub raw_name: String,
    pub dynamic_name: bool,
    pub expr: String,
    pub span: Option<Span>,
}

/// `v-name:arg.modifier="value"` other than the forms handled natively.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectiveBinding {
    pub name: String,
    pub raw_name: String,
    pub arg: Option<String>,
    pub modifiers: Vec<String>,
    pub value: String,
    pub span: Option<Span>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AstElement {
    pub tag: String,
    /// Attributes exactly as the parser reported them.
    pub attrs_list: Vec<Attribute>,
    /// Plain attributes left after bindings, directives and module-owned
    /// attributes were taken out.
    pub attrs: Vec<(String, String)>,
    pub bindings: Vec<Binding>,
    /// `v-if` expression.
    pub condition: Option<String>,
    pub directives: Vec<DirectiveBinding>,
    pub static_class: Option<String>,
    pub static_style: Option<String>,
    pub children: Vec<AstNode>,
    pub unary: bool,
    pub span: Span,
    pub is_static: bool,
    pub static_root: bool,
}

impl AstElement {
    pub fn new(tag: &str, attrs_list: Vec<Attribute>, unary: bool, span: Span) -> Self {
        Self {
            tag: tag.to_string(),
            attrs_list,
            unary,
            span,
            ..Self::default()
        }
    }

    /// Removes the plain attribute `name` and returns its value.
    pub fn take_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|(n, _)| n == name)?;
        Some(self.attrs.remove(index).1)
    }

    pub fn raw_attr(&self, name: &str) -> Option<&Attribute> {
        self.attrs_list.iter().find(|attr| attr.name == name)
    }

    /// Names of the features this element carries, as matched against the
    /// optimizer's static key set.
    pub fn feature_keys(&self) -> Vec<&'static str> {
        let mut keys = vec!["tag", "children"];
        if !self.attrs.is_empty() {
            keys.push("attrs");
        }
        if self.static_class.is_some() {
            keys.push("staticClass");
        }
        if self.static_style.is_some() {
            keys.push("staticStyle");
        }
        if !self.bindings.is_empty() {
            keys.push("bindings");
        }
        if self.condition.is_some() {
            keys.push("if");
        }
        if !self.directives.is_empty() {
            keys.push("directives");
        }
        keys
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextPart {
    Static(String),
    Expr(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AstText {
    /// Decoded text the parts were split from.
    pub text: String,
    pub parts: Vec<TextPart>,
    pub span: Option<Span>,
}

impl AstText {
    pub fn is_static(&self) -> bool {
        self.parts.iter().all(|part| matches!(part, TextPart::Static(_)))
    }

    pub fn is_whitespace(&self) -> bool {
        self.parts.iter().all(|part| match part {
            TextPart::Static(text) => text.trim().is_empty(),
            TextPart::Expr(_) => false,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AstComment {
    pub text: String,
    pub span: Span,
}

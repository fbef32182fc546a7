//! Compiler configuration: platform defaults plus per-call overrides.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use super::diagnostics::{DiagnosticSink, Diagnostics};
use crate::ast::{AstElement, DirectiveBinding};
use crate::parser::ParseOptions;
use crate::tags::{self, TagPredicate};

/// Interpolation markers for text, `{{` and `}}` by default.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Delimiters {
    pub open: String,
    pub close: String,
}

impl Delimiters {
    pub fn new(open: &str, close: &str) -> Self {
        Self {
            open: open.to_string(),
            close: close.to_string(),
        }
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new("{{", "}}")
    }
}

impl fmt::Display for Delimiters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.open, self.close)
    }
}

/// Per-element transform contributed by the platform or the caller.
pub trait CompilerModule: fmt::Debug + Send + Sync {
    /// Element features this module introduces that don't stop an element
    /// from being static.
    fn static_keys(&self) -> &[&'static str] {
        &[]
    }

    /// Runs once per element after its attributes have been sorted into
    /// bindings and directives, before its children are built.
    fn transform_node(&self, _el: &mut AstElement, _options: &CompilerOptions, _diags: &mut Diagnostics) {}
}

/// Code generation for a `v-name` directive.
pub trait Directive: fmt::Debug + Send + Sync {
    /// Render code replacing the element's children, if this directive
    /// supplies them.
    fn gen_children(&self, binding: &DirectiveBinding) -> Option<String>;
}

/// Fully resolved options for one compile.
#[derive(Clone, Debug)]
pub struct CompilerOptions {
    pub expect_html: bool,
    pub is_unary_tag: TagPredicate,
    pub can_be_left_open_tag: TagPredicate,
    pub is_raw_text_tag: TagPredicate,
    pub is_pre_tag: TagPredicate,
    pub should_decode_newlines: bool,
    pub should_decode_newlines_for_href: bool,
    pub output_source_range: bool,
    /// Keep comments in the output.
    pub comments: bool,
    pub delimiters: Delimiters,
    /// Run static analysis and hoist static subtrees.
    pub optimize: bool,
    pub static_keys: BTreeSet<String>,
    pub modules: Vec<Arc<dyn CompilerModule>>,
    pub directives: BTreeMap<String, Arc<dyn Directive>>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            expect_html: false,
            is_unary_tag: TagPredicate::none(),
            can_be_left_open_tag: TagPredicate::none(),
            is_raw_text_tag: TagPredicate::new(tags::is_plain_text_element),
            is_pre_tag: TagPredicate::none(),
            should_decode_newlines: false,
            should_decode_newlines_for_href: false,
            output_source_range: false,
            comments: false,
            delimiters: Delimiters::default(),
            optimize: true,
            static_keys: BTreeSet::new(),
            modules: Vec::new(),
            directives: BTreeMap::new(),
        }
    }
}

/// Caller overrides for a single compile. `None` and empty collections
/// leave the base value alone.
#[derive(Clone, Debug, Default)]
pub struct CompileOptions {
    pub expect_html: Option<bool>,
    pub is_unary_tag: Option<TagPredicate>,
    pub can_be_left_open_tag: Option<TagPredicate>,
    pub is_raw_text_tag: Option<TagPredicate>,
    pub is_pre_tag: Option<TagPredicate>,
    pub should_decode_newlines: Option<bool>,
    pub should_decode_newlines_for_href: Option<bool>,
    pub output_source_range: Option<bool>,
    pub comments: Option<bool>,
    pub delimiters: Option<Delimiters>,
    pub optimize: Option<bool>,
    pub static_keys: Option<BTreeSet<String>>,
    /// Appended after the base modules.
    pub modules: Vec<Arc<dyn CompilerModule>>,
    /// Layered over the base directives; same name replaces.
    pub directives: BTreeMap<String, Arc<dyn Directive>>,
    /// Where `compile_to_functions` reports; the compiler's default sink
    /// otherwise.
    pub warn: Option<Arc<dyn DiagnosticSink>>,
}

impl CompilerOptions {
    /// Layers `overrides` over `self`. `self` is left untouched.
    pub fn merge(&self, overrides: &CompileOptions) -> CompilerOptions {
        let mut merged = self.clone();
        merged
            .modules
            .extend(overrides.modules.iter().cloned());
        for (name, directive) in &overrides.directives {
            merged.directives.insert(name.clone(), Arc::clone(directive));
        }

        fn replace<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *slot = value.clone();
            }
        }
        replace(&mut merged.expect_html, &overrides.expect_html);
        replace(&mut merged.is_unary_tag, &overrides.is_unary_tag);
        replace(&mut merged.can_be_left_open_tag, &overrides.can_be_left_open_tag);
        replace(&mut merged.is_raw_text_tag, &overrides.is_raw_text_tag);
        replace(&mut merged.is_pre_tag, &overrides.is_pre_tag);
        replace(&mut merged.should_decode_newlines, &overrides.should_decode_newlines);
        replace(
            &mut merged.should_decode_newlines_for_href,
            &overrides.should_decode_newlines_for_href,
        );
        replace(&mut merged.output_source_range, &overrides.output_source_range);
        replace(&mut merged.comments, &overrides.comments);
        replace(&mut merged.delimiters, &overrides.delimiters);
        replace(&mut merged.optimize, &overrides.optimize);
        replace(&mut merged.static_keys, &overrides.static_keys);
        merged
    }

    /// The subset the markup parser consults.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            expect_html: self.expect_html,
            is_unary_tag: self.is_unary_tag.clone(),
            can_be_left_open_tag: self.can_be_left_open_tag.clone(),
            is_raw_text_tag: self.is_raw_text_tag.clone(),
            should_keep_comment: self.comments,
            should_decode_newlines: self.should_decode_newlines,
            should_decode_newlines_for_href: self.should_decode_newlines_for_href,
            output_source_range: self.output_source_range,
        }
    }

    /// Static keys plus every module's contribution.
    pub fn effective_static_keys(&self) -> BTreeSet<&str> {
        self.static_keys
            .iter()
            .map(String::as_str)
            .chain(self.modules.iter().flat_map(|m| m.static_keys().iter().copied()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Named(&'static str);

    impl CompilerModule for Named {
        fn static_keys(&self) -> &[&'static str] {
            std::slice::from_ref(&self.0)
        }
    }

    #[derive(Debug)]
    struct Echo(&'static str);

    impl Directive for Echo {
        fn gen_children(&self, _binding: &DirectiveBinding) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    fn base() -> CompilerOptions {
        let mut directives: BTreeMap<String, Arc<dyn Directive>> = BTreeMap::new();
        directives.insert("text".into(), Arc::new(Echo("base-text")));
        directives.insert("html".into(), Arc::new(Echo("base-html")));
        CompilerOptions {
            modules: vec![Arc::new(Named("a"))],
            directives,
            ..CompilerOptions::default()
        }
    }

    #[test]
    fn merge_concatenates_modules() {
        let overrides = CompileOptions {
            modules: vec![Arc::new(Named("b"))],
            ..CompileOptions::default()
        };
        let merged = base().merge(&overrides);
        let keys: Vec<_> = merged.effective_static_keys().into_iter().collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(merged.modules.len(), 2);
    }

    #[test]
    fn merge_layers_directives() {
        let mut directives: BTreeMap<String, Arc<dyn Directive>> = BTreeMap::new();
        directives.insert("text".into(), Arc::new(Echo("override-text")));
        directives.insert("show".into(), Arc::new(Echo("override-show")));
        let merged = base().merge(&CompileOptions {
            directives,
            ..CompileOptions::default()
        });
        let binding = DirectiveBinding {
            name: "text".into(),
            raw_name: "v-text".into(),
            arg: None,
            modifiers: Vec::new(),
            value: "x".into(),
            span: None,
        };
        let gen_for = |name: &str| merged.directives[name].gen_children(&binding);
        assert_eq!(gen_for("text").as_deref(), Some("override-text"));
        assert_eq!(gen_for("html").as_deref(), Some("base-html"));
        assert_eq!(gen_for("show").as_deref(), Some("override-show"));
    }

    #[test]
    fn merge_replaces_scalars_and_leaves_base_alone() {
        let base = base();
        let merged = base.merge(&CompileOptions {
            delimiters: Some(Delimiters::new("${", "}")),
            comments: Some(true),
            ..CompileOptions::default()
        });
        assert_eq!(merged.delimiters.to_string(), "${,}");
        assert!(merged.comments);
        assert_eq!(base.delimiters, Delimiters::default());
        assert!(!base.comments);
    }

    #[test]
    fn parse_options_maps_comments_flag() {
        let options = CompilerOptions {
            comments: true,
            output_source_range: true,
            ..CompilerOptions::default()
        };
        let parse = options.parse_options();
        assert!(parse.should_keep_comment);
        assert!(parse.output_source_range);
    }
}

//! Tag-name vocabularies consulted while parsing and compiling.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Shareable yes/no test over tag names.
#[derive(Clone)]
pub struct TagPredicate(Arc<dyn Fn(&str) -> bool + Send + Sync>);

impl TagPredicate {
    pub fn new(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Matches nothing.
    pub fn none() -> Self {
        Self::new(|_| false)
    }

    /// Exact, case-sensitive membership in `names`.
    pub fn from_names(names: &[&str]) -> Self {
        let set: HashSet<String> = names.iter().map(|name| (*name).to_string()).collect();
        Self::new(move |tag| set.contains(tag))
    }

    pub fn test(&self, tag: &str) -> bool {
        (self.0)(tag)
    }
}

impl Default for TagPredicate {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for TagPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TagPredicate(..)")
    }
}

/// Elements whose content is raw text up to the matching close tag.
pub fn is_plain_text_element(tag: &str) -> bool {
    ["script", "style", "textarea"]
        .iter()
        .any(|name| tag.eq_ignore_ascii_case(name))
}

/// Raw-text elements whose content is passed through untouched; the rest get
/// comment and CDATA wrappers stripped.
pub(crate) fn is_opaque_text_element(lower_tag: &str) -> bool {
    is_plain_text_element(lower_tag) || lower_tag == "noscript"
}

/// Elements that drop a newline immediately following their start tag.
pub(crate) fn ignores_first_newline(tag: &str) -> bool {
    tag.eq_ignore_ascii_case("pre") || tag.eq_ignore_ascii_case("textarea")
}

/// Elements that may not appear inside an open `<p>`.
pub(crate) fn is_non_phrasing_tag(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "base"
            | "blockquote"
            | "body"
            | "caption"
            | "col"
            | "colgroup"
            | "dd"
            | "details"
            | "dialog"
            | "div"
            | "dl"
            | "dt"
            | "fieldset"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "head"
            | "header"
            | "hgroup"
            | "hr"
            | "html"
            | "legend"
            | "li"
            | "menuitem"
            | "meta"
            | "optgroup"
            | "option"
            | "param"
            | "rp"
            | "rt"
            | "source"
            | "style"
            | "summary"
            | "tbody"
            | "td"
            | "tfoot"
            | "th"
            | "thead"
            | "title"
            | "tr"
            | "track"
    )
}

/// Void elements of the web platform.
pub fn is_unary_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "frame"
            | "hr"
            | "img"
            | "input"
            | "isindex"
            | "keygen"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Elements whose end tag may be omitted.
pub fn can_be_left_open_tag(tag: &str) -> bool {
    matches!(
        tag,
        "colgroup"
            | "dd"
            | "dt"
            | "li"
            | "options"
            | "p"
            | "td"
            | "tfoot"
            | "th"
            | "thead"
            | "tr"
            | "source"
    )
}

pub fn is_pre_tag(tag: &str) -> bool {
    tag == "pre"
}

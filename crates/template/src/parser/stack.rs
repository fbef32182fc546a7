//! Stack of currently open tags.

use super::Attribute;
use crate::span::Span;

/// Entry in the open-tag stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct OpenTag {
    pub(crate) tag: String,
    /// Lower-cased name used for end-tag matching.
    pub(crate) lower: String,
    pub(crate) attrs: Vec<Attribute>,
    pub(crate) span: Span,
}

impl OpenTag {
    pub(crate) fn new(tag: &str, attrs: Vec<Attribute>, span: Span) -> Self {
        Self {
            tag: tag.to_string(),
            lower: tag.to_lowercase(),
            attrs,
            span,
        }
    }
}

/// Open tags in document order; the last entry is the innermost.
#[derive(Clone, Debug, Default)]
pub(crate) struct OpenTagStack {
    items: Vec<OpenTag>,
}

impl OpenTagStack {
    pub(crate) fn push(&mut self, entry: OpenTag) {
        self.items.push(entry);
    }

    pub(crate) fn current(&self) -> Option<&OpenTag> {
        self.items.last()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the innermost entry whose lower-cased name is `lower`.
    pub(crate) fn position_of(&self, lower: &str) -> Option<usize> {
        self.items.iter().rposition(|entry| entry.lower == lower)
    }

    /// Removes entries from `index` to the top and returns them innermost
    /// first.
    pub(crate) fn pop_from(&mut self, index: usize) -> Vec<OpenTag> {
        debug_assert!(index <= self.items.len());
        let mut closed = self.items.split_off(index);
        closed.reverse();
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::{OpenTag, OpenTagStack};
    use crate::span::Span;

    fn entry(tag: &str, start: usize) -> OpenTag {
        OpenTag::new(tag, Vec::new(), Span::new(start, start + tag.len() + 2))
    }

    #[test]
    fn position_of_finds_innermost_match() {
        let mut stack = OpenTagStack::default();
        stack.push(entry("div", 0));
        stack.push(entry("span", 5));
        stack.push(entry("div", 11));
        assert_eq!(stack.position_of("div"), Some(2));
        assert_eq!(stack.position_of("span"), Some(1));
        assert_eq!(stack.position_of("p"), None);
    }

    #[test]
    fn matching_uses_lowercased_name() {
        let mut stack = OpenTagStack::default();
        stack.push(entry("DIV", 0));
        assert_eq!(stack.position_of("div"), Some(0));
        assert_eq!(stack.current().map(|e| e.tag.as_str()), Some("DIV"));
    }

    #[test]
    fn pop_from_returns_innermost_first() {
        let mut stack = OpenTagStack::default();
        stack.push(entry("a", 0));
        stack.push(entry("b", 3));
        stack.push(entry("c", 6));
        let closed = stack.pop_from(1);
        let names: Vec<_> = closed.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(names, ["c", "b"]);
        assert_eq!(stack.current().map(|e| e.tag.as_str()), Some("a"));
    }
}

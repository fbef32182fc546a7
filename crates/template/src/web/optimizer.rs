//! Static subtree detection.
//!
//! An element is static when it carries only features named in the static
//! key set and all of its children are static. Static elements with real
//! content become static roots, which code generation hoists into their own
//! procedures.

use std::collections::BTreeSet;

use crate::ast::{AstElement, AstNode};
use crate::compiler::CompilerOptions;

pub(crate) fn optimize(root: &mut AstElement, options: &CompilerOptions) {
    let keys = options.effective_static_keys();
    mark_static(root, &keys);
    mark_static_roots(root);
}

fn is_built_in(tag: &str) -> bool {
    tag == "slot" || tag == "component"
}

fn mark_static(el: &mut AstElement, keys: &BTreeSet<&str>) -> bool {
    let mut is_static =
        !is_built_in(&el.tag) && el.feature_keys().iter().all(|key| keys.contains(key));
    for child in &mut el.children {
        let child_static = match child {
            AstNode::Element(child) => mark_static(child, keys),
            other => other.is_static(),
        };
        is_static &= child_static;
    }
    el.is_static = is_static;
    is_static
}

fn mark_static_roots(el: &mut AstElement) {
    let only_text = matches!(el.children.as_slice(), [AstNode::Text(_) | AstNode::Comment(_)]);
    if el.is_static && !el.children.is_empty() && !only_text {
        el.static_root = true;
        return;
    }
    el.static_root = false;
    for child in &mut el.children {
        if let AstNode::Element(child) = child {
            mark_static_roots(child);
        }
    }
}

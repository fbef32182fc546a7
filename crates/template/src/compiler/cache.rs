//! Memo of materialized templates, keyed by template text and delimiters.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::options::Delimiters;
use crate::render::CompiledFunctions;

/// Cache key: the delimiter override (if any) followed by the template.
pub fn cache_key(template: &str, delimiters: Option<&Delimiters>) -> String {
    match delimiters {
        Some(delimiters) => format!("{delimiters}{template}"),
        None => template.to_string(),
    }
}

/// Append-only cache shared by every caller of one compiler.
///
/// Entries are never evicted. When two callers race on the same key, the
/// first insert wins and both get that entry back.
#[derive(Debug, Default)]
pub struct CompileCache {
    entries: Mutex<HashMap<String, Arc<CompiledFunctions>>>,
}

impl CompileCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<CompiledFunctions>>> {
        // Entries are inserted whole, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<Arc<CompiledFunctions>> {
        self.lock().get(key).cloned()
    }

    /// Stores `functions` under `key` unless an entry already exists, and
    /// returns whichever entry is now cached.
    pub fn insert(&self, key: String, functions: CompiledFunctions) -> Arc<CompiledFunctions> {
        Arc::clone(self.lock().entry(key).or_insert_with(|| Arc::new(functions)))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderFn;

    fn functions(text: &'static str) -> CompiledFunctions {
        CompiledFunctions {
            render: RenderFn::new(move |_| Ok(text.to_string())),
            static_render_fns: Vec::new(),
        }
    }

    #[test]
    fn key_prefixes_delimiters() {
        assert_eq!(cache_key("<a/>", None), "<a/>");
        assert_eq!(
            cache_key("<a/>", Some(&Delimiters::new("[[", "]]"))),
            "[[,]]<a/>"
        );
    }

    #[test]
    fn first_insert_wins() {
        let cache = CompileCache::new();
        let first = cache.insert("k".into(), functions("first"));
        let second = cache.insert("k".into(), functions("second"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            second.render(&serde_json::Value::Null),
            Ok("first".to_string())
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn get_returns_shared_entry() {
        let cache = CompileCache::new();
        assert!(cache.get("k").is_none());
        let stored = cache.insert("k".into(), functions("x"));
        let fetched = cache.get("k").expect("cached");
        assert!(Arc::ptr_eq(&stored, &fetched));
    }
}

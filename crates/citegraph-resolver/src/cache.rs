use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use citegraph_core::CitationMeta;

/// Successful lookups keyed by normalized identifier. Failures are never
/// stored, so a later build retries them. The lock is never held across an
/// await.
#[derive(Debug, Default)]
pub struct CitationCache {
    entries: RwLock<HashMap<String, CitationMeta>>,
}

impl CitationCache {
    pub fn get(&self, key: &str) -> Option<CitationMeta> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn insert(&self, key: String, meta: CitationMeta) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, meta);
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

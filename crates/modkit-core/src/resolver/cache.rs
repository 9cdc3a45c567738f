use crate::module_id::ModuleId;
use rustc_hash::FxHashMap;
use std::sync::{Mutex, PoisonError};

/// Kind of content cached per module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Html,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub module: ModuleId,
    pub kind: ContentKind,
}

impl CacheKey {
    pub fn html(module: &ModuleId) -> Self {
        Self {
            module: module.clone(),
            kind: ContentKind::Html,
        }
    }
}

/// Resolved content, filled on first resolution and never invalidated
#[derive(Debug, Default)]
pub struct ResolverCache {
    entries: Mutex<FxHashMap<CacheKey, String>>,
}

impl ResolverCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn insert(&self, key: CacheKey, content: String) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, content);
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

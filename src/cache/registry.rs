//! Name to backend resolution.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::cache::AppCache;

/// Resolves a configured cache name to a live backend handle.
///
/// Implementations must hand back the same backend for the same name for as
/// long as caches built from them are in use.
pub trait BackendResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Arc<dyn AppCache>>;
}

impl<F> BackendResolver for F
where
    F: Fn(&str) -> Option<Arc<dyn AppCache>> + Send + Sync,
{
    fn resolve(&self, name: &str) -> Option<Arc<dyn AppCache>> {
        self(name)
    }
}

impl BackendResolver for HashMap<String, Arc<dyn AppCache>> {
    fn resolve(&self, name: &str) -> Option<Arc<dyn AppCache>> {
        self.get(name).cloned()
    }
}

/// Concurrent registry of named cache backends.
#[derive(Default)]
pub struct CacheRegistry {
    caches: DashMap<String, Arc<dyn AppCache>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend under `name`, returning any backend it replaced.
    pub fn register(
        &self,
        name: impl Into<String>,
        backend: Arc<dyn AppCache>,
    ) -> Option<Arc<dyn AppCache>> {
        self.caches.insert(name.into(), backend)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AppCache>> {
        self.caches.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.caches.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
}

impl BackendResolver for CacheRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<dyn AppCache>> {
        self.get(name)
    }
}

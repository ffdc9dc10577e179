//! Memory cache implementation using cached::SizedCache with per-entry TTL.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cached::{Cached, SizedCache};

use crate::cache::key::{DEFAULT_VERSION, KeyMaker};
use crate::cache::{AppCache, CacheError};
use crate::config::settings::MemoryCacheConfig;

struct MemoryEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl MemoryEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

type Store = SizedCache<String, MemoryEntry>;

/// In-memory cache with LRU size limit and TTL.
pub struct MemoryCache {
    store: Mutex<Store>,
    keys: KeyMaker,
    default_ttl: u64,
}

impl MemoryCache {
    /// Fails with [`CacheError::Configuration`] when `max_size` is zero.
    pub fn new(
        config: &MemoryCacheConfig,
        keys: KeyMaker,
        default_ttl: u64,
    ) -> Result<Self, CacheError> {
        let store = SizedCache::try_with_size(config.max_size).map_err(|e| {
            CacheError::configuration(format!("invalid memory cache size {}: {}", config.max_size, e))
        })?;
        Ok(Self::with_store(store, keys, default_ttl))
    }

    fn with_store(store: Store, keys: KeyMaker, default_ttl: u64) -> Self {
        Self {
            store: Mutex::new(store),
            keys,
            default_ttl,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Store>, CacheError> {
        self.store
            .lock()
            .map_err(|e| CacheError::Operation(e.to_string()))
    }

    /// Look up a live entry, evicting it if it has expired.
    fn live_value(store: &mut Store, key: &str) -> Option<Vec<u8>> {
        let expired = match store.cache_get(key) {
            Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            store.cache_remove(key);
        }
        None
    }

    fn store_value(&self, store: &mut Store, key: String, value: Vec<u8>, ttl_seconds: Option<u64>) {
        let ttl = ttl_seconds.unwrap_or(self.default_ttl);
        if ttl == 0 {
            store.cache_remove(&key);
            return;
        }
        let entry = MemoryEntry {
            value,
            expires_at: Instant::now() + Duration::from_secs(ttl),
        };
        store.cache_set(key, entry);
    }
}

/// Size of the default store; must stay non-zero.
const DEFAULT_MAX_SIZE: usize = 1000;

impl Default for MemoryCache {
    fn default() -> Self {
        Self::with_store(
            SizedCache::with_size(DEFAULT_MAX_SIZE),
            KeyMaker::new("", DEFAULT_VERSION),
            300,
        )
    }
}

#[async_trait]
impl AppCache for MemoryCache {
    async fn get(&self, key: &str, version: Option<u32>) -> Result<Option<Vec<u8>>, CacheError> {
        let key = self.keys.make_key(key, version);
        let mut store = self.lock()?;
        Ok(Self::live_value(&mut store, &key))
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_seconds: Option<u64>,
        version: Option<u32>,
    ) -> Result<(), CacheError> {
        let key = self.keys.make_key(key, version);
        let mut store = self.lock()?;
        self.store_value(&mut store, key, value, ttl_seconds);
        Ok(())
    }

    async fn add(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_seconds: Option<u64>,
        version: Option<u32>,
    ) -> Result<bool, CacheError> {
        let key = self.keys.make_key(key, version);
        let mut store = self.lock()?;
        if Self::live_value(&mut store, &key).is_some() {
            return Ok(false);
        }
        self.store_value(&mut store, key, value, ttl_seconds);
        Ok(true)
    }

    async fn delete(&self, key: &str, version: Option<u32>) -> Result<(), CacheError> {
        let key = self.keys.make_key(key, version);
        let mut store = self.lock()?;
        store.cache_remove(&key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut store = self.lock()?;
        store.cache_clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_cache(max_size: usize) -> MemoryCache {
        MemoryCache::new(
            &MemoryCacheConfig { max_size },
            KeyMaker::new("test", 1),
            3600,
        )
        .unwrap()
    }

    #[test]
    fn test_zero_size_is_configuration_error() {
        let result = MemoryCache::new(&MemoryCacheConfig { max_size: 0 }, KeyMaker::default(), 60);
        assert!(result.err().unwrap().is_configuration());
    }

    #[tokio::test]
    async fn test_get_set() {
        let cache = small_cache(10);
        cache.set("key", b"value".to_vec(), None, None).await.unwrap();
        assert_eq!(cache.get("key", None).await.unwrap(), Some(b"value".to_vec()));
        assert_eq!(cache.get("missing", None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_value_is_a_hit() {
        let cache = small_cache(10);
        cache.set("key", Vec::new(), None, None).await.unwrap();
        assert_eq!(cache.get("key", None).await.unwrap(), Some(Vec::new()));
        assert!(cache.has_key("key", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_add_only_when_absent() {
        let cache = small_cache(10);
        assert!(cache.add("key", b"v1".to_vec(), None, None).await.unwrap());
        assert!(!cache.add("key", b"v2".to_vec(), None, None).await.unwrap());
        assert_eq!(cache.get("key", None).await.unwrap(), Some(b"v1".to_vec()));
    }

    #[tokio::test]
    async fn test_versions_are_separate() {
        let cache = small_cache(10);
        cache.set("key", b"one".to_vec(), None, Some(1)).await.unwrap();
        cache.set("key", b"two".to_vec(), None, Some(2)).await.unwrap();
        assert_eq!(cache.get("key", Some(1)).await.unwrap(), Some(b"one".to_vec()));
        assert_eq!(cache.get("key", Some(2)).await.unwrap(), Some(b"two".to_vec()));
        assert_eq!(cache.get("key", None).await.unwrap(), Some(b"one".to_vec()));
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let cache = small_cache(10);
        cache.set("key", b"value".to_vec(), None, None).await.unwrap();
        cache.set("key", b"gone".to_vec(), Some(0), None).await.unwrap();
        assert_eq!(cache.get("key", None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let cache = small_cache(10);
        cache.set("key", b"value".to_vec(), Some(1), None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(cache.get("key", None).await.unwrap(), None);
        assert!(cache.add("key", b"again".to_vec(), None, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_incr_resets_ttl_to_default() {
        use crate::cache::TypedCacheExt;

        let cache = small_cache(10);
        cache.set_json("counter", &1i64, Some(1), None).await.unwrap();
        assert_eq!(cache.incr("counter", 1, None).await.unwrap(), 2);

        // The short expiry is gone; the default of an hour applies now
        tokio::time::sleep(Duration::from_millis(1100)).await;
        let value: Option<i64> = cache.get_json("counter", None).await.unwrap();
        assert_eq!(value, Some(2));
    }

    #[tokio::test]
    async fn test_size_limit_evicts_least_recent() {
        let cache = small_cache(2);
        cache.set("a", b"1".to_vec(), None, None).await.unwrap();
        cache.set("b", b"2".to_vec(), None, None).await.unwrap();
        cache.set("c", b"3".to_vec(), None, None).await.unwrap();
        assert_eq!(cache.get("a", None).await.unwrap(), None);
        assert_eq!(cache.get("c", None).await.unwrap(), Some(b"3".to_vec()));
    }

    #[tokio::test]
    async fn test_batch_defaults() {
        let cache = small_cache(10);
        let data: std::collections::HashMap<String, Vec<u8>> = [("a", b"1".to_vec()), ("b", b"2".to_vec())]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        cache.set_many(&data, None, None).await.unwrap();

        let found = cache.get_many(&["a", "b", "c"], None).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found["b"], b"2".to_vec());

        cache.delete_many(&["a", "b"], None).await.unwrap();
        assert!(cache.get_many(&["a", "b"], None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = small_cache(10);
        cache.set("k1", b"v1".to_vec(), None, None).await.unwrap();
        cache.set("k2", b"v2".to_vec(), None, None).await.unwrap();
        cache.clear().await.unwrap();
        assert_eq!(cache.get("k1", None).await.unwrap(), None);
        assert_eq!(cache.get("k2", None).await.unwrap(), None);
    }
}

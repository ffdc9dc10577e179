//! Disk cache implementation with per-entry TTL support.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use cached::IOCached;
use cached::stores::DiskCache as CachedDiskCache;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::cache::key::KeyMaker;
use crate::cache::{AppCache, CacheError};
use crate::config::settings::DiskCacheConfig;

type Store = CachedDiskCache<String, Vec<u8>>;

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Option<u64>, // Unix timestamp in seconds
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        if let Some(exp) = self.expires_at {
            now_secs() >= exp
        } else {
            false
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Disk-based cache with per-entry TTL.
pub struct DiskCache {
    store: Mutex<Store>,
    keys: KeyMaker,
    default_ttl: u64,
}

impl DiskCache {
    pub fn new(
        config: &DiskCacheConfig,
        cache_name: &str,
        keys: KeyMaker,
        default_ttl: u64,
    ) -> Result<Self, CacheError> {
        // Set a very long lifespan - we manage TTL ourselves via CacheEntry
        let store = CachedDiskCache::new(cache_name)
            .set_disk_directory(&config.directory)
            .set_lifespan(Duration::from_secs(86400 * 365)) // 1 year max
            .build()
            .map_err(|e| CacheError::Connection(e.to_string()))?;
        Ok(Self {
            store: Mutex::new(store),
            keys,
            default_ttl,
        })
    }

    fn read_live(store: &Store, key: &String) -> Result<Option<Vec<u8>>, CacheError> {
        let Some(bytes) = store
            .cache_get(key)
            .map_err(|e| CacheError::Operation(e.to_string()))?
        else {
            return Ok(None);
        };

        match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) if !entry.is_expired() => return Ok(Some(entry.value)),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Unreadable disk cache entry, discarding");
            }
        }

        if let Err(e) = store.cache_remove(key) {
            tracing::warn!(key = %key, error = %e, "Failed to remove stale disk cache entry");
        }
        Ok(None)
    }

    fn write_entry(
        &self,
        store: &Store,
        key: String,
        value: Vec<u8>,
        ttl_seconds: Option<u64>,
    ) -> Result<(), CacheError> {
        let ttl = ttl_seconds.unwrap_or(self.default_ttl);
        if ttl == 0 {
            store
                .cache_remove(&key)
                .map_err(|e| CacheError::Operation(e.to_string()))?;
            return Ok(());
        }

        let entry = CacheEntry {
            value,
            expires_at: Some(now_secs() + ttl),
        };

        let bytes =
            serde_json::to_vec(&entry).map_err(|e| CacheError::Serialization(e.to_string()))?;

        store
            .cache_set(key, bytes)
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl AppCache for DiskCache {
    async fn get(&self, key: &str, version: Option<u32>) -> Result<Option<Vec<u8>>, CacheError> {
        let key = self.keys.make_key(key, version);
        let store = self.store.lock().await;
        Self::read_live(&store, &key)
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_seconds: Option<u64>,
        version: Option<u32>,
    ) -> Result<(), CacheError> {
        let key = self.keys.make_key(key, version);
        let store = self.store.lock().await;
        self.write_entry(&store, key, value, ttl_seconds)
    }

    async fn add(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_seconds: Option<u64>,
        version: Option<u32>,
    ) -> Result<bool, CacheError> {
        let key = self.keys.make_key(key, version);
        let store = self.store.lock().await;
        if Self::read_live(&store, &key)?.is_some() {
            return Ok(false);
        }
        self.write_entry(&store, key, value, ttl_seconds)?;
        Ok(true)
    }

    async fn delete(&self, key: &str, version: Option<u32>) -> Result<(), CacheError> {
        let key = self.keys.make_key(key, version);
        let store = self.store.lock().await;
        store
            .cache_remove(&key)
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let store = self.store.lock().await;
        let db = store.connection();

        // Use sled's clear (more efficient than iterating)
        db.clear()
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        db.flush()
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        Ok(())
    }
}

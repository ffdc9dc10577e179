//! AppCache trait definition.

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::CacheError;

/// Trait for cache operations.
///
/// All cache backends must implement this trait to provide a unified interface.
/// `version` selects a keyspace partition (`None` means the backend's default
/// version) and `ttl_seconds` overrides the backend's default expiry, with
/// `Some(0)` expiring the entry immediately.
#[async_trait]
pub trait AppCache: Send + Sync {
    /// Get a value from the cache.
    ///
    /// `Ok(None)` is a miss. A stored empty value is a hit.
    async fn get(&self, key: &str, version: Option<u32>) -> Result<Option<Vec<u8>>, CacheError>;

    /// Set a value in the cache with optional TTL override.
    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_seconds: Option<u64>,
        version: Option<u32>,
    ) -> Result<(), CacheError>;

    /// Set a value only if the key is absent.
    ///
    /// Returns `true` if the value was stored.
    async fn add(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_seconds: Option<u64>,
        version: Option<u32>,
    ) -> Result<bool, CacheError>;

    /// Remove a value from the cache.
    async fn delete(&self, key: &str, version: Option<u32>) -> Result<(), CacheError>;

    /// Clear all values from the cache.
    async fn clear(&self) -> Result<(), CacheError>;

    /// Check whether a live entry exists for the key.
    async fn has_key(&self, key: &str, version: Option<u32>) -> Result<bool, CacheError> {
        Ok(self.get(key, version).await?.is_some())
    }

    /// Fetch several keys at once.
    ///
    /// Missing keys are absent from the returned map.
    async fn get_many(
        &self,
        keys: &[&str],
        version: Option<u32>,
    ) -> Result<HashMap<String, Vec<u8>>, CacheError> {
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.get(key, version).await? {
                found.insert((*key).to_string(), value);
            }
        }
        Ok(found)
    }

    /// Store several key/value pairs at once.
    async fn set_many(
        &self,
        data: &HashMap<String, Vec<u8>>,
        ttl_seconds: Option<u64>,
        version: Option<u32>,
    ) -> Result<(), CacheError> {
        for (key, value) in data {
            self.set(key, value.clone(), ttl_seconds, version).await?;
        }
        Ok(())
    }

    /// Remove several keys at once.
    async fn delete_many(&self, keys: &[&str], version: Option<u32>) -> Result<(), CacheError> {
        for key in keys {
            self.delete(key, version).await?;
        }
        Ok(())
    }
}

/// JSON-typed helpers available on every cache.
#[async_trait]
pub trait TypedCacheExt: AppCache {
    /// Get and deserialize a JSON value.
    async fn get_json<T>(&self, key: &str, version: Option<u32>) -> Result<Option<T>, CacheError>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(key, version).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| CacheError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    /// Serialize a value as JSON and store it.
    async fn set_json<T>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: Option<u64>,
        version: Option<u32>,
    ) -> Result<(), CacheError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let bytes =
            serde_json::to_vec(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.set(key, bytes, ttl_seconds, version).await
    }

    /// Return the cached value, computing and adding it on a miss.
    ///
    /// If another writer stores the key between the miss and the add, the
    /// stored value is returned instead of the computed one.
    async fn get_or_set<T, F, Fut>(
        &self,
        key: &str,
        default: F,
        ttl_seconds: Option<u64>,
        version: Option<u32>,
    ) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = T> + Send,
    {
        if let Some(value) = self.get_json(key, version).await? {
            return Ok(value);
        }

        let value = default().await;
        let bytes =
            serde_json::to_vec(&value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.add(key, bytes, ttl_seconds, version).await?;

        Ok(self.get_json(key, version).await?.unwrap_or(value))
    }

    /// Add `delta` to a stored integer and return the new value.
    ///
    /// The updated entry is rewritten with the backend's default TTL; any
    /// expiry given when it was first stored is not kept.
    async fn incr(&self, key: &str, delta: i64, version: Option<u32>) -> Result<i64, CacheError> {
        let current: i64 = self
            .get_json(key, version)
            .await?
            .ok_or_else(|| CacheError::KeyNotFound(key.to_string()))?;
        let updated = current
            .checked_add(delta)
            .ok_or_else(|| CacheError::Operation(format!("Integer overflow for key '{}'", key)))?;
        self.set_json(key, &updated, None, version).await?;
        Ok(updated)
    }

    /// Subtract `delta` from a stored integer and return the new value.
    ///
    /// Resets the expiry like [`incr`](Self::incr).
    async fn decr(&self, key: &str, delta: i64, version: Option<u32>) -> Result<i64, CacheError> {
        let delta = delta
            .checked_neg()
            .ok_or_else(|| CacheError::Operation(format!("Integer overflow for key '{}'", key)))?;
        self.incr(key, delta, version).await
    }
}

impl<C: AppCache + ?Sized> TypedCacheExt for C {}

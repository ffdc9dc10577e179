//! Multi-level cache that fans operations out across ordered tiers.
//!
//! Reads fall through the tiers in declared order and stop at the first hit.
//! Writes go to every tier, one after another, and a failing tier never stops
//! the remaining tiers from being written or surfaces as an error.
//!
//! Batch reads merge every tier's answer with later tiers overwriting earlier
//! ones, so for `get_many` the *last* tier holding a key wins while for `get`
//! the *first* one does.
//!
//! A hit in a deep tier is not copied back into the earlier tiers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::cache::outcome::FanOutReport;
use crate::cache::registry::BackendResolver;
use crate::cache::{AppCache, CacheError};

struct Tier {
    name: String,
    backend: Arc<dyn AppCache>,
}

/// Cache facade over an ordered, non-empty list of backend tiers.
pub struct LayeredCache {
    name: String,
    tiers: Vec<Tier>,
}

impl LayeredCache {
    /// Build a layered cache, resolving each level name once.
    ///
    /// Fails with [`CacheError::Configuration`] if `levels` is empty or a
    /// name cannot be resolved.
    pub fn new<R, S>(name: impl Into<String>, levels: &[S], resolver: &R) -> Result<Self, CacheError>
    where
        R: BackendResolver + ?Sized,
        S: AsRef<str>,
    {
        let name = name.into();
        if levels.is_empty() {
            return Err(CacheError::configuration(format!(
                "no levels configured for '{}'",
                name
            )));
        }

        let tiers = levels
            .iter()
            .map(|level| {
                let level = level.as_ref();
                resolver
                    .resolve(level)
                    .map(|backend| Tier {
                        name: level.to_string(),
                        backend,
                    })
                    .ok_or_else(|| {
                        CacheError::configuration(format!(
                            "level '{}' of cache '{}' does not name a configured cache",
                            level, name
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let cache = Self { name, tiers };
        tracing::debug!(cache = %cache.name, levels = ?cache.levels(), "Layered cache created");
        Ok(cache)
    }

    /// Build a layered cache from already-resolved backends.
    pub fn from_tiers<I, S>(name: impl Into<String>, tiers: I) -> Result<Self, CacheError>
    where
        I: IntoIterator<Item = (S, Arc<dyn AppCache>)>,
        S: Into<String>,
    {
        let name = name.into();
        let tiers: Vec<Tier> = tiers
            .into_iter()
            .map(|(tier, backend)| Tier {
                name: tier.into(),
                backend,
            })
            .collect();
        if tiers.is_empty() {
            return Err(CacheError::configuration(format!(
                "no levels configured for '{}'",
                name
            )));
        }
        Ok(Self { name, tiers })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tier names in lookup order.
    pub fn levels(&self) -> Vec<&str> {
        self.tiers.iter().map(|t| t.name.as_str()).collect()
    }

    /// Backend handle of a tier by name.
    pub fn tier(&self, name: &str) -> Option<&Arc<dyn AppCache>> {
        self.tiers
            .iter()
            .find(|t| t.name == name)
            .map(|t| &t.backend)
    }

    /// Run `op` against every tier in order, recording each outcome.
    async fn fan_out<'a, F>(&'a self, operation: &'static str, op: F) -> FanOutReport
    where
        F: Fn(&'a dyn AppCache) -> BoxFuture<'a, Result<(), CacheError>>,
    {
        let mut report = FanOutReport::with_capacity(self.tiers.len());
        for tier in &self.tiers {
            let result = op(tier.backend.as_ref()).await;
            if let Err(e) = &result {
                tracing::warn!(
                    cache = %self.name,
                    tier = %tier.name,
                    operation,
                    error = %e,
                    "Cache tier failed, continuing with remaining tiers"
                );
            }
            report.record(&tier.name, result);
        }
        tracing::debug!(
            cache = %self.name,
            operation,
            failed = report.failure_count(),
            "Fan-out complete"
        );
        report
    }

    /// Return the value from the first tier that has the key.
    ///
    /// A tier that errors is treated as a miss.
    pub async fn get(&self, key: &str, version: Option<u32>) -> Option<Vec<u8>> {
        for tier in &self.tiers {
            match tier.backend.get(key, version).await {
                Ok(Some(value)) => {
                    tracing::debug!(cache = %self.name, tier = %tier.name, key, "Cache hit");
                    return Some(value);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        cache = %self.name,
                        tier = %tier.name,
                        key,
                        error = %e,
                        "Cache tier read failed, treating as miss"
                    );
                }
            }
        }
        tracing::debug!(cache = %self.name, key, "Cache miss on every tier");
        None
    }

    /// Like [`get`](Self::get), returning `default` when every tier misses.
    pub async fn get_or(&self, key: &str, default: Vec<u8>, version: Option<u32>) -> Vec<u8> {
        self.get(key, version).await.unwrap_or(default)
    }

    /// Write the value to every tier.
    pub async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_seconds: Option<u64>,
        version: Option<u32>,
    ) -> FanOutReport {
        self.fan_out("set", |backend| backend.set(key, value.clone(), ttl_seconds, version))
            .await
    }

    /// Add the value on every tier.
    ///
    /// Every tier is attempted. Returns `true` only if each tier stored the
    /// value; a tier that already held the key or failed makes it `false`,
    /// and tiers that did store it are not rolled back.
    pub async fn add(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_seconds: Option<u64>,
        version: Option<u32>,
    ) -> bool {
        let mut added_everywhere = true;
        for tier in &self.tiers {
            match tier.backend.add(key, value.clone(), ttl_seconds, version).await {
                Ok(true) => {}
                Ok(false) => added_everywhere = false,
                Err(e) => {
                    tracing::warn!(
                        cache = %self.name,
                        tier = %tier.name,
                        operation = "add",
                        error = %e,
                        "Cache tier failed, continuing with remaining tiers"
                    );
                    added_everywhere = false;
                }
            }
        }
        added_everywhere
    }

    pub async fn delete(&self, key: &str, version: Option<u32>) -> FanOutReport {
        self.fan_out("delete", |backend| backend.delete(key, version)).await
    }

    /// True as soon as one tier reports the key; later tiers are not asked.
    pub async fn has_key(&self, key: &str, version: Option<u32>) -> bool {
        for tier in &self.tiers {
            match tier.backend.has_key(key, version).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        cache = %self.name,
                        tier = %tier.name,
                        key,
                        error = %e,
                        "Cache tier lookup failed, treating as miss"
                    );
                }
            }
        }
        false
    }

    /// Merge every tier's hits; the last tier holding a key wins.
    pub async fn get_many(&self, keys: &[&str], version: Option<u32>) -> HashMap<String, Vec<u8>> {
        let mut results = HashMap::with_capacity(keys.len());
        for tier in &self.tiers {
            match tier.backend.get_many(keys, version).await {
                Ok(found) => results.extend(found),
                Err(e) => {
                    tracing::warn!(
                        cache = %self.name,
                        tier = %tier.name,
                        error = %e,
                        "Cache tier batch read failed, treating as miss"
                    );
                }
            }
        }
        results
    }

    pub async fn set_many(
        &self,
        data: &HashMap<String, Vec<u8>>,
        ttl_seconds: Option<u64>,
        version: Option<u32>,
    ) -> FanOutReport {
        self.fan_out("set_many", |backend| backend.set_many(data, ttl_seconds, version))
            .await
    }

    pub async fn delete_many(&self, keys: &[&str], version: Option<u32>) -> FanOutReport {
        self.fan_out("delete_many", |backend| backend.delete_many(keys, version))
            .await
    }

    pub async fn clear(&self) -> FanOutReport {
        self.fan_out("clear", |backend| backend.clear()).await
    }
}

impl fmt::Debug for LayeredCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayeredCache")
            .field("name", &self.name)
            .field("levels", &self.levels())
            .finish()
    }
}

// Tier failures are absorbed by the inherent methods, so none of these fail.
#[async_trait]
impl AppCache for LayeredCache {
    async fn get(&self, key: &str, version: Option<u32>) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(LayeredCache::get(self, key, version).await)
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_seconds: Option<u64>,
        version: Option<u32>,
    ) -> Result<(), CacheError> {
        LayeredCache::set(self, key, value, ttl_seconds, version).await;
        Ok(())
    }

    async fn add(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_seconds: Option<u64>,
        version: Option<u32>,
    ) -> Result<bool, CacheError> {
        Ok(LayeredCache::add(self, key, value, ttl_seconds, version).await)
    }

    async fn delete(&self, key: &str, version: Option<u32>) -> Result<(), CacheError> {
        LayeredCache::delete(self, key, version).await;
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        LayeredCache::clear(self).await;
        Ok(())
    }

    async fn has_key(&self, key: &str, version: Option<u32>) -> Result<bool, CacheError> {
        Ok(LayeredCache::has_key(self, key, version).await)
    }

    async fn get_many(
        &self,
        keys: &[&str],
        version: Option<u32>,
    ) -> Result<HashMap<String, Vec<u8>>, CacheError> {
        Ok(LayeredCache::get_many(self, keys, version).await)
    }

    async fn set_many(
        &self,
        data: &HashMap<String, Vec<u8>>,
        ttl_seconds: Option<u64>,
        version: Option<u32>,
    ) -> Result<(), CacheError> {
        LayeredCache::set_many(self, data, ttl_seconds, version).await;
        Ok(())
    }

    async fn delete_many(&self, keys: &[&str], version: Option<u32>) -> Result<(), CacheError> {
        LayeredCache::delete_many(self, keys, version).await;
        Ok(())
    }
}

//! Cache manager that builds every configured cache by name.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cache::disk::DiskCache;
use crate::cache::key::KeyMaker;
use crate::cache::layered::LayeredCache;
use crate::cache::memory::MemoryCache;
use crate::cache::noop::NoOpCache;
use crate::cache::redis::RedisCache;
use crate::cache::registry::CacheRegistry;
use crate::cache::{AppCache, CacheError};
use crate::config::settings::{CacheBackend, CacheConfig, Settings};

/// Name of the cache returned by [`CacheManager::default_cache`].
pub const DEFAULT_CACHE_ALIAS: &str = "default";

/// Owns the registry of configured caches.
///
/// Leaf backends are built first, then layered caches in dependency order so
/// a layered cache may use another layered cache as one of its levels.
#[derive(Clone)]
pub struct CacheManager {
    registry: Arc<CacheRegistry>,
    config: BTreeMap<String, CacheConfig>,
}

impl CacheManager {
    /// Build every cache in `caches`.
    pub async fn new(caches: BTreeMap<String, CacheConfig>) -> Result<Self, CacheError> {
        let registry = CacheRegistry::new();

        for (name, config) in &caches {
            if config.backend == CacheBackend::Layered {
                continue;
            }
            let backend = build_backend(name, config).await?;
            tracing::debug!(cache = %name, backend = ?config.backend, "Cache backend created");
            registry.register(name.clone(), backend);
        }

        let mut pending: Vec<(&String, &CacheConfig)> = caches
            .iter()
            .filter(|(_, config)| config.backend == CacheBackend::Layered)
            .collect();

        while !pending.is_empty() {
            let before = pending.len();
            let mut waiting = Vec::new();
            for (name, config) in pending {
                if config.levels.iter().all(|level| registry.contains(level)) {
                    let layered = LayeredCache::new(name.clone(), config.levels.as_slice(), &registry)?;
                    registry.register(name.clone(), Arc::new(layered));
                } else {
                    waiting.push((name, config));
                }
            }

            if waiting.len() == before {
                let names: Vec<&str> = waiting.iter().map(|(name, _)| name.as_str()).collect();
                return Err(CacheError::configuration(format!(
                    "cannot resolve levels for {} (unknown level or reference cycle)",
                    names.join(", ")
                )));
            }
            pending = waiting;
        }

        tracing::info!(caches = ?registry.names(), "Caches initialized");

        Ok(Self {
            registry: Arc::new(registry),
            config: caches,
        })
    }

    /// Validate `settings` and build its cache table.
    pub async fn from_settings(settings: &Settings) -> Result<Self, CacheError> {
        settings.validate()?;
        Self::new(settings.caches.clone()).await
    }

    /// Get a cache by its configured name.
    pub fn cache(&self, name: &str) -> Result<Arc<dyn AppCache>, CacheError> {
        self.registry.get(name).ok_or_else(|| {
            CacheError::configuration(format!("the cache '{}' is not configured", name))
        })
    }

    /// Get the cache configured as `default`.
    pub fn default_cache(&self) -> Result<Arc<dyn AppCache>, CacheError> {
        self.cache(DEFAULT_CACHE_ALIAS)
    }

    /// Registry of built caches, usable as a [`BackendResolver`](crate::cache::BackendResolver).
    pub fn registry(&self) -> &CacheRegistry {
        &self.registry
    }

    /// Get the configuration a cache was built from.
    pub fn config(&self, name: &str) -> Option<&CacheConfig> {
        self.config.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.registry.names()
    }
}

async fn build_backend(name: &str, config: &CacheConfig) -> Result<Arc<dyn AppCache>, CacheError> {
    let keys = KeyMaker::new(config.key_prefix.clone(), config.version);
    let backend: Arc<dyn AppCache> = match config.backend {
        CacheBackend::Memory => Arc::new(MemoryCache::new(&config.memory, keys, config.ttl_seconds)?),
        CacheBackend::Disk => Arc::new(DiskCache::new(
            &config.disk,
            name,
            keys,
            config.ttl_seconds,
        )?),
        CacheBackend::Redis => {
            // Namespace by cache name so `clear` stays scoped to this cache
            let prefix = if config.key_prefix.is_empty() {
                name.to_string()
            } else {
                format!("{}:{}", config.key_prefix, name)
            };
            let keys = KeyMaker::new(prefix, config.version);
            Arc::new(RedisCache::new(&config.redis, keys, config.ttl_seconds).await?)
        }
        CacheBackend::Dummy => Arc::new(NoOpCache::new()),
        CacheBackend::Layered => {
            return Err(CacheError::configuration(format!(
                "cache '{}' is layered and cannot be built as a backend",
                name
            )));
        }
    };
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::DiskCacheConfig;
    use tempfile::tempdir;

    fn memory() -> CacheConfig {
        CacheConfig::default()
    }

    fn layered(levels: &[&str]) -> CacheConfig {
        CacheConfig {
            backend: CacheBackend::Layered,
            levels: levels.iter().map(|l| l.to_string()).collect(),
            ..CacheConfig::default()
        }
    }

    #[tokio::test]
    async fn test_builds_layered_cache_over_named_levels() {
        let caches = BTreeMap::from([
            ("default".to_string(), layered(&["simple_in_mem", "simple_shared_mem"])),
            ("simple_in_mem".to_string(), memory()),
            ("simple_shared_mem".to_string(), memory()),
        ]);
        let manager = CacheManager::new(caches).await.unwrap();

        let cache = manager.default_cache().unwrap();
        cache.set("key", b"value".to_vec(), None, None).await.unwrap();

        let first = manager.cache("simple_in_mem").unwrap();
        let second = manager.cache("simple_shared_mem").unwrap();
        assert_eq!(first.get("key", None).await.unwrap(), Some(b"value".to_vec()));
        assert_eq!(second.get("key", None).await.unwrap(), Some(b"value".to_vec()));
        assert_eq!(manager.names().len(), 3);
    }

    #[tokio::test]
    async fn test_dummy_first_level_falls_through() {
        let caches = BTreeMap::from([
            ("default".to_string(), layered(&["complex_dummy", "complex_shared_mem"])),
            (
                "complex_dummy".to_string(),
                CacheConfig {
                    backend: CacheBackend::Dummy,
                    ..CacheConfig::default()
                },
            ),
            ("complex_shared_mem".to_string(), memory()),
        ]);
        let manager = CacheManager::new(caches).await.unwrap();
        let cache = manager.default_cache().unwrap();

        assert!(cache.add("key", b"value".to_vec(), None, None).await.unwrap());
        assert_eq!(cache.get("key", None).await.unwrap(), Some(b"value".to_vec()));
        assert!(!cache.add("key", b"other".to_vec(), None, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_layered_levels_may_be_layered() {
        let caches = BTreeMap::from([
            ("a".to_string(), memory()),
            ("b".to_string(), memory()),
            ("c".to_string(), memory()),
            ("default".to_string(), layered(&["inner", "c"])),
            ("inner".to_string(), layered(&["a", "b"])),
        ]);
        let manager = CacheManager::new(caches).await.unwrap();
        manager
            .default_cache()
            .unwrap()
            .set("k", b"v".to_vec(), None, None)
            .await
            .unwrap();
        let b = manager.cache("b").unwrap();
        assert_eq!(b.get("k", None).await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn test_missing_levels_is_configuration_error() {
        let caches = BTreeMap::from([("default".to_string(), layered(&[]))]);
        let err = CacheManager::new(caches).await.err().unwrap();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_cycle_is_configuration_error() {
        let caches = BTreeMap::from([
            ("x".to_string(), layered(&["y"])),
            ("y".to_string(), layered(&["x"])),
        ]);
        let err = CacheManager::new(caches).await.err().unwrap();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("x"));
    }

    #[tokio::test]
    async fn test_from_settings_validates_first() {
        let mut settings = Settings::default();
        assert!(CacheManager::from_settings(&settings).await.is_ok());

        settings.caches.remove("default");
        let err = CacheManager::from_settings(&settings).await.err().unwrap();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_unvalidated_zero_sizes_are_configuration_errors() {
        let mut memory_config = memory();
        memory_config.memory.max_size = 0;
        let caches = BTreeMap::from([("default".to_string(), memory_config)]);
        let err = CacheManager::new(caches).await.err().unwrap();
        assert!(err.is_configuration());

        let mut redis_config = CacheConfig {
            backend: CacheBackend::Redis,
            ..CacheConfig::default()
        };
        redis_config.redis.pool_size = 0;
        let caches = BTreeMap::from([("default".to_string(), redis_config)]);
        let err = CacheManager::new(caches).await.err().unwrap();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_unknown_cache_name() {
        let caches = BTreeMap::from([("default".to_string(), memory())]);
        let manager = CacheManager::new(caches).await.unwrap();
        assert!(manager.cache("nope").err().unwrap().is_configuration());
        assert!(manager.config("default").is_some());
    }

    #[tokio::test]
    async fn test_disk_backend_from_config() {
        let dir = tempdir().unwrap();
        let caches = BTreeMap::from([(
            "default".to_string(),
            CacheConfig {
                backend: CacheBackend::Disk,
                disk: DiskCacheConfig {
                    directory: dir.path().to_str().unwrap().to_string(),
                },
                ..CacheConfig::default()
            },
        )]);
        let manager = CacheManager::new(caches).await.unwrap();
        let cache = manager.default_cache().unwrap();
        cache.set("k", b"v".to_vec(), None, None).await.unwrap();
        assert!(cache.has_key("k", None).await.unwrap());
    }
}

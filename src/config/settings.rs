//! Configuration settings structures for layered-cache
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables. The `[logger]` table deserializes
//! straight into [`LoggerConfig`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cache::{DEFAULT_CACHE_ALIAS, DEFAULT_VERSION};
use crate::logger::LoggerConfig;

fn default_cache_ttl() -> u64 {
    300
}

fn default_cache_version() -> u32 {
    DEFAULT_VERSION
}

fn default_cache_max_size() -> usize {
    1000
}

fn default_cache_directory() -> String {
    "cache".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_redis_pool_size() -> u32 {
    4
}

fn default_redis_connection_timeout() -> u64 {
    5
}

fn default_caches() -> BTreeMap<String, CacheConfig> {
    BTreeMap::from([(DEFAULT_CACHE_ALIAS.to_string(), CacheConfig::default())])
}

// ============================================================================
// Cache Configuration
// ============================================================================

/// Cache backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Disk,
    Redis,
    Dummy,
    Layered,
}

/// Memory cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCacheConfig {
    /// Maximum number of entries in the cache
    #[serde(default = "default_cache_max_size")]
    pub max_size: usize,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_size: default_cache_max_size(),
        }
    }
}

/// Disk cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskCacheConfig {
    /// Directory to store cache files
    #[serde(default = "default_cache_directory")]
    pub directory: String,
}

impl Default for DiskCacheConfig {
    fn default() -> Self {
        Self {
            directory: default_cache_directory(),
        }
    }
}

/// Redis cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisCacheConfig {
    /// Redis connection URL (`rediss://` for TLS)
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Connection pool size
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_redis_connection_timeout")]
    pub connection_timeout: u64,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            pool_size: default_redis_pool_size(),
            connection_timeout: default_redis_connection_timeout(),
        }
    }
}

/// Configuration of one named cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache backend type
    #[serde(default)]
    pub backend: CacheBackend,

    /// Prefix added to every stored key
    #[serde(default)]
    pub key_prefix: String,

    /// Version used when an operation does not pass one
    #[serde(default = "default_cache_version")]
    pub version: u32,

    /// Default time-to-live in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,

    /// Names of the caches a layered cache fans out to, fastest first
    #[serde(default)]
    pub levels: Vec<String>,

    /// Memory cache settings
    #[serde(default)]
    pub memory: MemoryCacheConfig,

    /// Disk cache settings
    #[serde(default)]
    pub disk: DiskCacheConfig,

    /// Redis cache settings
    #[serde(default)]
    pub redis: RedisCacheConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            key_prefix: String::new(),
            version: default_cache_version(),
            ttl_seconds: default_cache_ttl(),
            levels: Vec::new(),
            memory: MemoryCacheConfig::default(),
            disk: DiskCacheConfig::default(),
            redis: RedisCacheConfig::default(),
        }
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Logger configuration
    #[serde(default)]
    pub logger: LoggerConfig,

    /// Named caches
    #[serde(default = "default_caches")]
    pub caches: BTreeMap<String, CacheConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logger: LoggerConfig::default(),
            caches: default_caches(),
        }
    }
}

//! Cache module providing named cache backends and a layered cache on top.
//!
//! This module provides a unified caching interface ([`AppCache`]) with the
//! following backends:
//! - Memory cache (in-process, fastest)
//! - Disk cache (persistent, file-based)
//! - Redis cache (distributed, network-based)
//! - Dummy cache (stores nothing)
//! - Layered cache (fans out across other configured caches)
//!
//! # Configuration
//!
//! Caches are declared by name in your TOML config file. A layered cache
//! lists other caches as its levels, fastest first:
//!
//! ```toml
//! [caches.local]
//! backend = "memory"
//! ttl_seconds = 60
//!
//! [caches.local.memory]
//! max_size = 1000
//!
//! [caches.shared]
//! backend = "redis"
//! key_prefix = "app"
//!
//! [caches.shared.redis]
//! url = "redis://127.0.0.1:6379"
//! pool_size = 4
//!
//! [caches.default]
//! backend = "layered"
//! levels = ["local", "shared"]
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let manager = CacheManager::new(settings.caches).await?;
//! let cache = manager.default_cache()?;
//! cache.set("room:1", bytes, Some(60), None).await?;
//! ```

mod disk;
mod error;
mod key;
mod layered;
mod manager;
mod memory;
mod noop;
mod outcome;
mod redis;
mod registry;
mod traits;

pub use disk::DiskCache;
pub use error::CacheError;
pub use key::{DEFAULT_VERSION, KeyMaker, MAX_KEY_LENGTH, validate_key};
pub use layered::LayeredCache;
pub use manager::{CacheManager, DEFAULT_CACHE_ALIAS};
pub use memory::MemoryCache;
pub use noop::NoOpCache;
pub use outcome::{FanOutReport, TierOutcome};
pub use redis::RedisCache;
pub use registry::{BackendResolver, CacheRegistry};
pub use traits::{AppCache, TypedCacheExt};

// Re-export config types
pub use crate::config::settings::{
    CacheBackend, CacheConfig, DiskCacheConfig, MemoryCacheConfig, RedisCacheConfig,
};

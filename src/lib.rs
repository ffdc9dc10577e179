//! layered-cache
//!
//! A multi-level cache facade. Named cache backends (memory, disk, redis,
//! dummy) are built from configuration, and a [`LayeredCache`] fans reads and
//! writes out across an ordered list of them.

pub mod cache;
pub mod config;
pub mod logger;

pub use cache::{
    AppCache, BackendResolver, CacheError, CacheManager, CacheRegistry, FanOutReport,
    LayeredCache, TypedCacheExt,
};
pub use config::{ConfigLoader, Settings};

/// Load settings, install the logger and build every configured cache.
pub async fn bootstrap() -> anyhow::Result<(Settings, CacheManager)> {
    let settings = ConfigLoader::new()?.load()?;
    logger::init_logger(settings.logger.clone())?;
    let caches = CacheManager::from_settings(&settings).await?;
    Ok((settings, caches))
}

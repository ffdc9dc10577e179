//! NoOp cache implementation.
//!
//! Configured with `backend = "dummy"`. All operations are no-ops.

use async_trait::async_trait;

use crate::cache::{AppCache, CacheError};

/// A no-operation cache that doesn't store anything.
///
/// Every read misses and `add` reports success, so a layered cache with a
/// dummy tier behaves as if that tier were always empty.
pub struct NoOpCache;

impl NoOpCache {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AppCache for NoOpCache {
    async fn get(&self, _key: &str, _version: Option<u32>) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(None)
    }

    async fn set(
        &self,
        _key: &str,
        _value: Vec<u8>,
        _ttl_seconds: Option<u64>,
        _version: Option<u32>,
    ) -> Result<(), CacheError> {
        Ok(())
    }

    async fn add(
        &self,
        _key: &str,
        _value: Vec<u8>,
        _ttl_seconds: Option<u64>,
        _version: Option<u32>,
    ) -> Result<bool, CacheError> {
        Ok(true)
    }

    async fn delete(&self, _key: &str, _version: Option<u32>) -> Result<(), CacheError> {
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

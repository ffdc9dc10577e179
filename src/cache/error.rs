//! Cache error types.

use thiserror::Error;

/// Errors that can occur during cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache operation failed: {0}")]
    Operation(String),

    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Raised while building a cache, never by a cache operation.
    #[error("Improperly configured cache: {0}")]
    Configuration(String),

    #[error("Key '{0}' not found")]
    KeyNotFound(String),
}

impl CacheError {
    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        CacheError::Configuration(message.into())
    }

    /// Whether this error can only happen at construction time
    pub fn is_configuration(&self) -> bool {
        matches!(self, CacheError::Configuration(_))
    }
}

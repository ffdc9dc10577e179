//! Configuration validation logic
//!
//! This module provides validation methods for all configuration structures
//! to ensure configuration values are within acceptable ranges and formats.

use std::collections::{BTreeMap, HashSet};

use crate::cache::DEFAULT_CACHE_ALIAS;
use crate::config::error::ConfigError;
use crate::config::settings::{CacheBackend, CacheConfig, Settings};
use crate::logger::LoggerConfig;

/// Valid redis URL schemes
const VALID_REDIS_SCHEMES: &[&str] = &["redis://", "rediss://", "redis+unix://", "unix://"];

/// Validate the `[logger]` table
///
/// # Validation Rules
/// - Level must be one of trace, debug, info, warn, error
/// - At least one output must be enabled
/// - File path is required when file logging is enabled
fn validate_logger(logger: &LoggerConfig) -> Result<(), ConfigError> {
    if let Err(e) = logger.parse_level() {
        return Err(ConfigError::validation("logger.level".to_string(), e.to_string()));
    }

    if !logger.console.enabled && !logger.file.enabled {
        return Err(ConfigError::validation(
            "logger",
            "At least one output (console or file) must be enabled.",
        ));
    }

    if logger.file.enabled && logger.file.path.as_os_str().is_empty() {
        return Err(ConfigError::validation(
            "logger.file.path",
            "File path is required when file logging is enabled.",
        ));
    }

    Ok(())
}

impl CacheConfig {
    /// Validate a single cache definition in isolation
    ///
    /// # Validation Rules
    /// - TTL must be greater than 0
    /// - Memory caches need a positive max size
    /// - Disk caches need a directory
    /// - Redis caches need a redis URL and a positive pool size
    /// - Layered caches need at least one level and must not list themselves
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let field = |suffix: &str| format!("caches.{}.{}", name, suffix);

        if self.ttl_seconds == 0 {
            return Err(ConfigError::ValidationError {
                field: field("ttl_seconds"),
                message: "TTL must be greater than 0 seconds.".to_string(),
            });
        }

        match self.backend {
            CacheBackend::Memory => {
                if self.memory.max_size == 0 {
                    return Err(ConfigError::ValidationError {
                        field: field("memory.max_size"),
                        message: "Max size must be greater than 0.".to_string(),
                    });
                }
            }
            CacheBackend::Disk => {
                if self.disk.directory.trim().is_empty() {
                    return Err(ConfigError::ValidationError {
                        field: field("disk.directory"),
                        message: "Disk cache directory is required.".to_string(),
                    });
                }
            }
            CacheBackend::Redis => {
                if !VALID_REDIS_SCHEMES
                    .iter()
                    .any(|scheme| self.redis.url.starts_with(scheme))
                {
                    return Err(ConfigError::ValidationError {
                        field: field("redis.url"),
                        message: format!(
                            "Invalid redis URL '{}'. Expected format: redis://[user:password@]host[:port][/db]",
                            self.redis.url
                        ),
                    });
                }
                if self.redis.pool_size == 0 {
                    return Err(ConfigError::ValidationError {
                        field: field("redis.pool_size"),
                        message: "Pool size must be greater than 0.".to_string(),
                    });
                }
            }
            CacheBackend::Dummy => {}
            CacheBackend::Layered => {
                if self.levels.is_empty() {
                    return Err(ConfigError::ValidationError {
                        field: field("levels"),
                        message: format!("No levels configured for '{}'.", name),
                    });
                }
                if self.levels.iter().any(|level| level == name) {
                    return Err(ConfigError::ValidationError {
                        field: field("levels"),
                        message: format!("Layered cache '{}' cannot be one of its own levels.", name),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Validate the named cache table as a whole
///
/// # Validation Rules
/// - A `default` cache must be configured
/// - Every cache definition must be valid
/// - Every level must name a configured cache
/// - Layered caches must not reference each other in a cycle
fn validate_caches(caches: &BTreeMap<String, CacheConfig>) -> Result<(), ConfigError> {
    if !caches.contains_key(DEFAULT_CACHE_ALIAS) {
        return Err(ConfigError::validation(
            "caches",
            "You must define a 'default' cache.",
        ));
    }

    for (name, config) in caches {
        config.validate(name)?;
        for level in &config.levels {
            if !caches.contains_key(level) {
                return Err(ConfigError::ValidationError {
                    field: format!("caches.{}.levels", name),
                    message: format!("Level '{}' does not name a configured cache.", level),
                });
            }
        }
    }

    for name in caches.keys() {
        let mut path = HashSet::new();
        if has_cycle(caches, name, &mut path) {
            return Err(ConfigError::ValidationError {
                field: format!("caches.{}.levels", name),
                message: format!("Layered cache '{}' references itself through its levels.", name),
            });
        }
    }

    Ok(())
}

fn has_cycle<'a>(
    caches: &'a BTreeMap<String, CacheConfig>,
    name: &'a str,
    path: &mut HashSet<&'a str>,
) -> bool {
    if !path.insert(name) {
        return true;
    }
    let cyclic = caches.get(name).is_some_and(|config| {
        config.backend == CacheBackend::Layered
            && config
                .levels
                .iter()
                .any(|level| has_cycle(caches, level, path))
    });
    path.remove(name);
    cyclic
}

impl Settings {
    /// Validate all settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_logger(&self.logger)?;
        validate_caches(&self.caches)?;
        Ok(())
    }
}

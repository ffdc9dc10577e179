//! Final key construction for backends.
//!
//! Every backend stores entries under `{prefix}:{version}:{key}` so that two
//! logical keys differing only in version never collide.

/// Version used when the caller does not pass one.
pub const DEFAULT_VERSION: u32 = 1;

/// Longest key memcached accepts; longer keys only trigger a warning here.
pub const MAX_KEY_LENGTH: usize = 250;

/// Builds versioned, prefixed keys for one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMaker {
    prefix: String,
    version: u32,
}

impl KeyMaker {
    pub fn new(prefix: impl Into<String>, version: u32) -> Self {
        Self {
            prefix: prefix.into(),
            version,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn default_version(&self) -> u32 {
        self.version
    }

    /// Build the stored key, falling back to the configured default version.
    pub fn make_key(&self, key: &str, version: Option<u32>) -> String {
        let version = version.unwrap_or(self.version);
        let full = format!("{}:{}:{}", self.prefix, version, key);
        if let Some(warning) = validate_key(&full) {
            tracing::warn!(key = %full, "{}", warning);
        }
        full
    }
}

impl Default for KeyMaker {
    fn default() -> Self {
        Self::new("", DEFAULT_VERSION)
    }
}

/// Check a key for portability problems.
///
/// Returns a warning message when the key would be rejected by memcached.
/// The key is still usable by every backend in this crate.
pub fn validate_key(key: &str) -> Option<String> {
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Cache key will cause errors if used with memcached: {} (longer than {})",
            key, MAX_KEY_LENGTH
        ));
    }
    if key.chars().any(|c| (c as u32) < 33 || c as u32 == 127) {
        return Some(format!(
            "Cache key contains characters that will cause errors if used with memcached: {:?}",
            key
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_key_uses_default_version() {
        let keys = KeyMaker::new("app", 3);
        assert_eq!(keys.make_key("user:1", None), "app:3:user:1");
        assert_eq!(keys.make_key("user:1", Some(7)), "app:7:user:1");
    }

    #[test]
    fn test_versions_partition_keyspace() {
        let keys = KeyMaker::default();
        assert_ne!(keys.make_key("k", Some(1)), keys.make_key("k", Some(2)));
        assert_eq!(keys.make_key("k", None), keys.make_key("k", Some(DEFAULT_VERSION)));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("plain:key").is_none());
        assert!(validate_key("has space").is_some());
        assert!(validate_key("tab\there").is_some());
        assert!(validate_key(&"x".repeat(MAX_KEY_LENGTH + 1)).is_some());
        assert!(validate_key(&"x".repeat(MAX_KEY_LENGTH)).is_none());
    }
}

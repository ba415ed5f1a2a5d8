//! Process-wide in-memory cache with per-entry TTL
//!
//! Keys are namespaced per ecosystem (`npm:<name>`, `maven:<group>:<artifact>`,
//! `dockerhub:<image>`, ...). Values are stored as JSON trees so every
//! resolver can share one map. A read older than the TTL is a miss; stale
//! entries are overwritten by the next store, never swept. Concurrent
//! readers do not block each other, and concurrent misses for the same
//! key may all fetch; the first writer wins and any stored value is
//! acceptable to later readers.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default time-to-live for cached registry data (12 hours)
pub const DEFAULT_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// A cached value with its insertion instant
struct CacheEntry {
    value: serde_json::Value,
    inserted_at: Instant,
}

/// In-memory TTL cache shared by all resolvers
pub struct TtlCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl TtlCache {
    /// Creates a cache with the default 12-hour TTL
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Creates a cache with a custom TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns the live value for `key`, deserialized as `T`.
    ///
    /// Entries older than the TTL, and entries that no longer
    /// deserialize as `T`, are treated as misses.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().expect("cache lock poisoned");
        let entry = entries.get(key)?;
        if entry.inserted_at.elapsed() > self.ttl {
            return None;
        }
        match serde_json::from_value(entry.value.clone()) {
            Ok(value) => {
                debug!(key, "cache hit");
                Some(value)
            }
            Err(_) => None,
        }
    }

    /// Stores `value` under `key`, replacing any previous entry
    pub fn put_as<T: Serialize>(&self, key: &str, value: &T) {
        let json = match serde_json::to_value(value) {
            Ok(json) => json,
            Err(_) => return,
        };
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: json,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Number of stored entries, live or expired (test helper)
    pub fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }

    /// True when no entries are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_within_ttl() {
        let cache = TtlCache::new();
        cache.put_as("npm:react", &"18.2.0".to_string());
        assert_eq!(cache.get_as::<String>("npm:react"), Some("18.2.0".to_string()));
    }

    #[test]
    fn test_miss_for_absent_key() {
        let cache = TtlCache::new();
        assert_eq!(cache.get_as::<String>("npm:absent"), None);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = TtlCache::with_ttl(Duration::from_millis(10));
        cache.put_as("go:github.com/a/b", &"v1.0.0".to_string());
        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(cache.get_as::<String>("go:github.com/a/b"), None);
        // The entry stays in the map until overwritten
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_overwrite_refreshes_entry() {
        let cache = TtlCache::with_ttl(Duration::from_millis(50));
        cache.put_as("rust:serde", &"1.0.0".to_string());
        std::thread::sleep(Duration::from_millis(30));
        cache.put_as("rust:serde", &"1.0.1".to_string());
        std::thread::sleep(Duration::from_millis(30));
        // 60ms after the first put, but only 30ms after the refresh
        assert_eq!(cache.get_as::<String>("rust:serde"), Some("1.0.1".to_string()));
    }

    #[test]
    fn test_structured_values() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Tags {
            tags: Vec<String>,
        }

        let cache = TtlCache::new();
        let stored = Tags {
            tags: vec!["1.25.3".to_string(), "latest".to_string()],
        };
        cache.put_as("dockerhub:nginx", &stored);
        assert_eq!(cache.get_as::<Tags>("dockerhub:nginx"), Some(stored));
    }

    #[test]
    fn test_concurrent_readers() {
        use std::sync::Arc;

        let cache = Arc::new(TtlCache::new());
        cache.put_as("pypi:requests", &"2.31.0".to_string());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        assert_eq!(
                            cache.get_as::<String>("pypi:requests"),
                            Some("2.31.0".to_string())
                        );
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}

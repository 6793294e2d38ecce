//! Read-view cache contract.
//!
//! The engine memoizes list/detail views as JSON strings and drops every key
//! that may reflect a partner right after a sync for it commits.

use std::{
    collections::HashMap,
    fmt,
    sync::{Mutex, MutexGuard},
    time::{Duration, Instant},
};

/// Longest lifetime of a [`MemoryCache`] entry; longer TTLs are capped.
pub const MAX_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Key/value cache used by the read views.
///
/// Implementations must be safe to share across tasks.
pub trait ViewCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: String, ttl: Duration);

    /// Removes every entry whose key starts with `prefix`.
    fn invalidate_prefix(&self, prefix: &str);
}

/// In-process TTL cache. Expired entries are swept on every `set`.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, (String, Instant)>> {
        // Entries are replaced whole, so a poisoned map is still consistent.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries()
            .values()
            .filter(|(_, expires_at)| *expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.len())
            .finish()
    }
}

impl ViewCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries();
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, value: String, ttl: Duration) {
        let now = Instant::now();
        let expires_at = now + ttl.min(MAX_TTL);
        let mut entries = self.entries();
        entries.retain(|_, (_, expires)| *expires > now);
        entries.insert(key.to_string(), (value, expires_at));
    }

    fn invalidate_prefix(&self, prefix: &str) {
        self.entries().retain(|key, _| !key.starts_with(prefix));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_returns_value() {
        let cache = MemoryCache::new();
        cache.set("debt:list:a", "payload".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get("debt:list:a").as_deref(), Some("payload"));
        assert_eq!(cache.get("debt:list:b"), None);
    }

    #[test]
    fn expired_entries_are_not_returned() {
        let cache = MemoryCache::new();
        cache.set("k", "v".to_string(), Duration::ZERO);
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn set_sweeps_expired_entries() {
        let cache = MemoryCache::new();
        cache.set("debt:list:{\"page\":1}", "a".to_string(), Duration::ZERO);
        cache.set("debt:list:{\"page\":2}", "b".to_string(), Duration::ZERO);
        cache.set("debt:list:{\"page\":3}", "c".to_string(), Duration::from_secs(60));

        let entries = cache.entries();
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("debt:list:{\"page\":3}"));
    }

    #[test]
    fn huge_ttl_is_capped() {
        let cache = MemoryCache::new();
        cache.set("k", "v".to_string(), Duration::MAX);
        assert_eq!(cache.get("k").as_deref(), Some("v"));

        let entries = cache.entries();
        let (_, expires_at) = &entries["k"];
        assert!(*expires_at <= Instant::now() + MAX_TTL);
    }

    #[test]
    fn invalidate_prefix_only_drops_matching_keys() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(60);
        cache.set("debt:list:1", "a".to_string(), ttl);
        cache.set("debt:list:2", "b".to_string(), ttl);
        cache.set("debt:detail:customer:x:2024", "c".to_string(), ttl);

        cache.invalidate_prefix("debt:list:");

        assert_eq!(cache.get("debt:list:1"), None);
        assert_eq!(cache.get("debt:list:2"), None);
        assert_eq!(cache.len(), 1);
    }
}

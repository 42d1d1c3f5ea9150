//! Per-process cache (spec §4.11).
//!
//! Four keyed stores: per-element EID, per-selector query result (the only
//! store that is size-bounded), per-element anchor result, per-element
//! semantics. Each store tracks hits/misses; `clear()` resets everything.
//!
//! Entries are identity-keyed by a caller-supplied key (typically an
//! element's stable ref or a selector string), not by the handle itself —
//! per §9 the cache must not hold the host runtime's elements alive.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use std::sync::Mutex;

use crate::model::{Eid, Semantics};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub hits: u64,
    pub misses: u64,
}

/// Insertion-order-evicting, access-promoting bounded map.
struct LruStore<K, V> {
    capacity: usize,
    order: Vec<K>,
    entries: HashMap<K, V>,
    stats: StoreStats,
}

impl<K: Eq + std::hash::Hash + Clone, V: Clone> LruStore<K, V> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: Vec::new(),
            entries: HashMap::new(),
            stats: StoreStats::default(),
        }
    }

    fn get(&mut self, key: &K) -> Option<V> {
        if let Some(value) = self.entries.get(key).cloned() {
            self.stats.hits += 1;
            self.promote(key);
            Some(value)
        } else {
            self.stats.misses += 1;
            None
        }
    }

    fn promote(&mut self, key: &K) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            let k = self.order.remove(pos);
            self.order.push(k);
        }
    }

    fn put(&mut self, key: K, value: V) {
        if self.entries.contains_key(&key) {
            self.entries.insert(key.clone(), value);
            self.promote(&key);
            return;
        }
        if self.capacity > 0 && self.order.len() >= self.capacity {
            let evicted = self.order.remove(0);
            self.entries.remove(&evicted);
        }
        self.order.push(key.clone());
        self.entries.insert(key, value);
    }

    fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
        self.stats = StoreStats::default();
    }
}

/// Unbounded store for the non-LRU stores (§4.11 only calls out the
/// selector-query store as LRU-bounded).
struct UnboundedStore<K, V> {
    entries: HashMap<K, V>,
    stats: StoreStats,
}

impl<K: Eq + std::hash::Hash + Clone, V: Clone> UnboundedStore<K, V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            stats: StoreStats::default(),
        }
    }

    fn get(&mut self, key: &K) -> Option<V> {
        match self.entries.get(key).cloned() {
            Some(v) => {
                self.stats.hits += 1;
                Some(v)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    fn put(&mut self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.stats = StoreStats::default();
    }
}

/// Default cap for the per-selector query-result store.
pub const DEFAULT_QUERY_CACHE_CAPACITY: usize = 256;

/// A single cache instance. Construct a private one with `Cache::new` for
/// isolation, or use `Cache::shared()` for the process-global default.
pub struct Cache {
    eids: Mutex<UnboundedStore<String, Eid>>,
    queries: Mutex<LruStore<String, Vec<String>>>,
    anchors: Mutex<UnboundedStore<String, String>>,
    semantics: Mutex<UnboundedStore<String, Semantics>>,
}

impl Cache {
    pub fn new(query_capacity: usize) -> Self {
        Self {
            eids: Mutex::new(UnboundedStore::new()),
            queries: Mutex::new(LruStore::new(query_capacity)),
            anchors: Mutex::new(UnboundedStore::new()),
            semantics: Mutex::new(UnboundedStore::new()),
        }
    }

    pub fn get_eid(&self, key: &str) -> Option<Eid> {
        self.eids.lock().unwrap().get(&key.to_string())
    }

    pub fn put_eid(&self, key: &str, value: Eid) {
        self.eids.lock().unwrap().put(key.to_string(), value);
    }

    pub fn get_query(&self, selector: &str) -> Option<Vec<String>> {
        self.queries.lock().unwrap().get(&selector.to_string())
    }

    pub fn put_query(&self, selector: &str, result: Vec<String>) {
        self.queries
            .lock()
            .unwrap()
            .put(selector.to_string(), result);
    }

    pub fn get_anchor(&self, key: &str) -> Option<String> {
        self.anchors.lock().unwrap().get(&key.to_string())
    }

    pub fn put_anchor(&self, key: &str, value: String) {
        self.anchors.lock().unwrap().put(key.to_string(), value);
    }

    pub fn get_semantics(&self, key: &str) -> Option<Semantics> {
        self.semantics.lock().unwrap().get(&key.to_string())
    }

    pub fn put_semantics(&self, key: &str, value: Semantics) {
        self.semantics.lock().unwrap().put(key.to_string(), value);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            eids: self.eids.lock().unwrap().stats,
            queries: self.queries.lock().unwrap().stats,
            anchors: self.anchors.lock().unwrap().stats,
            semantics: self.semantics.lock().unwrap().stats,
        }
    }

    pub fn clear(&self) {
        self.eids.lock().unwrap().clear();
        self.queries.lock().unwrap().clear();
        self.anchors.lock().unwrap().clear();
        self.semantics.lock().unwrap().clear();
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY_CACHE_CAPACITY)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub eids: StoreStats,
    pub queries: StoreStats,
    pub anchors: StoreStats,
    pub semantics: StoreStats,
}

/// The process-global cache instance (§4.11). Callers needing isolation
/// (tests, parallel hosts) should construct a private `Cache` instead.
pub static SHARED: Lazy<Cache> = Lazy::new(Cache::default);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_then_hit() {
        let cache = Cache::new(2);
        assert_eq!(cache.get_anchor("a"), None);
        cache.put_anchor("a", "x".into());
        assert_eq!(cache.get_anchor("a"), Some("x".into()));
        let stats = cache.stats();
        assert_eq!(stats.anchors.hits, 1);
        assert_eq!(stats.anchors.misses, 1);
    }

    #[test]
    fn lru_evicts_least_recently_used() {
        let cache = Cache::new(2);
        cache.put_query("a", vec!["1".into()]);
        cache.put_query("b", vec!["2".into()]);
        cache.put_query("c", vec!["3".into()]);
        assert_eq!(cache.get_query("a"), None);
        assert!(cache.get_query("b").is_some());
        assert!(cache.get_query("c").is_some());
    }

    #[test]
    fn access_promotes_entry() {
        let cache = Cache::new(2);
        cache.put_query("a", vec!["1".into()]);
        cache.put_query("b", vec!["2".into()]);
        cache.get_query("a"); // promote a
        cache.put_query("c", vec!["3".into()]); // should evict b, not a
        assert!(cache.get_query("a").is_some());
        assert_eq!(cache.get_query("b"), None);
    }

    #[test]
    fn clear_resets_everything() {
        let cache = Cache::new(2);
        cache.put_anchor("a", "x".into());
        cache.get_anchor("a");
        cache.clear();
        assert_eq!(cache.get_anchor("a"), None);
        let stats = cache.stats();
        assert_eq!(stats.anchors.hits, 0);
        assert_eq!(stats.anchors.misses, 1);
    }
}

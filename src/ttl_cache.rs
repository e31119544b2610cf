//! Time-bounded store of search results keyed by entity type and query parameters.
//!
//! Expiry is lazy: a stale entry is only dropped when it is read again or when its type
//! (or the whole cache) is cleared. Capacity is bounded with LRU eviction.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::clock::Clock;

/// Cache key: the entity type plus a digest of the canonical JSON of the parameters
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct CacheKey {
    entity: String,
    params_digest: String,
}

impl CacheKey {
    pub fn new(entity: &str, params: &Value) -> Self {
        let mut canonical = String::new();
        write_canonical(params, &mut canonical);

        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());

        Self {
            entity: entity.to_string(),
            params_digest: format!("{:x}", hasher.finalize()),
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity, self.params_digest)
    }
}

/// JSON with object keys sorted at every level
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(object) => {
            let mut keys: Vec<&String> = object.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&object[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

struct CacheEntry<V> {
    data: V,
    timestamp: Instant,
}

/// Outcome of a cache read
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<V> {
    Hit(V),
    Miss,
    /// The entry existed but was older than the max age; it has been removed
    Expired,
}

pub struct TtlCache<V> {
    entries: LruCache<CacheKey, CacheEntry<V>>,
    max_age: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(max_age: Duration, max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            max_age,
            clock,
        }
    }

    /// Fresh data for `(entity, params)`; a stale entry is evicted and reported as `Expired`
    pub fn lookup(&mut self, entity: &str, params: &Value) -> CacheLookup<V> {
        let key = CacheKey::new(entity, params);
        let now = self.clock.now();

        match self.entries.get(&key) {
            None => return CacheLookup::Miss,
            Some(entry) if now.saturating_duration_since(entry.timestamp) <= self.max_age => {
                return CacheLookup::Hit(entry.data.clone());
            }
            Some(_) => {}
        }

        self.entries.pop(&key);
        log::debug!("Cache entry expired: {}", key);
        CacheLookup::Expired
    }

    pub fn get(&mut self, entity: &str, params: &Value) -> Option<V> {
        match self.lookup(entity, params) {
            CacheLookup::Hit(data) => Some(data),
            CacheLookup::Miss | CacheLookup::Expired => None,
        }
    }

    /// Create or overwrite the entry, stamped with the current time
    pub fn set(&mut self, entity: &str, params: &Value, data: V) {
        let key = CacheKey::new(entity, params);
        let entry = CacheEntry {
            data,
            timestamp: self.clock.now(),
        };
        if let Some((evicted, _)) = self.entries.push(key.clone(), entry) {
            if evicted != key {
                log::debug!("Cache full, evicted least recently used entry {}", evicted);
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove every entry for `entity`; returns how many were removed
    pub fn clear_type(&mut self, entity: &str) -> usize {
        let keys: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(key, _)| key.entity() == entity)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &keys {
            self.entries.pop(key);
        }
        keys.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

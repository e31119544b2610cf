use serde::{Deserialize, Serialize};

/// Search cache counters for performance monitoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SearchCacheMetrics {
    /// Searches answered from the local index
    pub local_hits: u64,
    /// Searches answered from the TTL cache
    pub cache_hits: u64,
    /// Cache reads that found nothing fresh
    pub cache_misses: u64,
    /// Cache entries dropped for being older than the max age
    pub cache_expirations: u64,
    /// Calls made to a remote search function
    pub remote_calls: u64,
    /// Remote searches that failed and were answered with nothing
    pub remote_failures: u64,
    /// Preload fetches started
    pub preloads: u64,
    /// Preload fetches that failed
    pub preload_failures: u64,
    /// Preload requests that attached to a fetch already in flight
    pub deduplicated_preloads: u64,
    /// Share of lookups answered locally or from cache (0.0 to 1.0)
    pub hit_rate: f64,
}

impl SearchCacheMetrics {
    /// Update hit rate
    pub fn update_hit_rate(&mut self) {
        let hits = self.local_hits + self.cache_hits;
        let total_requests = hits + self.cache_misses;
        self.hit_rate = if total_requests > 0 {
            hits as f64 / total_requests as f64
        } else {
            0.0
        };
    }
}

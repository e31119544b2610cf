//! # Search Cache Service
//!
//! In-memory search layer for the catalogue entities of the distributor front-end
//! (customers, products, suppliers, batches). It keeps, per entity type:
//!
//! - **Preloaded dataset + inverted index**: fetched once in the background and rebuilt
//!   as a single snapshot, so type-ahead lookups never wait on the network.
//! - **TTL cache**: results of remote searches keyed by `(type, {"search": query})`.
//! - **Pending preloads**: at most one fetch in flight per type; later callers attach
//!   to the running one.
//!
//! `smart_search` ties these together: local index first, then the TTL cache, then the
//! caller's remote search function. Every public operation fails soft: errors are logged
//! and turned into empty results.
//!
//! All state lives behind an `Arc`, so clones are cheap handles onto the same cache.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::clock::{Clock, SystemClock};
use crate::config::{SearchCacheConfig, SmartSearchOptions};
use crate::errors::ConfigResult;
use crate::fields::{FieldTable, SearchItem};
use crate::inverted_index::InvertedIndex;
use crate::metrics::SearchCacheMetrics;
use crate::normalize::normalize;
use crate::scoring::score;
use crate::tokenizer::tokenize;
use crate::ttl_cache::{CacheLookup, TtlCache};

/// A preload in flight; every clone resolves to the same items
pub type PreloadFuture<T> = Shared<BoxFuture<'static, Vec<Arc<T>>>>;

/// Where a `smart_search` answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSource {
    /// Query below the minimum length; nothing searched
    TooShort,
    /// Query below the minimum length; start of the preloaded dataset returned
    Preloaded,
    /// Answered from the local index
    Local,
    /// Answered from the TTL cache
    Cache,
    /// Answered by the remote search function (and now cached)
    Remote,
    /// The remote search function failed
    Failed,
}

/// Result of one `smart_search_tracked` call
#[derive(Debug, Clone)]
pub struct SearchOutcome<T> {
    /// Per-type increasing id of this request
    pub request_id: u64,
    pub query: String,
    pub items: Vec<Arc<T>>,
    pub source: SearchSource,
    /// A newer request for the same type was issued before this one resolved
    pub superseded: bool,
}

struct PendingPreload<T> {
    generation: u64,
    future: PreloadFuture<T>,
}

/// Preload bookkeeping, guarded together so that a clear and a finishing preload
/// never interleave
struct PreloadState<T> {
    pending: HashMap<String, PendingPreload<T>>,
    /// Bumped by `clear`/`clear_type`; a preload only installs into its own generation
    generations: HashMap<String, u64>,
}

struct Inner<T> {
    config: SearchCacheConfig,
    table: Arc<FieldTable>,
    cache: Mutex<TtlCache<Vec<Arc<T>>>>,
    index: InvertedIndex<T>,
    preload: Mutex<PreloadState<T>>,
    next_request_id: AtomicU64,
    latest_requests: Mutex<HashMap<String, u64>>,
    metrics: Mutex<SearchCacheMetrics>,
}

fn lock<M>(mutex: &Mutex<M>) -> MutexGuard<'_, M> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: SearchItem + DeserializeOwned> Inner<T> {
    fn update_metrics<F>(&self, updater: F)
    where
        F: FnOnce(&mut SearchCacheMetrics),
    {
        if self.config.enable_metrics {
            let mut metrics = lock(&self.metrics);
            updater(&mut metrics);
            metrics.update_hit_rate();
        }
    }

    /// Normalize a raw response and convert each element into an item
    fn convert(&self, entity: &str, response: Value) -> Vec<Arc<T>> {
        let raw_items = normalize(response, entity);
        let total = raw_items.len();

        let items: Vec<Arc<T>> = raw_items
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<T>(raw) {
                Ok(item) => Some(Arc::new(item)),
                Err(e) => {
                    log::warn!("⚠️ Skipping malformed '{}' item: {}", entity, e);
                    None
                }
            })
            .collect();

        if items.len() < total {
            log::warn!("⚠️ Kept {} of {} '{}' items", items.len(), total, entity);
        }
        items
    }

    fn finish_preload(
        &self,
        entity: &str,
        generation: u64,
        started: Instant,
        outcome: anyhow::Result<Value>,
    ) -> Vec<Arc<T>> {
        let items = match outcome {
            Ok(response) => Some(self.convert(entity, response)),
            Err(e) => {
                log::error!("❌ Preload of '{}' failed: {:#}", entity, e);
                self.update_metrics(|m| m.preload_failures += 1);
                None
            }
        };

        let mut state = lock(&self.preload);
        let current = state.generations.get(entity).copied().unwrap_or(0);

        if let Some(items) = &items {
            if current == generation {
                self.index.build_index(entity, items.clone());
                log::info!(
                    "✅ Preloaded {} '{}' items in {:.1}ms",
                    items.len(),
                    entity,
                    started.elapsed().as_secs_f64() * 1000.0
                );
            } else {
                log::info!(
                    "🗑️ '{}' was cleared while preloading, result not installed",
                    entity
                );
            }
        }

        if state.pending.get(entity).map(|p| p.generation) == Some(generation) {
            state.pending.remove(entity);
        }

        items.unwrap_or_default()
    }
}

/// Main search cache
pub struct SearchCache<T = Value> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for SearchCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: SearchItem + DeserializeOwned> Default for SearchCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SearchItem + DeserializeOwned> SearchCache<T> {
    /// Create a new search cache with default configuration
    pub fn new() -> Self {
        Self::with_config(SearchCacheConfig::default())
    }

    /// Create a new search cache with custom configuration
    pub fn with_config(config: SearchCacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Like `with_config`, but rejects invalid settings
    pub fn try_with_config(config: SearchCacheConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    /// Create a search cache whose TTL is measured on `clock`
    pub fn with_clock(config: SearchCacheConfig, clock: Arc<dyn Clock>) -> Self {
        let table = Arc::new(FieldTable::with_overrides(&config.field_overrides));
        let cache = TtlCache::new(config.max_age(), config.max_entries, clock);
        let index = InvertedIndex::new(Arc::clone(&table), config.max_field_chars);

        Self {
            inner: Arc::new(Inner {
                config,
                table,
                cache: Mutex::new(cache),
                index,
                preload: Mutex::new(PreloadState {
                    pending: HashMap::new(),
                    generations: HashMap::new(),
                }),
                next_request_id: AtomicU64::new(1),
                latest_requests: Mutex::new(HashMap::new()),
                metrics: Mutex::new(SearchCacheMetrics::default()),
            }),
        }
    }

    pub fn config(&self) -> &SearchCacheConfig {
        &self.inner.config
    }

    /// Fetch, normalize and index the full dataset of `entity`.
    ///
    /// Registration happens immediately: a second call for the same type made before the
    /// first fetch settles gets a handle to the same fetch and `fetch` is not called. The
    /// returned future resolves to the items, or to an empty list if the fetch failed.
    ///
    /// `fetch` runs without any internal lock held, so it may call back into the cache.
    pub fn preload_data<F, Fut>(&self, entity: &str, fetch: F) -> PreloadFuture<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        if let Some(pending) = self.attach_pending(&lock(&self.inner.preload), entity) {
            return pending;
        }

        let fetch_future = fetch();

        let mut state = lock(&self.inner.preload);
        // `fetch` itself may have registered a preload for this type
        if let Some(pending) = self.attach_pending(&state, entity) {
            return pending;
        }

        let generation = *state.generations.entry(entity.to_string()).or_insert(0);
        let inner = Arc::clone(&self.inner);
        let owned_entity = entity.to_string();

        log::debug!("📥 Starting preload of '{}'", entity);
        self.inner.update_metrics(|m| m.preloads += 1);

        let future = async move {
            let started = Instant::now();
            let outcome = fetch_future.await;
            inner.finish_preload(&owned_entity, generation, started, outcome)
        }
        .boxed()
        .shared();

        state.pending.insert(
            entity.to_string(),
            PendingPreload {
                generation,
                future: future.clone(),
            },
        );
        future
    }

    fn attach_pending(&self, state: &PreloadState<T>, entity: &str) -> Option<PreloadFuture<T>> {
        let pending = state.pending.get(entity)?;
        log::debug!("🔄 Preload of '{}' already in flight, attaching", entity);
        self.inner.update_metrics(|m| m.deduplicated_preloads += 1);
        Some(pending.future.clone())
    }

    /// Run `preload_data` on the tokio runtime without waiting for it
    pub fn spawn_preload<F, Fut>(
        &self,
        entity: &str,
        fetch: F,
    ) -> tokio::task::JoinHandle<Vec<Arc<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        tokio::spawn(self.preload_data(entity, fetch))
    }

    /// Whether a preload for `entity` is in flight
    pub fn is_preloading(&self, entity: &str) -> bool {
        lock(&self.inner.preload).pending.contains_key(entity)
    }

    /// Install `items` as the dataset and index of `entity`, replacing what was there
    pub fn build_index(&self, entity: &str, items: Vec<T>) {
        let items = items.into_iter().map(Arc::new).collect();
        let _state = lock(&self.inner.preload);
        self.inner.index.build_index(entity, items);
    }

    /// The most recent preloaded dataset of `entity`, empty if none
    pub fn get_preloaded_data(&self, entity: &str) -> Vec<Arc<T>> {
        self.inner
            .index
            .get(entity)
            .map(|index| index.items().to_vec())
            .unwrap_or_default()
    }

    fn has_preloaded_data(&self, entity: &str) -> bool {
        self.inner
            .index
            .get(entity)
            .is_some_and(|index| !index.is_empty())
    }

    /// Ranked search over the local index of `entity`; never touches the network.
    ///
    /// Queries shorter than the minimum length return the start of the dataset. Only items
    /// with a field matching the query are returned; ties keep dataset order. `limit`
    /// defaults to the configured `default_limit`.
    pub fn search_local(&self, entity: &str, query: &str, limit: Option<usize>) -> Vec<Arc<T>> {
        let limit = limit.unwrap_or(self.inner.config.default_limit);
        let Some(index) = self.inner.index.get(entity) else {
            return Vec::new();
        };

        let query = query.trim();
        if query.chars().count() < self.inner.config.min_query_length {
            return index.items().iter().take(limit).cloned().collect();
        }

        let query_lower = query.to_lowercase();
        let tokens = tokenize(&query_lower);

        let mut ranked: Vec<(u32, usize)> = index
            .lookup(&tokens)
            .into_iter()
            .filter_map(|position| {
                let item = index.item(position)?;
                let relevance = score(&self.inner.table, entity, item.as_ref(), &query_lower);
                // Sharing a token prefix is not a match
                (relevance > 0).then_some((relevance, position))
            })
            .collect();

        ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        ranked.truncate(limit);

        ranked
            .into_iter()
            .filter_map(|(_, position)| index.item(position).cloned())
            .collect()
    }

    /// Fresh cached items for `(entity, params)`. Counted in the hit/miss/expiry metrics.
    pub fn cache_get(&self, entity: &str, params: &Value) -> Option<Vec<Arc<T>>> {
        let lookup = lock(&self.inner.cache).lookup(entity, params);
        match lookup {
            CacheLookup::Hit(items) => {
                log::debug!("✅ Cache hit for '{}' {}", entity, params);
                self.inner.update_metrics(|m| m.cache_hits += 1);
                Some(items)
            }
            CacheLookup::Expired => {
                self.inner.update_metrics(|m| {
                    m.cache_expirations += 1;
                    m.cache_misses += 1;
                });
                None
            }
            CacheLookup::Miss => {
                self.inner.update_metrics(|m| m.cache_misses += 1);
                None
            }
        }
    }

    /// Store items for `(entity, params)`, replacing any previous entry
    pub fn cache_set(&self, entity: &str, params: &Value, items: Vec<Arc<T>>) {
        lock(&self.inner.cache).set(entity, params, items);
    }

    /// Search `entity` for `query`: local index, then TTL cache, then `api_search`.
    pub async fn smart_search<F, Fut>(
        &self,
        entity: &str,
        query: &str,
        api_search: F,
        options: &SmartSearchOptions,
    ) -> Vec<Arc<T>>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = anyhow::Result<Value>>,
    {
        self.smart_search_tracked(entity, query, api_search, options)
            .await
            .items
    }

    /// `smart_search` that also reports the request id, the answering stage and whether a
    /// newer request for the same type was issued in the meantime
    pub async fn smart_search_tracked<F, Fut>(
        &self,
        entity: &str,
        query: &str,
        api_search: F,
        options: &SmartSearchOptions,
    ) -> SearchOutcome<T>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = anyhow::Result<Value>>,
    {
        let request_id = self.issue_request(entity);
        let query = query.trim().to_string();
        let (items, source) = self.run_search(entity, &query, api_search, options).await;

        let superseded = self.latest_request_id(entity) != Some(request_id);
        if superseded {
            log::debug!("Search #{} for '{}' resolved after a newer request", request_id, entity);
        }

        SearchOutcome {
            request_id,
            query,
            items,
            source,
            superseded,
        }
    }

    async fn run_search<F, Fut>(
        &self,
        entity: &str,
        query: &str,
        api_search: F,
        options: &SmartSearchOptions,
    ) -> (Vec<Arc<T>>, SearchSource)
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = anyhow::Result<Value>>,
    {
        if query.chars().count() < options.min_query_length {
            if options.preload_if_empty {
                let items = self
                    .get_preloaded_data(entity)
                    .into_iter()
                    .take(options.limit)
                    .collect();
                return (items, SearchSource::Preloaded);
            }
            return (Vec::new(), SearchSource::TooShort);
        }

        if options.use_local_search && self.has_preloaded_data(entity) {
            let items = self.search_local(entity, query, Some(options.limit));
            if !items.is_empty() {
                self.inner.update_metrics(|m| m.local_hits += 1);
                return (items, SearchSource::Local);
            }
        }

        let params = json!({ "search": query });
        if let Some(items) = self.cache_get(entity, &params) {
            return (items, SearchSource::Cache);
        }

        log::debug!("🌐 Remote search for '{}' query '{}'", entity, query);
        self.inner.update_metrics(|m| m.remote_calls += 1);

        match api_search(query.to_string()).await {
            Ok(response) => {
                let items = self.inner.convert(entity, response);
                self.cache_set(entity, &params, items.clone());
                (items, SearchSource::Remote)
            }
            Err(e) => {
                log::warn!(
                    "⚠️ Remote search for '{}' query '{}' failed: {:#}",
                    entity,
                    query,
                    e
                );
                self.inner.update_metrics(|m| m.remote_failures += 1);
                (Vec::new(), SearchSource::Failed)
            }
        }
    }

    fn issue_request(&self, entity: &str) -> u64 {
        let request_id = self.inner.next_request_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.inner.latest_requests).insert(entity.to_string(), request_id);
        request_id
    }

    /// Id of the most recent `smart_search` issued for `entity`
    pub fn latest_request_id(&self, entity: &str) -> Option<u64> {
        lock(&self.inner.latest_requests).get(entity).copied()
    }

    /// Drop every cached result, index and preloaded dataset
    pub fn clear(&self) {
        {
            let mut state = lock(&self.inner.preload);
            for generation in state.generations.values_mut() {
                *generation += 1;
            }
            state.pending.clear();
            self.inner.index.clear();
        }
        lock(&self.inner.cache).clear();
        log::info!("🗑️ Cleared search cache");
    }

    /// Drop cached results, index and preloaded dataset of `entity` only
    pub fn clear_type(&self, entity: &str) {
        {
            let mut state = lock(&self.inner.preload);
            *state.generations.entry(entity.to_string()).or_insert(0) += 1;
            state.pending.remove(entity);
            self.inner.index.remove(entity);
        }
        let removed = lock(&self.inner.cache).clear_type(entity);
        log::info!("🗑️ Cleared '{}' from search cache ({} cached results)", entity, removed);
    }

    /// Snapshot of the counters
    pub fn metrics(&self) -> SearchCacheMetrics {
        if self.inner.config.enable_metrics {
            lock(&self.inner.metrics).clone()
        } else {
            SearchCacheMetrics::default()
        }
    }

    pub fn reset_metrics(&self) {
        *lock(&self.inner.metrics) = SearchCacheMetrics::default();
    }

    /// Number of cached remote results
    pub fn cached_entries(&self) -> usize {
        lock(&self.inner.cache).len()
    }
}

//! # Global State Management
//!
//! The front-end shares one search cache for the whole session: every screen that looks
//! up customers or products reads the same preloaded data, and a mutation on one screen
//! invalidates the type for all of them via `clear_type`.
//!
//! ```rust
//! let cache = search_cache::globals::search_cache();
//! cache.clear_type("customers");
//! ```

use once_cell::sync::Lazy;

use crate::search_cache::SearchCache;

/// Session-wide search cache with default configuration
///
/// Created lazily on first access. `SearchCache` is a handle onto shared state, so the
/// clones handed out by `search_cache()` all see the same data.
pub static SEARCH_CACHE: Lazy<SearchCache> = Lazy::new(SearchCache::new);

/// Handle to the session-wide search cache
pub fn search_cache() -> SearchCache {
    SEARCH_CACHE.clone()
}

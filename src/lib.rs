//! Client-side search cache for the distributor catalogue: preloaded datasets with a
//! prefix-aware inverted index, a TTL cache of remote search results, and a `smart_search`
//! entry point that falls back from local to cached to remote results.

// Module declarations
pub mod clock;
pub mod config;
pub mod errors;
pub mod fields;
pub mod globals;
pub mod http_source;
pub mod inverted_index;
pub mod metrics;
pub mod normalize;
pub mod scoring;
pub mod search_cache;
pub mod tokenizer;
pub mod ttl_cache;

// Re-exports for commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{RemoteConfig, SearchCacheConfig, SmartSearchOptions};
pub use errors::{ConfigError, ConfigResult, RemoteError, RemoteResult};
pub use fields::{FieldTable, SearchItem};
pub use http_source::HttpSource;
pub use metrics::SearchCacheMetrics;
pub use normalize::normalize;
pub use search_cache::{PreloadFuture, SearchCache, SearchOutcome, SearchSource};
pub use tokenizer::tokenize;

//! Settings for the search cache, the per-call search options and the HTTP adapter.
//!
//! Settings are plain serde structs with sensible defaults. They can be persisted as
//! pretty-printed JSON next to the other per-user settings of the host application.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ConfigResult};

/// Configuration for a `SearchCache` instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCacheConfig {
    /// Maximum age of a cached search result in milliseconds
    pub max_age_ms: u64,
    /// Maximum number of cached search results kept at once
    pub max_entries: usize,
    /// Result limit used by `search_local` when the caller passes none
    pub default_limit: usize,
    /// Queries shorter than this (in characters) never reach the index or the network
    pub min_query_length: usize,
    /// Field values are truncated to this many characters before tokenizing
    pub max_field_chars: usize,
    /// Enable hit/miss counters
    pub enable_metrics: bool,
    /// Entity type -> searchable fields, overriding the built-in table
    pub field_overrides: HashMap<String, Vec<String>>,
}

impl Default for SearchCacheConfig {
    fn default() -> Self {
        Self {
            max_age_ms: 10 * 60 * 1000, // 10 minute TTL
            max_entries: 1000,
            default_limit: 20,
            min_query_length: 2,
            max_field_chars: 200,
            enable_metrics: true,
            field_overrides: HashMap::new(),
        }
    }
}

impl SearchCacheConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_millis(self.max_age_ms)
    }

    /// Reject values that would make the cache unusable
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_age_ms == 0 {
            return Err(invalid("max_age_ms", "must be greater than zero"));
        }
        if self.max_entries == 0 {
            return Err(invalid("max_entries", "must be greater than zero"));
        }
        if self.default_limit == 0 {
            return Err(invalid("default_limit", "must be greater than zero"));
        }
        if self.max_field_chars < 2 {
            return Err(invalid("max_field_chars", "must be at least 2"));
        }
        for (entity, fields) in &self.field_overrides {
            if fields.is_empty() {
                return Err(invalid(
                    "field_overrides",
                    &format!("entity type '{}' has no fields", entity),
                ));
            }
        }
        Ok(())
    }

    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            log::debug!("No search cache config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save settings as pretty-printed JSON, creating parent directories as needed
    pub fn save_to_file(&self, path: &Path) -> ConfigResult<()> {
        let write_failed = |message: String| ConfigError::WriteFailed {
            path: path.display().to_string(),
            message,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| write_failed(e.to_string()))?;
            }
        }

        let content = serde_json::to_string_pretty(self).map_err(|e| write_failed(e.to_string()))?;
        fs::write(path, content).map_err(|e| write_failed(e.to_string()))?;
        Ok(())
    }

    /// `<user config dir>/pharmadist/search_cache.json`
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("pharmadist").join("search_cache.json"))
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Per-call options for `SearchCache::smart_search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartSearchOptions {
    /// Try the local index before the cache and the network
    pub use_local_search: bool,
    /// Maximum number of results from the local index
    pub limit: usize,
    /// Queries shorter than this return early without searching
    pub min_query_length: usize,
    /// Return the start of the preloaded dataset for short queries instead of nothing
    pub preload_if_empty: bool,
}

impl Default for SmartSearchOptions {
    fn default() -> Self {
        Self {
            use_local_search: true,
            limit: 20,
            min_query_length: 2,
            preload_if_empty: false,
        }
    }
}

impl SmartSearchOptions {
    /// Options seeded from the instance settings
    pub fn from_config(config: &SearchCacheConfig) -> Self {
        Self {
            limit: config.default_limit,
            min_query_length: config.min_query_length,
            ..Self::default()
        }
    }
}

/// Configuration for the HTTP fetch adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    /// Entity type -> path relative to `base_url`
    pub endpoints: HashMap<String, String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        let endpoints = [
            ("customers", "customers/"),
            ("products", "products/"),
            ("suppliers", "suppliers/"),
            ("batches", "batches/"),
        ]
        .into_iter()
        .map(|(entity, path)| (entity.to_string(), path.to_string()))
        .collect();

        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_ms: 10_000,
            endpoints,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_values() {
        let config = SearchCacheConfig::default();
        assert_eq!(config.max_age(), Duration::from_secs(600));
        assert_eq!(config.default_limit, 20);
        assert_eq!(config.min_query_length, 2);
        assert_eq!(config.max_field_chars, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let config = SearchCacheConfig {
            max_age_ms: 0,
            ..Default::default()
        };
        match config.validate() {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "max_age_ms"),
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_empty_override() {
        let mut config = SearchCacheConfig::default();
        config.field_overrides.insert("customers".to_string(), Vec::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.json");

        let config = SearchCacheConfig::load_from_file(&path).unwrap();
        assert_eq!(config, SearchCacheConfig::default());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("search_cache.json");

        let mut config = SearchCacheConfig {
            max_age_ms: 30_000,
            ..Default::default()
        };
        config
            .field_overrides
            .insert("doctors".to_string(), vec!["doctor_name".to_string(), "clinic".to_string()]);

        config.save_to_file(&path).unwrap();
        let loaded = SearchCacheConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("search_cache.json");
        fs::write(&path, r#"{ "default_limit": 5 }"#).unwrap();

        let config = SearchCacheConfig::load_from_file(&path).unwrap();
        assert_eq!(config.default_limit, 5);
        assert_eq!(config.max_age_ms, 600_000);
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("search_cache.json");
        fs::write(&path, "{ not json").unwrap();

        match SearchCacheConfig::load_from_file(&path) {
            Err(ConfigError::ParseFailed { .. }) => (),
            other => panic!("Expected ParseFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_smart_search_options_from_config() {
        let config = SearchCacheConfig {
            default_limit: 7,
            min_query_length: 3,
            ..Default::default()
        };
        let options = SmartSearchOptions::from_config(&config);
        assert_eq!(options.limit, 7);
        assert_eq!(options.min_query_length, 3);
        assert!(options.use_local_search);
        assert!(!options.preload_if_empty);
    }
}

//! Ready-made fetch functions backed by the distributor REST API.
//!
//! The adapter only transports JSON; shape normalization happens in the search cache.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::config::RemoteConfig;
use crate::errors::{RemoteError, RemoteResult};

/// HTTP client for list and search endpoints
#[derive(Debug, Clone)]
pub struct HttpSource {
    config: RemoteConfig,
    client: Client,
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpSource {
    /// Create a new source with default configuration
    pub fn new() -> Self {
        Self::with_config(RemoteConfig::default())
    }

    /// Create a new source with custom configuration
    pub fn with_config(config: RemoteConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("⚠️ Failed to configure HTTP client ({}), using defaults", e);
                Client::new()
            });

        Self { config, client }
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    fn endpoint_url(&self, entity: &str) -> RemoteResult<String> {
        let path = self
            .config
            .endpoints
            .get(entity)
            .ok_or_else(|| RemoteError::UnknownEntity {
                entity: entity.to_string(),
            })?;

        Ok(format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> RemoteResult<Value> {
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| RemoteError::Decode {
            message: e.to_string(),
        })
    }

    /// `GET {base_url}/{endpoint}`, the full list used for preloading
    pub async fn fetch_all(&self, entity: &str) -> anyhow::Result<Value> {
        let url = self.endpoint_url(entity)?;
        log::debug!("🌐 Fetching all '{}' from {}", entity, url);
        Ok(self.get_json(&url, &[]).await?)
    }

    /// `GET {base_url}/{endpoint}?search={query}`
    pub async fn search(&self, entity: &str, query: &str) -> anyhow::Result<Value> {
        let url = self.endpoint_url(entity)?;
        log::debug!("🌐 Searching '{}' for '{}'", entity, query);
        Ok(self.get_json(&url, &[("search", query)]).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_joins_slashes() {
        let config = RemoteConfig {
            base_url: "http://example.test/api/".to_string(),
            ..Default::default()
        };
        let source = HttpSource::with_config(config);

        assert_eq!(
            source.endpoint_url("customers").unwrap(),
            "http://example.test/api/customers/"
        );
    }

    #[test]
    fn test_unknown_entity_rejected() {
        let source = HttpSource::new();
        match source.endpoint_url("invoices") {
            Err(RemoteError::UnknownEntity { entity }) => assert_eq!(entity, "invoices"),
            other => panic!("Expected UnknownEntity, got {:?}", other),
        }
    }
}

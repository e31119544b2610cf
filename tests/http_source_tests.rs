//! Integration tests for the HTTP fetch adapter against a mock REST API

use std::sync::Arc;

use serde_json::json;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use search_cache::{
    HttpSource, RemoteConfig, RemoteError, SearchCache, SearchSource, SmartSearchOptions,
};

/// Mock distributor API
struct MockApiServer {
    server: MockServer,
}

impl MockApiServer {
    async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    fn source(&self) -> HttpSource {
        HttpSource::with_config(RemoteConfig {
            base_url: self.server.uri(),
            timeout_ms: 2_000,
            ..Default::default()
        })
    }

    async fn setup_list(&self, endpoint: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    async fn setup_status(&self, endpoint: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }
}

fn remote_error(error: &anyhow::Error) -> &RemoteError {
    error
        .downcast_ref::<RemoteError>()
        .unwrap_or_else(|| panic!("Expected RemoteError, got {:#}", error))
}

#[tokio::test]
async fn test_fetch_all_returns_body() {
    let api = MockApiServer::new().await;
    api.setup_list("/customers/", json!({ "results": [{ "customer_name": "Apollo Pharmacy" }] }))
        .await;

    let body = api.source().fetch_all("customers").await.unwrap();
    assert_eq!(body["results"][0]["customer_name"], "Apollo Pharmacy");
}

#[tokio::test]
async fn test_search_sends_query_parameter() {
    let api = MockApiServer::new().await;
    Mock::given(method("GET"))
        .and(path("/products/"))
        .and(query_param("search", "para"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "product_name": "Paracetamol" }])),
        )
        .expect(1)
        .mount(&api.server)
        .await;

    let body = api.source().search("products", "para").await.unwrap();
    assert_eq!(body[0]["product_name"], "Paracetamol");
}

#[tokio::test]
async fn test_server_error_maps_to_http_error() {
    let api = MockApiServer::new().await;
    api.setup_status("/suppliers/", 500).await;

    let error = api.source().fetch_all("suppliers").await.unwrap_err();
    match remote_error(&error) {
        RemoteError::Http { status, url } => {
            assert_eq!(*status, 500);
            assert!(url.ends_with("/suppliers/"));
        }
        other => panic!("Expected Http error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unauthorized_has_sign_in_message() {
    let api = MockApiServer::new().await;
    api.setup_status("/batches/", 401).await;

    let error = api.source().fetch_all("batches").await.unwrap_err();
    assert!(remote_error(&error).user_message().to_lowercase().contains("sign in"));
}

#[tokio::test]
async fn test_invalid_json_maps_to_decode_error() {
    let api = MockApiServer::new().await;
    Mock::given(method("GET"))
        .and(path("/customers/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&api.server)
        .await;

    let error = api.source().fetch_all("customers").await.unwrap_err();
    assert!(matches!(remote_error(&error), RemoteError::Decode { .. }));
}

#[tokio::test]
async fn test_unknown_entity_is_rejected_without_request() {
    let api = MockApiServer::new().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&api.server)
        .await;

    let error = api.source().fetch_all("invoices").await.unwrap_err();
    assert!(matches!(remote_error(&error), RemoteError::UnknownEntity { .. }));
}

#[tokio::test]
async fn test_preload_and_smart_search_over_http() {
    let api = MockApiServer::new().await;
    api.setup_list(
        "/customers/",
        json!({ "customers": [
            { "customer_name": "Apollo Pharmacy", "city": "Chennai" },
            { "customer_name": "MedPlus Health", "city": "Hyderabad" },
        ]}),
    )
    .await;

    let source = Arc::new(api.source());
    let cache: SearchCache = SearchCache::new();

    let fetch_source = Arc::clone(&source);
    let items = cache
        .preload_data("customers", move || async move { fetch_source.fetch_all("customers").await })
        .await;
    assert_eq!(items.len(), 2);

    let search_source = Arc::clone(&source);
    let outcome = cache
        .smart_search_tracked(
            "customers",
            "hyder",
            move |query| async move { search_source.search("customers", &query).await },
            &SmartSearchOptions::default(),
        )
        .await;

    assert_eq!(outcome.source, SearchSource::Local);
    assert_eq!(outcome.items[0]["customer_name"], "MedPlus Health");
}

#[tokio::test]
async fn test_remote_failure_through_smart_search_is_empty() {
    let api = MockApiServer::new().await;
    api.setup_status("/products/", 503).await;

    let source = api.source();
    let cache: SearchCache = SearchCache::new();

    let found = cache
        .smart_search(
            "products",
            "dolo",
            |query| async move { source.search("products", &query).await },
            &SmartSearchOptions::default(),
        )
        .await;

    assert!(found.is_empty());
    assert_eq!(cache.cached_entries(), 0);
    assert_eq!(cache.metrics().remote_failures, 1);
}

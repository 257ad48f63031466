#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use linkshelf_core::cache::{LocalCache, MemoryCache};
use linkshelf_core::catalog::Catalog;
use linkshelf_core::export::ExportRegistry;
use linkshelf_core::link::Link;
use linkshelf_core::store::MemoryStore;
use tokio::sync::Mutex;
use tower::ServiceExt;

use linkshelf_api::config::ServerConfig;
use linkshelf_api::router::build_app_router;
use linkshelf_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        local_cache_path: String::new(),
    }
}

/// A started application over an in-memory store.
///
/// `router` can be cloned for several requests; all clones share the same
/// catalog session.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub export: Arc<ExportRegistry>,
}

/// Build the full application router with all middleware layers over
/// `store`, running the catalog startup sequence first.
pub async fn build_test_app_with(store: Arc<MemoryStore>, cache: Arc<dyn LocalCache>) -> TestApp {
    let config = test_config();

    let mut catalog = Catalog::new(store.clone(), cache);
    catalog.start().await;

    let export = Arc::new(ExportRegistry::new());
    catalog.mount_export(&export);

    let state = AppState {
        catalog: Arc::new(Mutex::new(catalog)),
        store: store.clone(),
        config: Arc::new(config.clone()),
        export: Arc::clone(&export),
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        export,
    }
}

pub async fn build_test_app(store: Arc<MemoryStore>) -> TestApp {
    build_test_app_with(store, Arc::new(MemoryCache::new())).await
}

/// An app over an empty store.
pub async fn empty_app() -> TestApp {
    build_test_app(Arc::new(MemoryStore::new())).await
}

pub fn link(id: i64, title: &str, category: Option<&str>) -> Link {
    Link {
        id,
        title: title.to_string(),
        url: format!("https://example.com/{id}"),
        category: category.map(str::to_string),
        author: "ana".to_string(),
        migration_batch: None,
        content_hash: None,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    send(app, Method::DELETE, uri, None).await
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

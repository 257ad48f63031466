//! HTTP-level integration tests for the derived view, header, export, and
//! startup migration report.

mod common;

use std::sync::Arc;

use axum::http::{header, StatusCode};
use common::{body_json, body_text, get, link, post_json};
use linkshelf_core::cache::{
    JsonFileCache, LocalCache, MemoryCache, LEGACY_LINKS_KEY, MIGRATION_COMPLETE_KEY,
};
use linkshelf_core::export::CSV_HEADER;
use linkshelf_core::store::MemoryStore;
use serde_json::{json, Value};

fn group_ids(view: &Value) -> Vec<(String, Vec<i64>)> {
    view["data"]["groups"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| {
            let ids = g["links"]
                .as_array()
                .unwrap()
                .iter()
                .map(|l| l["id"].as_i64().unwrap())
                .collect();
            (g["label"].as_str().unwrap().to_string(), ids)
        })
        .collect()
}

fn sample_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_links(vec![
        link(3, "Tokio", Some("X")),
        link(2, "Axum", Some("X")),
        link(1, "Serde", Some("Y")),
    ]))
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_default_view_groups_newest_first() {
    let app = common::build_test_app(sample_store()).await;

    let json = body_json(get(app.router, "/api/v1/view").await).await;

    assert_eq!(
        group_ids(&json),
        vec![("X".to_string(), vec![3, 2]), ("Y".to_string(), vec![1])]
    );
}

#[tokio::test]
async fn test_empty_catalog_has_no_groups() {
    let app = common::empty_app().await;

    let json = body_json(get(app.router, "/api/v1/view").await).await;

    assert!(json["data"]["groups"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_is_case_insensitive() {
    let app = common::build_test_app(sample_store()).await;

    let json = body_json(get(app.router, "/api/v1/view?search=AXUM").await).await;

    assert_eq!(group_ids(&json), vec![("X".to_string(), vec![2])]);
}

#[tokio::test]
async fn test_category_filter_is_exact() {
    let app = common::build_test_app(sample_store()).await;

    let json = body_json(get(app.router.clone(), "/api/v1/view?category=Y").await).await;
    assert_eq!(group_ids(&json), vec![("Y".to_string(), vec![1])]);

    let json = body_json(get(app.router, "/api/v1/view?category=y").await).await;
    assert!(json["data"]["groups"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_query_persists_across_requests() {
    let app = common::build_test_app(sample_store()).await;

    get(app.router.clone(), "/api/v1/view?search=serde").await;
    let json = body_json(get(app.router.clone(), "/api/v1/view").await).await;
    assert_eq!(group_ids(&json), vec![("Y".to_string(), vec![1])]);

    let json = body_json(get(app.router, "/api/v1/view?search=").await).await;
    assert_eq!(group_ids(&json).len(), 2);
}

#[tokio::test]
async fn test_sort_by_title_ascending() {
    let app = common::build_test_app(sample_store()).await;

    let json = body_json(
        get(app.router, "/api/v1/view?sort=title&direction=ascending").await,
    )
    .await;

    assert_eq!(
        group_ids(&json),
        vec![("X".to_string(), vec![2, 3]), ("Y".to_string(), vec![1])]
    );
}

#[tokio::test]
async fn test_invalid_sort_returns_400() {
    let app = common::build_test_app(sample_store()).await;

    let response = get(app.router, "/api/v1/view?sort=rating").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"].as_str().unwrap().contains("rating"));
}

#[tokio::test]
async fn test_toggle_sort_flips_direction() {
    let app = common::build_test_app(sample_store()).await;

    let first = body_json(
        post_json(app.router.clone(), "/api/v1/view/sort", json!({ "key": "id" })).await,
    )
    .await;
    assert_eq!(group_ids(&first)[0], ("X".to_string(), vec![2, 3]));

    let second = body_json(
        post_json(app.router, "/api/v1/view/sort", json!({ "key": "id" })).await,
    )
    .await;
    assert_eq!(group_ids(&second)[0], ("X".to_string(), vec![3, 2]));
}

#[tokio::test]
async fn test_persisted_order_survives_filtering() {
    let store = Arc::new(
        MemoryStore::with_links(vec![
            link(3, "c", Some("A")),
            link(2, "b", Some("B")),
            link(1, "a", Some("C")),
        ])
        .with_category_order(vec!["C".into(), "B".into(), "A".into()]),
    );
    let app = common::build_test_app(store).await;

    let json = body_json(get(app.router, "/api/v1/view?search=example.com/1").await).await;

    assert_eq!(group_ids(&json), vec![("C".to_string(), vec![1])]);
}

// ---------------------------------------------------------------------------
// Nav and export
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_nav_offers_export_while_mounted() {
    let app = common::empty_app().await;

    let json = body_json(get(app.router, "/api/v1/nav").await).await;

    assert_eq!(json["data"]["export_available"], true);
}

#[tokio::test]
async fn test_export_csv_follows_current_view() {
    let store = Arc::new(MemoryStore::with_links(vec![
        link(2, "Hello, world", Some("X")),
        link(1, "Plain", Some("Y")),
    ]));
    let app = common::build_test_app(store).await;
    get(app.router.clone(), "/api/v1/view?category=X").await;

    let response = get(app.router, "/api/v1/export.csv").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("links.csv"));

    let body = body_text(response).await;
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines[0], CSV_HEADER);
    assert!(lines[1].starts_with("2,\"Hello, world\",https://example.com/2,X,ana,"));
    assert_eq!(lines.len(), 2);
}

#[tokio::test]
async fn test_export_reflects_new_links() {
    let app = common::empty_app().await;

    post_json(
        app.router.clone(),
        "/api/v1/links",
        json!({ "title": "Rust", "url": "https://rust-lang.org", "author": "ana" }),
    )
    .await;
    let body = body_text(get(app.router, "/api/v1/export.csv").await).await;

    assert_eq!(body.lines().count(), 2);
    assert!(body.contains("https://rust-lang.org"));
}

#[tokio::test]
async fn test_export_without_producer_returns_404() {
    let app = common::empty_app().await;
    // Replace the mounted producer with a short-lived one, then drop it.
    drop(app.export.register(String::new));

    let nav = body_json(get(app.router.clone(), "/api/v1/nav").await).await;
    assert_eq!(nav["data"]["export_available"], false);

    let response = get(app.router, "/api/v1/export.csv").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Migration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_migration_report_after_startup() {
    let legacy = json!([
        { "id": 10, "title": "Old", "url": "https://old.example", "category": "Legacy", "author": "bo" },
        { "id": "11", "title": "Older", "url": "https://older.example", "author": "bo" },
        { "title": "", "url": "https://broken.example", "author": "bo" }
    ]);
    let cache = Arc::new(MemoryCache::with_entries([(LEGACY_LINKS_KEY, legacy.to_string())]));
    let app = common::build_test_app_with(Arc::new(MemoryStore::new()), cache).await;

    let report = body_json(get(app.router.clone(), "/api/v1/migration").await).await;
    assert_eq!(report["data"]["status"], "migrated");
    assert_eq!(report["data"]["inserted"], 2);
    assert_eq!(report["data"]["rejected"], 1);
    assert!(report["data"]["batch_id"].is_string());

    let view = body_json(get(app.router, "/api/v1/view").await).await;
    assert_eq!(
        group_ids(&view),
        vec![
            ("uncategorized".to_string(), vec![11]),
            ("Legacy".to_string(), vec![10]),
        ]
    );
}

#[tokio::test]
async fn test_migration_skipped_without_legacy_data() {
    let app = common::empty_app().await;

    let report = body_json(get(app.router, "/api/v1/migration").await).await;

    assert_eq!(report["data"]["status"], "skipped");
    assert_eq!(report["data"]["inserted"], 0);
}

#[tokio::test]
async fn test_migration_from_json_file_cache_sets_flag() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");
    let legacy = json!([
        { "id": 7, "title": "Old", "url": "https://old.example", "category": "Legacy", "author": "bo" }
    ]);
    let mut file = serde_json::Map::new();
    file.insert(LEGACY_LINKS_KEY.to_string(), Value::String(legacy.to_string()));
    std::fs::write(&path, Value::Object(file).to_string()).unwrap();

    let cache = Arc::new(JsonFileCache::new(&path));
    let app = common::build_test_app_with(Arc::new(MemoryStore::new()), cache.clone()).await;

    let report = body_json(get(app.router, "/api/v1/migration").await).await;
    assert_eq!(report["data"]["status"], "migrated");
    assert_eq!(app.store.links().len(), 1);
    assert_eq!(cache.get(MIGRATION_COMPLETE_KEY).unwrap().as_deref(), Some("true"));
    assert!(cache.get(LEGACY_LINKS_KEY).unwrap().is_some());
}

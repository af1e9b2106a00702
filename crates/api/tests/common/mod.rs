//! Shared helpers for HTTP-level integration tests.
//!
//! Requests go straight to the router via `tower::ServiceExt::oneshot`,
//! no TCP listener involved. `build_test_app` mirrors the production
//! router construction so tests exercise the same middleware stack.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use fanray_api::config::{ServerConfig, StorageConfig};
use fanray_api::router::build_app_router;
use fanray_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults and a per-run media
/// root under the system temp directory.
pub fn test_config() -> ServerConfig {
    let media_root = std::env::temp_dir()
        .join(format!("fanray-test-media-{}", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();

    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        storage: StorageConfig {
            provider: "local".to_string(),
            local_root: media_root,
            base_url: "http://localhost:3000/media".to_string(),
            s3_bucket: String::new(),
        },
    }
}

/// Build the full application router against the given database pool,
/// with an in-memory cache and local disk storage.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();

    let storage = Arc::new(fanray_storage::LocalDiskStorage::new(
        config.storage.local_root.clone(),
        config.storage.base_url.clone(),
    ));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        cache: Arc::new(fanray_cache::MemoryCache::new()),
        storage,
        event_bus: Arc::new(fanray_events::EventBus::default()),
    };

    build_app_router(state, &config)
}

/// GET `uri`.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST `uri` with a JSON body.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// PUT `uri` with a JSON body.
pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// DELETE `uri`.
pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST `uri` with a raw body and content type (XML-RPC, multipart).
pub async fn post_raw(
    app: Router,
    uri: &str,
    content_type: &str,
    body: Vec<u8>,
) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", content_type)
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect the response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect the response body as a string.
pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Create a post through the API and return its JSON representation.
pub async fn create_post(pool: PgPool, body: serde_json::Value) -> serde_json::Value {
    let app = build_test_app(pool);
    let response = post_json(app, "/api/v1/posts", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

/// A 1x1 transparent PNG, the smallest upload the pipeline accepts.
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Build a multipart body with one `file` part (and optional `title`).
pub fn multipart_upload(
    boundary: &str,
    file_name: &str,
    bytes: &[u8],
    title: Option<&str>,
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\ncontent-disposition: form-data; name=\"file\"; \
             filename=\"{file_name}\"\r\ncontent-type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
    if let Some(title) = title {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\ncontent-disposition: form-data; name=\"title\"\r\n\r\n{title}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

//! Integration tests for the statistics endpoints.

mod common;

use axum::http::StatusCode;
use chrono::Datelike;
use common::{body_json, create_post, get};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn archives_group_published_posts_by_month(pool: PgPool) {
    create_post(
        pool.clone(),
        serde_json::json!({"title": "Live A", "status": "published"}),
    )
    .await;
    create_post(
        pool.clone(),
        serde_json::json!({"title": "Live B", "status": "published"}),
    )
    .await;
    // Drafts stay out of the archive.
    create_post(pool.clone(), serde_json::json!({"title": "Draft"})).await;

    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/stats/archives").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let months = json["data"].as_array().unwrap();
    assert_eq!(months.len(), 1);

    let now = chrono::Utc::now();
    assert_eq!(months[0]["year"], now.year());
    assert_eq!(months[0]["month"], now.month());
    assert_eq!(months[0]["count"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn archives_are_empty_without_published_posts(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/stats/archives").await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn post_counts_split_by_status(pool: PgPool) {
    create_post(pool.clone(), serde_json::json!({"title": "D1"})).await;
    create_post(pool.clone(), serde_json::json!({"title": "D2"})).await;
    create_post(
        pool.clone(),
        serde_json::json!({"title": "P1", "status": "published"}),
    )
    .await;

    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/stats/posts").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["draft"], 2);
    assert_eq!(json["data"]["published"], 1);
    assert_eq!(json["data"]["total"], 3);
}

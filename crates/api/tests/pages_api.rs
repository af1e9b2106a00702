//! HTTP-level integration tests for the page endpoints: hierarchy,
//! sibling slug scope, and child-protected deletion.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete, get, post_json, put_json};
use sqlx::PgPool;

async fn create_page(pool: PgPool, body: serde_json::Value) -> serde_json::Value {
    let app = common::build_test_app(pool);
    let response = post_json(app, "/api/v1/pages", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_root_and_child_pages(pool: PgPool) {
    let root = create_page(pool.clone(), serde_json::json!({"title": "Docs"})).await;
    let root_id = root["data"]["id"].as_i64().unwrap();
    assert_eq!(root["data"]["slug"], "docs");
    assert!(root["data"]["parent_id"].is_null());

    let child = create_page(
        pool.clone(),
        serde_json::json!({"title": "Install", "parent_id": root_id}),
    )
    .await;
    assert_eq!(child["data"]["parent_id"].as_i64(), Some(root_id));

    // The tree listing returns the child under its root.
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/pages").await;
    let json = body_json(response).await;
    let tree = json["data"].as_array().unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0]["title"], "Docs");
    assert_eq!(tree[0]["children"][0]["title"], "Install");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sibling_slugs_conflict_but_cousins_do_not(pool: PgPool) {
    let a = create_page(pool.clone(), serde_json::json!({"title": "Section A"})).await;
    let b = create_page(pool.clone(), serde_json::json!({"title": "Section B"})).await;
    let a_id = a["data"]["id"].as_i64().unwrap();
    let b_id = b["data"]["id"].as_i64().unwrap();

    // Two children of A with the same title: the second gets a suffix.
    let first = create_page(
        pool.clone(),
        serde_json::json!({"title": "Intro", "parent_id": a_id}),
    )
    .await;
    assert_eq!(first["data"]["slug"], "intro");

    let second = create_page(
        pool.clone(),
        serde_json::json!({"title": "Intro", "parent_id": a_id}),
    )
    .await;
    assert_eq!(second["data"]["slug"], "intro-2");

    // A child of B can reuse the slug; the scope is per sibling set.
    let cousin = create_page(
        pool,
        serde_json::json!({"title": "Intro", "parent_id": b_id}),
    )
    .await;
    assert_eq!(cousin["data"]["slug"], "intro");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_page_under_unknown_parent_is_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/pages",
        serde_json::json!({"title": "Orphan", "parent_id": 999999}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_page_reslug_probes_siblings(pool: PgPool) {
    let taken = create_page(pool.clone(), serde_json::json!({"title": "About"})).await;
    assert_eq!(taken["data"]["slug"], "about");

    let other = create_page(pool.clone(), serde_json::json!({"title": "Contact"})).await;
    let other_id = other["data"]["id"].as_i64().unwrap();

    let app = common::build_test_app(pool);
    let response = put_json(
        app,
        &format!("/api/v1/pages/{other_id}"),
        serde_json::json!({"title": "About"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["slug"], "about-2");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_a_parent_with_children_is_refused(pool: PgPool) {
    let root = create_page(pool.clone(), serde_json::json!({"title": "Parent"})).await;
    let root_id = root["data"]["id"].as_i64().unwrap();
    let child = create_page(
        pool.clone(),
        serde_json::json!({"title": "Child", "parent_id": root_id}),
    )
    .await;
    let child_id = child["data"]["id"].as_i64().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = delete(app, &format!("/api/v1/pages/{root_id}")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // After removing the child the parent can go.
    let app = common::build_test_app(pool.clone());
    let response = delete(app, &format!("/api/v1/pages/{child_id}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let app = common::build_test_app(pool);
    let response = delete(app, &format!("/api/v1/pages/{root_id}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn page_ids_are_not_visible_as_posts(pool: PgPool) {
    let page = create_page(pool.clone(), serde_json::json!({"title": "Standalone"})).await;
    let id = page["data"]["id"].as_i64().unwrap();

    // The post endpoints refuse page ids.
    let app = common::build_test_app(pool);
    let response = get(app, &format!("/api/v1/posts/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

//! Integration tests for widget areas: placement, ordering, moving
//! between areas, and instance settings.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete, get, post_json, put_json};
use sqlx::PgPool;

async fn add_widget(pool: PgPool, area: &str, widget_type: &str) -> serde_json::Value {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        &format!("/api/v1/widgets/areas/{area}"),
        serde_json::json!({"widget_type": widget_type}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn seeded_areas_are_listed_empty(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/widgets/areas").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let areas = json["data"].as_array().unwrap();
    let ids: Vec<&str> = areas.iter().map(|a| a["id"].as_str().unwrap()).collect();
    assert!(ids.contains(&"blog-sidebar1"));
    assert!(ids.contains(&"footer1"));
    for area in areas {
        assert_eq!(area["widgets"].as_array().unwrap().len(), 0);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn add_widget_to_area(pool: PgPool) {
    let created = add_widget(pool.clone(), "blog-sidebar1", "recent-posts").await;
    assert_eq!(created["data"]["widget_type"], "recent-posts");
    let widget_id = created["data"]["id"].as_str().unwrap().to_string();

    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/widgets/areas").await;
    let json = body_json(response).await;
    let sidebar = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["id"] == "blog-sidebar1")
        .unwrap();
    assert_eq!(sidebar["widgets"][0]["id"], widget_id.as_str());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn adding_to_unknown_area_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/widgets/areas/no-such-area",
        serde_json::json!({"widget_type": "tag-cloud"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_widget_settings(pool: PgPool) {
    let created = add_widget(pool.clone(), "blog-sidebar1", "recent-posts").await;
    let widget_id = created["data"]["id"].as_str().unwrap().to_string();

    let app = common::build_test_app(pool);
    let response = put_json(
        app,
        &format!("/api/v1/widgets/instances/{widget_id}"),
        serde_json::json!({"title": "Latest", "settings": {"count": 5}}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], "Latest");
    assert_eq!(json["data"]["settings"]["count"], 5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reorder_within_an_area(pool: PgPool) {
    let a = add_widget(pool.clone(), "blog-sidebar1", "recent-posts").await;
    let b = add_widget(pool.clone(), "blog-sidebar1", "tag-cloud").await;
    let a_id = a["data"]["id"].as_str().unwrap().to_string();
    let b_id = b["data"]["id"].as_str().unwrap().to_string();

    let app = common::build_test_app(pool.clone());
    let response = put_json(
        app,
        "/api/v1/widgets/areas/blog-sidebar1/order",
        serde_json::json!({"widget_ids": [b_id, a_id]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/widgets/areas").await;
    let json = body_json(response).await;
    let sidebar = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["id"] == "blog-sidebar1")
        .unwrap();
    assert_eq!(sidebar["widgets"][0]["widget_type"], "tag-cloud");
    assert_eq!(sidebar["widgets"][1]["widget_type"], "recent-posts");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn moving_a_widget_between_areas(pool: PgPool) {
    let created = add_widget(pool.clone(), "blog-sidebar1", "recent-posts").await;
    let widget_id = created["data"]["id"].as_str().unwrap().to_string();

    // Reordering footer1 with the sidebar's widget moves it over.
    let app = common::build_test_app(pool.clone());
    let response = put_json(
        app,
        "/api/v1/widgets/areas/footer1/order",
        serde_json::json!({"widget_ids": [widget_id]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/widgets/areas").await;
    let json = body_json(response).await;
    let areas = json["data"].as_array().unwrap();
    let sidebar = areas.iter().find(|a| a["id"] == "blog-sidebar1").unwrap();
    let footer = areas.iter().find(|a| a["id"] == "footer1").unwrap();
    assert_eq!(sidebar["widgets"].as_array().unwrap().len(), 0);
    assert_eq!(footer["widgets"][0]["widget_type"], "recent-posts");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn remove_widget_unlinks_and_deletes(pool: PgPool) {
    let created = add_widget(pool.clone(), "blog-sidebar1", "recent-posts").await;
    let widget_id = created["data"]["id"].as_str().unwrap().to_string();

    let app = common::build_test_app(pool.clone());
    let response = delete(app, &format!("/api/v1/widgets/instances/{widget_id}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let app = common::build_test_app(pool.clone());
    let response = get(app, "/api/v1/widgets/areas").await;
    let json = body_json(response).await;
    let sidebar = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["id"] == "blog-sidebar1")
        .unwrap();
    assert_eq!(sidebar["widgets"].as_array().unwrap().len(), 0);

    // Deleting again reports the missing instance.
    let app = common::build_test_app(pool);
    let response = delete(app, &format!("/api/v1/widgets/instances/{widget_id}")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

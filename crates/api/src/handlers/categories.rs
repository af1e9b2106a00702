//! Handlers for categories.
//!
//! The category list is cache-backed. The site default category (meta
//! `blog.default_category_id`) cannot be deleted; deleting any other
//! category reassigns its posts to the default.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use fanray_core::error::CoreError;
use fanray_core::slug;
use fanray_core::types::DbId;
use fanray_db::models::category::{Category, CreateCategoryRequest, UpdateCategoryRequest};
use fanray_db::repositories::{CategoryRepo, MetaRepo};
use fanray_events::SiteEvent;

use crate::error::{validate_dto, AppError, AppResult};
use crate::handlers::posts::default_category_id;
use crate::response::DataResponse;
use crate::state::{AppState, DEFAULT_USER_ID};

/// GET /api/v1/categories
pub async fn list_categories(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let key = fanray_cache::keys::CATEGORIES;
    if let Some(cached) =
        fanray_cache::get_json::<Vec<Category>>(state.cache.as_ref(), key).await
    {
        return Ok(Json(DataResponse { data: cached }));
    }

    let categories = CategoryRepo::list_all(&state.pool).await?;
    fanray_cache::put_json(
        state.cache.as_ref(),
        key,
        &categories,
        fanray_cache::keys::LIST_TTL,
    )
    .await;

    Ok(Json(DataResponse { data: categories }))
}

/// GET /api/v1/categories/{id}
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let category = CategoryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id,
        }))?;
    Ok(Json(DataResponse { data: category }))
}

/// POST /api/v1/categories
pub async fn create_category(
    State(state): State<AppState>,
    Json(input): Json<CreateCategoryRequest>,
) -> AppResult<impl IntoResponse> {
    validate_dto(&input)?;
    let title = input.title.trim();

    if CategoryRepo::find_by_title_ci(&state.pool, title)
        .await?
        .is_some()
    {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Category '{title}' already exists"
        ))));
    }

    let candidate = match input.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => slug::slugify(s),
        None => slug::slugify(title),
    };
    let resolved = CategoryRepo::unique_slug(&state.pool, &candidate, None).await?;
    let category =
        CategoryRepo::create(&state.pool, title, &resolved, input.description.as_deref()).await?;

    state.event_bus.publish(
        SiteEvent::new("category.created")
            .with_source("category", category.id)
            .with_actor(DEFAULT_USER_ID)
            .with_payload(serde_json::json!({ "title": category.title })),
    );
    tracing::info!(category_id = category.id, title = %category.title, "Category created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}

/// PUT /api/v1/categories/{id}
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCategoryRequest>,
) -> AppResult<impl IntoResponse> {
    validate_dto(&input)?;

    // A retitle may not collide with another category.
    if let Some(title) = input.title.as_deref().map(str::trim) {
        if let Some(existing) = CategoryRepo::find_by_title_ci(&state.pool, title).await? {
            if existing.id != id {
                return Err(AppError::Core(CoreError::Conflict(format!(
                    "Category '{title}' already exists"
                ))));
            }
        }
    }

    let resolved_slug = match input.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => {
            Some(CategoryRepo::unique_slug(&state.pool, &slug::slugify(s), Some(id)).await?)
        }
        None => None,
    };

    let category = CategoryRepo::update(
        &state.pool,
        id,
        input.title.as_deref().map(str::trim),
        resolved_slug.as_deref(),
        input.description.as_deref(),
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "Category",
        id,
    }))?;

    state.event_bus.publish(
        SiteEvent::new("category.updated")
            .with_source("category", id)
            .with_actor(DEFAULT_USER_ID),
    );

    Ok(Json(DataResponse { data: category }))
}

/// DELETE /api/v1/categories/{id}
///
/// The default category is protected; posts in a deleted category move
/// to the default, which is then recounted.
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let default_id = default_category_id(&state.pool).await?;
    if id == default_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "The default category cannot be deleted".into(),
        )));
    }

    let removed = CategoryRepo::delete(&state.pool, id, default_id).await?;
    if !removed {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id,
        }));
    }
    CategoryRepo::recount(&state.pool, default_id).await?;

    state.event_bus.publish(
        SiteEvent::new("category.deleted")
            .with_source("category", id)
            .with_actor(DEFAULT_USER_ID),
    );
    tracing::info!(category_id = id, "Category deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/categories/{id}/default
///
/// Mark a category as the site default.
pub async fn set_default_category(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let category = CategoryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id,
        }))?;

    MetaRepo::upsert(
        &state.pool,
        "blog.default_category_id",
        &serde_json::json!(id),
    )
    .await?;
    tracing::info!(category_id = id, title = %category.title, "Default category changed");

    Ok(Json(DataResponse { data: category }))
}

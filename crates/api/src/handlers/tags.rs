//! Handlers for tags. The tag list is cache-backed.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use fanray_core::error::CoreError;
use fanray_core::slug;
use fanray_core::types::DbId;
use fanray_db::models::tag::{CreateTagRequest, Tag, UpdateTagRequest};
use fanray_db::repositories::TagRepo;
use fanray_events::SiteEvent;

use crate::error::{validate_dto, AppError, AppResult};
use crate::response::DataResponse;
use crate::state::{AppState, DEFAULT_USER_ID};

/// GET /api/v1/tags
pub async fn list_tags(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let key = fanray_cache::keys::TAGS;
    if let Some(cached) = fanray_cache::get_json::<Vec<Tag>>(state.cache.as_ref(), key).await {
        return Ok(Json(DataResponse { data: cached }));
    }

    let tags = TagRepo::list_all(&state.pool).await?;
    fanray_cache::put_json(
        state.cache.as_ref(),
        key,
        &tags,
        fanray_cache::keys::LIST_TTL,
    )
    .await;

    Ok(Json(DataResponse { data: tags }))
}

/// GET /api/v1/tags/{id}
pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let tag = TagRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Tag", id }))?;
    Ok(Json(DataResponse { data: tag }))
}

/// POST /api/v1/tags
pub async fn create_tag(
    State(state): State<AppState>,
    Json(input): Json<CreateTagRequest>,
) -> AppResult<impl IntoResponse> {
    validate_dto(&input)?;
    let title = input.title.trim();

    if TagRepo::find_by_title_ci(&state.pool, title).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Tag '{title}' already exists"
        ))));
    }

    let candidate = match input.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => slug::slugify(s),
        None => slug::slugify(title),
    };
    let resolved = TagRepo::unique_slug(&state.pool, &candidate, None).await?;
    let tag = TagRepo::create(&state.pool, title, &resolved, input.description.as_deref()).await?;

    state.event_bus.publish(
        SiteEvent::new("tag.created")
            .with_source("tag", tag.id)
            .with_actor(DEFAULT_USER_ID)
            .with_payload(serde_json::json!({ "title": tag.title })),
    );
    tracing::info!(tag_id = tag.id, title = %tag.title, "Tag created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: tag })))
}

/// PUT /api/v1/tags/{id}
pub async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTagRequest>,
) -> AppResult<impl IntoResponse> {
    validate_dto(&input)?;

    if let Some(title) = input.title.as_deref().map(str::trim) {
        if let Some(existing) = TagRepo::find_by_title_ci(&state.pool, title).await? {
            if existing.id != id {
                return Err(AppError::Core(CoreError::Conflict(format!(
                    "Tag '{title}' already exists"
                ))));
            }
        }
    }

    let resolved_slug = match input.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Some(TagRepo::unique_slug(&state.pool, &slug::slugify(s), Some(id)).await?),
        None => None,
    };

    let tag = TagRepo::update(
        &state.pool,
        id,
        input.title.as_deref().map(str::trim),
        resolved_slug.as_deref(),
        input.description.as_deref(),
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound { entity: "Tag", id }))?;

    state.event_bus.publish(
        SiteEvent::new("tag.updated")
            .with_source("tag", id)
            .with_actor(DEFAULT_USER_ID),
    );

    Ok(Json(DataResponse { data: tag }))
}

/// DELETE /api/v1/tags/{id}
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let removed = TagRepo::delete(&state.pool, id).await?;
    if !removed {
        return Err(AppError::Core(CoreError::NotFound { entity: "Tag", id }));
    }

    state.event_bus.publish(
        SiteEvent::new("tag.deleted")
            .with_source("tag", id)
            .with_actor(DEFAULT_USER_ID),
    );
    tracing::info!(tag_id = id, "Tag deleted");

    Ok(StatusCode::NO_CONTENT)
}

//! Handlers for hierarchical pages.
//!
//! Pages form a parent/child tree; a page's slug is unique among its
//! siblings, and a parent with children cannot be deleted.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use fanray_core::error::CoreError;
use fanray_core::slug;
use fanray_core::types::DbId;
use fanray_db::models::post::{
    CreatePageRequest, CreatePostRow, Post, UpdatePageRequest, UpdatePostRow, TYPE_PAGE,
};
use fanray_db::repositories::PostRepo;
use fanray_db::DbPool;
use fanray_events::SiteEvent;
use serde::{Deserialize, Serialize};

use crate::error::{validate_dto, AppError, AppResult};
use crate::handlers::posts::{parse_status, rewrite_responsive, slug_candidate};
use crate::response::DataResponse;
use crate::state::{AppState, DEFAULT_USER_ID};

/// A page and its immediate children.
#[derive(Debug, Serialize, Deserialize)]
pub struct PageDto {
    #[serde(flatten)]
    pub page: Post,
    pub children: Vec<Post>,
}

/// GET /api/v1/pages
///
/// Root pages with their immediate children (the admin page tree).
pub async fn list_pages(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let roots = PostRepo::list_root_pages(&state.pool).await?;
    let mut data = Vec::with_capacity(roots.len());
    for root in roots {
        let children = PostRepo::list_children(&state.pool, root.id).await?;
        data.push(PageDto {
            page: root,
            children,
        });
    }
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/pages/{id}
pub async fn get_page(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let mut page = find_page(&state.pool, id).await?;
    page.body = rewrite_responsive(&state.pool, &page.body).await?;
    let children = PostRepo::list_children(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: PageDto { page, children },
    }))
}

/// POST /api/v1/pages
pub async fn create_page(
    State(state): State<AppState>,
    Json(input): Json<CreatePageRequest>,
) -> AppResult<impl IntoResponse> {
    validate_dto(&input)?;
    let status = parse_status(input.status.as_deref())?;

    // A parent must exist and itself be a page.
    if let Some(pid) = input.parent_id {
        find_page(&state.pool, pid).await?;
    }

    let candidate = slug_candidate(input.slug.as_deref(), &input.title);
    let resolved_slug = resolve_page_slug(&state.pool, &candidate, input.parent_id, None).await?;

    let page = PostRepo::create(
        &state.pool,
        &CreatePostRow {
            user_id: DEFAULT_USER_ID,
            parent_id: input.parent_id,
            category_id: None,
            post_type: TYPE_PAGE.to_string(),
            status,
            title: input.title.clone(),
            slug: resolved_slug,
            body: input.body.clone(),
            excerpt: input.excerpt.clone(),
            comments_enabled: input.comments_enabled.unwrap_or(false),
            created_at: None,
        },
    )
    .await?;

    state.event_bus.publish(
        SiteEvent::new("page.created")
            .with_source("page", page.id)
            .with_actor(DEFAULT_USER_ID)
            .with_payload(serde_json::json!({ "slug": page.slug })),
    );
    tracing::info!(page_id = page.id, slug = %page.slug, "Page created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: page })))
}

/// PUT /api/v1/pages/{id}
pub async fn update_page(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePageRequest>,
) -> AppResult<impl IntoResponse> {
    validate_dto(&input)?;
    let current = find_page(&state.pool, id).await?;

    let status = match &input.status {
        Some(s) => parse_status(Some(s))?,
        None => current.status.clone(),
    };
    let title = input.title.clone().unwrap_or_else(|| current.title.clone());

    let resolved_slug = match (&input.slug, &input.title) {
        (None, None) => current.slug.clone(),
        (explicit, _) => {
            let candidate = slug_candidate(explicit.as_deref(), &title);
            if candidate == current.slug {
                current.slug.clone()
            } else {
                resolve_page_slug(&state.pool, &candidate, current.parent_id, Some(id)).await?
            }
        }
    };

    let updated = PostRepo::update(
        &state.pool,
        id,
        &UpdatePostRow {
            category_id: None,
            status,
            title,
            slug: resolved_slug,
            body: input.body.clone().unwrap_or_else(|| current.body.clone()),
            excerpt: input.excerpt.clone().or_else(|| current.excerpt.clone()),
            comments_enabled: input
                .comments_enabled
                .unwrap_or(current.comments_enabled),
        },
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "Page",
        id,
    }))?;

    state.event_bus.publish(
        SiteEvent::new("page.updated")
            .with_source("page", id)
            .with_actor(DEFAULT_USER_ID)
            .with_payload(serde_json::json!({ "slug": updated.slug })),
    );
    tracing::info!(page_id = id, slug = %updated.slug, "Page updated");

    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/pages/{id}
///
/// Refused while the page still has children.
pub async fn delete_page(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_page(&state.pool, id).await?;

    if PostRepo::has_children(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "Page has child pages; delete or move them first".into(),
        )));
    }

    PostRepo::delete(&state.pool, id).await?;

    state.event_bus.publish(
        SiteEvent::new("page.deleted")
            .with_source("page", id)
            .with_actor(DEFAULT_USER_ID),
    );
    tracing::info!(page_id = id, "Page deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Fetch a post by id, requiring it to be a page.
async fn find_page(pool: &DbPool, id: DbId) -> Result<Post, AppError> {
    match PostRepo::find_by_id(pool, id).await? {
        Some(p) if p.post_type == TYPE_PAGE => Ok(p),
        _ => Err(AppError::Core(CoreError::NotFound {
            entity: "Page",
            id,
        })),
    }
}

/// Probe the sibling scope until the slug is free.
async fn resolve_page_slug(
    pool: &DbPool,
    candidate: &str,
    parent_id: Option<DbId>,
    exclude_id: Option<DbId>,
) -> Result<String, sqlx::Error> {
    if !PostRepo::page_slug_taken(pool, candidate, parent_id, exclude_id).await? {
        return Ok(candidate.to_string());
    }
    let mut n = 2;
    loop {
        let probe = slug::with_suffix(candidate, n);
        if !PostRepo::page_slug_taken(pool, &probe, parent_id, exclude_id).await? {
            return Ok(probe);
        }
        n += 1;
    }
}

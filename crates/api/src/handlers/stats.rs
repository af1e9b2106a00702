//! Handlers for blog statistics: the archive sidebar and post counts.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use fanray_db::models::post::{ArchiveMonth, PostStatusCounts};
use fanray_db::repositories::PostRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/stats/archives
///
/// Published posts grouped by year/month, newest first. Cache-backed:
/// the archive only changes when posts are published or deleted.
pub async fn get_archives(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let key = fanray_cache::keys::ARCHIVES;
    if let Some(cached) =
        fanray_cache::get_json::<Vec<ArchiveMonth>>(state.cache.as_ref(), key).await
    {
        return Ok(Json(DataResponse { data: cached }));
    }

    let archives = PostRepo::archive_counts(&state.pool).await?;
    fanray_cache::put_json(
        state.cache.as_ref(),
        key,
        &archives,
        fanray_cache::keys::LIST_TTL,
    )
    .await;

    Ok(Json(DataResponse { data: archives }))
}

/// GET /api/v1/stats/posts
///
/// Post totals per status, for the admin dashboard.
pub async fn get_post_counts(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let counts: PostStatusCounts = PostRepo::count_by_status(&state.pool).await?;
    Ok(Json(DataResponse { data: counts }))
}

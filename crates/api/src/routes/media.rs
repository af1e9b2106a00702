//! Media library routes.

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;

use crate::handlers::media;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/media", get(media::list_media).post(media::upload_media))
        .route(
            "/media/{id}",
            get(media::get_media)
                .put(media::update_media)
                .delete(media::delete_media),
        )
        .route("/media/{id}/url", get(media::get_media_url))
        // Multipart framing overhead on top of the per-file limit.
        .layer(DefaultBodyLimit::max(
            fanray_core::upload::MAX_UPLOAD_BYTES + 64 * 1024,
        ))
}

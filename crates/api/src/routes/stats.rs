//! Statistics routes.

use axum::routing::get;
use axum::Router;

use crate::handlers::stats;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats/archives", get(stats::get_archives))
        .route("/stats/posts", get(stats::get_post_counts))
}

//! Tag routes.

use axum::routing::get;
use axum::Router;

use crate::handlers::tags;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tags", get(tags::list_tags).post(tags::create_tag))
        .route(
            "/tags/{id}",
            get(tags::get_tag).put(tags::update_tag).delete(tags::delete_tag),
        )
}

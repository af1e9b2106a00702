//! Blog post routes.

use axum::routing::get;
use axum::Router;

use crate::handlers::posts;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/published", get(posts::list_published))
        .route(
            "/posts/{id}",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
}

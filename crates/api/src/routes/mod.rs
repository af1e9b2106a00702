//! Route modules. Each module exposes a `router()` returning a
//! `Router<AppState>`; [`api_routes`] merges the `/api/v1` surface.

pub mod categories;
pub mod health;
pub mod media;
pub mod navigation;
pub mod pages;
pub mod posts;
pub mod stats;
pub mod tags;
pub mod widgets;

use axum::Router;

use crate::state::AppState;

/// All `/api/v1` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(posts::router())
        .merge(pages::router())
        .merge(categories::router())
        .merge(tags::router())
        .merge(media::router())
        .merge(navigation::router())
        .merge(widgets::router())
        .merge(stats::router())
}

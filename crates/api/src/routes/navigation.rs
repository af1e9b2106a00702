//! Navigation menu routes.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::navigation;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/navigation",
            get(navigation::list_menus).post(navigation::create_menu),
        )
        .route(
            "/navigation/{menu_id}",
            put(navigation::update_menu).delete(navigation::delete_menu),
        )
}

//! Widget area and instance routes.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::widgets;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/widgets/areas", get(widgets::list_areas))
        .route("/widgets/areas/{area_id}", post(widgets::add_widget))
        .route("/widgets/areas/{area_id}/order", put(widgets::reorder_area))
        .route(
            "/widgets/instances/{id}",
            put(widgets::update_widget).delete(widgets::remove_widget),
        )
}

//! Handlers for navigation menus.
//!
//! Menus live in one meta row (`site.navigation`) as an ordered JSON
//! array; replacing a menu's item list wholesale is how the admin UI
//! persists drag-and-drop ordering.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use fanray_core::error::CoreError;
use fanray_core::types::DbId;
use fanray_db::repositories::MetaRepo;
use fanray_db::DbPool;
use fanray_events::SiteEvent;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{validate_dto, AppError, AppResult};
use crate::response::DataResponse;
use crate::state::{AppState, DEFAULT_USER_ID};

/// Meta key holding all menus.
pub const NAVIGATION_KEY: &str = "site.navigation";

/// One link in a menu. `nav_type` says what the link points at;
/// `target_id` identifies the target for non-custom types.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NavItem {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    pub url: String,
    /// `page`, `category`, or `custom`.
    pub nav_type: String,
    pub target_id: Option<DbId>,
}

/// A named menu and its ordered items.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NavMenu {
    pub id: DbId,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(nested)]
    pub items: Vec<NavItem>,
}

/// Body for `PUT /navigation/{menu_id}`: the full replacement item list.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMenuRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(nested)]
    pub items: Vec<NavItem>,
}

/// GET /api/v1/navigation
pub async fn list_menus(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let menus = load_menus(&state.pool).await?;
    Ok(Json(DataResponse { data: menus }))
}

/// POST /api/v1/navigation
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMenuRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

pub async fn create_menu(
    State(state): State<AppState>,
    Json(input): Json<CreateMenuRequest>,
) -> AppResult<impl IntoResponse> {
    validate_dto(&input)?;

    let mut menus = load_menus(&state.pool).await?;
    let next_id = menus.iter().map(|m| m.id).max().unwrap_or(0) + 1;
    let menu = NavMenu {
        id: next_id,
        name: input.name,
        items: Vec::new(),
    };
    menus.push(menu.clone());
    save_menus(&state.pool, &menus).await?;

    state.event_bus.publish(
        SiteEvent::new("navigation.updated")
            .with_source("menu", next_id)
            .with_actor(DEFAULT_USER_ID),
    );
    tracing::info!(menu_id = next_id, name = %menu.name, "Navigation menu created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: menu })))
}

/// PUT /api/v1/navigation/{menu_id}
///
/// Replaces the menu's item list in the given order.
pub async fn update_menu(
    State(state): State<AppState>,
    Path(menu_id): Path<DbId>,
    Json(input): Json<UpdateMenuRequest>,
) -> AppResult<impl IntoResponse> {
    validate_dto(&input)?;

    let mut menus = load_menus(&state.pool).await?;
    let menu = menus
        .iter_mut()
        .find(|m| m.id == menu_id)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Menu",
            id: menu_id,
        }))?;

    if let Some(name) = input.name {
        menu.name = name;
    }
    menu.items = input.items;
    let updated = menu.clone();
    save_menus(&state.pool, &menus).await?;

    state.event_bus.publish(
        SiteEvent::new("navigation.updated")
            .with_source("menu", menu_id)
            .with_actor(DEFAULT_USER_ID),
    );
    tracing::info!(menu_id, "Navigation menu updated");

    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/navigation/{menu_id}
pub async fn delete_menu(
    State(state): State<AppState>,
    Path(menu_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let mut menus = load_menus(&state.pool).await?;
    let before = menus.len();
    menus.retain(|m| m.id != menu_id);
    if menus.len() == before {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Menu",
            id: menu_id,
        }));
    }
    save_menus(&state.pool, &menus).await?;

    state.event_bus.publish(
        SiteEvent::new("navigation.updated")
            .with_source("menu", menu_id)
            .with_actor(DEFAULT_USER_ID),
    );
    tracing::info!(menu_id, "Navigation menu deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn load_menus(pool: &DbPool) -> Result<Vec<NavMenu>, AppError> {
    let Some(meta) = MetaRepo::get(pool, NAVIGATION_KEY).await? else {
        return Ok(Vec::new());
    };
    serde_json::from_value(meta.value)
        .map_err(|e| AppError::InternalError(format!("Corrupt navigation meta: {e}")))
}

async fn save_menus(pool: &DbPool, menus: &[NavMenu]) -> Result<(), AppError> {
    let value = serde_json::to_value(menus)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize menus: {e}")))?;
    MetaRepo::upsert(pool, NAVIGATION_KEY, &value).await?;
    Ok(())
}

//! Handlers for widget areas and widget instances.
//!
//! Placement lives in meta rows: `widgets.areas` lists the area ids,
//! `widgets.area.{id}` holds an area's ordered instance list, and
//! `widgets.instance.{uuid}` holds one instance's type, title, and
//! settings blob. Moving a widget between areas is a remove from one
//! list and an insert into another; the instance row is untouched.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use fanray_db::repositories::MetaRepo;
use fanray_db::DbPool;
use fanray_events::SiteEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{validate_dto, AppError, AppResult};
use crate::response::DataResponse;
use crate::state::{AppState, DEFAULT_USER_ID};

/// Meta key listing the area ids.
pub const AREAS_KEY: &str = "widgets.areas";

fn area_key(id: &str) -> String {
    format!("widgets.area.{id}")
}

fn instance_key(id: Uuid) -> String {
    format!("widgets.instance.{id}")
}

/// An area's ordered widget list, as stored in meta.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaPlacement {
    pub id: String,
    #[serde(default)]
    pub widget_ids: Vec<Uuid>,
}

/// One configured widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetInstance {
    pub id: Uuid,
    /// The widget implementation, e.g. `recent-posts` or `tag-cloud`.
    pub widget_type: String,
    pub title: String,
    /// Widget-specific settings, opaque to the host.
    pub settings: serde_json::Value,
}

/// An area with its instances resolved, as returned to the admin UI.
#[derive(Debug, Serialize, Deserialize)]
pub struct AreaDto {
    pub id: String,
    pub widgets: Vec<WidgetInstance>,
}

/// GET /api/v1/widgets/areas
pub async fn list_areas(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let ids = load_area_ids(&state.pool).await?;
    let mut data = Vec::with_capacity(ids.len());
    for id in ids {
        let placement = load_area(&state.pool, &id).await?;
        let mut widgets = Vec::with_capacity(placement.widget_ids.len());
        for wid in placement.widget_ids {
            if let Some(instance) = load_instance(&state.pool, wid).await? {
                widgets.push(instance);
            }
        }
        data.push(AreaDto { id, widgets });
    }
    Ok(Json(DataResponse { data }))
}

/// Body for `POST /widgets/areas/{area_id}`: add a widget to an area.
#[derive(Debug, Deserialize, Validate)]
pub struct AddWidgetRequest {
    #[validate(length(min = 1, max = 100))]
    pub widget_type: String,
    #[validate(length(max = 250))]
    pub title: Option<String>,
    pub settings: Option<serde_json::Value>,
    /// Insert position; appended when absent or out of range.
    pub position: Option<usize>,
}

/// POST /api/v1/widgets/areas/{area_id}
pub async fn add_widget(
    State(state): State<AppState>,
    Path(area_id): Path<String>,
    Json(input): Json<AddWidgetRequest>,
) -> AppResult<impl IntoResponse> {
    validate_dto(&input)?;
    require_area(&state.pool, &area_id).await?;

    let instance = WidgetInstance {
        id: Uuid::new_v4(),
        widget_type: input.widget_type,
        title: input.title.unwrap_or_default(),
        settings: input.settings.unwrap_or_else(|| serde_json::json!({})),
    };
    save_instance(&state.pool, &instance).await?;

    let mut placement = load_area(&state.pool, &area_id).await?;
    let pos = input
        .position
        .unwrap_or(placement.widget_ids.len())
        .min(placement.widget_ids.len());
    placement.widget_ids.insert(pos, instance.id);
    save_area(&state.pool, &placement).await?;

    state.event_bus.publish(
        SiteEvent::new("widget.added")
            .with_actor(DEFAULT_USER_ID)
            .with_payload(serde_json::json!({
                "area": area_id,
                "widget_id": instance.id,
                "widget_type": instance.widget_type,
            })),
    );
    tracing::info!(area = %area_id, widget_id = %instance.id, "Widget added");

    Ok((StatusCode::CREATED, Json(DataResponse { data: instance })))
}

/// Body for `PUT /widgets/instances/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateWidgetRequest {
    #[validate(length(max = 250))]
    pub title: Option<String>,
    pub settings: Option<serde_json::Value>,
}

/// PUT /api/v1/widgets/instances/{id}
pub async fn update_widget(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateWidgetRequest>,
) -> AppResult<impl IntoResponse> {
    validate_dto(&input)?;

    let mut instance = load_instance(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("Widget instance {id} not found")))?;

    if let Some(title) = input.title {
        instance.title = title;
    }
    if let Some(settings) = input.settings {
        instance.settings = settings;
    }
    save_instance(&state.pool, &instance).await?;

    state.event_bus.publish(
        SiteEvent::new("widget.updated")
            .with_actor(DEFAULT_USER_ID)
            .with_payload(serde_json::json!({ "widget_id": id })),
    );

    Ok(Json(DataResponse { data: instance }))
}

/// Body for `PUT /widgets/areas/{area_id}/order`: full replacement order,
/// also how a widget is moved in from another area.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub widget_ids: Vec<Uuid>,
}

/// PUT /api/v1/widgets/areas/{area_id}/order
pub async fn reorder_area(
    State(state): State<AppState>,
    Path(area_id): Path<String>,
    Json(input): Json<ReorderRequest>,
) -> AppResult<impl IntoResponse> {
    require_area(&state.pool, &area_id).await?;

    // Every referenced instance must exist.
    for wid in &input.widget_ids {
        if load_instance(&state.pool, *wid).await?.is_none() {
            return Err(AppError::BadRequest(format!(
                "Widget instance {wid} not found"
            )));
        }
    }

    // A widget moving in from another area must leave its old list.
    let area_ids = load_area_ids(&state.pool).await?;
    for other_id in area_ids.iter().filter(|a| **a != area_id) {
        let mut other = load_area(&state.pool, other_id).await?;
        let before = other.widget_ids.len();
        other.widget_ids.retain(|w| !input.widget_ids.contains(w));
        if other.widget_ids.len() != before {
            save_area(&state.pool, &other).await?;
        }
    }

    let placement = AreaPlacement {
        id: area_id.clone(),
        widget_ids: input.widget_ids,
    };
    save_area(&state.pool, &placement).await?;

    state.event_bus.publish(
        SiteEvent::new("widget.moved")
            .with_actor(DEFAULT_USER_ID)
            .with_payload(serde_json::json!({ "area": area_id })),
    );
    tracing::info!(area = %area_id, "Widget area reordered");

    Ok(Json(DataResponse { data: placement }))
}

/// DELETE /api/v1/widgets/instances/{id}
///
/// Removes the instance and unlinks it from whichever area holds it.
pub async fn remove_widget(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    if load_instance(&state.pool, id).await?.is_none() {
        return Err(AppError::BadRequest(format!(
            "Widget instance {id} not found"
        )));
    }

    for area_id in load_area_ids(&state.pool).await? {
        let mut placement = load_area(&state.pool, &area_id).await?;
        let before = placement.widget_ids.len();
        placement.widget_ids.retain(|w| *w != id);
        if placement.widget_ids.len() != before {
            save_area(&state.pool, &placement).await?;
        }
    }
    MetaRepo::delete(&state.pool, &instance_key(id)).await?;

    state.event_bus.publish(
        SiteEvent::new("widget.removed")
            .with_actor(DEFAULT_USER_ID)
            .with_payload(serde_json::json!({ "widget_id": id })),
    );
    tracing::info!(widget_id = %id, "Widget removed");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Meta row access
// ---------------------------------------------------------------------------

async fn load_area_ids(pool: &DbPool) -> Result<Vec<String>, AppError> {
    let Some(meta) = MetaRepo::get(pool, AREAS_KEY).await? else {
        return Ok(Vec::new());
    };
    serde_json::from_value(meta.value)
        .map_err(|e| AppError::InternalError(format!("Corrupt widget areas meta: {e}")))
}

async fn require_area(pool: &DbPool, area_id: &str) -> Result<(), AppError> {
    let ids = load_area_ids(pool).await?;
    if ids.iter().any(|a| a == area_id) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Unknown widget area '{area_id}'"
        )))
    }
}

async fn load_area(pool: &DbPool, area_id: &str) -> Result<AreaPlacement, AppError> {
    let Some(meta) = MetaRepo::get(pool, &area_key(area_id)).await? else {
        return Ok(AreaPlacement {
            id: area_id.to_string(),
            widget_ids: Vec::new(),
        });
    };
    serde_json::from_value(meta.value)
        .map_err(|e| AppError::InternalError(format!("Corrupt widget area meta: {e}")))
}

async fn save_area(pool: &DbPool, placement: &AreaPlacement) -> Result<(), AppError> {
    let value = serde_json::to_value(placement)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize area: {e}")))?;
    MetaRepo::upsert(pool, &area_key(&placement.id), &value).await?;
    Ok(())
}

async fn load_instance(pool: &DbPool, id: Uuid) -> Result<Option<WidgetInstance>, AppError> {
    let Some(meta) = MetaRepo::get(pool, &instance_key(id)).await? else {
        return Ok(None);
    };
    serde_json::from_value(meta.value)
        .map(Some)
        .map_err(|e| AppError::InternalError(format!("Corrupt widget instance meta: {e}")))
}

async fn save_instance(pool: &DbPool, instance: &WidgetInstance) -> Result<(), AppError> {
    let value = serde_json::to_value(instance)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize widget: {e}")))?;
    MetaRepo::upsert(pool, &instance_key(instance.id), &value).await?;
    Ok(())
}

//! Handlers for the media library.
//!
//! Upload decodes the image, generates the derivative ladder (every size
//! strictly smaller than the original), writes the files through the
//! storage provider, and records the row with its `resize_count`.

use std::io::Cursor;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Datelike;
use fanray_core::error::CoreError;
use fanray_core::types::DbId;
use fanray_core::{images, upload};
use fanray_db::models::media::{CreateMedia, Media, MediaListParams, UpdateMediaRequest};
use fanray_db::repositories::MediaRepo;
use fanray_events::SiteEvent;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::error::{validate_dto, AppError, AppResult};
use crate::handlers::posts::page_bounds;
use crate::response::{DataResponse, PagedResponse};
use crate::state::{AppState, DEFAULT_USER_ID};

/// A media row plus the public URL of its original file.
#[derive(Debug, Serialize, Deserialize)]
pub struct MediaDto {
    #[serde(flatten)]
    pub media: Media,
    pub url: String,
}

/// GET /api/v1/media
pub async fn list_media(
    State(state): State<AppState>,
    Query(params): Query<MediaListParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = page_bounds(params.page, params.per_page)?;
    let rows = MediaRepo::list(&state.pool, limit, offset).await?;
    let total = MediaRepo::count(&state.pool).await?;

    let data = rows
        .into_iter()
        .map(|m| to_dto(&state, m))
        .collect::<Vec<_>>();

    Ok(Json(PagedResponse {
        data,
        total,
        page: params.page,
        per_page: params.per_page,
    }))
}

/// GET /api/v1/media/{id}
pub async fn get_media(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let media = find_media(&state, id).await?;
    let dto = to_dto(&state, media);
    Ok(Json(DataResponse { data: dto }))
}

#[derive(Debug, Deserialize)]
pub struct MediaUrlParams {
    /// Requested logical size; defaults to `original`.
    pub size: Option<String>,
}

/// Response shape for `GET /media/{id}/url`.
#[derive(Debug, Serialize, Deserialize)]
pub struct MediaUrl {
    pub url: String,
    /// The size actually served, after the fallback decision.
    pub size: images::ImageSize,
}

/// GET /api/v1/media/{id}/url?size=medium
///
/// Resolve the URL for a logical size. Sizes that were not generated at
/// upload time fall back to the original.
pub async fn get_media_url(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<MediaUrlParams>,
) -> AppResult<impl IntoResponse> {
    let media = find_media(&state, id).await?;

    let requested = match params.size.as_deref() {
        None => images::ImageSize::Original,
        Some(s) => images::ImageSize::parse(s).ok_or_else(|| {
            AppError::Core(CoreError::Validation(format!("Unknown image size '{s}'")))
        })?,
    };

    let served = images::stored_size(requested, media.resize_count);
    let path = images::media_path(
        media.upload_year,
        media.upload_month as u32,
        served,
        &media.file_name,
    );

    Ok(Json(DataResponse {
        data: MediaUrl {
            url: state.storage.public_url(&path),
            size: served,
        },
    }))
}

/// POST /api/v1/media: multipart upload.
///
/// Expects a `file` part; an optional `title` part overrides the title
/// derived from the filename.
pub async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut file_name: Option<String> = None;
    let mut bytes: Option<Vec<u8>> = None;
    let mut title: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                file_name = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
                bytes = Some(data.to_vec());
            }
            Some("title") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read title: {e}")))?;
                title = Some(text);
            }
            _ => {}
        }
    }

    let file_name =
        file_name.ok_or_else(|| AppError::BadRequest("Missing 'file' part".into()))?;
    let bytes = bytes.ok_or_else(|| AppError::BadRequest("Missing 'file' part".into()))?;

    let media = store_upload(&state, &file_name, &bytes, title).await?;
    let dto = to_dto(&state, media);
    Ok((StatusCode::CREATED, Json(DataResponse { data: dto })))
}

/// The full upload pipeline, shared by the JSON API and the MetaWeblog
/// `newMediaObject` method: validate, resolve a unique stored name,
/// generate derivatives, write files, record the row.
pub(crate) async fn store_upload(
    state: &AppState,
    file_name: &str,
    bytes: &[u8],
    title: Option<String>,
) -> Result<Media, AppError> {
    upload::validate_upload(file_name, bytes.len()).map_err(AppError::Core)?;

    let now = chrono::Utc::now();
    let (year, month) = (now.year(), now.month() as i32);

    // Probe the year/month folder until the sanitized name is free.
    let sanitized = upload::sanitize_file_name(file_name);
    let stored_name = resolve_file_name(state, year, month, &sanitized).await?;

    let title = title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| upload::split_file_name(file_name).0);

    let content_type = content_type_for(&stored_name);

    // Decode for dimensions and derivatives; non-resizable formats (gif)
    // are stored as-is and never decoded.
    let (width, height, resize_count) = if upload::is_resizable(&stored_name) {
        let img = image::load_from_memory(bytes)
            .map_err(|e| AppError::Core(CoreError::Validation(format!("Invalid image: {e}"))))?;
        let (w, h) = (img.width(), img.height());

        let targets = images::resize_targets(w);
        let count = targets.len() as i32;
        for (size, target_w) in targets {
            let resized = resize_to_width(&img, target_w);
            let encoded = encode_image(&resized, &stored_name)?;
            let path = images::media_path(year, month as u32, size, &stored_name);
            state.storage.save(&path, &encoded).await?;
        }
        (w as i32, h as i32, count)
    } else {
        (0, 0, 0)
    };

    let original_path =
        images::media_path(year, month as u32, images::ImageSize::Original, &stored_name);
    state.storage.save(&original_path, bytes).await?;

    let media = MediaRepo::create(
        &state.pool,
        &CreateMedia {
            uploaded_by: DEFAULT_USER_ID,
            file_name: stored_name,
            title,
            content_type,
            byte_length: bytes.len() as i64,
            width,
            height,
            resize_count,
            upload_year: year,
            upload_month: month,
        },
    )
    .await?;

    state.event_bus.publish(
        SiteEvent::new("media.uploaded")
            .with_source("media", media.id)
            .with_actor(DEFAULT_USER_ID)
            .with_payload(serde_json::json!({
                "file_name": media.file_name,
                "resize_count": media.resize_count,
            })),
    );
    tracing::info!(
        media_id = media.id,
        file_name = %media.file_name,
        resize_count = media.resize_count,
        "Media uploaded"
    );

    Ok(media)
}

/// PUT /api/v1/media/{id}: editable metadata only.
pub async fn update_media(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateMediaRequest>,
) -> AppResult<impl IntoResponse> {
    validate_dto(&input)?;

    let media = MediaRepo::update_info(
        &state.pool,
        id,
        input.title.as_deref(),
        input.alt.as_deref(),
        input.caption.as_deref(),
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "Media",
        id,
    }))?;

    let dto = to_dto(&state, media);
    Ok(Json(DataResponse { data: dto }))
}

/// DELETE /api/v1/media/{id}
///
/// Removes the row, the original file, and every derivative.
pub async fn delete_media(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let media = find_media(&state, id).await?;

    for size in images::DERIVATIVE_SIZES
        .iter()
        .take(media.resize_count.max(0) as usize)
    {
        let path = images::media_path(
            media.upload_year,
            media.upload_month as u32,
            *size,
            &media.file_name,
        );
        state.storage.delete(&path).await?;
    }
    let original = images::media_path(
        media.upload_year,
        media.upload_month as u32,
        images::ImageSize::Original,
        &media.file_name,
    );
    state.storage.delete(&original).await?;

    MediaRepo::delete(&state.pool, id).await?;

    state.event_bus.publish(
        SiteEvent::new("media.deleted")
            .with_source("media", id)
            .with_actor(DEFAULT_USER_ID),
    );
    tracing::info!(media_id = id, "Media deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_media(state: &AppState, id: DbId) -> Result<Media, AppError> {
    MediaRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Media",
            id,
        }))
}

fn to_dto(state: &AppState, media: Media) -> MediaDto {
    let path = images::media_path(
        media.upload_year,
        media.upload_month as u32,
        images::ImageSize::Original,
        &media.file_name,
    );
    let url = state.storage.public_url(&path);
    MediaDto { media, url }
}

/// Probe `name`, `name-2`, … until the year/month folder has no row with
/// that file name.
async fn resolve_file_name(
    state: &AppState,
    year: i32,
    month: i32,
    name: &str,
) -> Result<String, AppError> {
    if !MediaRepo::file_name_exists(&state.pool, year, month, name).await? {
        return Ok(name.to_string());
    }
    let mut n = 2;
    loop {
        let probe = upload::file_name_with_suffix(name, n);
        if !MediaRepo::file_name_exists(&state.pool, year, month, &probe).await? {
            return Ok(probe);
        }
        n += 1;
    }
}

/// Scale to `target_w` preserving aspect ratio; height never rounds to 0.
fn resize_to_width(img: &DynamicImage, target_w: u32) -> DynamicImage {
    let h = ((img.height() as u64 * target_w as u64) / img.width() as u64).max(1) as u32;
    img.resize_exact(target_w, h, FilterType::Lanczos3)
}

/// Re-encode in the upload's own format, chosen by extension.
fn encode_image(img: &DynamicImage, file_name: &str) -> Result<Vec<u8>, AppError> {
    let (_, ext) = upload::split_file_name(file_name);
    let format = ImageFormat::from_extension(&ext)
        .ok_or_else(|| AppError::InternalError(format!("No encoder for '{ext}'")))?;
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format)
        .map_err(|e| AppError::InternalError(format!("Image encode failed: {e}")))?;
    Ok(out.into_inner())
}

fn content_type_for(file_name: &str) -> String {
    let (_, ext) = upload::split_file_name(file_name);
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
    .to_string()
}

//! Handlers for blog posts.
//!
//! Create/update resolve the slug against the per-day conflict scope,
//! reconcile the category (by id, or by title created on demand) and the
//! tag set, and publish `post.*` events. Bodies returned from read
//! endpoints get responsive `srcset` rewriting applied against the media
//! store.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use fanray_core::error::CoreError;
use fanray_core::types::DbId;
use fanray_core::{images, slug};
use fanray_db::models::category::Category;
use fanray_db::models::post::{
    CreatePostRequest, CreatePostRow, Post, PostListParams, UpdatePostRequest, UpdatePostRow,
    STATUS_DRAFT, STATUS_PUBLISHED, TYPE_BLOG_POST,
};
use fanray_db::models::tag::Tag;
use fanray_db::repositories::{CategoryRepo, MediaRepo, MetaRepo, PostRepo, TagRepo};
use fanray_db::DbPool;
use fanray_events::SiteEvent;
use serde::{Deserialize, Serialize};

use crate::error::{validate_dto, AppError, AppResult};
use crate::response::{DataResponse, PagedResponse};
use crate::state::{AppState, DEFAULT_USER_ID};

/// A post joined with its category and tags, as returned to the admin UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDto {
    #[serde(flatten)]
    pub post: Post,
    pub category: Option<Category>,
    pub tags: Vec<Tag>,
}

/// Cached shape of one published-index page.
#[derive(Debug, Serialize, Deserialize)]
struct PublishedPage {
    posts: Vec<PostDto>,
    total: i64,
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/posts
///
/// Admin listing of blog posts, optionally filtered by status.
pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<PostListParams>,
) -> AppResult<impl IntoResponse> {
    let status = parse_status_filter(params.status.as_deref())?;
    let (limit, offset) = page_bounds(params.page, params.per_page)?;

    let posts = PostRepo::list(&state.pool, TYPE_BLOG_POST, status, limit, offset).await?;
    let total = PostRepo::count(&state.pool, TYPE_BLOG_POST, status).await?;

    let mut data = Vec::with_capacity(posts.len());
    for post in posts {
        data.push(to_dto(&state.pool, post, false).await?);
    }

    Ok(Json(PagedResponse {
        data,
        total,
        page: params.page,
        per_page: params.per_page,
    }))
}

/// GET /api/v1/posts/published
///
/// Paged public index of published posts, cache-backed for the default
/// page size.
pub async fn list_published(
    State(state): State<AppState>,
    Query(params): Query<PostListParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = page_bounds(params.page, params.per_page)?;

    let cacheable = params.per_page == 10;
    let key = fanray_cache::keys::post_index(params.page);

    if cacheable {
        if let Some(page) =
            fanray_cache::get_json::<PublishedPage>(state.cache.as_ref(), &key).await
        {
            return Ok(Json(PagedResponse {
                data: page.posts,
                total: page.total,
                page: params.page,
                per_page: params.per_page,
            }));
        }
    }

    let posts = PostRepo::list_published(&state.pool, limit, offset).await?;
    let total = PostRepo::count(&state.pool, TYPE_BLOG_POST, Some(STATUS_PUBLISHED)).await?;

    let mut data = Vec::with_capacity(posts.len());
    for post in posts {
        data.push(to_dto(&state.pool, post, true).await?);
    }

    if cacheable {
        let page = PublishedPage {
            posts: data.clone(),
            total,
        };
        fanray_cache::put_json(
            state.cache.as_ref(),
            &key,
            &page,
            fanray_cache::keys::POST_INDEX_TTL,
        )
        .await;
    }

    Ok(Json(PagedResponse {
        data,
        total,
        page: params.page,
        per_page: params.per_page,
    }))
}

/// GET /api/v1/posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let post = find_blog_post(&state.pool, id).await?;
    let dto = to_dto(&state.pool, post, true).await?;
    Ok(Json(DataResponse { data: dto }))
}

/// POST /api/v1/posts
pub async fn create_post(
    State(state): State<AppState>,
    Json(input): Json<CreatePostRequest>,
) -> AppResult<impl IntoResponse> {
    validate_dto(&input)?;
    let status = parse_status(input.status.as_deref())?;

    let candidate = slug_candidate(input.slug.as_deref(), &input.title);
    let today = chrono::Utc::now().date_naive();
    let resolved_slug = resolve_blog_slug(&state.pool, &candidate, today, None).await?;

    let category_id = resolve_category(
        &state,
        input.category_id,
        input.category_title.as_deref(),
    )
    .await?;

    let post = PostRepo::create(
        &state.pool,
        &CreatePostRow {
            user_id: DEFAULT_USER_ID,
            parent_id: None,
            category_id: Some(category_id),
            post_type: TYPE_BLOG_POST.to_string(),
            status,
            title: input.title.clone(),
            slug: resolved_slug,
            body: input.body.clone(),
            excerpt: input.excerpt.clone(),
            comments_enabled: input.comments_enabled.unwrap_or(true),
            created_at: None,
        },
    )
    .await?;

    let tags = apply_tags(&state, post.id, &input.tags).await?;
    CategoryRepo::recount(&state.pool, category_id).await?;

    state.event_bus.publish(
        SiteEvent::new("post.created")
            .with_source("post", post.id)
            .with_actor(DEFAULT_USER_ID)
            .with_payload(serde_json::json!({ "slug": post.slug, "status": post.status })),
    );
    tracing::info!(post_id = post.id, slug = %post.slug, "Blog post created");

    let category = CategoryRepo::find_by_id(&state.pool, category_id).await?;
    let dto = PostDto {
        post,
        category,
        tags,
    };
    Ok((StatusCode::CREATED, Json(DataResponse { data: dto })))
}

/// PUT /api/v1/posts/{id}
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePostRequest>,
) -> AppResult<impl IntoResponse> {
    validate_dto(&input)?;
    let current = find_blog_post(&state.pool, id).await?;

    let status = match &input.status {
        Some(s) => parse_status(Some(s))?,
        None => current.status.clone(),
    };

    let title = input.title.clone().unwrap_or_else(|| current.title.clone());

    // Re-probe the slug only when the caller changes it (or the title,
    // with no explicit slug kept).
    let resolved_slug = match (&input.slug, &input.title) {
        (None, None) => current.slug.clone(),
        (explicit, _) => {
            let candidate = slug_candidate(explicit.as_deref(), &title);
            if candidate == current.slug {
                current.slug.clone()
            } else {
                resolve_blog_slug(
                    &state.pool,
                    &candidate,
                    current.created_at.date_naive(),
                    Some(id),
                )
                .await?
            }
        }
    };

    let category_id = if input.category_id.is_some() || input.category_title.is_some() {
        resolve_category(&state, input.category_id, input.category_title.as_deref()).await?
    } else {
        match current.category_id {
            Some(cid) => cid,
            None => default_category_id(&state.pool).await?,
        }
    };

    let updated = PostRepo::update(
        &state.pool,
        id,
        &UpdatePostRow {
            category_id: Some(category_id),
            status,
            title,
            slug: resolved_slug,
            body: input.body.clone().unwrap_or_else(|| current.body.clone()),
            excerpt: input.excerpt.clone().or_else(|| current.excerpt.clone()),
            comments_enabled: input
                .comments_enabled
                .unwrap_or(current.comments_enabled),
        },
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "Post",
        id,
    }))?;

    let tags = match &input.tags {
        Some(titles) => apply_tags(&state, id, titles).await?,
        None => TagRepo::tags_for_post(&state.pool, id).await?,
    };

    // Status or category changes move counts on both sides.
    if let Some(old) = current.category_id {
        CategoryRepo::recount(&state.pool, old).await?;
    }
    CategoryRepo::recount(&state.pool, category_id).await?;

    state.event_bus.publish(
        SiteEvent::new("post.updated")
            .with_source("post", id)
            .with_actor(DEFAULT_USER_ID)
            .with_payload(serde_json::json!({ "slug": updated.slug, "status": updated.status })),
    );
    tracing::info!(post_id = id, slug = %updated.slug, "Blog post updated");

    let category = CategoryRepo::find_by_id(&state.pool, category_id).await?;
    let dto = PostDto {
        post: updated,
        category,
        tags,
    };
    Ok(Json(DataResponse { data: dto }))
}

/// DELETE /api/v1/posts/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let post = find_blog_post(&state.pool, id).await?;

    let tags = TagRepo::tags_for_post(&state.pool, id).await?;
    PostRepo::delete(&state.pool, id).await?;

    if let Some(cid) = post.category_id {
        CategoryRepo::recount(&state.pool, cid).await?;
    }
    for tag in tags {
        TagRepo::recount(&state.pool, tag.id).await?;
    }

    state.event_bus.publish(
        SiteEvent::new("post.deleted")
            .with_source("post", id)
            .with_actor(DEFAULT_USER_ID),
    );
    tracing::info!(post_id = id, "Blog post deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Shared helpers (also used by pages and the MetaWeblog shim)
// ---------------------------------------------------------------------------

/// Normalize the slug source: explicit slug if given, else the title.
pub(crate) fn slug_candidate(explicit: Option<&str>, title: &str) -> String {
    match explicit {
        Some(s) if !s.trim().is_empty() => slug::slugify(s),
        _ => slug::slugify(title),
    }
}

/// Probe the per-day blog-post scope until the slug is free.
pub(crate) async fn resolve_blog_slug(
    pool: &DbPool,
    candidate: &str,
    date: NaiveDate,
    exclude_id: Option<DbId>,
) -> Result<String, sqlx::Error> {
    if !PostRepo::blog_slug_taken(pool, candidate, date, exclude_id).await? {
        return Ok(candidate.to_string());
    }
    let mut n = 2;
    loop {
        let probe = slug::with_suffix(candidate, n);
        if !PostRepo::blog_slug_taken(pool, &probe, date, exclude_id).await? {
            return Ok(probe);
        }
        n += 1;
    }
}

/// Resolve a category reference to an id.
///
/// Accepts an explicit id (must exist), a title (resolved
/// case-insensitively, created on demand), or neither (the site default
/// category applies).
pub(crate) async fn resolve_category(
    state: &AppState,
    category_id: Option<DbId>,
    category_title: Option<&str>,
) -> Result<DbId, AppError> {
    if let Some(id) = category_id {
        return match CategoryRepo::find_by_id(&state.pool, id).await? {
            Some(c) => Ok(c.id),
            None => Err(AppError::Core(CoreError::NotFound {
                entity: "Category",
                id,
            })),
        };
    }

    if let Some(title) = category_title.map(str::trim).filter(|t| !t.is_empty()) {
        if let Some(existing) = CategoryRepo::find_by_title_ci(&state.pool, title).await? {
            return Ok(existing.id);
        }
        let slug = CategoryRepo::unique_slug(&state.pool, &slug::slugify(title), None).await?;
        let created = CategoryRepo::create(&state.pool, title, &slug, None).await?;
        state.event_bus.publish(
            SiteEvent::new("category.created")
                .with_source("category", created.id)
                .with_payload(serde_json::json!({ "title": created.title, "on_demand": true })),
        );
        tracing::info!(category_id = created.id, title = %created.title, "Category created on demand");
        return Ok(created.id);
    }

    default_category_id(&state.pool).await
}

/// The site's default category id (meta `blog.default_category_id`,
/// falling back to the seeded category).
pub(crate) async fn default_category_id(pool: &DbPool) -> Result<DbId, AppError> {
    let id = MetaRepo::get(pool, "blog.default_category_id")
        .await?
        .and_then(|m| m.value.as_i64())
        .unwrap_or(1);
    Ok(id)
}

/// Reconcile a post's tag set from free-form titles: resolve each
/// case-insensitively, create unknown ones, and replace the junction rows.
pub(crate) async fn apply_tags(
    state: &AppState,
    post_id: DbId,
    titles: &[String],
) -> Result<Vec<Tag>, AppError> {
    let mut tag_ids: Vec<DbId> = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    for raw in titles {
        let title = raw.trim();
        if title.is_empty() || seen.iter().any(|s| s.eq_ignore_ascii_case(title)) {
            continue;
        }
        seen.push(title.to_string());

        let tag = match TagRepo::find_by_title_ci(&state.pool, title).await? {
            Some(t) => t,
            None => {
                let slug = TagRepo::unique_slug(&state.pool, &slug::slugify(title), None).await?;
                let created = TagRepo::create(&state.pool, title, &slug, None).await?;
                state.event_bus.publish(
                    SiteEvent::new("tag.created")
                        .with_source("tag", created.id)
                        .with_payload(serde_json::json!({ "title": created.title })),
                );
                created
            }
        };
        tag_ids.push(tag.id);
    }

    TagRepo::set_post_tags(&state.pool, post_id, &tag_ids).await?;
    Ok(TagRepo::tags_for_post(&state.pool, post_id).await?)
}

/// Fetch a post by id, requiring it to be a blog post.
pub(crate) async fn find_blog_post(pool: &DbPool, id: DbId) -> Result<Post, AppError> {
    match PostRepo::find_by_id(pool, id).await? {
        Some(p) if p.post_type == TYPE_BLOG_POST => Ok(p),
        _ => Err(AppError::Core(CoreError::NotFound {
            entity: "Post",
            id,
        })),
    }
}

/// Join a post with its category and tags; optionally rewrite the body
/// for responsive images.
pub(crate) async fn to_dto(
    pool: &DbPool,
    mut post: Post,
    rewrite: bool,
) -> Result<PostDto, AppError> {
    if rewrite {
        post.body = rewrite_responsive(pool, &post.body).await?;
    }
    let category = match post.category_id {
        Some(cid) => CategoryRepo::find_by_id(pool, cid).await?,
        None => None,
    };
    let tags = TagRepo::tags_for_post(pool, post.id).await?;
    Ok(PostDto {
        post,
        category,
        tags,
    })
}

/// Validate an optional status filter value.
fn parse_status_filter(status: Option<&str>) -> Result<Option<&str>, AppError> {
    match status {
        None => Ok(None),
        Some(s @ (STATUS_DRAFT | STATUS_PUBLISHED)) => Ok(Some(s)),
        Some(other) => Err(AppError::Core(CoreError::Validation(format!(
            "Unknown status '{other}'"
        )))),
    }
}

/// Validate a status value, defaulting to draft.
pub(crate) fn parse_status(status: Option<&str>) -> Result<String, AppError> {
    match status {
        None => Ok(STATUS_DRAFT.to_string()),
        Some(s @ (STATUS_DRAFT | STATUS_PUBLISHED)) => Ok(s.to_string()),
        Some(other) => Err(AppError::Core(CoreError::Validation(format!(
            "Unknown status '{other}'"
        )))),
    }
}

/// Convert 1-based page params to LIMIT/OFFSET, capping the page size.
pub(crate) fn page_bounds(page: u32, per_page: u32) -> Result<(i64, i64), AppError> {
    if page == 0 {
        return Err(AppError::Core(CoreError::Validation(
            "page must be >= 1".into(),
        )));
    }
    let per_page = per_page.clamp(1, 100) as i64;
    Ok((per_page, (page as i64 - 1) * per_page))
}

// ---------------------------------------------------------------------------
// Responsive image rewriting
// ---------------------------------------------------------------------------

/// Rewrite `<img>` tags in post body HTML with `srcset`/`sizes` built
/// from the media rows their `src` URLs resolve to.
pub(crate) async fn rewrite_responsive(pool: &DbPool, html: &str) -> Result<String, AppError> {
    let srcs = images::collect_img_srcs(html);
    if srcs.is_empty() {
        return Ok(html.to_string());
    }

    let mut sources: HashMap<String, images::ImageSource> = HashMap::new();
    for src in srcs {
        if sources.contains_key(&src) {
            continue;
        }
        if let Some(source) = resolve_src(pool, &src).await? {
            sources.insert(src, source);
        }
    }

    Ok(images::rewrite_img_tags(html, |src| {
        sources.get(src).cloned()
    }))
}

/// Resolve one `src` URL to its media row and candidate widths.
///
/// Only URLs following the `…/blog/{yyyy}/{MM}/[{size}/]{file}` layout
/// are resolvable; anything else is treated as foreign.
async fn resolve_src(
    pool: &DbPool,
    src: &str,
) -> Result<Option<images::ImageSource>, AppError> {
    let Some((prefix, year, month, file_name)) = parse_media_url(src) else {
        return Ok(None);
    };
    let Some(media) = MediaRepo::find_by_folder_name(pool, year, month, &file_name).await? else {
        return Ok(None);
    };
    if media.width <= 0 {
        return Ok(None);
    }

    let mut candidates: Vec<(String, u32)> = images::DERIVATIVE_SIZES
        .iter()
        .take(media.resize_count.max(0) as usize)
        .map(|&size| {
            let path = images::media_path(year, month as u32, size, &file_name);
            // Unwrap is safe: derivative sizes always carry a width.
            (format!("{prefix}/{path}"), size.width().unwrap())
        })
        .collect();
    let original = images::media_path(year, month as u32, images::ImageSize::Original, &file_name);
    candidates.push((format!("{prefix}/{original}"), media.width as u32));

    Ok(Some(images::ImageSource { candidates }))
}

/// Split a media URL into `(prefix, year, month, file_name)`.
///
/// `prefix` is everything before the `blog/` segment, without a
/// trailing slash.
fn parse_media_url(src: &str) -> Option<(String, i32, i32, String)> {
    let idx = src.find("/blog/")?;
    let prefix = &src[..idx];
    let rest = &src[idx + 1..]; // "blog/…"
    let segments: Vec<&str> = rest.split('/').collect();
    match segments.as_slice() {
        ["blog", year, month, file] | ["blog", year, month, _, file] => {
            let year: i32 = year.parse().ok()?;
            let month: i32 = month.parse().ok()?;
            if !(1..=12).contains(&month) {
                return None;
            }
            Some((prefix.to_string(), year, month, (*file).to_string()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_media_url_accepts_both_layouts() {
        let (prefix, y, m, f) =
            parse_media_url("http://localhost:3000/media/blog/2026/08/cat.jpg").unwrap();
        assert_eq!(prefix, "http://localhost:3000/media");
        assert_eq!((y, m), (2026, 8));
        assert_eq!(f, "cat.jpg");

        let (_, y, m, f) =
            parse_media_url("http://localhost:3000/media/blog/2026/08/md/cat.jpg").unwrap();
        assert_eq!((y, m), (2026, 8));
        assert_eq!(f, "cat.jpg");
    }

    #[test]
    fn parse_media_url_rejects_foreign_urls() {
        assert!(parse_media_url("https://elsewhere.example/pic.png").is_none());
        assert!(parse_media_url("/media/blog/not-a-year/08/cat.jpg").is_none());
        assert!(parse_media_url("/media/blog/2026/13/cat.jpg").is_none());
    }

    #[test]
    fn slug_candidate_prefers_explicit() {
        assert_eq!(slug_candidate(Some("My Slug"), "Title"), "my-slug");
        assert_eq!(slug_candidate(Some("  "), "A Title"), "a-title");
        assert_eq!(slug_candidate(None, "A Title"), "a-title");
    }

    #[test]
    fn page_bounds_validation() {
        assert!(page_bounds(0, 10).is_err());
        assert_eq!(page_bounds(1, 10).unwrap(), (10, 0));
        assert_eq!(page_bounds(3, 10).unwrap(), (10, 20));
        // Page size is capped.
        assert_eq!(page_bounds(1, 1000).unwrap(), (100, 0));
    }
}

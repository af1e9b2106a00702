//! MetaWeblog / Blogger method dispatch.
//!
//! One POST endpoint receives every call. Authentication happens at the
//! gateway, so the credentials every method carries are accepted as-is;
//! the username is logged for attribution. Errors surface as XML-RPC
//! faults with the HTTP status always 200, which is what desktop
//! clients expect.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, NaiveDateTime, Utc};
use fanray_core::images;
use fanray_core::types::DbId;
use fanray_db::models::post::{
    CreatePostRow, Post, UpdatePostRow, STATUS_DRAFT, STATUS_PUBLISHED, TYPE_BLOG_POST,
};
use fanray_db::repositories::{CategoryRepo, PostRepo, TagRepo};
use fanray_events::SiteEvent;

use crate::error::AppError;
use crate::handlers::media::store_upload;
use crate::handlers::posts::{
    apply_tags, find_blog_post, resolve_blog_slug, resolve_category, slug_candidate,
};
use crate::metaweblog::codec::{
    fault_xml, parse_method_call, response_xml, CodecError, MethodCall, XmlRpcValue,
};
use crate::state::{AppState, DEFAULT_USER_ID};

/// The `dateCreated` format MetaWeblog clients send and expect.
const DATE_FORMAT: &str = "%Y%m%dT%H:%M:%S";

/// POST /api/metaweblog
pub async fn handle_xmlrpc(State(state): State<AppState>, body: String) -> Response {
    let call = match parse_method_call(&body) {
        Ok(call) => call,
        Err(e) => return xml_response(fault_xml(400, &e.to_string())),
    };
    tracing::debug!(method = %call.name, "XML-RPC call");

    let result = dispatch(&state, &call).await;
    match result {
        Ok(value) => xml_response(response_xml(&value)),
        Err(e) => {
            let (code, message) = fault_for(&e);
            tracing::warn!(method = %call.name, fault = code, error = %message, "XML-RPC fault");
            xml_response(fault_xml(code, &message))
        }
    }
}

fn xml_response(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml; charset=utf-8")],
        body,
    )
        .into_response()
}

fn fault_for(err: &AppError) -> (i64, String) {
    use fanray_core::error::CoreError;
    match err {
        AppError::Core(CoreError::NotFound { entity, id }) => {
            (404, format!("{entity} with id {id} not found"))
        }
        AppError::Core(CoreError::Validation(msg)) => (400, msg.clone()),
        AppError::Core(CoreError::ValidationErrors(list)) => (400, list.join("; ")),
        AppError::Core(CoreError::Conflict(msg)) => (409, msg.clone()),
        AppError::Core(CoreError::Forbidden(msg)) => (403, msg.clone()),
        AppError::BadRequest(msg) => (400, msg.clone()),
        other => {
            tracing::error!(error = %other, "XML-RPC internal error");
            (500, "An internal error occurred".to_string())
        }
    }
}

async fn dispatch(state: &AppState, call: &MethodCall) -> Result<XmlRpcValue, AppError> {
    match call.name.as_str() {
        "metaWeblog.newPost" => new_post(state, call).await,
        "metaWeblog.editPost" => edit_post(state, call).await,
        "metaWeblog.getPost" => get_post(state, call).await,
        "metaWeblog.getRecentPosts" => get_recent_posts(state, call).await,
        "metaWeblog.getCategories" => get_categories(state, call).await,
        "metaWeblog.newMediaObject" => new_media_object(state, call).await,
        "blogger.deletePost" => delete_post(state, call).await,
        "blogger.getUsersBlogs" => get_users_blogs(state, call).await,
        other => Err(AppError::BadRequest(format!("Unknown method '{other}'"))),
    }
}

// ---------------------------------------------------------------------------
// Parameter helpers
// ---------------------------------------------------------------------------

fn str_param(call: &MethodCall, index: usize) -> Result<String, AppError> {
    match call.param(index).map_err(codec_err)? {
        XmlRpcValue::String(s) => Ok(s.clone()),
        XmlRpcValue::Int(n) => Ok(n.to_string()),
        other => Err(AppError::BadRequest(format!(
            "Parameter {index} of {} must be a string, got {other:?}",
            call.name
        ))),
    }
}

fn id_param(call: &MethodCall, index: usize) -> Result<DbId, AppError> {
    call.param(index)
        .map_err(codec_err)?
        .as_i64()
        .ok_or_else(|| {
            AppError::BadRequest(format!("Parameter {index} of {} must be a post id", call.name))
        })
}

fn struct_param<'a>(
    call: &'a MethodCall,
    index: usize,
) -> Result<&'a BTreeMap<String, XmlRpcValue>, AppError> {
    call.param(index)
        .map_err(codec_err)?
        .as_struct()
        .ok_or_else(|| {
            AppError::BadRequest(format!("Parameter {index} of {} must be a struct", call.name))
        })
}

fn codec_err(e: CodecError) -> AppError {
    AppError::BadRequest(e.to_string())
}

/// Log the client-supplied username; credentials are not checked here.
fn note_actor(call: &MethodCall, index: usize) {
    if let Ok(username) = str_param(call, index) {
        tracing::debug!(method = %call.name, username = %username, "XML-RPC actor");
    }
}

fn parse_date_created(value: Option<&XmlRpcValue>) -> Option<DateTime<Utc>> {
    let XmlRpcValue::DateTime(raw) = value? else {
        return None;
    };
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, DATE_FORMAT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ---------------------------------------------------------------------------
// Post content struct
// ---------------------------------------------------------------------------

struct PostContent {
    title: String,
    body: String,
    excerpt: Option<String>,
    category_title: Option<String>,
    tags: Vec<String>,
    slug: Option<String>,
    date_created: Option<DateTime<Utc>>,
}

fn read_content(members: &BTreeMap<String, XmlRpcValue>) -> Result<PostContent, AppError> {
    let title = members
        .get("title")
        .and_then(XmlRpcValue::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("Post struct is missing 'title'".into()))?
        .to_string();

    let body = members
        .get("description")
        .and_then(XmlRpcValue::as_str)
        .unwrap_or_default()
        .to_string();

    let excerpt = members
        .get("mt_excerpt")
        .and_then(XmlRpcValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let category_title = members
        .get("categories")
        .and_then(XmlRpcValue::as_array)
        .and_then(|cats| cats.first())
        .and_then(XmlRpcValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    // mt_keywords is a comma-separated tag list.
    let tags = members
        .get("mt_keywords")
        .and_then(XmlRpcValue::as_str)
        .map(|kw| {
            kw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let slug = members
        .get("wp_slug")
        .and_then(XmlRpcValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let date_created = parse_date_created(members.get("dateCreated"));

    Ok(PostContent {
        title,
        body,
        excerpt,
        category_title,
        tags,
        slug,
        date_created,
    })
}

fn post_struct(state: &AppState, post: &Post, category: Option<&str>, tags: &[String]) -> XmlRpcValue {
    let mut members = BTreeMap::new();
    members.insert(
        "postid".into(),
        XmlRpcValue::String(post.id.to_string()),
    );
    members.insert("title".into(), XmlRpcValue::String(post.title.clone()));
    members.insert(
        "description".into(),
        XmlRpcValue::String(post.body.clone()),
    );
    members.insert(
        "dateCreated".into(),
        XmlRpcValue::DateTime(post.created_at.format(DATE_FORMAT).to_string()),
    );
    members.insert(
        "categories".into(),
        XmlRpcValue::Array(
            category
                .iter()
                .map(|c| XmlRpcValue::String(c.to_string()))
                .collect(),
        ),
    );
    members.insert(
        "mt_keywords".into(),
        XmlRpcValue::String(tags.join(", ")),
    );
    members.insert("wp_slug".into(), XmlRpcValue::String(post.slug.clone()));
    members.insert(
        "post_status".into(),
        XmlRpcValue::String(post.status.clone()),
    );
    members.insert(
        "link".into(),
        XmlRpcValue::String(format!(
            "{}/blog/{}/{}",
            state.config.storage.base_url.trim_end_matches("/media"),
            post.created_at.format("%Y/%m/%d"),
            post.slug
        )),
    );
    XmlRpcValue::Struct(members)
}

async fn post_to_struct(state: &AppState, post: &Post) -> Result<XmlRpcValue, AppError> {
    let category = match post.category_id {
        Some(cid) => CategoryRepo::find_by_id(&state.pool, cid)
            .await?
            .map(|c| c.title),
        None => None,
    };
    let tags: Vec<String> = TagRepo::tags_for_post(&state.pool, post.id)
        .await?
        .into_iter()
        .map(|t| t.title)
        .collect();
    Ok(post_struct(state, post, category.as_deref(), &tags))
}

// ---------------------------------------------------------------------------
// Methods
// ---------------------------------------------------------------------------

/// metaWeblog.newPost(blogid, username, password, content, publish)
async fn new_post(state: &AppState, call: &MethodCall) -> Result<XmlRpcValue, AppError> {
    note_actor(call, 1);
    let content = read_content(struct_param(call, 3)?)?;
    let publish = call
        .param(4)
        .map_err(codec_err)?
        .as_bool()
        .unwrap_or(false);

    let created_at = content.date_created;
    let slug_date = created_at.unwrap_or_else(Utc::now).date_naive();
    let candidate = slug_candidate(content.slug.as_deref(), &content.title);
    let resolved_slug = resolve_blog_slug(&state.pool, &candidate, slug_date, None).await?;

    let category_id =
        resolve_category(state, None, content.category_title.as_deref()).await?;

    let status = if publish { STATUS_PUBLISHED } else { STATUS_DRAFT };
    let post = PostRepo::create(
        &state.pool,
        &CreatePostRow {
            user_id: DEFAULT_USER_ID,
            parent_id: None,
            category_id: Some(category_id),
            post_type: TYPE_BLOG_POST.to_string(),
            status: status.to_string(),
            title: content.title,
            slug: resolved_slug,
            body: content.body,
            excerpt: content.excerpt,
            comments_enabled: true,
            created_at,
        },
    )
    .await?;

    apply_tags(state, post.id, &content.tags).await?;
    CategoryRepo::recount(&state.pool, category_id).await?;

    state.event_bus.publish(
        SiteEvent::new("post.created")
            .with_source("post", post.id)
            .with_actor(DEFAULT_USER_ID)
            .with_payload(serde_json::json!({ "slug": post.slug, "via": "metaweblog" })),
    );
    tracing::info!(post_id = post.id, slug = %post.slug, "Blog post created via XML-RPC");

    Ok(XmlRpcValue::String(post.id.to_string()))
}

/// metaWeblog.editPost(postid, username, password, content, publish)
async fn edit_post(state: &AppState, call: &MethodCall) -> Result<XmlRpcValue, AppError> {
    note_actor(call, 1);
    let id = id_param(call, 0)?;
    let content = read_content(struct_param(call, 3)?)?;
    let publish = call
        .param(4)
        .map_err(codec_err)?
        .as_bool()
        .unwrap_or(false);

    let current = find_blog_post(&state.pool, id).await?;

    let candidate = slug_candidate(content.slug.as_deref(), &content.title);
    let resolved_slug = if candidate == current.slug {
        current.slug.clone()
    } else {
        resolve_blog_slug(
            &state.pool,
            &candidate,
            current.created_at.date_naive(),
            Some(id),
        )
        .await?
    };

    let category_id = match content.category_title.as_deref() {
        Some(title) => resolve_category(state, None, Some(title)).await?,
        None => match current.category_id {
            Some(cid) => cid,
            None => resolve_category(state, None, None).await?,
        },
    };

    let status = if publish { STATUS_PUBLISHED } else { STATUS_DRAFT };
    PostRepo::update(
        &state.pool,
        id,
        &UpdatePostRow {
            category_id: Some(category_id),
            status: status.to_string(),
            title: content.title,
            slug: resolved_slug,
            body: content.body,
            excerpt: content.excerpt.or(current.excerpt),
            comments_enabled: current.comments_enabled,
        },
    )
    .await?;

    apply_tags(state, id, &content.tags).await?;
    if let Some(old) = current.category_id {
        CategoryRepo::recount(&state.pool, old).await?;
    }
    CategoryRepo::recount(&state.pool, category_id).await?;

    state.event_bus.publish(
        SiteEvent::new("post.updated")
            .with_source("post", id)
            .with_actor(DEFAULT_USER_ID)
            .with_payload(serde_json::json!({ "via": "metaweblog" })),
    );
    tracing::info!(post_id = id, "Blog post updated via XML-RPC");

    Ok(XmlRpcValue::Bool(true))
}

/// metaWeblog.getPost(postid, username, password)
async fn get_post(state: &AppState, call: &MethodCall) -> Result<XmlRpcValue, AppError> {
    note_actor(call, 1);
    let id = id_param(call, 0)?;
    let post = find_blog_post(&state.pool, id).await?;
    post_to_struct(state, &post).await
}

/// metaWeblog.getRecentPosts(blogid, username, password, numberOfPosts)
async fn get_recent_posts(state: &AppState, call: &MethodCall) -> Result<XmlRpcValue, AppError> {
    note_actor(call, 1);
    let limit = call
        .param(3)
        .map_err(codec_err)?
        .as_i64()
        .unwrap_or(10)
        .clamp(1, 100);

    let posts = PostRepo::list_recent(&state.pool, limit).await?;
    let mut items = Vec::with_capacity(posts.len());
    for post in &posts {
        items.push(post_to_struct(state, post).await?);
    }
    Ok(XmlRpcValue::Array(items))
}

/// metaWeblog.getCategories(blogid, username, password)
async fn get_categories(state: &AppState, call: &MethodCall) -> Result<XmlRpcValue, AppError> {
    note_actor(call, 1);
    let categories = CategoryRepo::list_all(&state.pool).await?;
    let items = categories
        .into_iter()
        .map(|c| {
            let mut members = BTreeMap::new();
            members.insert(
                "categoryid".into(),
                XmlRpcValue::String(c.id.to_string()),
            );
            members.insert("title".into(), XmlRpcValue::String(c.title.clone()));
            members.insert(
                "description".into(),
                XmlRpcValue::String(c.description.unwrap_or_default()),
            );
            XmlRpcValue::Struct(members)
        })
        .collect();
    Ok(XmlRpcValue::Array(items))
}

/// metaWeblog.newMediaObject(blogid, username, password, file)
///
/// `file` is a struct of `name`, `type`, and base64 `bits`. Runs the
/// same pipeline as a JSON upload and answers with the original's URL.
async fn new_media_object(state: &AppState, call: &MethodCall) -> Result<XmlRpcValue, AppError> {
    note_actor(call, 1);
    let file = struct_param(call, 3)?;

    let name = file
        .get("name")
        .and_then(XmlRpcValue::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::BadRequest("Media struct is missing 'name'".into()))?;
    // Clients send nested folder names like "Open-Live-Writer/img.png".
    let name = name.rsplit('/').next().unwrap_or(name).to_string();

    let bits = match file.get("bits") {
        Some(XmlRpcValue::Base64(bytes)) => bytes.clone(),
        _ => return Err(AppError::BadRequest("Media struct is missing 'bits'".into())),
    };

    let media = store_upload(state, &name, &bits, None).await?;
    let path = images::media_path(
        media.upload_year,
        media.upload_month as u32,
        images::ImageSize::Original,
        &media.file_name,
    );

    let mut members = BTreeMap::new();
    members.insert(
        "url".into(),
        XmlRpcValue::String(state.storage.public_url(&path)),
    );
    Ok(XmlRpcValue::Struct(members))
}

/// blogger.deletePost(appkey, postid, username, password, publish)
async fn delete_post(state: &AppState, call: &MethodCall) -> Result<XmlRpcValue, AppError> {
    note_actor(call, 2);
    let id = id_param(call, 1)?;
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
            .with_actor(DEFAULT_USER_ID)
            .with_payload(serde_json::json!({ "via": "metaweblog" })),
    );
    tracing::info!(post_id = id, "Blog post deleted via XML-RPC");

    Ok(XmlRpcValue::Bool(true))
}

/// blogger.getUsersBlogs(appkey, username, password)
///
/// A single-blog site: always one entry.
async fn get_users_blogs(state: &AppState, call: &MethodCall) -> Result<XmlRpcValue, AppError> {
    note_actor(call, 1);
    let url = state
        .config
        .storage
        .base_url
        .trim_end_matches("/media")
        .to_string();

    let mut members = BTreeMap::new();
    members.insert("blogid".into(), XmlRpcValue::String("1".into()));
    members.insert("blogName".into(), XmlRpcValue::String("Fanray".into()));
    members.insert("url".into(), XmlRpcValue::String(url));
    Ok(XmlRpcValue::Array(vec![XmlRpcValue::Struct(members)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_created_accepts_both_formats() {
        let v = XmlRpcValue::DateTime("20260815T10:30:00".into());
        let dt = parse_date_created(Some(&v)).unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2026-08-15 10:30");

        let v = XmlRpcValue::DateTime("2026-08-15T10:30:00Z".into());
        assert!(parse_date_created(Some(&v)).is_some());

        let v = XmlRpcValue::DateTime("garbage".into());
        assert!(parse_date_created(Some(&v)).is_none());
        assert!(parse_date_created(None).is_none());
    }

    #[test]
    fn content_struct_parsing() {
        let mut members = BTreeMap::new();
        members.insert("title".into(), XmlRpcValue::String("Hello".into()));
        members.insert(
            "description".into(),
            XmlRpcValue::String("<p>Hi</p>".into()),
        );
        members.insert(
            "mt_keywords".into(),
            XmlRpcValue::String("rust, web , ".into()),
        );
        members.insert(
            "categories".into(),
            XmlRpcValue::Array(vec![XmlRpcValue::String("Tech".into())]),
        );

        let content = read_content(&members).unwrap();
        assert_eq!(content.title, "Hello");
        assert_eq!(content.tags, vec!["rust", "web"]);
        assert_eq!(content.category_title.as_deref(), Some("Tech"));
        assert!(content.slug.is_none());
    }

    #[test]
    fn content_requires_title() {
        let members = BTreeMap::new();
        assert!(read_content(&members).is_err());

        let mut members = BTreeMap::new();
        members.insert("title".into(), XmlRpcValue::String("   ".into()));
        assert!(read_content(&members).is_err());
    }
}

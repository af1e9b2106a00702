//! Integration tests for the repository layer against a real database:
//! slug conflict scopes, taxonomy reconciliation, denormalized counts,
//! and the meta key/value rows.

use fanray_db::models::post::{CreatePostRow, UpdatePostRow};
use fanray_db::repositories::{
    CategoryRepo, EventRepo, MediaRepo, MetaRepo, PostRepo, TagRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_blog_post(title: &str, slug: &str, status: &str) -> CreatePostRow {
    CreatePostRow {
        user_id: 1,
        parent_id: None,
        category_id: Some(1),
        post_type: "blog_post".to_string(),
        status: status.to_string(),
        title: title.to_string(),
        slug: slug.to_string(),
        body: String::new(),
        excerpt: None,
        comments_enabled: true,
        created_at: None,
    }
}

fn new_page(title: &str, slug: &str, parent_id: Option<i64>) -> CreatePostRow {
    CreatePostRow {
        user_id: 1,
        parent_id,
        category_id: None,
        post_type: "page".to_string(),
        status: "draft".to_string(),
        title: title.to_string(),
        slug: slug.to_string(),
        body: String::new(),
        excerpt: None,
        comments_enabled: false,
        created_at: None,
    }
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn post_create_and_find(pool: PgPool) {
    let created = PostRepo::create(&pool, &new_blog_post("Hello", "hello", "draft"))
        .await
        .unwrap();

    let found = PostRepo::find_by_id(&pool, created.id).await.unwrap();
    assert_eq!(found.unwrap().title, "Hello");

    assert!(PostRepo::find_by_id(&pool, 999_999).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn blog_slug_scope_is_per_day(pool: PgPool) {
    let post = PostRepo::create(&pool, &new_blog_post("A", "taken", "draft"))
        .await
        .unwrap();
    let today = post.created_at.date_naive();

    assert!(PostRepo::blog_slug_taken(&pool, "taken", today, None)
        .await
        .unwrap());
    assert!(!PostRepo::blog_slug_taken(&pool, "free", today, None)
        .await
        .unwrap());

    // Excluding the owning row frees the slug (update path).
    assert!(
        !PostRepo::blog_slug_taken(&pool, "taken", today, Some(post.id))
            .await
            .unwrap()
    );

    // A different day is a different scope.
    let other_day = today.pred_opt().unwrap();
    assert!(!PostRepo::blog_slug_taken(&pool, "taken", other_day, None)
        .await
        .unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn page_slug_scope_is_per_sibling_set(pool: PgPool) {
    let root = PostRepo::create(&pool, &new_page("Root", "root", None))
        .await
        .unwrap();
    PostRepo::create(&pool, &new_page("Child", "child", Some(root.id)))
        .await
        .unwrap();

    // Taken among the root's children, free at the top level.
    assert!(
        PostRepo::page_slug_taken(&pool, "child", Some(root.id), None)
            .await
            .unwrap()
    );
    assert!(!PostRepo::page_slug_taken(&pool, "child", None, None)
        .await
        .unwrap());

    assert!(PostRepo::has_children(&pool, root.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_returns_none_for_missing_rows(pool: PgPool) {
    let result = PostRepo::update(
        &pool,
        999_999,
        &UpdatePostRow {
            category_id: Some(1),
            status: "draft".to_string(),
            title: "X".to_string(),
            slug: "x".to_string(),
            body: String::new(),
            excerpt: None,
            comments_enabled: true,
        },
    )
    .await
    .unwrap();
    assert!(result.is_none());
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_or_get_is_case_insensitive(pool: PgPool) {
    let first = CategoryRepo::create_or_get(&pool, "Technology").await.unwrap();
    let second = CategoryRepo::create_or_get(&pool, "TECHNOLOGY").await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(second.title, "Technology");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unique_slug_probes_suffixes(pool: PgPool) {
    CategoryRepo::create(&pool, "First", "news", None).await.unwrap();
    let probed = CategoryRepo::unique_slug(&pool, "news", None).await.unwrap();
    assert_eq!(probed, "news-2");

    CategoryRepo::create(&pool, "Second", "news-2", None).await.unwrap();
    let probed = CategoryRepo::unique_slug(&pool, "news", None).await.unwrap();
    assert_eq!(probed, "news-3");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn recount_counts_published_posts_only(pool: PgPool) {
    let category = CategoryRepo::create(&pool, "Counted", "counted", None)
        .await
        .unwrap();

    let mut row = new_blog_post("Pub", "pub", "published");
    row.category_id = Some(category.id);
    PostRepo::create(&pool, &row).await.unwrap();

    let mut row = new_blog_post("Draft", "draft-post", "draft");
    row.category_id = Some(category.id);
    PostRepo::create(&pool, &row).await.unwrap();

    CategoryRepo::recount(&pool, category.id).await.unwrap();
    let refreshed = CategoryRepo::find_by_id(&pool, category.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.post_count, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_reassigns_posts(pool: PgPool) {
    let doomed = CategoryRepo::create(&pool, "Doomed", "doomed", None)
        .await
        .unwrap();
    let mut row = new_blog_post("Orphan", "orphan", "published");
    row.category_id = Some(doomed.id);
    let post = PostRepo::create(&pool, &row).await.unwrap();

    CategoryRepo::delete(&pool, doomed.id, 1).await.unwrap();

    let moved = PostRepo::find_by_id(&pool, post.id).await.unwrap().unwrap();
    assert_eq!(moved.category_id, Some(1));
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn set_post_tags_replaces_and_recounts(pool: PgPool) {
    let post = PostRepo::create(&pool, &new_blog_post("Tagged", "tagged", "published"))
        .await
        .unwrap();
    let a = TagRepo::create(&pool, "alpha", "alpha", None).await.unwrap();
    let b = TagRepo::create(&pool, "beta", "beta", None).await.unwrap();

    TagRepo::set_post_tags(&pool, post.id, &[a.id]).await.unwrap();
    let tags = TagRepo::tags_for_post(&pool, post.id).await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].title, "alpha");

    // Replacement removes the old association and recounts both tags.
    TagRepo::set_post_tags(&pool, post.id, &[b.id]).await.unwrap();
    let tags = TagRepo::tags_for_post(&pool, post.id).await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].title, "beta");

    let a = TagRepo::find_by_id(&pool, a.id).await.unwrap().unwrap();
    let b = TagRepo::find_by_id(&pool, b.id).await.unwrap().unwrap();
    assert_eq!(a.post_count, 0);
    assert_eq!(b.post_count, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_a_post_cascades_junction_rows(pool: PgPool) {
    let post = PostRepo::create(&pool, &new_blog_post("Gone", "gone", "draft"))
        .await
        .unwrap();
    let tag = TagRepo::create(&pool, "sticky", "sticky", None).await.unwrap();
    TagRepo::set_post_tags(&pool, post.id, &[tag.id]).await.unwrap();

    PostRepo::delete(&pool, post.id).await.unwrap();

    let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_tags WHERE post_id = $1")
        .bind(post.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orphans, 0);
}

// ---------------------------------------------------------------------------
// Meta
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn meta_upsert_replaces_value(pool: PgPool) {
    MetaRepo::upsert(&pool, "test.key", &serde_json::json!({"v": 1}))
        .await
        .unwrap();
    MetaRepo::upsert(&pool, "test.key", &serde_json::json!({"v": 2}))
        .await
        .unwrap();

    let row = MetaRepo::get(&pool, "test.key").await.unwrap().unwrap();
    assert_eq!(row.value["v"], 2);

    assert!(MetaRepo::delete(&pool, "test.key").await.unwrap());
    assert!(MetaRepo::get(&pool, "test.key").await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn meta_prefix_listing(pool: PgPool) {
    MetaRepo::upsert(&pool, "widgets.instance.a", &serde_json::json!(1))
        .await
        .unwrap();
    MetaRepo::upsert(&pool, "widgets.instance.b", &serde_json::json!(2))
        .await
        .unwrap();
    MetaRepo::upsert(&pool, "other.key", &serde_json::json!(3))
        .await
        .unwrap();

    let rows = MetaRepo::list_by_prefix(&pool, "widgets.instance.")
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].key, "widgets.instance.a");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn default_category_is_seeded(pool: PgPool) {
    let row = MetaRepo::get(&pool, "blog.default_category_id")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.value.as_i64(), Some(1));

    let category = CategoryRepo::find_by_id(&pool, 1).await.unwrap().unwrap();
    assert_eq!(category.title, "Uncategorized");
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn media_file_names_scope_to_year_month(pool: PgPool) {
    let media = MediaRepo::create(
        &pool,
        &fanray_db::models::media::CreateMedia {
            uploaded_by: 1,
            file_name: "cat.jpg".to_string(),
            title: "cat".to_string(),
            content_type: "image/jpeg".to_string(),
            byte_length: 1234,
            width: 900,
            height: 600,
            resize_count: 1,
            upload_year: 2026,
            upload_month: 8,
        },
    )
    .await
    .unwrap();

    assert!(MediaRepo::file_name_exists(&pool, 2026, 8, "cat.jpg")
        .await
        .unwrap());
    // Another month is a different folder.
    assert!(!MediaRepo::file_name_exists(&pool, 2026, 9, "cat.jpg")
        .await
        .unwrap());

    let found = MediaRepo::find_by_folder_name(&pool, 2026, 8, "cat.jpg")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, media.id);
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn events_insert_and_list(pool: PgPool) {
    EventRepo::insert(
        &pool,
        "post.created",
        Some("post"),
        Some(1),
        Some(1),
        &serde_json::json!({"slug": "hello"}),
    )
    .await
    .unwrap();
    EventRepo::insert(&pool, "tag.created", None, None, None, &serde_json::json!({}))
        .await
        .unwrap();

    let recent = EventRepo::list_recent(&pool, 10).await.unwrap();
    assert_eq!(recent.len(), 2);
    // Newest first.
    assert_eq!(recent[0].event_type, "tag.created");
}

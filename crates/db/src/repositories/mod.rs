//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod category_repo;
pub mod event_repo;
pub mod media_repo;
pub mod meta_repo;
pub mod post_repo;
pub mod tag_repo;

pub use category_repo::CategoryRepo;
pub use event_repo::EventRepo;
pub use media_repo::MediaRepo;
pub use meta_repo::MetaRepo;
pub use post_repo::PostRepo;
pub use tag_repo::TagRepo;

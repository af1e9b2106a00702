//! Row models and request/response DTOs.

pub mod category;
pub mod event;
pub mod media;
pub mod meta;
pub mod post;
pub mod tag;

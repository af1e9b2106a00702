//! Long-lived background listeners spawned at startup.

pub mod invalidation;

pub use invalidation::CacheInvalidator;

//! Fanray event bus.
//!
//! Cross-cutting concerns (cache invalidation, audit persistence) are
//! decoupled from the request handlers through a small publish/subscribe
//! system:
//!
//! - [`EventBus`]: in-process pub/sub hub backed by
//!   `tokio::sync::broadcast`.
//! - [`SiteEvent`]: the canonical domain event envelope.
//! - [`EventPersistence`]: background service that durably writes every
//!   event to the `events` table.

pub mod bus;
pub mod persistence;

pub use bus::{EventBus, SiteEvent};
pub use persistence::EventPersistence;

use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: fanray_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Read-mostly list cache (pluggable; in-memory by default).
    pub cache: Arc<dyn fanray_cache::Cache>,
    /// Media file storage provider (local disk or S3).
    pub storage: Arc<dyn fanray_storage::StorageProvider>,
    /// Centralized event bus for publishing site events.
    pub event_bus: Arc<fanray_events::EventBus>,
}

/// The seeded admin user. Authentication is handled by an external
/// gateway, so handlers attribute mutations to this account.
pub const DEFAULT_USER_ID: fanray_core::types::DbId = 1;

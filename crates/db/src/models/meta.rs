//! Meta models: generic key → JSON value rows backing navigation menus
//! and widget placement.

use fanray_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `meta` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Meta {
    pub id: DbId,
    pub key: String,
    pub value: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

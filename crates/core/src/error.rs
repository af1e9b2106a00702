use crate::types::DbId;

/// Domain-level error carried from services and repositories up to the
/// HTTP boundary, where it is mapped to a JSON error response.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Field-level validation failures, surfaced to the admin UI as a list.
    #[error("Validation failed: {}", .0.join("; "))]
    ValidationErrors(Vec<String>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

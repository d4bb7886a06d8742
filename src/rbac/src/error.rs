//! Error types for the permission resolver and its collaborators

use thiserror::Error;

/// RBAC errors
///
/// Permission queries never surface these; they come from the record
/// adapters, the data loader and configuration.
#[derive(Debug, Error)]
pub enum RbacError {
    /// Role identifier is not a numeric string
    #[error("Malformed role id: {0:?}")]
    MalformedRoleId(String),

    /// User row references a role id outside the valid range
    #[error("Invalid role reference {role_id} for user {user_id}")]
    InvalidRoleReference { user_id: String, role_id: i64 },

    /// Permission token is not of the form `resource:action`
    #[error("Invalid permission: {0:?}")]
    InvalidPermission(String),

    /// Upstream data load failed
    #[error("Load failed: {0}")]
    Load(String),

    /// Upstream data load did not complete in time
    #[error("Load timed out after {0} ms")]
    LoadTimeout(u64),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for RBAC operations
pub type Result<T> = std::result::Result<T, RbacError>;

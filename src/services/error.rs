use std::collections::HashMap;

use thiserror::Error;

use crate::database::DatabaseError;
use crate::hierarchy::HierarchyError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    DepthExceeded(String),

    #[error("{0}")]
    InvalidReparenting(String),

    #[error("{0}")]
    HasChildren(String),

    #[error("{0}")]
    HasDependents(String),

    #[error("{message}")]
    ValidationFailed {
        message: String,
        field_errors: HashMap<String, String>,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    PasswordResetRequired(String),

    #[error("storage failure: {0}")]
    Storage(DatabaseError),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        ServiceError::ValidationFailed {
            message: format!("{}: {}", field, message),
            field_errors: HashMap::from([(field.to_string(), message)]),
        }
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ServiceError::NotFound(msg),
            DatabaseError::Conflict(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Storage(other),
        }
    }
}

impl From<HierarchyError> for ServiceError {
    fn from(err: HierarchyError) -> Self {
        match err {
            HierarchyError::ParentNotFound { .. } => ServiceError::NotFound(err.to_string()),
            // corrupted chains are logged where they are found
            HierarchyError::BrokenChain { .. } | HierarchyError::Cycle { .. } => ServiceError::NotFound(err.to_string()),
            HierarchyError::DepthExceeded { .. } => ServiceError::DepthExceeded(err.to_string()),
            HierarchyError::Storage(db) => db.into(),
        }
    }
}

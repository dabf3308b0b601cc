use thiserror::Error;

use crate::auth::{JwtError, PasswordError};
use crate::database::DatabaseError;

/// Domain failures raised by the workflow services. Each variant maps onto
/// exactly one client-facing error code.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// The entity exists but its current state does not allow the operation.
    #[error("{0}")]
    PreconditionFailed(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("JWT error: {0}")]
    Jwt(#[from] JwtError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        ServiceError::PreconditionFailed(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ServiceError::BadRequest(message.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

//! Workspace Error Types
//!
//! Workspace-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Workspace-specific result type alias
pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

/// Workspace-specific error variants
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// Unknown workspace slug or id
    #[error("Workspace not found")]
    WorkspaceNotFound,

    /// Unknown workspace request
    #[error("Workspace request not found")]
    RequestNotFound,

    /// Bad credential or bad/missing token.
    /// One generic message for every cause, so callers cannot enumerate
    /// which check failed.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Cryptographically valid token scoped to a different resource
    #[error("Access to this workspace is not allowed")]
    WrongScope,

    /// Too many failed attempts for this key
    #[error("Too many attempts. Retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// Slug collides with an existing workspace or pending request
    #[error("This URL slug is already in use")]
    SlugTaken,

    /// Request was already approved or rejected
    #[error("This request has already been processed")]
    AlreadyProcessed,

    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Master password is not configured on the server
    #[error("Server authentication is not configured")]
    MasterPasswordUnset,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WorkspaceError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkspaceError::WorkspaceNotFound | WorkspaceError::RequestNotFound => {
                ErrorKind::NotFound
            }
            WorkspaceError::InvalidCredentials => ErrorKind::Unauthorized,
            WorkspaceError::WrongScope => ErrorKind::Forbidden,
            WorkspaceError::RateLimited { .. } => ErrorKind::TooManyRequests,
            WorkspaceError::SlugTaken
            | WorkspaceError::AlreadyProcessed
            | WorkspaceError::Validation(_) => ErrorKind::BadRequest,
            WorkspaceError::MasterPasswordUnset
            | WorkspaceError::Database(_)
            | WorkspaceError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            WorkspaceError::Database(e) => {
                tracing::error!(error = %e, "Workspace database error");
            }
            WorkspaceError::Internal(msg) => {
                tracing::error!(message = %msg, "Workspace internal error");
            }
            WorkspaceError::MasterPasswordUnset => {
                tracing::error!("Master password is not configured");
            }
            WorkspaceError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            WorkspaceError::RateLimited { retry_after_secs } => {
                tracing::warn!(retry_after_secs, "Rate-limited auth attempt");
            }
            _ => {
                tracing::debug!(error = %self, "Workspace error");
            }
        }
    }
}

impl IntoResponse for WorkspaceError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<platform::password::PasswordPolicyError> for WorkspaceError {
    fn from(err: platform::password::PasswordPolicyError) -> Self {
        WorkspaceError::Validation(err.to_string())
    }
}

impl From<platform::rate_limit::RateLimitError> for WorkspaceError {
    fn from(err: platform::rate_limit::RateLimitError) -> Self {
        WorkspaceError::Internal(format!("Rate limit store error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(WorkspaceError::WorkspaceNotFound.status_code(), 404);
        assert_eq!(WorkspaceError::InvalidCredentials.status_code(), 401);
        assert_eq!(WorkspaceError::WrongScope.status_code(), 403);
        assert_eq!(
            WorkspaceError::RateLimited {
                retry_after_secs: 60
            }
            .status_code(),
            429
        );
        assert_eq!(WorkspaceError::SlugTaken.status_code(), 400);
        assert_eq!(WorkspaceError::MasterPasswordUnset.status_code(), 500);
    }

    #[test]
    fn test_rate_limited_message_embeds_retry_after() {
        let err = WorkspaceError::RateLimited {
            retry_after_secs: 42,
        };
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_generic_credential_message() {
        // Message must not reveal which check failed
        assert_eq!(
            WorkspaceError::InvalidCredentials.to_string(),
            "Invalid credentials"
        );
    }
}

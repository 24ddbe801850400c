//! Scheduling Error Types

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Scheduling-specific result type alias
pub type SchedulingResult<T> = Result<T, SchedulingError>;

/// Scheduling-specific error variants
#[derive(Debug, Error)]
pub enum SchedulingError {
    /// Unknown expert in this workspace
    #[error("Expert not found")]
    ExpertNotFound,

    /// Unknown polling slot
    #[error("Slot not found")]
    SlotNotFound,

    /// Lifecycle precondition violated; carries a human-readable reason
    #[error("{0}")]
    InvalidTransition(String),

    /// Voting is closed for this expert
    #[error("Voting has closed for this expert")]
    VotingClosed,

    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Bad credential; one generic message for every cause
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Valid token scoped to a different resource
    #[error("Access to this resource is not allowed")]
    WrongScope,

    /// Too many failed attempts for this key
    #[error("Too many attempts. Retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SchedulingError {
    pub fn invalid_transition(reason: impl Into<String>) -> Self {
        SchedulingError::InvalidTransition(reason.into())
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchedulingError::ExpertNotFound | SchedulingError::SlotNotFound => ErrorKind::NotFound,
            SchedulingError::InvalidTransition(_)
            | SchedulingError::VotingClosed
            | SchedulingError::Validation(_) => ErrorKind::BadRequest,
            SchedulingError::InvalidCredentials => ErrorKind::Unauthorized,
            SchedulingError::WrongScope => ErrorKind::Forbidden,
            SchedulingError::RateLimited { .. } => ErrorKind::TooManyRequests,
            SchedulingError::Database(_) | SchedulingError::Internal(_) => {
                ErrorKind::InternalServerError
            }
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

    fn log(&self) {
        match self {
            SchedulingError::Database(e) => {
                tracing::error!(error = %e, "Scheduling database error");
            }
            SchedulingError::Internal(msg) => {
                tracing::error!(message = %msg, "Scheduling internal error");
            }
            SchedulingError::InvalidCredentials => {
                tracing::warn!("Invalid expert or voter credential");
            }
            _ => {
                tracing::debug!(error = %self, "Scheduling error");
            }
        }
    }
}

impl IntoResponse for SchedulingError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<workspace::WorkspaceError> for SchedulingError {
    fn from(err: workspace::WorkspaceError) -> Self {
        use workspace::WorkspaceError;
        match err {
            WorkspaceError::InvalidCredentials => SchedulingError::InvalidCredentials,
            WorkspaceError::WrongScope => SchedulingError::WrongScope,
            WorkspaceError::RateLimited { retry_after_secs } => {
                SchedulingError::RateLimited { retry_after_secs }
            }
            WorkspaceError::WorkspaceNotFound => SchedulingError::ExpertNotFound,
            WorkspaceError::Validation(msg) => SchedulingError::Validation(msg),
            WorkspaceError::Database(e) => SchedulingError::Database(e),
            other => SchedulingError::Internal(other.to_string()),
        }
    }
}

impl From<platform::password::PasswordPolicyError> for SchedulingError {
    fn from(err: platform::password::PasswordPolicyError) -> Self {
        SchedulingError::Validation(err.to_string())
    }
}

impl From<platform::rate_limit::RateLimitError> for SchedulingError {
    fn from(err: platform::rate_limit::RateLimitError) -> Self {
        SchedulingError::Internal(format!("Rate limit store error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(SchedulingError::ExpertNotFound.status_code(), 404);
        assert_eq!(
            SchedulingError::invalid_transition("no candidate slots").status_code(),
            400
        );
        assert_eq!(SchedulingError::VotingClosed.status_code(), 400);
        assert_eq!(SchedulingError::InvalidCredentials.status_code(), 401);
        assert_eq!(SchedulingError::WrongScope.status_code(), 403);
        assert_eq!(
            SchedulingError::RateLimited {
                retry_after_secs: 9
            }
            .status_code(),
            429
        );
    }

    #[test]
    fn test_transition_reason_is_preserved() {
        let err = SchedulingError::invalid_transition("no candidate slots");
        assert_eq!(err.to_string(), "no candidate slots");
    }
}

//! Error taxonomy shared by the use cases.

use thiserror::Error;

use crate::timer::TimerError;
use crate::types::ValidationError;

/// Convenience alias for use-case results.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures surfaced by the use cases.
///
/// Every variant is recoverable at the use-case boundary; the presentation
/// layer decides how to render it (see [`Error::status_code`]).
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced user, project or task does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The acting user does not own the resource.
    #[error("{0}")]
    Unauthorized(String),

    /// The task already has a running timer.
    #[error("Task already has an active timer")]
    ActiveTimerExists,

    /// There is no running timer to stop.
    #[error("No active timer found for this task")]
    NoActiveTimer,

    /// Malformed or missing input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An illegal timer state transition.
    #[error(transparent)]
    Timer(#[from] TimerError),

    /// The entity store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// HTTP status an HTTP front end should answer with.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::NotFound { .. } => 404,
            Self::ActiveTimerExists | Self::NoActiveTimer => 409,
            Self::Timer(_) | Self::Store(_) => 500,
        }
    }
}

/// Errors reported by a repository implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("constraint violated: {0}")]
    Conflict(String),

    /// Any other backend failure.
    #[error("store error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps an arbitrary backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(Error::not_found("Task", "t-1").status_code(), 404);
        assert_eq!(Error::Unauthorized("nope".into()).status_code(), 401);
        assert_eq!(Error::ActiveTimerExists.status_code(), 409);
        assert_eq!(Error::NoActiveTimer.status_code(), 409);
        assert_eq!(
            Error::from(ValidationError::Empty { field: "title" }).status_code(),
            400
        );
        assert_eq!(
            Error::from(StoreError::Conflict("x".into())).status_code(),
            500
        );
    }

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            Error::not_found("Task", "t-1").to_string(),
            "Task not found: t-1"
        );
        assert_eq!(
            Error::NoActiveTimer.to_string(),
            "No active timer found for this task"
        );
    }
}

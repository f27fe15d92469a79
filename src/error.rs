use crate::domain::progress::COMPLETION_THRESHOLD;

/// Service-level failure taxonomy. Routes map each variant to exactly one
/// HTTP status; `Internal` details stay in the log, never in the response.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    BadRequest(String),

    /// Valid identity, but no completed payment for the course.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Certificate requested below the completion threshold.
    #[error("Course must be at least {COMPLETION_THRESHOLD}% complete")]
    BelowThreshold { current_progress: f64 },

    /// Creation race lost on the (user, course) unique index; retry as a read.
    #[error("{0}")]
    Conflict(String),

    /// Renderer collaborator failure.
    #[error("Renderer error: {0}")]
    Upstream(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(err: sea_orm::DbErr) -> Self {
        ServiceError::Internal(err.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

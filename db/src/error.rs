use sea_orm::DbErr;
use thiserror::Error;
use util::geofence::GeofenceError;

/// Failure classes surfaced by the data layer.
///
/// The HTTP layer maps each variant onto a status code; nothing here is retried.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Bad input shape or a request that makes no sense in the current state.
    #[error("{0}")]
    Validation(String),
    /// Caller is not allowed to touch the target record.
    #[error("{0}")]
    Permission(String),
    #[error("{0}")]
    NotFound(String),
    /// The write would break a uniqueness rule (already enrolled, second active session).
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl From<GeofenceError> for DomainError {
    fn from(err: GeofenceError) -> Self {
        DomainError::Validation(err.to_string())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

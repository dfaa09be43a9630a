use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::format_validation_errors;
use db::error::DomainError;
use sea_orm::DbErr;
use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::guards::Empty;
use crate::response::ApiResponse;

/// Error type returned by route handlers.
///
/// Rendered as the usual `{ success: false, data: {}, message }` envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Internal(String),
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        ApiError::Domain(DomainError::Database(err))
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::BadRequest(format_validation_errors(&errors))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Domain(DomainError::Validation(_)) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Domain(DomainError::Permission(_)) => StatusCode::FORBIDDEN,
            ApiError::Domain(DomainError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Domain(DomainError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Domain(DomainError::Database(_)) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Domain(DomainError::Database(e)) => {
                tracing::error!(error = %e, "database error");
                "Database error occurred".to_string()
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ApiResponse::<Empty>::error(message))).into_response()
    }
}

/// Success tuple produced by handlers.
pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

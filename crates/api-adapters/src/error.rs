//! # ApiError
//!
//! Every handler returns `Result<_, ApiError>`. Domain failures keep their
//! stable `code`; the body is always `{"error": "...", "code": "..."}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::DomainError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Malformed query string or parameter combination.
    #[error("{0}")]
    BadRequest(String),

    /// Failure inside the adapter itself (encoding metrics, for instance).
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Domain(e) => match e {
                DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
                DomainError::InvalidParent(_)
                | DomainError::SelfFollow
                | DomainError::ReasonRequired
                | DomainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DomainError::Unauthorized(_) => StatusCode::FORBIDDEN,
                DomainError::Conflict(_) => StatusCode::CONFLICT,
                DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Domain(e) => e.code(),
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, code = self.code(), "request rejected");
        }
        (status, Json(json!({ "error": self.to_string(), "code": self.code() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (DomainError::not_found("Post", 1), StatusCode::NOT_FOUND),
            (DomainError::SelfFollow, StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::ReasonRequired, StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::InvalidParent("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::Unauthorized("x".into()), StatusCode::FORBIDDEN),
            (DomainError::Conflict("x".into()), StatusCode::CONFLICT),
            (DomainError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn code_passes_through_from_domain() {
        assert_eq!(ApiError::from(DomainError::SelfFollow).code(), "self_follow");
        assert_eq!(ApiError::BadRequest("x".into()).code(), "bad_request");
    }
}

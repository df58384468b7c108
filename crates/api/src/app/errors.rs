use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use textileops_core::DomainError;
use textileops_infra::StoreError;

/// Error returned by handlers; rendered as `{"error", "message"}` JSON.
#[derive(Debug)]
pub enum ApiError {
    Store(StoreError),
    BadRequest(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Store(StoreError::Domain(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Store(err) => store_error_to_response(err),
        }
    }
}

pub fn store_error_to_response(err: StoreError) -> Response {
    match err {
        StoreError::Domain(e) => domain_error_to_response(e),
        StoreError::Storage { operation, message } => {
            tracing::error!(operation, %message, "storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "the request could not be completed; no changes were applied",
            )
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::ValidationErrors(errors) => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "validation_error",
                "message": errors.join("; "),
                "errors": errors,
            })),
        )
            .into_response(),
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        e @ DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", e.to_string()),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        e @ DomainError::InsufficientStock { .. } => {
            json_error(StatusCode::CONFLICT, "insufficient_stock", e.to_string())
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

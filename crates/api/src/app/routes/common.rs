use core::str::FromStr;

use axum::{extract::rejection::JsonRejection, Json};
use serde_json::json;

use textileops_core::DomainError;

use crate::app::errors::{ApiError, ApiResult};

/// Parse an id path segment; malformed or non-positive ids are a 400.
pub fn parse_id<T>(raw: &str) -> ApiResult<T>
where
    T: FromStr<Err = DomainError>,
{
    Ok(raw.parse::<T>()?)
}

/// Unwrap a JSON body, turning a rejection into our error body.
pub fn body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    let Json(value) = body.map_err(ApiError::from)?;
    Ok(value)
}

pub fn message(text: &str) -> Json<serde_json::Value> {
    Json(json!({ "message": text }))
}

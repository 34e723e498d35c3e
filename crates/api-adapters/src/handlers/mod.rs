//! # Handlers
//!
//! Thin axum handlers: extract, call one service, record a metric, serialize.

pub mod admin;
pub mod comments;
pub mod posts;
pub mod users;

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;

use crate::dto::Health;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const OPENMETRICS: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn metrics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let body = state
        .metrics
        .render()
        .map_err(|e| ApiError::Internal(format!("metrics encoding failed: {e}")))?;
    Ok(([(CONTENT_TYPE, OPENMETRICS)], body))
}

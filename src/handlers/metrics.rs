use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::error::ApiError;

/// GET /v1/metrics - request and response counters in the Prometheus text format
pub async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let (content_type, body) = state.metrics.encode().map_err(ApiError::server_error)?;
    Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
}

use axum::extract::State;
use serde_json::json;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /v1/healthcheck - liveness plus the running environment and version
pub async fn healthcheck(State(state): State<AppState>) -> ApiResult {
    ApiResponse::success("status", "available")?.and(
        "system_info",
        json!({
            "environment": state.config.environment.as_str(),
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use crate::app::AppState;
use crate::error::ApiError;

/// Per-client token bucket check, keyed by the peer IP address
pub async fn rate_limit(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.limiter.enabled() {
        return next.run(request).await;
    }

    // Without a peer address there is no client identity to bucket on
    let Some(ConnectInfo(addr)) = connect_info else {
        return ApiError::server_error("client address unavailable for rate limiting").into_response();
    };

    if !state.limiter.allow(addr.ip()) {
        tracing::debug!(client = %addr.ip(), "Rate limit exceeded");
        return ApiError::RateLimitExceeded.into_response();
    }

    next.run(request).await
}

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

/// Give the router's bare 405 the same error envelope as every other
/// rejection, keeping its `Allow` header.
pub async fn method_not_allowed(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let response = next.run(request).await;

    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut rejection = ApiError::MethodNotAllowed(method).into_response();
    if let Some(allow) = allow {
        rejection.headers_mut().insert(header::ALLOW, allow);
    }
    rejection
}

use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::any::Any;
use tracing::error;

use crate::app::panic_message;
use crate::error::{ApiError, ServerErrorDetail};

/// Turn a handler panic into a 500 and close the connection
pub fn recover_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let mut response = ApiError::server_error(format!("panic: {}", panic_message(panic.as_ref()))).into_response();
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}

/// Log the cause of every 500 together with the request that produced it
pub async fn log_server_errors(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    if let Some(ServerErrorDetail(detail)) = response.extensions().get::<ServerErrorDetail>() {
        error!(request_method = %method, request_url = %uri, "{}", detail);
    }

    response
}

// HTTP API Error Types
use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::database::StoreError;

/// Field name -> message map reported with 422 responses
pub type FieldErrors = BTreeMap<String, String>;

/// Rejection returned by any stage of the request pipeline or by a handler
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    InvalidCredentials,
    InvalidAuthenticationToken,
    AuthenticationRequired,

    // 403 Forbidden
    InactiveAccount,
    NotPermitted,

    // 404 Not Found
    NotFound,

    // 405 Method Not Allowed
    MethodNotAllowed(Method),

    // 409 Conflict
    EditConflict,

    // 422 Unprocessable Entity
    ValidationFailed(FieldErrors),

    // 429 Too Many Requests
    RateLimitExceeded,

    // 500 Internal Server Error. The detail is logged, never sent to the client.
    ServerError(String),
}

/// Attached to 500 responses so the outer logging layer can report the cause
/// together with the request method and URL.
#[derive(Debug, Clone)]
pub struct ServerErrorDetail(pub String);

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::InvalidAuthenticationToken => StatusCode::UNAUTHORIZED,
            ApiError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            ApiError::InactiveAccount => StatusCode::FORBIDDEN,
            ApiError::NotPermitted => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::EditConflict => StatusCode::CONFLICT,
            ApiError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> Cow<'_, str> {
        let message: &str = match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::InvalidCredentials => "invalid credentials",
            ApiError::InvalidAuthenticationToken => "invalid authentication token",
            ApiError::AuthenticationRequired => "you must be authenticated to access this resource",
            ApiError::InactiveAccount => "your user account must be activated to access this resource",
            ApiError::NotPermitted => {
                "your user account doesn't have the necessary permissions to access this resource"
            }
            ApiError::NotFound => "the requested resource could not be found",
            ApiError::MethodNotAllowed(method) => {
                return Cow::Owned(format!("the {} method is not supported for this resource", method))
            }
            ApiError::EditConflict => {
                "unable to update the record due to an edit conflict, please try again"
            }
            ApiError::ValidationFailed(_) => "one or more fields failed validation",
            ApiError::RateLimitExceeded => "rate limit exceeded",
            ApiError::ServerError(_) => {
                "the server encountered a problem and could not process your request"
            }
        };
        Cow::Borrowed(message)
    }

    /// Convert to the `{"error": ...}` response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationFailed(fields) => json!({ "error": fields }),
            _ => json!({ "error": self.message() }),
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn server_error(detail: impl std::fmt::Display) -> Self {
        ApiError::ServerError(detail.to_string())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.into(), message.into());
        ApiError::ValidationFailed(fields)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound,
            StoreError::EditConflict => ApiError::EditConflict,
            StoreError::DuplicateEmail => {
                ApiError::validation("email", "a user with this email address already exists")
            }
            other => ApiError::server_error(other),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::ServerError(detail) => write!(f, "server error: {}", detail),
            other => write!(f, "{}", other.message()),
        }
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let mut response = (self.status_code(), Json(self.to_json())).into_response();

        match self {
            ApiError::InvalidAuthenticationToken => {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            ApiError::ServerError(detail) => {
                response.extensions_mut().insert(ServerErrorDetail(detail));
            }
            _ => {}
        }

        response
    }
}

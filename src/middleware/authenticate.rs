use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::identity::Identity;
use crate::app::AppState;
use crate::auth::{token, TokenScope};
use crate::database::{StoreError, UserStore};
use crate::error::ApiError;

/// Resolve the `Authorization` header into an identity.
///
/// * no header, or an empty one -> `Anonymous`
/// * anything other than `Bearer <token>`, a malformed token, or a token
///   with no live authentication-scoped owner -> `InvalidAuthenticationToken`
pub async fn authenticate_request(headers: &HeaderMap, users: &dyn UserStore) -> Result<Identity, ApiError> {
    let Some(value) = headers.get(header::AUTHORIZATION).filter(|value| !value.is_empty()) else {
        return Ok(Identity::Anonymous);
    };

    let value = value.to_str().map_err(|_| ApiError::InvalidAuthenticationToken)?;
    let plaintext = parse_bearer(value).ok_or(ApiError::InvalidAuthenticationToken)?;

    if !token::is_well_formed(plaintext) {
        return Err(ApiError::InvalidAuthenticationToken);
    }

    let hash = token::hash_plaintext(plaintext);
    match users.get_by_token(&hash, TokenScope::Authentication).await {
        Ok(user) => Ok(Identity::Authenticated(user)),
        Err(StoreError::NotFound) => Err(ApiError::InvalidAuthenticationToken),
        Err(e) => Err(e.into()),
    }
}

fn parse_bearer(value: &str) -> Option<&str> {
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Some(token),
        _ => None,
    }
}

/// Attach the caller's `Identity` to the request. Every response, rejected
/// or not, varies on `Authorization`.
pub async fn authenticate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let mut response = match authenticate_request(request.headers(), state.models.users.as_ref()).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    };

    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Authorization"));
    response
}

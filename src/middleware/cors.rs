use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app::AppState;

const PREFLIGHT_METHODS: &str = "OPTIONS, PUT, PATCH, DELETE";
const PREFLIGHT_HEADERS: &str = "Authorization, Content-Type";
const PREFLIGHT_MAX_AGE: &str = "60";

/// Echo trusted origins back and answer pre-flight requests directly
pub async fn enable_cors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let trusted = &state.config.cors.trusted_origins;
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .filter(|origin| is_trusted(origin, trusted))
        .cloned();

    let preflight = origin.is_some()
        && request.method() == Method::OPTIONS
        && request.headers().contains_key(header::ACCESS_CONTROL_REQUEST_METHOD);

    let mut response = if preflight {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.append(header::VARY, HeaderValue::from_static("Origin"));
    headers.append(header::VARY, HeaderValue::from_static("Access-Control-Request-Method"));

    if let Some(origin) = origin {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        if preflight {
            add_preflight_headers(headers);
        }
    }

    response
}

fn is_trusted(origin: &HeaderValue, trusted: &[String]) -> bool {
    origin
        .to_str()
        .map(|origin| trusted.iter().any(|t| t == origin))
        .unwrap_or(false)
}

fn add_preflight_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(PREFLIGHT_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(PREFLIGHT_HEADERS),
    );
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(PREFLIGHT_MAX_AGE));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exact_origins_are_trusted() {
        let trusted = vec!["https://www.example.com".to_string()];
        assert!(is_trusted(&HeaderValue::from_static("https://www.example.com"), &trusted));
        assert!(!is_trusted(&HeaderValue::from_static("https://example.com"), &trusted));
        assert!(!is_trusted(&HeaderValue::from_static("null"), &[]));
    }
}

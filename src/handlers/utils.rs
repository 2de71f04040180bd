use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

use crate::error::ApiError;
use crate::validator::Validator;

pub const EXPECTED_VERSION_HEADER: &str = "x-expected-version";

/// Largest request body accepted by any handler
pub const MAX_BODY_BYTES: usize = 1_048_576;

/// `Json<T>` whose rejections use the `{"error": ...}` envelope
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::JsonSyntaxError(_) => ApiError::bad_request("body contains badly-formed JSON"),
        JsonRejection::JsonDataError(e) => ApiError::bad_request(format!("body contains invalid JSON: {}", e.body_text())),
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::bad_request("body must be JSON with a Content-Type of application/json")
        }
        JsonRejection::BytesRejection(_) => {
            ApiError::bad_request(format!("body must not be larger than {} bytes", MAX_BODY_BYTES))
        }
        other => ApiError::bad_request(other.body_text()),
    }
}

/// Positive integer id from the `:id` path segment; anything else cannot
/// name a record and is reported as not found
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(ApiError::NotFound),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RecordId(pub i64);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RecordId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::NotFound)?;
        parse_id(&raw).map(RecordId)
    }
}

/// Optional `X-Expected-Version` precondition
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpectedVersion(pub Option<i32>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ExpectedVersion {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(EXPECTED_VERSION_HEADER) else {
            return Ok(ExpectedVersion(None));
        };

        value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i32>().ok())
            .map(|v| ExpectedVersion(Some(v)))
            .ok_or_else(|| ApiError::bad_request("X-Expected-Version header must be an integer"))
    }
}

pub fn read_string(qs: &HashMap<String, String>, key: &str, default: &str) -> String {
    match qs.get(key) {
        Some(value) if !value.is_empty() => value.clone(),
        _ => default.to_string(),
    }
}

pub fn read_csv(qs: &HashMap<String, String>, key: &str) -> Vec<String> {
    match qs.get(key) {
        Some(value) if !value.is_empty() => value.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

/// Integer query parameter; a non-integer value is recorded in `v` and the default returned
pub fn read_int(qs: &HashMap<String, String>, key: &str, default: i64, v: &mut Validator) -> i64 {
    match qs.get(key) {
        Some(value) if !value.is_empty() => value.parse().unwrap_or_else(|_| {
            v.add_error(key, "must be an integer value");
            default
        }),
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(parse_id("42").unwrap(), 42);
        for raw in ["0", "-1", "abc", "1.5", ""] {
            assert!(matches!(parse_id(raw), Err(ApiError::NotFound)), "{}", raw);
        }
    }

    #[test]
    fn reads_query_values_with_defaults() {
        let qs = query(&[("title", "moana"), ("genres", "drama,comedy"), ("page", "x")]);
        let mut v = Validator::new();

        assert_eq!(read_string(&qs, "title", ""), "moana");
        assert_eq!(read_string(&qs, "sort", "id"), "id");
        assert_eq!(read_csv(&qs, "genres"), vec!["drama", "comedy"]);
        assert!(read_csv(&qs, "missing").is_empty());
        assert_eq!(read_int(&qs, "page_size", 20, &mut v), 20);
        assert_eq!(read_int(&qs, "page", 1, &mut v), 1);
        assert_eq!(v.errors().get("page").unwrap(), "must be an integer value");
    }

    #[tokio::test]
    async fn expected_version_header() {
        async fn extract(value: Option<&str>) -> Result<ExpectedVersion, ApiError> {
            let mut builder = HttpRequest::builder();
            if let Some(value) = value {
                builder = builder.header("X-Expected-Version", value);
            }
            let (mut parts, _) = builder.body(()).unwrap().into_parts();
            ExpectedVersion::from_request_parts(&mut parts, &()).await
        }

        assert_eq!(extract(None).await.unwrap().0, None);
        assert_eq!(extract(Some("3")).await.unwrap().0, Some(3));
        assert!(matches!(extract(Some("three")).await, Err(ApiError::BadRequest(_))));
    }
}

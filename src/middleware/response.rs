use axum::{
    http::{header::IntoHeaderName, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Successful response wrapped in a keyed envelope, e.g. `{"movie": {...}}`
#[derive(Debug)]
pub struct ApiResponse {
    envelope: Map<String, Value>,
    status: StatusCode,
    headers: HeaderMap,
}

impl ApiResponse {
    /// 200 OK with `data` under `key`
    pub fn success(key: &str, data: impl Serialize) -> Result<Self, ApiError> {
        Self::with_status(StatusCode::OK, key, data)
    }

    /// 201 Created
    pub fn created(key: &str, data: impl Serialize) -> Result<Self, ApiError> {
        Self::with_status(StatusCode::CREATED, key, data)
    }

    /// 202 Accepted
    pub fn accepted(key: &str, data: impl Serialize) -> Result<Self, ApiError> {
        Self::with_status(StatusCode::ACCEPTED, key, data)
    }

    pub fn with_status(status: StatusCode, key: &str, data: impl Serialize) -> Result<Self, ApiError> {
        let mut response = Self {
            envelope: Map::new(),
            status,
            headers: HeaderMap::new(),
        };
        response.insert(key, data)?;
        Ok(response)
    }

    /// Add another top-level key (e.g. list metadata)
    pub fn and(mut self, key: &str, data: impl Serialize) -> Result<Self, ApiError> {
        self.insert(key, data)?;
        Ok(self)
    }

    pub fn header<K: IntoHeaderName>(mut self, name: K, value: &str) -> Result<Self, ApiError> {
        let value = HeaderValue::from_str(value).map_err(ApiError::server_error)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    fn insert(&mut self, key: &str, data: impl Serialize) -> Result<(), ApiError> {
        let value = serde_json::to_value(data)
            .map_err(|e| ApiError::server_error(format!("failed to serialize response data: {}", e)))?;
        self.envelope.insert(key.to_string(), value);
        Ok(())
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, Json(Value::Object(self.envelope))).into_response()
    }
}

pub type ApiResult = Result<ApiResponse, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;
    use serde_json::json;

    #[test]
    fn builds_keyed_envelope_with_headers() {
        let response = ApiResponse::created("movie", json!({ "id": 1 }))
            .and_then(|r| r.and("note", "hello"))
            .and_then(|r| r.header(header::LOCATION, "/v1/movies/1"))
            .unwrap();

        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.envelope["movie"]["id"], 1);
        assert_eq!(response.envelope["note"], "hello");

        let response = response.into_response();
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/v1/movies/1");
    }
}

//! Test response wrapper.

use crate::error::TestError;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use std::fmt;
use vitruvius_core::{ErrorBody, RequestId};

/// A test response with helper methods for assertions.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Collects an HTTP response into a test response.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::BodyRead`] if the body fails to collect.
    pub async fn from_http<B>(response: http::Response<B>) -> Result<Self, TestError>
    where
        B: http_body::Body,
        B::Error: fmt::Display,
    {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| TestError::BodyRead(e.to_string()))?
            .to_bytes();

        Ok(Self {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }

    /// Creates a test response from raw parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status code as a u16.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns true if the status is successful (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns a reference to the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Gets a header value by name.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// Gets a header value as a string.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the echoed request ID.
    #[must_use]
    pub fn request_id(&self) -> Option<RequestId> {
        self.header_str("x-request-id").and_then(RequestId::parse)
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid UTF-8.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Json`] if the body does not deserialize.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Deserializes the body as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Json`] if the body is not JSON.
    pub fn json_value(&self) -> Result<serde_json::Value, TestError> {
        self.json()
    }

    /// Deserializes the body as an error body.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Json`] if the body is not an error body.
    pub fn error_body(&self) -> Result<ErrorBody, TestError> {
        self.json()
    }

    /// Asserts that the status code equals the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {}, got {}: {}",
            expected,
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts that the response is successful (2xx).
    ///
    /// # Panics
    ///
    /// Panics if the status is not 2xx.
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.is_success(),
            "Expected success status, got {}: {}",
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts that a header exists with the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let actual = self.header_str(name);
        assert_eq!(
            actual,
            Some(expected.as_ref()),
            "Expected header {name} to be {:?}, got {actual:?}",
            expected.as_ref()
        );
        self
    }

    /// Asserts that the body equals the expected JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON or doesn't match.
    pub fn assert_json_eq(&self, expected: &serde_json::Value) -> &Self {
        match self.json_value() {
            Ok(actual) => assert_eq!(&actual, expected, "JSON body mismatch"),
            Err(e) => panic!("Expected JSON body: {e}"),
        }
        self
    }

    /// Asserts that the body is an error body with the given name and code.
    ///
    /// # Panics
    ///
    /// Panics if the body is not an error body or the name or code differ.
    pub fn assert_error(&self, name: &str, code: u16) -> &Self {
        match self.error_body() {
            Ok(body) => {
                assert_eq!(body.name, name, "error name mismatch");
                assert_eq!(body.code, code, "error code mismatch");
                assert_eq!(self.status.as_u16(), code, "status and error code differ");
            }
            Err(e) => panic!("Expected error body: {e}"),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn json_response(status: StatusCode, body: serde_json::Value) -> TestResponse {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        TestResponse::new(status, headers, Bytes::from(body.to_string()))
    }

    #[test]
    fn test_json_helpers() {
        let response = json_response(StatusCode::OK, json!({"id": 1}));
        response
            .assert_success()
            .assert_header("content-type", "application/json")
            .assert_json_eq(&json!({"id": 1}));
        assert_eq!(response.content_type(), Some("application/json"));
    }

    #[test]
    fn test_error_body() {
        let response = json_response(
            StatusCode::NOT_FOUND,
            json!({"name": "UserNotFound", "code": 404, "message": "gone", "payload": {"id": 3}}),
        );
        response.assert_error("UserNotFound", 404);

        let body = response.error_body().unwrap();
        assert_eq!(body.payload, Some(json!({"id": 3})));
        assert_eq!(body.request_id, None);
    }

    #[test]
    #[should_panic(expected = "Expected status")]
    fn test_assert_status_panics() {
        json_response(StatusCode::BAD_REQUEST, json!({})).assert_status(StatusCode::OK);
    }

    #[test]
    fn test_request_id_header() {
        let id = RequestId::new();
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_str(&id.to_string()).unwrap());

        let response = TestResponse::new(StatusCode::NO_CONTENT, headers, Bytes::new());
        assert_eq!(response.request_id(), Some(id));
        assert_eq!(response.text().unwrap(), "");
    }

    #[tokio::test]
    async fn test_from_http() {
        let response = http::Response::builder()
            .status(StatusCode::CREATED)
            .body(http_body_util::Full::new(Bytes::from("hello")))
            .unwrap();

        let response = TestResponse::from_http(response).await.unwrap();
        assert_eq!(response.status_code(), 201);
        assert_eq!(response.text().unwrap(), "hello");
    }
}

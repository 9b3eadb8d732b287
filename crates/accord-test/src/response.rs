//! Test response wrapper.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::TestError;

/// A collected response with assertion helpers.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Wraps a collected response.
    pub fn from_http(response: Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
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

    /// Returns true for 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the headers.
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

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("Invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        serde_json::from_slice(&self.body).map_err(TestError::Json)
    }

    /// Parses the body as a JSON value.
    pub fn json_value(&self) -> Result<Value, TestError> {
        self.json()
    }

    /// Asserts the status code.
    ///
    /// # Panics
    ///
    /// Panics with the body text when the status differs.
    #[track_caller]
    pub fn assert_status(&self, expected: impl Into<u16>) -> &Self {
        let expected = expected.into();
        assert_eq!(
            self.status_code(),
            expected,
            "expected status {expected}, got {} with body: {}",
            self.status_code(),
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts that the header is present with the given value.
    ///
    /// # Panics
    ///
    /// Panics when the header is missing or differs.
    #[track_caller]
    pub fn assert_header(&self, name: &str, expected: &str) -> &Self {
        assert_eq!(
            self.header_str(name),
            Some(expected),
            "unexpected value for header {name}"
        );
        self
    }

    /// Asserts that the body is exactly this JSON value.
    ///
    /// # Panics
    ///
    /// Panics when the body is not JSON or differs.
    #[track_caller]
    pub fn assert_json(&self, expected: &Value) -> &Self {
        match self.json_value() {
            Ok(actual) => assert_eq!(&actual, expected, "unexpected JSON body"),
            Err(e) => panic!("body is not JSON ({e}): {}", String::from_utf8_lossy(&self.body)),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: &'static str) -> TestResponse {
        TestResponse::from_http(
            Response::builder()
                .status(status)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Bytes::from_static(body.as_bytes()))
                .unwrap(),
        )
    }

    #[test]
    fn test_accessors() {
        let response = response(201, r#"{"id":7}"#);
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.is_success());
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.json_value().unwrap(), json!({"id": 7}));
        assert_eq!(response.text().unwrap(), r#"{"id":7}"#);
    }

    #[test]
    fn test_assertions_chain() {
        response(200, r#"{"ok":true}"#)
            .assert_status(200u16)
            .assert_header("content-type", "application/json")
            .assert_json(&json!({"ok": true}));
    }

    #[test]
    #[should_panic(expected = "expected status 404")]
    fn test_assert_status_panics() {
        response(200, "{}").assert_status(404u16);
    }

    #[test]
    fn test_invalid_utf8() {
        let response = TestResponse::from_http(Response::new(Bytes::from_static(&[0xff, 0xfe])));
        assert!(matches!(response.text(), Err(TestError::BodyRead(_))));
    }
}

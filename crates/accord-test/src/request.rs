//! Test request building.

use accord_client::encode::encode_bracketed;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request};
use serde::Serialize;
use serde_json::Value;

use crate::error::TestError;

/// Builder for raw test requests.
///
/// Unlike [`ApiClient`](accord_client::ApiClient), nothing here consults the
/// contract, so tests can send requests a well-behaved client never would.
///
/// ```
/// use accord_test::TestRequestBuilder;
/// use http::Method;
///
/// let request = TestRequestBuilder::new(Method::GET, "/pokemon/25")
///     .query("shiny", "true")
///     .header("x-api-key", "secret")
///     .build()
///     .unwrap();
///
/// assert_eq!(request.uri(), "/pokemon/25?shiny=true");
/// ```
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    query: Vec<String>,
    headers: HeaderMap,
    body: Bytes,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a builder for `method` and `uri` (a path, optionally with a
    /// query string).
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            error: None,
        }
    }

    fn fail(mut self, error: TestError) -> Self {
        if self.error.is_none() {
            self.error = Some(error);
        }
        self
    }

    /// Sets a header, replacing any earlier value.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        let Ok(header_name) = HeaderName::try_from(name) else {
            return self.fail(TestError::InvalidHeader(name.to_string()));
        };
        let Ok(header_value) = HeaderValue::try_from(value.as_ref()) else {
            return self.fail(TestError::InvalidHeader(name.to_string()));
        };
        self.headers.insert(header_name, header_value);
        self
    }

    /// Appends a percent-encoded `name=value` query pair.
    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.query.push(format!(
            "{}={}",
            urlencoding::encode(name),
            urlencoding::encode(value)
        ));
        self
    }

    /// Appends an already-encoded query string.
    pub fn raw_query(mut self, raw: impl Into<String>) -> Self {
        self.query.push(raw.into());
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and `content-type: application/json`.
    pub fn json<T: Serialize>(self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self
                .header(CONTENT_TYPE.as_str(), "application/json")
                .body(bytes),
            Err(e) => self.fail(e.into()),
        }
    }

    /// Sets a bracket-encoded form body and the form content type.
    pub fn form(self, value: &Value) -> Self {
        self.header(CONTENT_TYPE.as_str(), "application/x-www-form-urlencoded")
            .body(encode_bracketed(value))
    }

    /// Builds the request.
    pub fn build(self) -> Result<Request<Bytes>, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut uri = self.uri;
        if !self.query.is_empty() {
            uri.push(if uri.contains('?') { '&' } else { '?' });
            uri.push_str(&self.query.join("&"));
        }

        let mut request = Request::builder()
            .method(self.method)
            .uri(uri)
            .body(self.body)?;
        *request.headers_mut() = self.headers;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_pairs() {
        let request = TestRequestBuilder::new(Method::GET, "/search?page=1")
            .query("name", "Mr Mime")
            .raw_query("tags[]=psychic")
            .build()
            .unwrap();
        assert_eq!(
            request.uri(),
            "/search?page=1&name=Mr%20Mime&tags[]=psychic"
        );
    }

    #[test]
    fn test_json_body() {
        let request = TestRequestBuilder::new(Method::POST, "/pokemon")
            .json(&json!({"name": "Eevee"}))
            .build()
            .unwrap();
        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(request.body().as_ref(), br#"{"name":"Eevee"}"#);
    }

    #[test]
    fn test_form_body() {
        let request = TestRequestBuilder::new(Method::POST, "/login")
            .form(&json!({"user": "ash", "remember": true}))
            .build()
            .unwrap();
        assert_eq!(
            request.headers()[CONTENT_TYPE],
            "application/x-www-form-urlencoded"
        );
        assert_eq!(request.body().as_ref(), b"remember=true&user=ash");
    }

    #[test]
    fn test_invalid_header_reported_at_build() {
        let result = TestRequestBuilder::new(Method::GET, "/")
            .header("bad header", "x")
            .header("x-ok", "fine")
            .build();
        assert!(matches!(result, Err(TestError::InvalidHeader(ref name)) if name == "bad header"));
    }
}

//! Response decoding and classification.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ClientError;

/// Broad outcome of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// Status 200 to 299.
    Success,
    /// Any other status.
    Error,
}

/// A decoded response.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientResponse {
    /// Status.
    pub status: StatusCode,
    /// Headers.
    pub headers: HeaderMap,
    /// Decoded body. `None` for an empty body.
    pub body: Option<Value>,
}

impl ClientResponse {
    /// Decodes a raw response.
    ///
    /// JSON content types are parsed; any other non-empty body becomes a
    /// string.
    pub fn decode(response: Response<Bytes>) -> Result<Self, ClientError> {
        let (parts, bytes) = response.into_parts();
        let body = decode_body(&parts.headers, &bytes)?;
        Ok(Self {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }

    /// Success for 200 to 299, error otherwise.
    #[must_use]
    pub fn classify(&self) -> ResponseClass {
        if self.status.is_success() {
            ResponseClass::Success
        } else {
            ResponseClass::Error
        }
    }

    /// Deserializes the body. An empty body reads as `null`.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        let value = self.body.clone().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(ClientError::Decode)
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .map(|essence| {
            let essence = essence.trim().to_ascii_lowercase();
            essence == "application/json" || essence.ends_with("+json")
        })
        .unwrap_or(false)
}

fn decode_body(headers: &HeaderMap, bytes: &Bytes) -> Result<Option<Value>, ClientError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    if is_json(headers) {
        return serde_json::from_slice(bytes).map(Some).map_err(ClientError::Decode);
    }
    Ok(Some(Value::String(String::from_utf8_lossy(bytes).into_owned())))
}

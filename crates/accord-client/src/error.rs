//! Client error types.

use accord_core::ResponseValidationError;
use http::StatusCode;
use thiserror::Error;

/// Errors raised while building, sending or decoding a request.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The contract has no route with this key.
    #[error("unknown route '{0}'")]
    UnknownRoute(String),

    /// A `:name` segment has no value.
    #[error("route '{route}': missing path param '{name}'")]
    MissingPathParam {
        /// Dotted route key.
        route: String,
        /// Parameter name.
        name: String,
    },

    /// A header name or value is not valid HTTP.
    #[error("invalid header '{0}'")]
    InvalidHeader(String),

    /// The body could not be encoded.
    #[error("failed to encode body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The response body could not be decoded.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The request could not be assembled.
    #[error("invalid request: {0}")]
    Http(#[from] http::Error),

    /// The transport failed to deliver the request.
    #[error("transport error: {0}")]
    Transport(anyhow::Error),

    /// The response status is not declared and `throw_on_unknown_status` is set.
    #[error("route '{route}' responded with undeclared status {status}")]
    UnknownStatus {
        /// Dotted route key.
        route: String,
        /// Received status.
        status: StatusCode,
    },

    /// The response body failed its declared schema.
    #[error(transparent)]
    ResponseValidation(#[from] ResponseValidationError),
}

impl ClientError {
    /// Wraps a transport failure.
    pub fn transport(error: impl Into<anyhow::Error>) -> Self {
        Self::Transport(error.into())
    }
}

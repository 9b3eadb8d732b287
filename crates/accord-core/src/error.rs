//! Error types shared across Accord crates.

use http::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use accord_router::PatternError;

/// Errors raised while building a [`Contract`](crate::Contract).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// A path template could not be parsed.
    #[error("route '{route}': {source}")]
    InvalidPath {
        /// Dotted route key.
        route: String,
        /// Parser error.
        #[source]
        source: PatternError,
    },

    /// The `path_params` schema fields differ from the template's parameters.
    #[error(
        "route '{route}': path params schema declares {schema_keys:?} but path '{path}' has {path_params:?}"
    )]
    PathParamMismatch {
        /// Dotted route key.
        route: String,
        /// Full path template.
        path: String,
        /// Parameter names in the template.
        path_params: Vec<String>,
        /// Field names in the schema.
        schema_keys: Vec<String>,
    },

    /// Method outside GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS.
    #[error("route '{route}': unsupported method {method}")]
    UnsupportedMethod {
        /// Dotted route key.
        route: String,
        /// The method.
        method: Method,
    },

    /// A route key is empty or contains `.`.
    #[error("invalid route key '{0}'")]
    InvalidKey(String),

    /// The same key was registered twice in one router.
    #[error("duplicate route key '{0}'")]
    DuplicateKey(String),
}

/// JSON error body sent by transport adapters.
///
/// ```json
/// {"error": {"code": "RESPONSE_VALIDATION_ERROR", "message": "..."}, "request_id": "..."}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Error detail.
    pub error: ErrorDetail,
    /// Request id for correlation, if known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub request_id: Option<String>,
}

/// Detail inside an [`ErrorEnvelope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Structured details.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub details: Option<serde_json::Value>,
}

impl ErrorEnvelope {
    /// Creates an envelope.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
            request_id: None,
        }
    }

    /// Attaches structured details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }

    /// Attaches a request id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

//! Dispatch and server errors.

use accord_core::{ErrorEnvelope, ResponseValidationError};
use accord_extract::RequestValidationError;
use http::StatusCode;
use thiserror::Error;

/// A request the dispatcher could not turn into a response on its own.
///
/// Transport adapters map these to responses; see
/// [`DispatchError::status_code`] and [`DispatchError::to_envelope`].
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Request validation failed and `throw_request_validation` is set.
    #[error("route '{route}': {error}")]
    RequestValidation {
        /// Dotted route key.
        route: String,
        /// Every failing part.
        error: RequestValidationError,
    },

    /// The handler's response broke the route's response contract.
    #[error(transparent)]
    ResponseValidation(#[from] ResponseValidationError),

    /// The handler failed.
    #[error("handler for route '{route}' failed: {error}")]
    Handler {
        /// Dotted route key.
        route: String,
        /// Handler failure.
        error: anyhow::Error,
    },

    /// A matched route has no bound handler.
    #[error("no handler bound for route '{0}'")]
    MissingHandler(String),

    /// The response could not be assembled.
    #[error("failed to build response: {0}")]
    Http(#[from] http::Error),

    /// The response body could not be encoded.
    #[error("failed to serialize response body: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DispatchError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RequestValidation { .. } => StatusCode::BAD_REQUEST,
            Self::ResponseValidation(_)
            | Self::Handler { .. }
            | Self::MissingHandler(_)
            | Self::Http(_)
            | Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::RequestValidation { .. } => "REQUEST_VALIDATION_ERROR",
            Self::ResponseValidation(_) => "RESPONSE_VALIDATION_ERROR",
            Self::Handler { .. } | Self::MissingHandler(_) => "INTERNAL_ERROR",
            Self::Http(_) | Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Builds the default JSON error body.
    ///
    /// Handler failures are reported without their message.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        match self {
            Self::RequestValidation { error, .. } => {
                let envelope = ErrorEnvelope::new(self.code(), self.to_string());
                match serde_json::to_value(error) {
                    Ok(details) => envelope.with_details(details),
                    Err(_) => envelope,
                }
            }
            Self::Handler { .. } | Self::MissingHandler(_) => {
                ErrorEnvelope::new(self.code(), "Internal server error")
            }
            _ => ErrorEnvelope::new(self.code(), self.to_string()),
        }
    }
}

/// Server error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    /// Failed to bind to the configured address.
    #[error("Bind error: {0}")]
    BindError(String),

    /// I/O error during server operation.
    #[error("I/O error: {0}")]
    IoError(String),
}

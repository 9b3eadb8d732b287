//! Dispatch options.

use std::fmt;
use std::sync::Arc;

use accord_extract::RequestValidationError;
use bytes::Bytes;
use http::Response;

/// Builds the response for a failed request validation.
pub type CustomErrorFn = Arc<dyn Fn(&RequestValidationError) -> Response<Bytes> + Send + Sync>;

/// How request validation failures become responses.
#[derive(Clone, Default)]
pub enum ErrorMode {
    /// `400` with only the first failing part populated, in the order path
    /// params, headers, query, body.
    #[default]
    Default,
    /// `400` with every failing part populated.
    Combined,
    /// A caller-built response.
    Custom(CustomErrorFn),
}

impl ErrorMode {
    /// Wraps a closure as [`ErrorMode::Custom`].
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&RequestValidationError) -> Response<Bytes> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }
}

impl fmt::Debug for ErrorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::Combined => f.write_str("Combined"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Options for a [`Dispatcher`](crate::Dispatcher).
///
/// ```
/// use accord_server::{DispatchOptions, ErrorMode};
///
/// let options = DispatchOptions::default()
///     .json_query(true)
///     .response_validation(true)
///     .error_mode(ErrorMode::Combined);
/// assert!(options.json_query);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    /// Parse each top-level query value as JSON.
    pub json_query: bool,
    /// Validate handler responses against the declared schemas.
    pub response_validation: bool,
    /// How request validation failures are reported.
    pub error_mode: ErrorMode,
    /// Return request validation failures as `Err` instead of a response.
    pub throw_request_validation: bool,
}

impl DispatchOptions {
    /// Sets `json_query`.
    pub fn json_query(mut self, enabled: bool) -> Self {
        self.json_query = enabled;
        self
    }

    /// Sets `response_validation`.
    pub fn response_validation(mut self, enabled: bool) -> Self {
        self.response_validation = enabled;
        self
    }

    /// Sets the error mode.
    pub fn error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Sets `throw_request_validation`.
    pub fn throw_request_validation(mut self, enabled: bool) -> Self {
        self.throw_request_validation = enabled;
        self
    }
}

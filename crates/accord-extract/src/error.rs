//! Request validation error types.

use std::fmt;

use accord_core::SchemaError;
use serde::{Deserialize, Serialize};

/// One of the four validated parts of a request, in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestPart {
    /// Path parameters.
    PathParams,
    /// Headers.
    Headers,
    /// Query parameters.
    Query,
    /// Body.
    Body,
}

impl RequestPart {
    /// All parts in check order.
    pub const ALL: [Self; 4] = [Self::PathParams, Self::Headers, Self::Query, Self::Body];

    /// Short label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PathParams => "path_params",
            Self::Headers => "headers",
            Self::Query => "query",
            Self::Body => "body",
        }
    }
}

impl fmt::Display for RequestPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failures for a request, one slot per part.
///
/// Serializes as the combined error body:
///
/// ```json
/// {
///   "pathParameterErrors": null,
///   "headerErrors": null,
///   "queryParameterErrors": null,
///   "bodyErrors": {"name": "ValidationError", "issues": [...]}
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestValidationError {
    /// Path parameter failure.
    #[serde(rename = "pathParameterErrors")]
    pub path_params: Option<SchemaError>,
    /// Header failure.
    #[serde(rename = "headerErrors")]
    pub headers: Option<SchemaError>,
    /// Query failure.
    #[serde(rename = "queryParameterErrors")]
    pub query: Option<SchemaError>,
    /// Body failure.
    #[serde(rename = "bodyErrors")]
    pub body: Option<SchemaError>,
}

impl RequestValidationError {
    /// Returns the failure for one part.
    #[must_use]
    pub fn part(&self, part: RequestPart) -> Option<&SchemaError> {
        match part {
            RequestPart::PathParams => self.path_params.as_ref(),
            RequestPart::Headers => self.headers.as_ref(),
            RequestPart::Query => self.query.as_ref(),
            RequestPart::Body => self.body.as_ref(),
        }
    }

    /// Iterates over failing parts in check order.
    pub fn failures(&self) -> impl Iterator<Item = (RequestPart, &SchemaError)> {
        RequestPart::ALL
            .into_iter()
            .filter_map(|part| self.part(part).map(|error| (part, error)))
    }

    /// Returns true if no part failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Keeps only the first failing part in check order.
    #[must_use]
    pub fn first_only(&self) -> Self {
        let mut out = Self::default();
        if let Some((part, error)) = self.failures().next() {
            let error = Some(error.clone());
            match part {
                RequestPart::PathParams => out.path_params = error,
                RequestPart::Headers => out.headers = error,
                RequestPart::Query => out.query = error,
                RequestPart::Body => out.body = error,
            }
        }
        out
    }
}

impl fmt::Display for RequestValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("request validation failed")?;
        for (i, (part, error)) in self.failures().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{part} ({error})")?;
        }
        Ok(())
    }
}

impl std::error::Error for RequestValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn failing_query_and_body() -> RequestValidationError {
        RequestValidationError {
            query: Some(SchemaError::single("bad query")),
            body: Some(SchemaError::single("bad body")),
            ..Default::default()
        }
    }

    #[test]
    fn test_serializes_all_keys() {
        let err = RequestValidationError {
            body: Some(SchemaError::single("Required")),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "pathParameterErrors": null,
                "headerErrors": null,
                "queryParameterErrors": null,
                "bodyErrors": {"name": "ValidationError", "issues": [{"message": "Required", "path": []}]}
            })
        );
    }

    #[test]
    fn test_first_only() {
        let first = failing_query_and_body().first_only();
        assert!(first.query.is_some());
        assert!(first.body.is_none());
    }

    #[test]
    fn test_failures_in_check_order() {
        let err = failing_query_and_body();
        let parts: Vec<_> = err.failures().map(|(p, _)| p).collect();
        assert_eq!(parts, [RequestPart::Query, RequestPart::Body]);
        assert!(!err.is_empty());
        assert!(RequestValidationError::default().is_empty());
    }

    #[test]
    fn test_display() {
        let err = failing_query_and_body();
        assert_eq!(
            err.to_string(),
            "request validation failed: query (ValidationError: bad query); body (ValidationError: bad body)"
        );
    }
}

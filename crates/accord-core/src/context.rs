//! Request context types.
//!
//! The [`RequestContext`] carries per-request metadata into handlers
//! alongside the validated request parts.

use std::time::Instant;

use http::{HeaderMap, Method, Uri};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contract::RouteKey;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it suitable for log correlation.
///
/// ```
/// use accord_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parses a request id supplied by the caller, e.g. from `x-request-id`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Per-request metadata handed to handlers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    route_key: RouteKey,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context for a matched request.
    #[must_use]
    pub fn new(
        request_id: RequestId,
        route_key: RouteKey,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
    ) -> Self {
        Self {
            request_id,
            route_key,
            method,
            uri,
            headers,
            started_at: Instant::now(),
        }
    }

    /// Request id.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Key of the matched route.
    #[must_use]
    pub fn route_key(&self) -> &RouteKey {
        &self.route_key
    }

    /// Request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Raw request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Time since the dispatcher matched the request.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

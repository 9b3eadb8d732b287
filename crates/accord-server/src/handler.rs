//! Handlers and the implementation-bound router.
//!
//! A handler receives the validated request parts plus the
//! [`RequestContext`] and returns an [`ApiResponse`]: a status and an
//! optional JSON body. [`HandlerError::Respond`] lets a handler stop early
//! with a typed response; the dispatcher treats it exactly like a normal
//! return.
//!
//! An [`Implementation`] binds one handler to every route of a
//! [`Contract`]. Building fails if a route has no handler or a handler
//! names a route the contract does not have.
//!
//! # Example
//!
//! ```
//! use accord_core::{RouteDescriptor, RouteTree, Shape};
//! use accord_server::{ApiResponse, Implementation};
//! use serde_json::json;
//!
//! let contract = RouteTree::new()
//!     .route(
//!         "get",
//!         RouteDescriptor::get("/pokemon/:id")
//!             .path_params(Shape::object([("id", Shape::integer().coerce())])),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let implementation = Implementation::builder(contract)
//!     .handle("get", |req, _ctx| async move {
//!         Ok(ApiResponse::ok(json!({"id": req.params["id"], "name": "Charizard"})))
//!     })
//!     .build()
//!     .unwrap();
//! assert_eq!(implementation.len(), 1);
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use accord_core::{Contract, RequestContext, ResolvedRoute};
use accord_extract::ValidatedRequest;
use http::StatusCode;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// What a handler returns: a status and an optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response body, `None` for an empty body.
    pub body: Option<Value>,
}

impl ApiResponse {
    /// Creates a response with a body.
    #[must_use]
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    /// `200 OK` with a body.
    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// A response without a body.
    #[must_use]
    pub fn empty(status: StatusCode) -> Self {
        Self { status, body: None }
    }

    /// Serializes `body` into a response.
    pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(status, serde_json::to_value(body)?))
    }
}

/// Error returned by a handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Stop early with this response. Validated and serialized like a
    /// normal return.
    #[error("handler responded early with status {}", .0.status)]
    Respond(ApiResponse),

    /// The handler failed. The dispatcher returns this as an `Err`.
    #[error(transparent)]
    Unhandled(#[from] anyhow::Error),
}

impl HandlerError {
    /// Wraps any error as [`HandlerError::Unhandled`].
    pub fn unhandled(error: impl Into<anyhow::Error>) -> Self {
        Self::Unhandled(error.into())
    }
}

impl From<ApiResponse> for HandlerError {
    fn from(response: ApiResponse) -> Self {
        Self::Respond(response)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(error: serde_json::Error) -> Self {
        Self::Unhandled(error.into())
    }
}

/// Result type returned by handlers.
pub type HandlerResult = Result<ApiResponse, HandlerError>;

/// A handler result with early responses folded in.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    /// The handler returned normally.
    Returned(ApiResponse),
    /// The handler stopped early with [`HandlerError::Respond`].
    Thrown(ApiResponse),
}

impl HandlerOutcome {
    /// Splits a handler result into an outcome or an unhandled error.
    pub fn from_result(result: HandlerResult) -> Result<Self, anyhow::Error> {
        match result {
            Ok(response) => Ok(Self::Returned(response)),
            Err(HandlerError::Respond(response)) => Ok(Self::Thrown(response)),
            Err(HandlerError::Unhandled(error)) => Err(error),
        }
    }

    /// Returns true for [`HandlerOutcome::Thrown`].
    #[must_use]
    pub fn is_thrown(&self) -> bool {
        matches!(self, Self::Thrown(_))
    }

    /// Returns the response, however it was produced.
    #[must_use]
    pub fn into_response(self) -> ApiResponse {
        match self {
            Self::Returned(response) | Self::Thrown(response) => response,
        }
    }
}

/// An async route handler.
///
/// Implemented for every `Fn(ValidatedRequest, RequestContext) -> Future`
/// closure or function.
pub trait Handler: Send + Sync + 'static {
    /// Handles one validated request.
    fn call(
        &self,
        request: ValidatedRequest,
        ctx: RequestContext,
    ) -> impl Future<Output = HandlerResult> + Send;
}

impl<F, Fut> Handler for F
where
    F: Fn(ValidatedRequest, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send,
{
    fn call(
        &self,
        request: ValidatedRequest,
        ctx: RequestContext,
    ) -> impl Future<Output = HandlerResult> + Send {
        self(request, ctx)
    }
}

/// Type alias for a boxed handler future.
pub type BoxedHandlerResult = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// A type-erased handler.
pub type ErasedHandler =
    Arc<dyn Fn(ValidatedRequest, RequestContext) -> BoxedHandlerResult + Send + Sync>;

fn erase<H: Handler>(handler: H) -> ErasedHandler {
    let handler = Arc::new(handler);
    Arc::new(move |request, ctx| {
        let handler = Arc::clone(&handler);
        Box::pin(async move { handler.call(request, ctx).await })
    })
}

/// Errors raised while binding handlers to a contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImplementationError {
    /// A route has no handler.
    #[error("no handler for route '{0}'")]
    MissingHandler(String),

    /// A handler names a route the contract does not declare.
    #[error("handler registered for unknown route '{0}'")]
    UnknownRoute(String),

    /// Two handlers were registered for one route.
    #[error("route '{0}' has more than one handler")]
    DuplicateHandler(String),
}

/// A contract with one handler bound to every route.
///
/// Handlers are stored in route order, so looking one up after a match is a
/// single index.
#[derive(Clone)]
pub struct Implementation {
    contract: Arc<Contract>,
    handlers: Vec<ErasedHandler>,
}

impl Implementation {
    /// Starts binding handlers to `contract`.
    pub fn builder(contract: impl Into<Arc<Contract>>) -> ImplementationBuilder {
        ImplementationBuilder {
            contract: contract.into(),
            handlers: IndexMap::new(),
            errors: Vec::new(),
        }
    }

    /// The bound contract.
    #[must_use]
    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Returns the handler for a matched route.
    #[must_use]
    pub fn handler(&self, route: &ResolvedRoute) -> Option<&ErasedHandler> {
        self.handlers.get(route.id().index())
    }

    /// Number of bound handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if the contract has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implementation")
            .field("routes", &self.contract.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Implementation`].
pub struct ImplementationBuilder {
    contract: Arc<Contract>,
    handlers: IndexMap<String, ErasedHandler>,
    errors: Vec<ImplementationError>,
}

impl ImplementationBuilder {
    /// Binds an async closure or function to the route with dotted key `key`.
    pub fn handle<F, Fut>(self, key: impl Into<String>, handler: F) -> Self
    where
        F: Fn(ValidatedRequest, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handle_with(key, handler)
    }

    /// Binds any [`Handler`] to the route with dotted key `key`.
    pub fn handle_with<H: Handler>(mut self, key: impl Into<String>, handler: H) -> Self {
        let key = key.into();
        if self.contract.route(&key).is_none() {
            self.errors.push(ImplementationError::UnknownRoute(key));
        } else if self.handlers.contains_key(&key) {
            self.errors.push(ImplementationError::DuplicateHandler(key));
        } else {
            self.handlers.insert(key, erase(handler));
        }
        self
    }

    /// Checks that every route has exactly one handler.
    ///
    /// Reports the first problem found: registration errors first, then the
    /// first route without a handler.
    pub fn build(mut self) -> Result<Implementation, ImplementationError> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }

        let mut handlers = Vec::with_capacity(self.contract.len());
        for route in self.contract.routes() {
            let handler = self
                .handlers
                .swap_remove(route.key().as_str())
                .ok_or_else(|| ImplementationError::MissingHandler(route.key().to_string()))?;
            handlers.push(handler);
        }

        Ok(Implementation {
            contract: self.contract,
            handlers,
        })
    }
}

//! Flattened, immutable contracts.
//!
//! A [`Contract`] is what a [`RouteTree`](crate::RouteTree) resolves into:
//! every route with its inherited headers, prefix, responses and
//! strictness already merged, stored in depth-first declaration order.
//! Matching and validation read resolved routes directly and never walk
//! the tree.

use std::fmt;

use http::{Method, StatusCode};
use indexmap::IndexMap;
use serde_json::Value;

use accord_router::{Params, PathPattern, Router};

use crate::route::{BodyEncoding, ResponseSpec, StatusKey};
use crate::Schema;

/// Index of a route in its contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(pub(crate) usize);

impl RouteId {
    /// Returns the position in depth-first declaration order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Dotted path of keys leading to a route, e.g. `pokemon.get`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteKey(String);

impl RouteKey {
    pub(crate) fn new(key: String) -> Self {
        Self(key)
    }

    /// Returns the dotted key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RouteKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A route with every inherited option merged in.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    pub(crate) id: RouteId,
    pub(crate) key: RouteKey,
    pub(crate) method: Method,
    pub(crate) pattern: PathPattern,
    pub(crate) path_params: Option<Schema>,
    pub(crate) query: Option<Schema>,
    pub(crate) body: Option<Schema>,
    pub(crate) headers: IndexMap<String, Option<Schema>>,
    pub(crate) responses: IndexMap<StatusKey, ResponseSpec>,
    pub(crate) strict_status_codes: bool,
    pub(crate) content_type: BodyEncoding,
    pub(crate) summary: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) deprecated: bool,
    pub(crate) metadata: Option<Value>,
}

impl ResolvedRoute {
    /// Route id.
    #[must_use]
    pub fn id(&self) -> RouteId {
        self.id
    }

    /// Dotted route key.
    #[must_use]
    pub fn key(&self) -> &RouteKey {
        &self.key
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Full path template, prefixes included.
    #[must_use]
    pub fn path(&self) -> &str {
        self.pattern.template()
    }

    /// Parsed path template.
    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Path params schema.
    #[must_use]
    pub fn path_params_schema(&self) -> Option<&Schema> {
        self.path_params.as_ref()
    }

    /// Query schema.
    #[must_use]
    pub fn query_schema(&self) -> Option<&Schema> {
        self.query.as_ref()
    }

    /// Body schema.
    #[must_use]
    pub fn body_schema(&self) -> Option<&Schema> {
        self.body.as_ref()
    }

    /// Declared headers with base headers merged; `None` entries are unset.
    #[must_use]
    pub fn headers(&self) -> &IndexMap<String, Option<Schema>> {
        &self.headers
    }

    /// Declared responses with common responses merged.
    #[must_use]
    pub fn responses(&self) -> &IndexMap<StatusKey, ResponseSpec> {
        &self.responses
    }

    /// Looks up the response for a status: exact entry, then `default`.
    #[must_use]
    pub fn response_for(&self, status: StatusCode) -> Option<&ResponseSpec> {
        self.responses
            .get(&StatusKey::Code(status))
            .or_else(|| self.responses.get(&StatusKey::Default))
    }

    /// Whether undeclared statuses are rejected.
    #[must_use]
    pub fn strict_status_codes(&self) -> bool {
        self.strict_status_codes
    }

    /// Request body encoding.
    #[must_use]
    pub fn content_type(&self) -> BodyEncoding {
        self.content_type
    }

    /// Summary.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Deprecation flag.
    #[must_use]
    pub fn deprecated(&self) -> bool {
        self.deprecated
    }

    /// Opaque metadata.
    #[must_use]
    pub fn metadata(&self) -> Option<&Value> {
        self.metadata.as_ref()
    }
}

/// An immutable, flattened set of routes.
#[derive(Debug, Clone)]
pub struct Contract {
    routes: Vec<ResolvedRoute>,
    by_key: IndexMap<String, RouteId>,
    router: Router<RouteId>,
}

impl Contract {
    pub(crate) fn from_routes(routes: Vec<ResolvedRoute>) -> Self {
        let mut by_key = IndexMap::with_capacity(routes.len());
        let mut router = Router::new();
        for route in &routes {
            by_key.insert(route.key.0.clone(), route.id);
            router.insert_pattern(route.method.clone(), route.pattern.clone(), route.id);
        }
        Self {
            routes,
            by_key,
            router,
        }
    }

    /// Returns all routes in declaration order.
    #[must_use]
    pub fn routes(&self) -> &[ResolvedRoute] {
        &self.routes
    }

    /// Returns a route by id.
    #[must_use]
    pub fn get(&self, id: RouteId) -> Option<&ResolvedRoute> {
        self.routes.get(id.0)
    }

    /// Returns a route by dotted key.
    #[must_use]
    pub fn route(&self, key: &str) -> Option<&ResolvedRoute> {
        self.by_key.get(key).and_then(|id| self.get(*id))
    }

    /// Number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if the contract has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterates over route keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.by_key.keys().map(String::as_str)
    }

    /// Finds the first route matching the method and raw path.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<(&ResolvedRoute, Params)> {
        let m = self.router.match_route(method, path)?;
        let route = self.get(*m.route)?;
        Some((route, m.params))
    }
}

//! Route trees and their resolution into a [`Contract`].
//!
//! A [`RouteTree`] is an ordered mapping of keys to routes or nested
//! routers. Routers carry options inherited by every descendant:
//!
//! - base headers, overridden per key by descendants (`None` unsets),
//! - a path prefix, concatenated outer first,
//! - common responses, where inner entries win and the route's own win last,
//! - a strict-status-codes default, innermost declaration wins.
//!
//! # Example
//!
//! ```
//! use accord_core::{RouteDescriptor, RouteTree, Shape};
//! use http::{Method, StatusCode};
//!
//! let contract = RouteTree::new()
//!     .path_prefix("/api")
//!     .router(
//!         "pokemon",
//!         RouteTree::new()
//!             .path_prefix("/pokemon")
//!             .route("get", RouteDescriptor::get("/:id").response(StatusCode::OK, Shape::any())),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let (route, params) = contract.match_route(&Method::GET, "/api/pokemon/25").unwrap();
//! assert_eq!(route.key().as_str(), "pokemon.get");
//! assert_eq!(params.get("id"), Some("25"));
//! ```

use http::Method;
use indexmap::IndexMap;

use accord_router::PathPattern;

use crate::contract::{Contract, ResolvedRoute, RouteId, RouteKey};
use crate::route::{ResponseSpec, RouteDescriptor, StatusKey};
use crate::{ContractError, Schema};

/// A node of a [`RouteTree`].
#[derive(Debug, Clone)]
pub enum RouteNode {
    /// A single endpoint.
    Route(RouteDescriptor),
    /// A nested router.
    Router(RouteTree),
}

/// Options a router passes down to its descendants.
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// Headers merged into every descendant route.
    pub base_headers: IndexMap<String, Option<Schema>>,
    /// Prefix prepended to every descendant path.
    pub path_prefix: String,
    /// Responses merged into every descendant route.
    pub common_responses: IndexMap<StatusKey, ResponseSpec>,
    /// Default for routes that do not set it.
    pub strict_status_codes: Option<bool>,
}

/// Ordered tree of routes and routers.
#[derive(Debug, Clone, Default)]
pub struct RouteTree {
    nodes: IndexMap<String, RouteNode>,
    options: RouterOptions,
    duplicates: Vec<String>,
}

impl RouteTree {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route under `key`.
    #[must_use]
    pub fn route(self, key: impl Into<String>, route: RouteDescriptor) -> Self {
        self.node(key.into(), RouteNode::Route(route))
    }

    /// Adds a nested router under `key`.
    #[must_use]
    pub fn router(self, key: impl Into<String>, router: RouteTree) -> Self {
        self.node(key.into(), RouteNode::Router(router))
    }

    fn node(mut self, key: String, node: RouteNode) -> Self {
        if self.nodes.contains_key(&key) {
            self.duplicates.push(key);
        } else {
            self.nodes.insert(key, node);
        }
        self
    }

    /// Adds a base header.
    #[must_use]
    pub fn base_header(mut self, name: &str, schema: impl Into<Schema>) -> Self {
        self.options
            .base_headers
            .insert(name.to_ascii_lowercase(), Some(schema.into()));
        self
    }

    /// Unsets a header inherited from an outer router.
    #[must_use]
    pub fn unset_base_header(mut self, name: &str) -> Self {
        self.options
            .base_headers
            .insert(name.to_ascii_lowercase(), None);
        self
    }

    /// Sets the path prefix.
    #[must_use]
    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.path_prefix = prefix.into();
        self
    }

    /// Adds a response merged into every descendant.
    #[must_use]
    pub fn common_response(
        mut self,
        status: impl Into<StatusKey>,
        spec: impl Into<ResponseSpec>,
    ) -> Self {
        self.options
            .common_responses
            .insert(status.into(), spec.into());
        self
    }

    /// Sets the strict-status-codes default for descendants.
    #[must_use]
    pub fn strict_status_codes(mut self, strict: bool) -> Self {
        self.options.strict_status_codes = Some(strict);
        self
    }

    /// Returns the router options.
    #[must_use]
    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    /// Iterates over direct children in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &RouteNode)> {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Resolves the tree into a flat contract.
    pub fn build(&self) -> Result<Contract, ContractError> {
        let mut routes = Vec::new();
        self.flatten(&Inherited::default(), "", &mut routes)?;
        Ok(Contract::from_routes(routes))
    }

    fn flatten(
        &self,
        outer: &Inherited,
        key_prefix: &str,
        out: &mut Vec<ResolvedRoute>,
    ) -> Result<(), ContractError> {
        if let Some(key) = self.duplicates.first() {
            return Err(ContractError::DuplicateKey(join_key(key_prefix, key)));
        }

        let inherited = outer.merge(&self.options);

        for (key, node) in &self.nodes {
            if key.is_empty() || key.contains('.') {
                return Err(ContractError::InvalidKey(join_key(key_prefix, key)));
            }
            let full_key = join_key(key_prefix, key);
            match node {
                RouteNode::Router(child) => child.flatten(&inherited, &full_key, out)?,
                RouteNode::Route(route) => {
                    let resolved = resolve(route, &inherited, full_key, RouteId(out.len()))?;
                    out.push(resolved);
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct Inherited {
    headers: IndexMap<String, Option<Schema>>,
    prefix: String,
    responses: IndexMap<StatusKey, ResponseSpec>,
    strict: Option<bool>,
}

impl Inherited {
    fn merge(&self, options: &RouterOptions) -> Self {
        let mut headers = self.headers.clone();
        for (name, schema) in &options.base_headers {
            headers.insert(name.clone(), schema.clone());
        }
        let mut responses = self.responses.clone();
        for (status, spec) in &options.common_responses {
            responses.insert(*status, spec.clone());
        }
        Self {
            headers,
            prefix: format!("{}{}", self.prefix, options.path_prefix),
            responses,
            strict: options.strict_status_codes.or(self.strict),
        }
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

const SUPPORTED_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
];

fn resolve(
    route: &RouteDescriptor,
    inherited: &Inherited,
    key: String,
    id: RouteId,
) -> Result<ResolvedRoute, ContractError> {
    if !SUPPORTED_METHODS.contains(&route.method) {
        return Err(ContractError::UnsupportedMethod {
            route: key,
            method: route.method.clone(),
        });
    }

    let full_path = format!("{}{}", inherited.prefix, route.path);
    let pattern = match PathPattern::parse(&full_path) {
        Ok(pattern) => pattern,
        Err(source) => return Err(ContractError::InvalidPath { route: key, source }),
    };

    if let Some(schema_keys) = route.path_params.as_ref().and_then(Schema::object_keys) {
        let mut path_params: Vec<String> = pattern.param_names().map(str::to_string).collect();
        let mut sorted_keys = schema_keys.clone();
        path_params.sort();
        sorted_keys.sort();
        if path_params != sorted_keys {
            return Err(ContractError::PathParamMismatch {
                route: key,
                path: full_path,
                path_params,
                schema_keys,
            });
        }
    }

    let mut headers = inherited.headers.clone();
    for (name, schema) in &route.headers {
        headers.insert(name.clone(), schema.clone());
    }

    let mut responses = inherited.responses.clone();
    for (status, spec) in &route.responses {
        responses.insert(*status, spec.clone());
    }

    Ok(ResolvedRoute {
        id,
        key: RouteKey::new(key),
        method: route.method.clone(),
        pattern,
        path_params: route.path_params.clone(),
        query: route.query.clone(),
        body: route.body.clone(),
        headers,
        responses,
        strict_status_codes: route
            .strict_status_codes
            .or(inherited.strict)
            .unwrap_or(false),
        content_type: route.content_type,
        summary: route.summary.clone(),
        description: route.description.clone(),
        deprecated: route.deprecated,
        metadata: route.metadata.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shape;
    use http::StatusCode;

    fn pokemon_tree() -> RouteTree {
        RouteTree::new()
            .base_header("X-Api-Key", Shape::string())
            .common_response(StatusCode::NOT_FOUND, Shape::object([("message", Shape::string())]))
            .router(
                "pokemon",
                RouteTree::new()
                    .path_prefix("/pokemon")
                    .strict_status_codes(true)
                    .route("list", RouteDescriptor::get("").response(StatusCode::OK, Shape::any()))
                    .route(
                        "get",
                        RouteDescriptor::get("/:id")
                            .path_params(Shape::object([("id", Shape::integer().coerce())]))
                            .response(StatusCode::OK, Shape::any()),
                    )
                    .route(
                        "create",
                        RouteDescriptor::post("")
                            .unset_header("x-api-key")
                            .strict_status_codes(false)
                            .response(StatusCode::CREATED, Shape::any()),
                    ),
            )
            .route("health", RouteDescriptor::get("/health"))
    }

    #[test]
    fn test_build_flattens_depth_first() {
        let contract = pokemon_tree().build().unwrap();
        let keys: Vec<_> = contract.keys().collect();
        assert_eq!(keys, ["pokemon.list", "pokemon.get", "pokemon.create", "health"]);
        assert_eq!(contract.route("pokemon.get").unwrap().id().index(), 1);
    }

    #[test]
    fn test_prefix_and_strictness_inherited() {
        let contract = pokemon_tree().build().unwrap();
        let get = contract.route("pokemon.get").unwrap();
        assert_eq!(get.path(), "/pokemon/:id");
        assert!(get.strict_status_codes());

        let create = contract.route("pokemon.create").unwrap();
        assert!(!create.strict_status_codes());

        let health = contract.route("health").unwrap();
        assert!(!health.strict_status_codes());
    }

    #[test]
    fn test_headers_inherited_and_unset() {
        let contract = pokemon_tree().build().unwrap();
        let get = contract.route("pokemon.get").unwrap();
        assert!(matches!(get.headers().get("x-api-key"), Some(Some(_))));

        let create = contract.route("pokemon.create").unwrap();
        assert!(matches!(create.headers().get("x-api-key"), Some(None)));
    }

    #[test]
    fn test_common_responses_merged() {
        let contract = pokemon_tree().build().unwrap();
        let get = contract.route("pokemon.get").unwrap();
        assert!(get.response_for(StatusCode::OK).is_some());
        assert!(get.response_for(StatusCode::NOT_FOUND).is_some());
        assert!(get.response_for(StatusCode::IM_A_TEAPOT).is_none());
    }

    #[test]
    fn test_route_response_overrides_common() {
        let contract = RouteTree::new()
            .common_response(StatusCode::NOT_FOUND, Shape::any())
            .route(
                "get",
                RouteDescriptor::get("/x").response(StatusCode::NOT_FOUND, ResponseSpec::NoBody),
            )
            .build()
            .unwrap();
        let route = contract.route("get").unwrap();
        assert!(matches!(
            route.response_for(StatusCode::NOT_FOUND),
            Some(ResponseSpec::NoBody)
        ));
    }

    #[test]
    fn test_default_response_wildcard() {
        let contract = RouteTree::new()
            .route(
                "get",
                RouteDescriptor::get("/x")
                    .response(StatusCode::OK, Shape::any())
                    .default_response(ResponseSpec::NoBody),
            )
            .build()
            .unwrap();
        let route = contract.route("get").unwrap();
        assert!(matches!(
            route.response_for(StatusCode::BAD_GATEWAY),
            Some(ResponseSpec::NoBody)
        ));
    }

    #[test]
    fn test_path_param_mismatch_rejected() {
        let err = RouteTree::new()
            .route(
                "get",
                RouteDescriptor::get("/pokemon/:id")
                    .path_params(Shape::object([("name", Shape::string())])),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, ContractError::PathParamMismatch { .. }));
    }

    #[test]
    fn test_invalid_path_rejected() {
        let err = RouteTree::new()
            .route("get", RouteDescriptor::get("pokemon"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ContractError::InvalidPath { .. }));
    }

    #[test]
    fn test_unsupported_method_rejected() {
        let err = RouteTree::new()
            .route("trace", RouteDescriptor::new(Method::TRACE, "/x"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ContractError::UnsupportedMethod { .. }));
    }

    #[test]
    fn test_duplicate_and_invalid_keys_rejected() {
        let err = RouteTree::new()
            .route("a", RouteDescriptor::get("/a"))
            .route("a", RouteDescriptor::get("/b"))
            .build()
            .unwrap_err();
        assert_eq!(err, ContractError::DuplicateKey("a".into()));

        let err = RouteTree::new()
            .route("a.b", RouteDescriptor::get("/a"))
            .build()
            .unwrap_err();
        assert_eq!(err, ContractError::InvalidKey("a.b".into()));
    }

    #[test]
    fn test_match_route_uses_declaration_order() {
        let contract = RouteTree::new()
            .route("byId", RouteDescriptor::get("/items/:id"))
            .route("new", RouteDescriptor::get("/items/new"))
            .build()
            .unwrap();
        let (route, params) = contract.match_route(&Method::GET, "/items/new").unwrap();
        assert_eq!(route.key().as_str(), "byId");
        assert_eq!(params.get("id"), Some("new"));
    }
}

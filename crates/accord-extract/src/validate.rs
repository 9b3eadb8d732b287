//! Request validation.
//!
//! [`validate_request`] checks the four parts of a matched request against
//! the route's schemas. All four are always computed, in the order path
//! params, headers, query, body, so a failing request reports every bad
//! part at once.

use accord_core::{
    validate_headers, validate_if_schema, ResolvedRoute, ValidateOptions, ValidationResult,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::body::parse_body;
use crate::headers::header_object;
use crate::query::parse_query;
use crate::{ExtractionContext, RequestValidationError};

/// Options that change how raw request parts are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Parse each top-level query value as JSON.
    pub json_query: bool,
}

/// The validated parts of a request.
///
/// Each part holds the schema's output, so coercions and defaults are
/// already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    /// Path parameters.
    pub params: Value,
    /// Query object.
    pub query: Value,
    /// Headers keyed by lowercase name.
    pub headers: Value,
    /// Body.
    pub body: Value,
}

impl ValidatedRequest {
    /// Returns one path parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Returns one header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&Value> {
        self.headers.get(name.to_ascii_lowercase())
    }

    /// Deserializes the path parameters.
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.params)
    }

    /// Deserializes the query.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.query)
    }

    /// Deserializes the body.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.body)
    }
}

/// Validates path params.
///
/// Captures are presented as an object of strings and extra keys pass
/// through even when the schema strips unknown fields.
pub fn validate_path_params(route: &ResolvedRoute, ctx: &ExtractionContext) -> ValidationResult {
    let captured: Map<String, Value> = ctx
        .path_params()
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    validate_if_schema(
        route.path_params_schema(),
        &Value::Object(captured),
        ValidateOptions::pass_through(),
    )
}

/// Validates declared headers.
pub fn validate_request_headers(route: &ResolvedRoute, ctx: &ExtractionContext) -> ValidationResult {
    validate_headers(route.headers(), &header_object(ctx.headers()))
}

/// Parses and validates the query string.
pub fn validate_query(
    route: &ResolvedRoute,
    ctx: &ExtractionContext,
    options: ExtractOptions,
) -> ValidationResult {
    let raw = parse_query(ctx.query_string().unwrap_or_default(), options.json_query);
    validate_if_schema(route.query_schema(), &raw, ValidateOptions::default())
}

/// Decodes and validates the body.
pub fn validate_body(route: &ResolvedRoute, ctx: &ExtractionContext) -> ValidationResult {
    let raw = parse_body(ctx.content_type(), ctx.body())?;
    validate_if_schema(route.body_schema(), &raw, ValidateOptions::default())
}

/// Validates every part of a matched request.
pub fn validate_request(
    route: &ResolvedRoute,
    ctx: &ExtractionContext,
    options: ExtractOptions,
) -> Result<ValidatedRequest, RequestValidationError> {
    let params = validate_path_params(route, ctx);
    let headers = validate_request_headers(route, ctx);
    let query = validate_query(route, ctx, options);
    let body = validate_body(route, ctx);

    match (params, headers, query, body) {
        (Ok(params), Ok(headers), Ok(query), Ok(body)) => Ok(ValidatedRequest {
            params,
            query,
            headers,
            body,
        }),
        (params, headers, query, body) => Err(RequestValidationError {
            path_params: params.err(),
            headers: headers.err(),
            query: query.err(),
            body: body.err(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_core::{Contract, RouteDescriptor, RouteTree, Shape};
    use http::{Method, Uri};
    use serde::Deserialize;
    use serde_json::json;

    fn contract() -> Contract {
        RouteTree::new()
            .route(
                "update",
                RouteDescriptor::patch("/pokemon/:id")
                    .path_params(Shape::object([("id", Shape::integer().coerce())]))
                    .header("x-api-key", Shape::string())
                    .query(Shape::object([("notify", Shape::boolean().coerce().optional())]))
                    .body(Shape::object([("name", Shape::string().min_length(1))])),
            )
            .build()
            .unwrap()
    }

    fn ctx(path_id: &str, uri: &'static str, key: Option<&str>, body: &str) -> ExtractionContext {
        let mut builder = ExtractionContext::builder()
            .method(Method::PATCH)
            .uri(Uri::from_static(uri))
            .path_param("id", path_id)
            .header("content-type", "application/json")
            .body(body.to_string());
        if let Some(key) = key {
            builder = builder.header("x-api-key", key);
        }
        builder.build()
    }

    #[test]
    fn test_valid_request() {
        let contract = contract();
        let route = contract.route("update").unwrap();
        let ctx = ctx("25", "/pokemon/25?notify=true", Some("k"), r#"{"name":"Raichu"}"#);

        let req = validate_request(route, &ctx, ExtractOptions::default()).unwrap();
        assert_eq!(req.params, json!({"id": 25}));
        assert_eq!(req.query, json!({"notify": true}));
        assert_eq!(req.body, json!({"name": "Raichu"}));
        assert_eq!(req.header("X-Api-Key"), Some(&json!("k")));
    }

    #[test]
    fn test_all_failures_reported() {
        let contract = contract();
        let route = contract.route("update").unwrap();
        let ctx = ctx("abc", "/pokemon/abc?notify=maybe", None, r#"{"name":""}"#);

        let err = validate_request(route, &ctx, ExtractOptions::default()).unwrap_err();
        assert!(err.path_params.is_some());
        assert!(err.headers.is_some());
        assert!(err.query.is_some());
        assert!(err.body.is_some());
    }

    #[test]
    fn test_only_body_fails() {
        let contract = contract();
        let route = contract.route("update").unwrap();
        let ctx = ctx("1", "/pokemon/1", Some("k"), "{not json");

        let err = validate_request(route, &ctx, ExtractOptions::default()).unwrap_err();
        assert!(err.path_params.is_none());
        assert!(err.headers.is_none());
        assert!(err.query.is_none());
        assert!(err.body.is_some());
    }

    #[test]
    fn test_json_query_mode() {
        let contract = RouteTree::new()
            .route(
                "list",
                RouteDescriptor::get("/pokemon")
                    .query(Shape::object([("page", Shape::integer())])),
            )
            .build()
            .unwrap();
        let route = contract.route("list").unwrap();
        let ctx = ExtractionContext::builder()
            .uri(Uri::from_static("/pokemon?page=3"))
            .build();

        assert!(validate_request(route, &ctx, ExtractOptions::default()).is_err());
        let req = validate_request(route, &ctx, ExtractOptions { json_query: true }).unwrap();
        assert_eq!(req.query, json!({"page": 3}));
    }

    #[test]
    fn test_unvalidated_parts_pass_through() {
        let contract = RouteTree::new()
            .route("get", RouteDescriptor::get("/things/:id"))
            .build()
            .unwrap();
        let route = contract.route("get").unwrap();
        let ctx = ExtractionContext::builder()
            .uri(Uri::from_static("/things/x?a=1"))
            .path_param("id", "x")
            .build();

        let req = validate_request(route, &ctx, ExtractOptions::default()).unwrap();
        assert_eq!(req.params, json!({"id": "x"}));
        assert_eq!(req.query, json!({"a": "1"}));
        assert_eq!(req.body, Value::Null);
    }

    #[test]
    fn test_typed_accessors() {
        #[derive(Deserialize)]
        struct Params {
            id: i64,
        }

        let contract = contract();
        let route = contract.route("update").unwrap();
        let ctx = ctx("7", "/pokemon/7", Some("k"), r#"{"name":"Eevee"}"#);
        let req = validate_request(route, &ctx, ExtractOptions::default()).unwrap();

        let params: Params = req.params_as().unwrap();
        assert_eq!(params.id, 7);
    }
}

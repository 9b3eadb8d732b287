//! Request building.
//!
//! [`build_request`] turns a route plus call arguments into a concrete
//! method, URL, header set and body, the way the server expects to read
//! them back.

use accord_core::{BodyEncoding, ResolvedRoute};
use accord_router::Segment;
use bytes::Bytes;
use http::header::{HeaderName, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method, Request};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::encode::{encode_bracketed, encode_json_query};
use crate::error::ClientError;

/// Arguments for one call.
///
/// ```
/// use accord_client::ClientArgs;
/// use serde_json::json;
///
/// let args = ClientArgs::new()
///     .param("id", 25)
///     .query(json!({"fields": ["name", "types"]}))
///     .header("x-api-key", "secret")
///     .body(json!({"nickname": "Sparky"}));
/// assert_eq!(args.params["id"], json!(25));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientArgs {
    /// Values for `:name` path segments.
    pub params: Map<String, Value>,
    /// Query object.
    pub query: Option<Value>,
    /// Per-call headers. `None` removes a base header.
    pub headers: IndexMap<String, Option<String>>,
    /// Request body.
    pub body: Option<Value>,
}

impl ClientArgs {
    /// Empty arguments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a path parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Sets the query object.
    pub fn query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    /// Sets a header for this call.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), Some(value.into()));
        self
    }

    /// Removes a base header for this call.
    pub fn unset_header(mut self, name: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), None);
        self
    }

    /// Sets the body.
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Client-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// Prefix for every request URL, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Headers sent with every request.
    pub base_headers: IndexMap<String, String>,
    /// Encode each top-level query value as JSON.
    pub json_query: bool,
    /// Validate response bodies against the route's declared schemas.
    pub validate_response: bool,
    /// Fail on statuses the route does not declare.
    pub throw_on_unknown_status: bool,
}

impl ClientOptions {
    /// Options with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Adds a base header.
    pub fn base_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.base_headers
            .insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Sets `json_query`.
    pub fn json_query(mut self, enabled: bool) -> Self {
        self.json_query = enabled;
        self
    }

    /// Sets `validate_response`.
    pub fn validate_response(mut self, enabled: bool) -> Self {
        self.validate_response = enabled;
        self
    }

    /// Sets `throw_on_unknown_status`.
    pub fn throw_on_unknown_status(mut self, enabled: bool) -> Self {
        self.throw_on_unknown_status = enabled;
        self
    }
}

/// A request ready to hand to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientRequest {
    /// Method.
    pub method: Method,
    /// Full URL: base URL, substituted path and query.
    pub url: String,
    /// Merged headers.
    pub headers: HeaderMap,
    /// Encoded body.
    pub body: Option<Bytes>,
}

impl ClientRequest {
    /// Converts into an `http::Request`.
    pub fn into_http(self) -> Result<Request<Bytes>, ClientError> {
        let mut request = Request::builder()
            .method(self.method)
            .uri(self.url)
            .body(self.body.unwrap_or_default())?;
        *request.headers_mut() = self.headers;
        Ok(request)
    }
}

fn param_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Substitutes `:name` segments with percent-encoded argument values.
pub fn substitute_path(route: &ResolvedRoute, params: &Map<String, Value>) -> Result<String, ClientError> {
    let mut path = String::new();
    for segment in route.pattern().segments() {
        path.push('/');
        match segment {
            Segment::Literal(text) => path.push_str(text),
            Segment::Param(name) => {
                let value = params.get(name).ok_or_else(|| ClientError::MissingPathParam {
                    route: route.key().to_string(),
                    name: name.clone(),
                })?;
                path.push_str(&urlencoding::encode(&param_text(value)));
            }
        }
    }
    Ok(path)
}

fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), ClientError> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ClientError::InvalidHeader(name.to_string()))?;
    let header_value =
        HeaderValue::from_str(value).map_err(|_| ClientError::InvalidHeader(name.to_string()))?;
    headers.insert(header_name, header_value);
    Ok(())
}

/// Builds the request for one call of `route`.
pub fn build_request(
    route: &ResolvedRoute,
    args: ClientArgs,
    options: &ClientOptions,
) -> Result<ClientRequest, ClientError> {
    let mut url = join_url(&options.base_url, &substitute_path(route, &args.params)?);

    if let Some(query) = &args.query {
        let encoded = if options.json_query {
            encode_json_query(query).map_err(ClientError::Encode)?
        } else {
            encode_bracketed(query)
        };
        if !encoded.is_empty() {
            url.push('?');
            url.push_str(&encoded);
        }
    }

    let mut headers = HeaderMap::new();
    for (name, value) in &options.base_headers {
        insert_header(&mut headers, name, value)?;
    }
    for (name, value) in &args.headers {
        match value {
            Some(value) => insert_header(&mut headers, name, value)?,
            None => {
                headers.remove(name.as_str());
            }
        }
    }

    let body = match args.body {
        None => None,
        Some(body) => {
            let encoding = route.content_type();
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(encoding.as_str()));
            }
            let bytes = match encoding {
                BodyEncoding::FormUrlEncoded => Bytes::from(encode_bracketed(&body)),
                BodyEncoding::Json => {
                    Bytes::from(serde_json::to_vec(&body).map_err(ClientError::Encode)?)
                }
            };
            Some(bytes)
        }
    };

    Ok(ClientRequest {
        method: route.method().clone(),
        url,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_core::{Contract, RouteDescriptor, RouteTree};
    use serde_json::json;

    fn contract() -> Contract {
        RouteTree::new()
            .route("get", RouteDescriptor::get("/pokemon/:id"))
            .route("root", RouteDescriptor::get("/"))
            .route(
                "login",
                RouteDescriptor::post("/login").content_type(BodyEncoding::FormUrlEncoded),
            )
            .route("create", RouteDescriptor::post("/pokemon"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_path_substitution() {
        let contract = contract();
        let route = contract.route("get").unwrap();
        let options = ClientOptions::new("http://localhost:8080/");

        let request = build_request(route, ClientArgs::new().param("id", 25), &options).unwrap();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url, "http://localhost:8080/pokemon/25");

        let request =
            build_request(route, ClientArgs::new().param("id", "Mr Mime"), &options).unwrap();
        assert_eq!(request.url, "http://localhost:8080/pokemon/Mr%20Mime");

        let root = contract.route("root").unwrap();
        let request = build_request(root, ClientArgs::new(), &ClientOptions::default()).unwrap();
        assert_eq!(request.url, "/");
    }

    #[test]
    fn test_missing_path_param() {
        let contract = contract();
        let route = contract.route("get").unwrap();
        let err = build_request(route, ClientArgs::new(), &ClientOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ClientError::MissingPathParam { ref name, .. } if name == "id"
        ));
    }

    #[test]
    fn test_query_modes() {
        let contract = contract();
        let route = contract.route("get").unwrap();
        let args = ClientArgs::new()
            .param("id", 1)
            .query(json!({"page": 2, "tags": ["a"]}));

        let request = build_request(route, args.clone(), &ClientOptions::default()).unwrap();
        assert_eq!(request.url, "/pokemon/1?page=2&tags[0]=a");

        let options = ClientOptions::default().json_query(true);
        let request = build_request(route, args, &options).unwrap();
        assert_eq!(request.url, "/pokemon/1?page=2&tags=%5B%22a%22%5D");

        let args = ClientArgs::new().param("id", 1).query(json!({}));
        let request = build_request(route, args, &ClientOptions::default()).unwrap();
        assert_eq!(request.url, "/pokemon/1");
    }

    #[test]
    fn test_header_merging() {
        let contract = contract();
        let route = contract.route("create").unwrap();
        let options = ClientOptions::default()
            .base_header("X-Api-Key", "base")
            .base_header("x-trace", "on");

        let args = ClientArgs::new()
            .header("x-api-key", "override")
            .unset_header("X-Trace");
        let request = build_request(route, args, &options).unwrap();
        assert_eq!(request.headers["x-api-key"], "override");
        assert!(!request.headers.contains_key("x-trace"));
        assert!(!request.headers.contains_key(CONTENT_TYPE));
    }

    #[test]
    fn test_json_body() {
        let contract = contract();
        let route = contract.route("create").unwrap();
        let request = build_request(
            route,
            ClientArgs::new().body(json!({"name": "Eevee"})),
            &ClientOptions::default(),
        )
        .unwrap();
        assert_eq!(request.headers[CONTENT_TYPE], "application/json");
        assert_eq!(request.body.unwrap().as_ref(), br#"{"name":"Eevee"}"#);

        let request = build_request(
            route,
            ClientArgs::new()
                .header("content-type", "application/merge-patch+json")
                .body(json!({})),
            &ClientOptions::default(),
        )
        .unwrap();
        assert_eq!(request.headers[CONTENT_TYPE], "application/merge-patch+json");
    }

    #[test]
    fn test_form_body() {
        let contract = contract();
        let route = contract.route("login").unwrap();
        let request = build_request(
            route,
            ClientArgs::new().body(json!({"user": "ash", "remember": true})),
            &ClientOptions::default(),
        )
        .unwrap();
        assert_eq!(
            request.headers[CONTENT_TYPE],
            "application/x-www-form-urlencoded"
        );
        assert_eq!(request.body.unwrap().as_ref(), b"remember=true&user=ash");
    }

    #[test]
    fn test_invalid_header() {
        let contract = contract();
        let route = contract.route("create").unwrap();
        let err = build_request(
            route,
            ClientArgs::new().header("bad header", "x"),
            &ClientOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::InvalidHeader(_)));
    }

    #[test]
    fn test_into_http() {
        let contract = contract();
        let route = contract.route("get").unwrap();
        let request = build_request(
            route,
            ClientArgs::new().param("id", 4).header("accept", "application/json"),
            &ClientOptions::default(),
        )
        .unwrap()
        .into_http()
        .unwrap();
        assert_eq!(request.uri().path(), "/pokemon/4");
        assert_eq!(request.headers()["accept"], "application/json");
        assert!(request.body().is_empty());
    }
}

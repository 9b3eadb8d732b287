//! Route descriptors.
//!
//! A [`RouteDescriptor`] is the declarative description of one endpoint:
//! method, path template, the schemas for each request part, and the
//! responses it may produce keyed by status.

use std::fmt;

use http::{Method, StatusCode};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Schema, Shape};

/// Response map key: a concrete status code or the `default` wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKey {
    /// An exact status code.
    Code(StatusCode),
    /// Matches any status without its own entry.
    Default,
}

impl From<StatusCode> for StatusKey {
    fn from(status: StatusCode) -> Self {
        Self::Code(status)
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{}", code.as_u16()),
            Self::Default => f.write_str("default"),
        }
    }
}

/// What a route declares for one response status.
#[derive(Debug, Clone)]
pub enum ResponseSpec {
    /// JSON body validated against the schema.
    Schema(Schema),
    /// The status carries no body.
    NoBody,
    /// A non-JSON body sent as-is with the given content type.
    Other {
        /// Content type to send.
        content_type: String,
        /// Optional schema for the body value.
        schema: Option<Schema>,
    },
}

impl ResponseSpec {
    /// A non-JSON response with no runtime check.
    #[must_use]
    pub fn other(content_type: impl Into<String>) -> Self {
        Self::Other {
            content_type: content_type.into(),
            schema: None,
        }
    }

    /// A non-JSON response validated against `schema`.
    #[must_use]
    pub fn other_with_schema(content_type: impl Into<String>, schema: impl Into<Schema>) -> Self {
        Self::Other {
            content_type: content_type.into(),
            schema: Some(schema.into()),
        }
    }
}

impl From<Schema> for ResponseSpec {
    fn from(schema: Schema) -> Self {
        Self::Schema(schema)
    }
}

impl From<Shape> for ResponseSpec {
    fn from(shape: Shape) -> Self {
        Self::Schema(shape.into())
    }
}

/// Encoding of a request body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyEncoding {
    /// `application/json`
    #[default]
    #[serde(rename = "application/json")]
    Json,
    /// `application/x-www-form-urlencoded`
    #[serde(rename = "application/x-www-form-urlencoded")]
    FormUrlEncoded,
}

impl BodyEncoding {
    /// Returns the MIME type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }
}

/// Declarative description of one endpoint.
///
/// # Example
///
/// ```
/// use accord_core::{RouteDescriptor, ResponseSpec, Shape};
/// use http::StatusCode;
///
/// let get_pokemon = RouteDescriptor::get("/pokemon/:id")
///     .path_params(Shape::object([("id", Shape::integer().coerce())]))
///     .response(StatusCode::OK, Shape::object([("name", Shape::string())]))
///     .response(StatusCode::NOT_FOUND, ResponseSpec::NoBody)
///     .summary("Get a pokemon by id");
///
/// assert_eq!(get_pokemon.path(), "/pokemon/:id");
/// ```
#[derive(Debug, Clone)]
pub struct RouteDescriptor {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) path_params: Option<Schema>,
    pub(crate) query: Option<Schema>,
    pub(crate) body: Option<Schema>,
    pub(crate) headers: IndexMap<String, Option<Schema>>,
    pub(crate) responses: IndexMap<StatusKey, ResponseSpec>,
    pub(crate) strict_status_codes: Option<bool>,
    pub(crate) content_type: BodyEncoding,
    pub(crate) summary: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) deprecated: bool,
    pub(crate) metadata: Option<Value>,
}

macro_rules! method_constructor {
    ($name:ident, $method:ident) => {
        #[doc = concat!("A `", stringify!($method), "` route.")]
        #[must_use]
        pub fn $name(path: impl Into<String>) -> Self {
            Self::new(Method::$method, path)
        }
    };
}

impl RouteDescriptor {
    /// Creates a route with no schemas and no responses.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            path_params: None,
            query: None,
            body: None,
            headers: IndexMap::new(),
            responses: IndexMap::new(),
            strict_status_codes: None,
            content_type: BodyEncoding::Json,
            summary: None,
            description: None,
            deprecated: false,
            metadata: None,
        }
    }

    method_constructor!(get, GET);
    method_constructor!(post, POST);
    method_constructor!(put, PUT);
    method_constructor!(patch, PATCH);
    method_constructor!(delete, DELETE);
    method_constructor!(head, HEAD);
    method_constructor!(options, OPTIONS);

    /// Schema for the captured path parameters.
    #[must_use]
    pub fn path_params(mut self, schema: impl Into<Schema>) -> Self {
        self.path_params = Some(schema.into());
        self
    }

    /// Schema for the parsed query object.
    #[must_use]
    pub fn query(mut self, schema: impl Into<Schema>) -> Self {
        self.query = Some(schema.into());
        self
    }

    /// Schema for the request body.
    #[must_use]
    pub fn body(mut self, schema: impl Into<Schema>) -> Self {
        self.body = Some(schema.into());
        self
    }

    /// Declares a header. Names are case-insensitive.
    #[must_use]
    pub fn header(mut self, name: &str, schema: impl Into<Schema>) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), Some(schema.into()));
        self
    }

    /// Removes an inherited base header from this route.
    #[must_use]
    pub fn unset_header(mut self, name: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), None);
        self
    }

    /// Declares a response for an exact status.
    #[must_use]
    pub fn response(mut self, status: StatusCode, spec: impl Into<ResponseSpec>) -> Self {
        self.responses.insert(StatusKey::Code(status), spec.into());
        self
    }

    /// Declares the response used for any status without its own entry.
    #[must_use]
    pub fn default_response(mut self, spec: impl Into<ResponseSpec>) -> Self {
        self.responses.insert(StatusKey::Default, spec.into());
        self
    }

    /// Overrides the inherited strict-status-codes setting.
    #[must_use]
    pub fn strict_status_codes(mut self, strict: bool) -> Self {
        self.strict_status_codes = Some(strict);
        self
    }

    /// Sets the request body encoding.
    #[must_use]
    pub fn content_type(mut self, encoding: BodyEncoding) -> Self {
        self.content_type = encoding;
        self
    }

    /// Short summary.
    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Longer description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the route deprecated.
    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Opaque metadata carried through to the resolved route.
    #[must_use]
    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path template as declared (before any prefix).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

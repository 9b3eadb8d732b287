//! # Accord Core
//!
//! Contract model and validation primitives for Accord.
//!
//! - [`RouteDescriptor`] / [`RouteTree`] - declarative route trees
//! - [`Contract`] / [`ResolvedRoute`] - the tree flattened with inheritance applied
//! - [`Schema`] / [`validate_if_schema`] - pluggable schema adapter
//! - [`Shape`] - built-in schema library
//! - [`validate_response`] - response checking against declared statuses
//! - [`RequestContext`] / [`RequestId`] - per-request metadata

#![doc(html_root_url = "https://docs.rs/accord-core/0.1.0")]

mod context;
pub mod contract;
mod error;
pub mod response;
pub mod route;
pub mod schema;
mod shape;
pub mod tree;

pub use context::{RequestContext, RequestId};
pub use contract::{Contract, ResolvedRoute, RouteId, RouteKey};
pub use error::{ContractError, ErrorDetail, ErrorEnvelope};
pub use response::{check_status, validate_response, ResponseValidationError};
pub use route::{BodyEncoding, ResponseSpec, RouteDescriptor, StatusKey};
pub use schema::{
    validate_headers, validate_if_schema, Issue, LegacyValidator, PathItem, SafeParse, Schema,
    SchemaError, StandardOutcome, StandardValidator, TypeMarker, ValidateOptions,
    ValidationResult,
};
pub use shape::{Shape, UnknownKeys};
pub use tree::{RouteNode, RouteTree, RouterOptions};

pub use accord_router::Params;

//! # Accord Extract
//!
//! Reads the raw parts of a matched request and validates them against the
//! route's schemas.
//!
//! - [`ExtractionContext`] - raw method, URI, headers, body and path captures
//! - [`query`] - bracket-notation and JSON query parsing
//! - [`validate_request`] - validates path params, headers, query and body
//! - [`RequestValidationError`] - per-part failures, serializable as the
//!   combined error body

#![doc(html_root_url = "https://docs.rs/accord-extract/0.1.0")]

pub mod body;
mod context;
mod error;
pub mod headers;
pub mod query;
mod validate;

pub use context::{ExtractionContext, ExtractionContextBuilder};
pub use error::{RequestPart, RequestValidationError};
pub use validate::{
    validate_body, validate_path_params, validate_query, validate_request,
    validate_request_headers, ExtractOptions, ValidatedRequest,
};

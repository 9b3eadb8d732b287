//! # Accord Client
//!
//! Builds requests from a [`Contract`](accord_core::Contract) route and
//! decodes the responses.
//!
//! - [`build_request`] - path substitution, query and body encoding, header
//!   merging
//! - [`encode`] - bracket and JSON query encoding, the inverse of the
//!   server's parsing
//! - [`ApiClient`] - calls routes by key over any [`Transport`]
//! - [`ClientResponse`] - decoded body plus success/error classification
//!
//! # Example
//!
//! ```rust,ignore
//! use accord_client::{ApiClient, ClientArgs, ClientOptions};
//!
//! let client = ApiClient::new(contract, transport, ClientOptions::new("http://localhost:8080"));
//! let response = client
//!     .call("pokemon.get", ClientArgs::new().param("id", 25))
//!     .await?;
//! ```

#![doc(html_root_url = "https://docs.rs/accord-client/0.1.0")]

mod client;
pub mod encode;
mod error;
mod request;
mod response;

pub use client::{ApiClient, Transport};
pub use error::ClientError;
pub use request::{build_request, substitute_path, ClientArgs, ClientOptions, ClientRequest};
pub use response::{ClientResponse, ResponseClass};

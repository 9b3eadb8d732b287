//! # Accord Test
//!
//! In-memory testing for Accord implementations: requests go through the
//! full dispatch path of a [`Server`](accord_server::Server) without binding
//! a port.
//!
//! - [`TestClient`] - raw requests, plus a [`Transport`](accord_client::Transport)
//!   so an [`ApiClient`](accord_client::ApiClient) can call the same server
//! - [`TestRequestBuilder`] - requests a contract-aware client would refuse
//!   to build
//! - [`TestResponse`] - status, header and JSON assertions
//!
//! ## Example
//!
//! ```ignore
//! use accord_test::TestClient;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn get_pokemon() {
//!     let client = TestClient::from_implementation(implementation(), DispatchOptions::default());
//!
//!     client
//!         .get("/pokemon/1")
//!         .send()
//!         .await
//!         .assert_status(200u16)
//!         .assert_json(&json!({"id": 1, "name": "Charizard"}));
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/accord-test/0.1.0")]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest, TEST_BASE_URL};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;

//! # Accord Server
//!
//! Serves a [`Contract`](accord_core::Contract) by binding a handler to each
//! route and dispatching requests through validation.
//!
//! - [`Implementation`] - one handler per route, checked at build time
//! - [`Dispatcher`] - match, validate, handle, check the response, serialize
//! - [`DispatchOptions`] - JSON query mode, response validation, error mode
//! - [`Server`] - hyper HTTP/1.1 adapter with graceful shutdown
//!
//! # Example
//!
//! ```rust,ignore
//! use accord_core::{RouteDescriptor, RouteTree, Shape};
//! use accord_server::{ApiResponse, DispatchOptions, Dispatcher, Implementation, Server, ServerConfig};
//! use serde_json::json;
//!
//! let contract = RouteTree::new()
//!     .route(
//!         "get",
//!         RouteDescriptor::get("/pokemon/:id")
//!             .path_params(Shape::object([("id", Shape::integer().coerce())])),
//!     )
//!     .build()?;
//!
//! let implementation = Implementation::builder(contract)
//!     .handle("get", |req, _ctx| async move {
//!         Ok(ApiResponse::ok(json!({"id": req.params["id"], "name": "Charizard"})))
//!     })
//!     .build()?;
//!
//! let dispatcher = Dispatcher::new(implementation, DispatchOptions::default());
//! Server::new(dispatcher, ServerConfig::default()).run().await?;
//! ```

#![doc(html_root_url = "https://docs.rs/accord-server/0.1.0")]

mod config;
mod dispatch;
mod error;
mod handler;
mod options;
mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR};
pub use dispatch::{Dispatcher, REQUEST_ID_HEADER};
pub use error::{DispatchError, ServerError};
pub use handler::{
    ApiResponse, BoxedHandlerResult, ErasedHandler, Handler, HandlerError, HandlerOutcome,
    HandlerResult, Implementation, ImplementationBuilder, ImplementationError,
};
pub use options::{CustomErrorFn, DispatchOptions, ErrorMode};
pub use server::{ErrorHandler, HttpResponse, Server};
pub use shutdown::ShutdownSignal;

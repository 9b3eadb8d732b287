//! # Accord
//!
//! **Contract-first RPC over HTTP**
//!
//! One route contract, shared by the server and its clients:
//!
//! - **Contracts** - route trees with path, query, header and body schemas,
//!   declared responses, and inherited router options
//! - **Validated dispatch** - requests are checked before the handler runs;
//!   responses can be checked before they are sent
//! - **Clients** - requests built from the same contract, with query
//!   encoding that the server parses back
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use accord::prelude::*;
//! use http::StatusCode;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let contract = RouteTree::new()
//!         .router(
//!             "pokemon",
//!             RouteTree::new().path_prefix("/pokemon").route(
//!                 "get",
//!                 RouteDescriptor::get("/:id")
//!                     .path_params(Shape::object([("id", Shape::number().coerce())]))
//!                     .response(StatusCode::OK, Shape::any()),
//!             ),
//!         )
//!         .build()?;
//!
//!     let implementation = Implementation::builder(contract)
//!         .handle("pokemon.get", |req: ValidatedRequest, _ctx| async move {
//!             Ok(ApiResponse::ok(json!({"id": req.params["id"], "name": "Charizard"})))
//!         })
//!         .build()?;
//!
//!     let config = ConfigLoader::new()
//!         .with_optional_file("accord.toml")?
//!         .with_env_prefix("ACCORD")
//!         .load()?;
//!     init_logging(&config.log_config())?;
//!
//!     let dispatcher = Dispatcher::new(implementation, config.dispatch_options());
//!     Server::new(dispatcher, config.server_config()).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Request flow
//!
//! ```text
//! Request → match route → validate params/headers/query/body → handler
//!                                                                 ↓
//! Response ← serialize ← check status / validate body ←───────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/accord/0.1.0")]

// Re-export contract types
pub use accord_core as core;

// Re-export path matching
pub use accord_router as router;

// Re-export request extraction
pub use accord_extract as extract;

// Re-export dispatch and transport
pub use accord_server as server;

// Re-export the client
pub use accord_client as client;

// Re-export configuration
pub use accord_config as config;

// Re-export logging and metrics
pub use accord_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use accord::prelude::*;
/// ```
pub mod prelude {
    pub use accord_core::{
        BodyEncoding, Contract, ContractError, RequestContext, RequestId, ResponseSpec,
        RouteDescriptor, RouteTree, Schema, SchemaError, Shape, StatusKey,
    };

    pub use accord_extract::{RequestValidationError, ValidatedRequest};

    pub use accord_server::{
        ApiResponse, DispatchError, DispatchOptions, Dispatcher, ErrorMode, HandlerError,
        HandlerResult, Implementation, Server, ServerConfig, ShutdownSignal,
    };

    pub use accord_client::{ApiClient, ClientArgs, ClientError, ClientOptions, ClientResponse, Transport};

    pub use accord_config::{AccordConfig, ConfigLoader};

    pub use accord_telemetry::{init_logging, LogConfig};
}

//! Typed configuration for Accord servers.
//!
//! Supports:
//! - TOML and JSON configuration files
//! - Environment variable overrides, with optional `.env` loading
//! - Strict parsing (fails on unknown fields)
//! - Layering (defaults → file → env)
//!
//! [`AccordConfig`] has three sections:
//!
//! - [`ServerSettings`] - bind address and timeouts
//! - [`ValidationConfig`] - query mode, response validation, error format
//! - [`LoggingConfig`] - filter directive and output format
//!
//! Each section converts into the runtime type it configures:
//! `accord_server::ServerConfig`, `accord_server::DispatchOptions` and
//! `accord_telemetry::LogConfig`.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//!
//! [validation]
//! json_query = false
//! validate_responses = true
//! error_format = "combined"
//! throw_request_validation = false
//!
//! [logging]
//! level = "info,accord_server=debug"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Keys use the format `PREFIX__SECTION__KEY`:
//!
//! - `ACCORD__SERVER__HTTP_ADDR=0.0.0.0:9000`
//! - `ACCORD__VALIDATION__JSON_QUERY=true`
//! - `ACCORD__LOGGING__LEVEL=debug`

mod config;
mod error;
mod loader;
mod schema;

pub use config::AccordConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{ErrorFormat, LogFormat, LoggingConfig, ServerSettings, ValidationConfig};

//! Observability for Accord services.
//!
//! - **Logging**: [`init_logging`] installs a `tracing-subscriber` registry
//!   with an env filter and JSON or pretty output.
//! - **Metrics**: recording helpers over the `metrics` facade, used by the
//!   dispatcher and the transport adapter. See [`metrics`](crate::metrics)
//!   for the metric table.
//!
//! Exporters (Prometheus, OTLP, ...) are not installed here. A host that
//! wants them installs a `metrics` recorder, then calls
//! [`describe_metrics`].
//!
//! # Example
//!
//! ```rust,ignore
//! use accord_telemetry::{describe_metrics, init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//! describe_metrics();
//! ```

pub mod error;
pub mod logging;
pub mod metrics;

pub use crate::error::TelemetryError;
pub use crate::logging::{create_env_filter, init_logging, LogConfig};
pub use crate::metrics::{
    describe_metrics, record_request, record_request_validation_failure,
    record_response_validation_failure, InFlightGuard,
};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

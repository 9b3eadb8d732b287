//! Configuration section types and their conversions into runtime settings.

use std::time::Duration;

use accord_server::{DispatchOptions, ErrorMode, ServerConfig};
use accord_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

/// HTTP transport settings.
///
/// # Example
///
/// ```
/// use accord_config::ServerSettings;
///
/// let settings = ServerSettings {
///     http_addr: "127.0.0.1:3000".to_string(),
///     ..Default::default()
/// };
/// let config: accord_server::ServerConfig = (&settings).into();
/// assert_eq!(config.http_addr(), "127.0.0.1:3000");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSettings {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Limit for reading and dispatching one request, in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

fn default_http_addr() -> String {
    accord_server::DEFAULT_HTTP_ADDR.to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    30_000
}

impl From<&ServerSettings> for ServerConfig {
    fn from(settings: &ServerSettings) -> Self {
        ServerConfig::builder()
            .http_addr(settings.http_addr.clone())
            .shutdown_timeout(Duration::from_secs(settings.shutdown_timeout_secs))
            .request_timeout(Duration::from_millis(settings.request_timeout_ms))
            .build()
    }
}

/// Shape of request validation error responses.
///
/// Custom error responses are code-only and have no configuration form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ErrorFormat {
    /// Only the first failing part.
    #[default]
    Default,
    /// Every failing part.
    Combined,
}

/// Request and response validation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Parse each top-level query value as JSON.
    #[serde(default)]
    pub json_query: bool,

    /// Validate handler responses against the declared schemas.
    #[serde(default)]
    pub validate_responses: bool,

    /// Shape of the `400` body for request validation failures.
    #[serde(default)]
    pub error_format: ErrorFormat,

    /// Surface request validation failures as errors instead of responses.
    #[serde(default)]
    pub throw_request_validation: bool,
}

impl From<&ValidationConfig> for DispatchOptions {
    fn from(config: &ValidationConfig) -> Self {
        let mode = match config.error_format {
            ErrorFormat::Default => ErrorMode::Default,
            ErrorFormat::Combined => ErrorMode::Combined,
        };
        DispatchOptions::default()
            .json_query(config.json_query)
            .response_validation(config.validate_responses)
            .error_mode(mode)
            .throw_request_validation(config.throw_request_validation)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Structured JSON output.
    #[default]
    Json,
    /// Human-readable output.
    Pretty,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (e.g., "info", "accord_server=debug").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Log span open and close events.
    #[serde(default)]
    pub span_events: bool,

    /// Include file and line.
    #[serde(default)]
    pub include_location: bool,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include the event target.
    #[serde(default = "default_true")]
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::Json,
            span_events: false,
            include_location: false,
            thread_ids: false,
            include_target: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        LogConfig {
            enabled: config.enabled,
            level: config.level.clone(),
            json_format: config.format == LogFormat::Json,
            span_events: config.span_events,
            file_line_info: config.include_location,
            thread_ids: config.thread_ids,
            include_target: config.include_target,
        }
    }
}

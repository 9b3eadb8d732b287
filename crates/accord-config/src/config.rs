//! Root configuration type.

use accord_server::{DispatchOptions, ServerConfig};
use accord_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, LogFormat, LoggingConfig, ServerSettings, ValidationConfig};

/// Complete Accord server configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to layer files and environment
/// variables on top of the defaults.
///
/// # Example
///
/// ```
/// use accord_config::AccordConfig;
///
/// let config = AccordConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(!config.validation.json_query);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct AccordConfig {
    /// HTTP transport settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Request and response validation settings.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AccordConfig {
    /// Checks values that deserialize but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if:
    /// - `server.http_addr` is not a socket address
    /// - `server.request_timeout_ms` is zero
    /// - `logging.level` is not a valid filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.logging.enabled {
            accord_telemetry::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        Ok(())
    }

    /// Debug-level pretty logs with file locations, response validation on.
    ///
    /// ```
    /// use accord_config::AccordConfig;
    ///
    /// let config = AccordConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// assert!(config.validation.validate_responses);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.span_events = true;
        config.logging.include_location = true;

        config.validation.validate_responses = true;

        config
    }

    /// Info-level JSON logs, response validation off.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.validation.validate_responses = false;

        config
    }

    /// Settings for [`Server`](accord_server::Server).
    #[must_use]
    pub fn server_config(&self) -> ServerConfig {
        (&self.server).into()
    }

    /// Options for [`Dispatcher`](accord_server::Dispatcher).
    #[must_use]
    pub fn dispatch_options(&self) -> DispatchOptions {
        (&self.validation).into()
    }

    /// Settings for [`init_logging`](accord_telemetry::init_logging).
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        (&self.logging).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AccordConfig::default().validate().is_ok());
        assert!(AccordConfig::development().validate().is_ok());
        assert!(AccordConfig::production().validate().is_ok());
    }

    #[test]
    fn test_invalid_addr() {
        let mut config = AccordConfig::default();
        config.server.http_addr = "localhost".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "server.http_addr"));
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = AccordConfig::default();
        config.server.request_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_log_level() {
        let mut config = AccordConfig::default();
        config.logging.level = "accord=notalevel".to_string();
        assert!(config.validate().is_err());

        config.logging.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let dev = AccordConfig::development();
        assert_eq!(dev.logging.format, LogFormat::Pretty);
        assert!(dev.log_config().span_events);

        let prod = AccordConfig::production();
        assert_eq!(prod.log_config(), LogConfig::production());
        assert!(!prod.dispatch_options().response_validation);
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result = toml::from_str::<AccordConfig>("[telemetry]\nenabled = true\n");
        assert!(result.is_err());
    }
}

//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::{AccordConfig, ConfigError, ErrorFormat, LogFormat};

/// Loads an [`AccordConfig`] in layers, later layers overriding earlier ones:
///
/// 1. Defaults or a preset
/// 2. Configuration files or strings (TOML or JSON), merged key by key
/// 3. Environment variables `PREFIX__SECTION__KEY`
///
/// # Example
///
/// ```no_run
/// use accord_config::ConfigLoader;
///
/// # fn main() -> Result<(), accord_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_optional_file("accord.toml")?
///     .with_dotenv()?
///     .with_env_prefix("ACCORD")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: AccordConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader starting from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: AccordConfig::default(),
            env_prefix: None,
        }
    }

    /// Reset to the default configuration.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = AccordConfig::default();
        self
    }

    /// Start from the development preset.
    ///
    /// ```
    /// use accord_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = AccordConfig::development();
        self
    }

    /// Start from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = AccordConfig::production();
        self
    }

    /// Merge a configuration file. The format follows the extension
    /// (`.toml` or `.json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing or unreadable, has an
    /// unsupported extension, does not parse, or contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        self.with_string(&content, format)
    }

    /// Merge a configuration file if it exists.
    ///
    /// # Errors
    ///
    /// Same as [`with_file`](Self::with_file) when the file exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Merge configuration text in the given format (`"toml"` or `"json"`).
    ///
    /// Only the keys present in `content` change; everything else keeps its
    /// current value.
    ///
    /// ```
    /// use accord_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .with_string("[server]\nhttp_addr = \"127.0.0.1:3000\"\n", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.http_addr, "127.0.0.1:3000");
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an unsupported format, a parse error, or
    /// unknown fields.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer: Value = match format.to_ascii_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        let mut merged = serde_json::to_value(&self.config)?;
        merge_values(&mut merged, layer);
        self.config = serde_json::from_value(merged)?;
        Ok(self)
    }

    /// Enable environment overrides with the given prefix.
    ///
    /// With prefix `ACCORD`, `ACCORD__SERVER__HTTP_ADDR=0.0.0.0:9000`
    /// overrides `server.http_addr`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load `.env` from the current directory into the process environment,
    /// if present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Dotenv`] if the file exists but cannot be
    /// parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Load a specific env file into the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Dotenv`] if the file is missing or malformed.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref())?;
        Ok(self)
    }

    /// Apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override does not parse or validation
    /// fails.
    ///
    /// ```
    /// use accord_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().load().unwrap();
    /// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
    /// ```
    pub fn load(mut self) -> Result<AccordConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix, env::vars())?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Return the configuration without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> AccordConfig {
        self.config
    }

    fn apply_env_overrides<I>(&mut self, prefix: &str, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let marker = format!("{prefix}__");
        let mut vars: Vec<(String, String)> = vars
            .into_iter()
            .filter(|(k, _)| k.starts_with(&marker))
            .collect();
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, &marker)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, marker: &str) -> Result<(), ConfigError> {
        let Some(path) = key.strip_prefix(marker) else {
            return Ok(());
        };
        let parts: Vec<&str> = path.split("__").collect();

        let expect_bool = || {
            parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
        };
        let expect_u64 = || {
            value
                .parse::<u64>()
                .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
        };

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => self.config.server.http_addr = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                self.config.server.shutdown_timeout_secs = expect_u64()?;
            }
            ["SERVER", "REQUEST_TIMEOUT_MS"] => {
                self.config.server.request_timeout_ms = expect_u64()?;
            }

            ["VALIDATION", "JSON_QUERY"] => self.config.validation.json_query = expect_bool()?,
            ["VALIDATION", "VALIDATE_RESPONSES"] => {
                self.config.validation.validate_responses = expect_bool()?;
            }
            ["VALIDATION", "THROW_REQUEST_VALIDATION"] => {
                self.config.validation.throw_request_validation = expect_bool()?;
            }
            ["VALIDATION", "ERROR_FORMAT"] => {
                self.config.validation.error_format = match value.to_lowercase().as_str() {
                    "default" => ErrorFormat::Default,
                    "combined" => ErrorFormat::Combined,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'default' or 'combined'",
                        ))
                    }
                };
            }

            ["LOGGING", "ENABLED"] => self.config.logging.enabled = expect_bool()?,
            ["LOGGING", "LEVEL"] => self.config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "SPAN_EVENTS"] => self.config.logging.span_events = expect_bool()?,
            ["LOGGING", "INCLUDE_LOCATION"] => {
                self.config.logging.include_location = expect_bool()?;
            }
            ["LOGGING", "THREAD_IDS"] => self.config.logging.thread_ids = expect_bool()?,
            ["LOGGING", "INCLUDE_TARGET"] => self.config.logging.include_target = expect_bool()?,

            _ => {}
        }

        Ok(())
    }
}

/// Overlays `layer` onto `base`. Objects merge recursively; anything else
/// replaces.
fn merge_values(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, AccordConfig::default());
    }

    #[test]
    fn test_loader_with_production() {
        let config = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_string_merges_over_preset() {
        let json = r#"{"validation": {"json_query": true}}"#;
        let config = ConfigLoader::new()
            .with_development()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();

        assert!(config.validation.json_query);
        assert!(config.validation.validate_responses);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_unknown_field_in_layer() {
        let result = ConfigLoader::new().with_string("[server]\nport = 80\n", "toml");
        assert!(matches!(result, Err(ConfigError::JsonError(_))));
    }

    #[test]
    fn test_unsupported_format() {
        let result = ConfigLoader::new().with_string("a: 1", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ref f)) if f == "yaml"));
    }

    #[test]
    fn test_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/accord.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));

        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/accord.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.http_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_env_overrides() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_overrides(
                "TEST",
                vars(&[
                    ("TEST__SERVER__HTTP_ADDR", "127.0.0.1:9000"),
                    ("TEST__SERVER__REQUEST_TIMEOUT_MS", "250"),
                    ("TEST__VALIDATION__JSON_QUERY", "yes"),
                    ("TEST__VALIDATION__ERROR_FORMAT", "Combined"),
                    ("TEST__LOGGING__FORMAT", "pretty"),
                    ("OTHER__SERVER__HTTP_ADDR", "10.0.0.1:1"),
                    ("TESTING__SERVER__HTTP_ADDR", "10.0.0.2:1"),
                ]),
            )
            .unwrap();

        let config = loader.load_unvalidated();
        assert_eq!(config.server.http_addr, "127.0.0.1:9000");
        assert_eq!(config.server.request_timeout_ms, 250);
        assert!(config.validation.json_query);
        assert_eq!(config.validation.error_format, ErrorFormat::Combined);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_env_parse_errors() {
        let mut loader = ConfigLoader::new();
        let err = loader
            .apply_env_overrides("TEST", vars(&[("TEST__SERVER__SHUTDOWN_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvParseError { ref var, .. } if var == "TEST__SERVER__SHUTDOWN_TIMEOUT_SECS"));

        let result =
            loader.apply_env_overrides("TEST", vars(&[("TEST__LOGGING__ENABLED", "maybe")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_env_key_ignored() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_overrides("TEST", vars(&[("TEST__SERVER__WORKERS", "4")]))
            .unwrap();
        assert_eq!(loader.load_unvalidated(), AccordConfig::default());
    }

    #[test]
    fn test_merge_values() {
        let mut base = json!({"a": {"b": 1, "c": 2}, "d": [1, 2]});
        merge_values(&mut base, json!({"a": {"c": 3}, "d": [9], "e": true}));
        assert_eq!(base, json!({"a": {"b": 1, "c": 3}, "d": [9], "e": true}));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("Off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }
}

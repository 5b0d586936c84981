//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, `.env` files and environment variables.

use std::env;
use std::fs;
use std::path::Path;

use serde_json::Value;
use vitruvius_params::ConverterRegistry;

use crate::{ConfigError, VitruviusConfig};

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (or a preset)
/// 2. Configuration files (TOML or JSON), merged key by key
/// 3. Environment variables
///
/// Tables merge recursively; arrays (such as `actions`) are replaced whole.
///
/// # Example
///
/// ```no_run
/// use vitruvius_config::ConfigLoader;
///
/// # fn main() -> Result<(), vitruvius_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("vitruvius.toml")?
///     .with_dotenv()?
///     .with_env_prefix("VITRUVIUS")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: VitruviusConfig,
    env_prefix: Option<String>,
    converters: ConverterRegistry,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: VitruviusConfig::default(),
            env_prefix: None,
            converters: ConverterRegistry::default(),
        }
    }

    /// Start with default configuration values.
    ///
    /// This is called automatically by `new()`, but can be chained for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = VitruviusConfig::default();
        self
    }

    /// Start with development preset configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use vitruvius_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = VitruviusConfig::development();
        self
    }

    /// Start with production preset configuration.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = VitruviusConfig::production();
        self
    }

    /// Use a converter registry when validating action declarations.
    ///
    /// Needed when declarations name application-registered converters.
    #[must_use]
    pub fn with_converters(mut self, converters: ConverterRegistry) -> Self {
        self.converters = converters;
        self
    }

    /// Merge a configuration file.
    ///
    /// Supports TOML (.toml) and JSON (.json) formats.
    /// The file format is determined by the file extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        let format = match extension.as_deref() {
            Some(format @ ("toml" | "json")) => format,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration file format: {}",
                    path.display()
                )))
            }
        };

        tracing::debug!(path = %path.display(), "loading configuration file");
        self.with_string(&content, format)
    }

    /// Merge an optional configuration file.
    ///
    /// If the file exists, loads it. If not, silently continues.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Merge configuration from a string.
    ///
    /// # Arguments
    ///
    /// * `content` - Configuration content as a string
    /// * `format` - File format ("toml" or "json")
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the content has unknown fields.
    ///
    /// # Example
    ///
    /// ```
    /// use vitruvius_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [dispatch]
    ///     max_body_bytes = 4096
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.dispatch.max_body_bytes, 4096);
    /// assert_eq!(config.dispatch.request_id_header, "x-request-id");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer: Value = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };

        self.merge_layer(layer)?;
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`.
    /// For example, with prefix "VITRUVIUS":
    /// - `VITRUVIUS__DISPATCH__MAX_BODY_BYTES=2097152`
    /// - `VITRUVIUS__TELEMETRY__LOGGING__LEVEL=debug`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file from the current directory or its parents.
    ///
    /// A missing file is not an error. Variables already set in the
    /// environment are not overridden.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "loaded dotenv file");
                Ok(self)
            }
            Err(error) if error.not_found() => Ok(self),
            Err(error) => Err(error.into()),
        }
    }

    /// Load a specific `.env` file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing or cannot be parsed.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref())?;
        Ok(self)
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the final configuration, compiling every declared action.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Environment variable parsing fails
    /// - Configuration validation fails
    pub fn load(mut self) -> Result<VitruviusConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate_with(&self.converters)?;

        tracing::debug!(
            actions = self.config.actions.len(),
            max_body_bytes = self.config.dispatch.max_body_bytes,
            "configuration loaded"
        );
        Ok(self.config)
    }

    /// Finalize without validation.
    #[must_use]
    pub fn load_unvalidated(self) -> VitruviusConfig {
        self.config
    }

    fn merge_layer(&mut self, layer: Value) -> Result<(), ConfigError> {
        let mut merged = serde_json::to_value(&self.config)?;
        merge_values(&mut merged, layer);
        self.config = serde_json::from_value(merged)?;
        Ok(())
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let mut vars: Vec<(String, String)> = env::vars()
            .filter(|(key, _)| {
                key.strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with("__"))
            })
            .collect();
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let dispatch = &mut self.config.dispatch;
        let logging = &mut self.config.telemetry.logging;
        let metrics = &mut self.config.telemetry.metrics;

        match parts.as_slice() {
            // Dispatch section
            ["DISPATCH", "MAX_BODY_BYTES"] => {
                dispatch.max_body_bytes = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["DISPATCH", "GENERIC_ERROR_MESSAGE"] => {
                dispatch.generic_error_message = value.to_string();
            }
            ["DISPATCH", "REQUEST_ID_HEADER"] => {
                dispatch.request_id_header = value.to_lowercase();
            }
            ["DISPATCH", "PROPAGATE_REQUEST_ID"] => {
                dispatch.propagate_request_id = parse_bool(key, value)?;
            }

            // Telemetry logging
            ["TELEMETRY", "LOGGING", "ENABLED"] => logging.enabled = parse_bool(key, value)?,
            ["TELEMETRY", "LOGGING", "LEVEL"] => logging.level = value.to_string(),
            ["TELEMETRY", "LOGGING", "JSON_FORMAT"] => {
                logging.json_format = parse_bool(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "SPAN_EVENTS"] => {
                logging.span_events = parse_bool(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "FILE_LINE_INFO"] => {
                logging.file_line_info = parse_bool(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "THREAD_IDS"] => logging.thread_ids = parse_bool(key, value)?,
            ["TELEMETRY", "LOGGING", "INCLUDE_TARGET"] => {
                logging.include_target = parse_bool(key, value)?;
            }

            // Telemetry metrics
            ["TELEMETRY", "METRICS", "ENABLED"] => metrics.enabled = parse_bool(key, value)?,
            ["TELEMETRY", "METRICS", "DURATION_BUCKETS"] => {
                metrics.duration_buckets = value
                    .split(',')
                    .map(|bucket| bucket.trim().parse::<f64>())
                    .collect::<Result<_, _>>()
                    .map_err(|_| {
                        ConfigError::env_parse_error(key, "expected comma-separated floats")
                    })?;
            }

            _ => tracing::warn!(var = key, "ignoring unknown configuration variable"),
        }

        Ok(())
    }
}

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

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_parse_error(key, "expected boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, VitruviusConfig::default());
    }

    #[test]
    fn test_loader_with_development() {
        let config = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(config.telemetry.logging.level, "debug");
        assert!(!config.telemetry.logging.json_format);
    }

    #[test]
    fn test_string_layer_keeps_preset_values() {
        let config = ConfigLoader::new()
            .with_development()
            .with_string(r#"{"dispatch": {"max_body_bytes": 10}}"#, "json")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.dispatch.max_body_bytes, 10);
        assert_eq!(config.telemetry.logging.level, "debug");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = ConfigLoader::new().with_string("[dispatch]\nmax_body = 1\n", "toml");
        assert!(matches!(result, Err(ConfigError::JsonError(_))));
    }

    #[test]
    fn test_unsupported_format() {
        let result = ConfigLoader::new().with_string("a: 1", "yaml");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/vitruvius.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/vitruvius.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.dispatch.max_body_bytes, 1024 * 1024);
    }

    #[test]
    fn test_merge_values() {
        let mut base = json!({"a": {"b": 1, "c": 2}, "list": [1, 2]});
        merge_values(&mut base, json!({"a": {"c": 3}, "list": [9], "new": true}));
        assert_eq!(base, json!({"a": {"b": 1, "c": 3}, "list": [9], "new": true}));
    }

    #[test]
    fn test_parse_bool() {
        for value in ["true", "True", "1", "yes", "ON"] {
            assert!(parse_bool("K", value).unwrap());
        }
        for value in ["false", "FALSE", "0", "no", "off"] {
            assert!(!parse_bool("K", value).unwrap());
        }
        assert!(parse_bool("K", "maybe").is_err());
        assert!(parse_bool("K", "").is_err());
    }

    #[test]
    fn test_apply_env_var_dispatch() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__DISPATCH__MAX_BODY_BYTES", "2048", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__DISPATCH__PROPAGATE_REQUEST_ID", "off", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__DISPATCH__REQUEST_ID_HEADER", "X-Correlation-Id", "TEST")
            .unwrap();

        assert_eq!(loader.config.dispatch.max_body_bytes, 2048);
        assert!(!loader.config.dispatch.propagate_request_id);
        assert_eq!(loader.config.dispatch.request_id_header, "x-correlation-id");
    }

    #[test]
    fn test_apply_env_var_telemetry() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__TELEMETRY__LOGGING__LEVEL", "trace", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__TELEMETRY__METRICS__DURATION_BUCKETS", "0.01, 0.1,1", "TEST")
            .unwrap();

        assert_eq!(loader.config.telemetry.logging.level, "trace");
        assert_eq!(loader.config.telemetry.metrics.duration_buckets, [0.01, 0.1, 1.0]);
    }

    #[test]
    fn test_apply_env_var_invalid_integer() {
        let mut loader = ConfigLoader::new();
        let result = loader.apply_env_var("TEST__DISPATCH__MAX_BODY_BYTES", "lots", "TEST");
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));
    }

    #[test]
    fn test_apply_env_var_unknown_is_ignored() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__DISPATCH__NOPE", "1", "TEST")
            .unwrap();
        assert_eq!(loader.config, VitruviusConfig::default());
    }
}

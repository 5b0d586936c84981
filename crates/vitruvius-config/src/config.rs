//! Main configuration types.
//!
//! This module provides the top-level [`VitruviusConfig`] struct and its builder.

use std::collections::HashSet;

use http::HeaderName;
use serde::{Deserialize, Serialize};
use vitruvius_action::{ActionDecl, DefinitionError, DispatchConfig, ErrorSet};
use vitruvius_params::{ConverterRegistry, ParamsSchema};
use vitruvius_telemetry::TelemetryConfig;

use crate::ConfigError;

/// Complete Vitruvius configuration.
///
/// This is the root configuration type that contains all configuration sections.
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use vitruvius_config::VitruviusConfig;
///
/// let config = VitruviusConfig::default();
/// assert_eq!(config.dispatch.max_body_bytes, 1024 * 1024);
/// assert!(config.actions.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct VitruviusConfig {
    /// Dispatcher configuration.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Telemetry configuration (logging, metrics).
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Declared actions: parameter trees and error declarations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionDecl>,
}

impl VitruviusConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use vitruvius_action::{ActionDecl, DispatchConfig};
    /// use vitruvius_config::VitruviusConfig;
    ///
    /// let config = VitruviusConfig::builder()
    ///     .dispatch(DispatchConfig::default().with_max_body_bytes(4096))
    ///     .action(ActionDecl::new("health"))
    ///     .build();
    ///
    /// assert_eq!(config.dispatch.max_body_bytes, 4096);
    /// assert!(config.action("health").is_some());
    /// ```
    #[must_use]
    pub fn builder() -> VitruviusConfigBuilder {
        VitruviusConfigBuilder::new()
    }

    /// Create a development configuration preset.
    ///
    /// Pretty logs at `debug`, no Prometheus recorder.
    ///
    /// # Example
    ///
    /// ```
    /// use vitruvius_config::VitruviusConfig;
    ///
    /// let config = VitruviusConfig::development();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// assert!(!config.telemetry.metrics.enabled);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        Self {
            dispatch: DispatchConfig::default(),
            telemetry: TelemetryConfig::development(),
            actions: Vec::new(),
        }
    }

    /// Create a production configuration preset.
    ///
    /// JSON logs at `info`, Prometheus recorder enabled.
    ///
    /// # Example
    ///
    /// ```
    /// use vitruvius_config::VitruviusConfig;
    ///
    /// let config = VitruviusConfig::production();
    /// assert!(config.telemetry.logging.json_format);
    /// assert!(config.telemetry.metrics.enabled);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        Self {
            dispatch: DispatchConfig::default(),
            telemetry: TelemetryConfig::production(),
            actions: Vec::new(),
        }
    }

    /// Looks up an action declaration by id.
    #[must_use]
    pub fn action(&self, id: &str) -> Option<&ActionDecl> {
        self.actions.iter().find(|action| action.id == id)
    }

    /// Validate the configuration against the built-in converters.
    ///
    /// # Errors
    ///
    /// See [`validate_with`](Self::validate_with).
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_with(&ConverterRegistry::default())
    }

    /// Validate the configuration.
    ///
    /// Every declared action is compiled against `converters`, so a
    /// declaration that would fail at startup fails here instead.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `dispatch.max_body_bytes` is zero
    /// - `dispatch.generic_error_message` is empty
    /// - `dispatch.request_id_header` is not a valid header name
    /// - logging is enabled with an empty level
    /// - metrics are enabled with empty, non-positive or unsorted buckets
    /// - an action id is empty or repeated
    /// - an action's parameter tree or error declarations do not compile
    pub fn validate_with(&self, converters: &ConverterRegistry) -> Result<(), ConfigError> {
        if self.dispatch.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "dispatch.max_body_bytes",
                "must be greater than 0",
            ));
        }

        if self.dispatch.generic_error_message.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "dispatch.generic_error_message",
                "must not be empty",
            ));
        }

        // Empty disables request ID propagation.
        if !self.dispatch.request_id_header.is_empty()
            && HeaderName::from_bytes(self.dispatch.request_id_header.as_bytes()).is_err()
        {
            return Err(ConfigError::invalid_value(
                "dispatch.request_id_header",
                format!("invalid header name: {}", self.dispatch.request_id_header),
            ));
        }

        let logging = &self.telemetry.logging;
        if logging.enabled && logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "telemetry.logging.level",
                "must not be empty when logging is enabled",
            ));
        }

        let metrics = &self.telemetry.metrics;
        if metrics.enabled {
            validate_buckets(&metrics.duration_buckets)?;
        }

        self.validate_actions(converters)
    }

    fn validate_actions(&self, converters: &ConverterRegistry) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for action in &self.actions {
            if action.id.is_empty() {
                return Err(DefinitionError::EmptyId.into());
            }
            if !seen.insert(action.id.as_str()) {
                return Err(DefinitionError::DuplicateAction {
                    action: action.id.clone(),
                }
                .into());
            }

            ParamsSchema::compile(&action.params, converters).map_err(|source| {
                DefinitionError::Schema {
                    action: action.id.clone(),
                    source,
                }
            })?;
            ErrorSet::compile(&action.id, &action.errors)?;
        }
        Ok(())
    }
}

fn validate_buckets(buckets: &[f64]) -> Result<(), ConfigError> {
    const FIELD: &str = "telemetry.metrics.duration_buckets";

    if buckets.is_empty() {
        return Err(ConfigError::invalid_value(FIELD, "must not be empty"));
    }
    if buckets.iter().any(|bucket| !bucket.is_finite() || *bucket <= 0.0) {
        return Err(ConfigError::invalid_value(
            FIELD,
            "buckets must be finite and positive",
        ));
    }
    if buckets.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(ConfigError::invalid_value(
            FIELD,
            "buckets must be strictly increasing",
        ));
    }
    Ok(())
}

/// Builder for [`VitruviusConfig`].
#[derive(Debug, Default)]
pub struct VitruviusConfigBuilder {
    dispatch: Option<DispatchConfig>,
    telemetry: Option<TelemetryConfig>,
    actions: Vec<ActionDecl>,
}

impl VitruviusConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dispatcher configuration.
    #[must_use]
    pub fn dispatch(mut self, dispatch: DispatchConfig) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Set the telemetry configuration.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetryConfig) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Add an action declaration.
    #[must_use]
    pub fn action(mut self, action: ActionDecl) -> Self {
        self.actions.push(action);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> VitruviusConfig {
        VitruviusConfig {
            dispatch: self.dispatch.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
            actions: self.actions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitruvius_action::ErrorDecl;
    use vitruvius_params::{FieldDecl, ParamsDecl, SourceDecl};

    fn users_update() -> ActionDecl {
        ActionDecl::new("users.update")
            .with_params(
                ParamsDecl::new()
                    .with_path(SourceDecl::new(vec![FieldDecl::int("id")]))
                    .with_json(SourceDecl::new(vec![FieldDecl::string("name")])),
            )
            .with_error(ErrorDecl::new("UserNotFound", 404).with_payload(["id"]))
    }

    #[test]
    fn test_default_is_valid() {
        assert!(VitruviusConfig::default().validate().is_ok());
        assert!(VitruviusConfig::development().validate().is_ok());
        assert!(VitruviusConfig::production().validate().is_ok());
    }

    #[test]
    fn test_zero_body_limit_rejected() {
        let config = VitruviusConfig::builder()
            .dispatch(DispatchConfig::default().with_max_body_bytes(0))
            .build();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "dispatch.max_body_bytes"));
    }

    #[test]
    fn test_request_id_header_may_be_empty() {
        let mut config = VitruviusConfig::default();
        config.dispatch.request_id_header = String::new();
        assert!(config.validate().is_ok());

        config.dispatch.request_id_header = "bad header".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsorted_buckets_rejected() {
        let mut config = VitruviusConfig::production();
        config.telemetry.metrics.duration_buckets = vec![0.1, 0.05];
        assert!(config.validate().is_err());

        // Ignored when metrics are off.
        config.telemetry.metrics.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_actions_are_compiled() {
        let config = VitruviusConfig::builder().action(users_update()).build();
        assert!(config.validate().is_ok());
        assert_eq!(config.action("users.update").unwrap().errors.len(), 1);
        assert!(config.action("users.delete").is_none());
    }

    #[test]
    fn test_duplicate_action_rejected() {
        let config = VitruviusConfig::builder()
            .action(users_update())
            .action(users_update())
            .build();

        let err = config.validate().unwrap_err();
        assert_eq!(err.action(), Some("users.update"));
    }

    #[test]
    fn test_bad_error_code_rejected() {
        let config = VitruviusConfig::builder()
            .action(ActionDecl::new("x").with_error(ErrorDecl::new("Weird", 200)))
            .build();

        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::Action(DefinitionError::InvalidErrorCode { code: 200, .. })
        ));
    }

    #[test]
    fn test_unknown_converter_needs_registry() {
        let action = ActionDecl::new("x").with_params(ParamsDecl::new().with_query(
            SourceDecl::new(vec![FieldDecl::string("name").with_converter("shout")]),
        ));
        let config = VitruviusConfig::builder().action(action).build();

        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::Action(DefinitionError::Schema { .. })
        ));
    }
}

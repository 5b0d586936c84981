//! Dispatcher configuration.

use serde::{Deserialize, Serialize};

/// Default request body limit (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Default generic message for undeclared errors.
pub const DEFAULT_GENERIC_ERROR_MESSAGE: &str = "Internal Server Error";

/// Default request ID header.
pub const DEFAULT_REQUEST_ID_HEADER: &str = "x-request-id";

/// Dispatcher settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Message rendered for every undeclared error.
    pub generic_error_message: String,

    /// Header carrying the request ID in both directions.
    pub request_id_header: String,

    /// Whether to adopt a valid incoming request ID instead of generating one.
    pub propagate_request_id: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            generic_error_message: DEFAULT_GENERIC_ERROR_MESSAGE.to_string(),
            request_id_header: DEFAULT_REQUEST_ID_HEADER.to_string(),
            propagate_request_id: true,
        }
    }
}

impl DispatchConfig {
    /// Sets the body limit.
    #[must_use]
    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    /// Sets the generic error message.
    #[must_use]
    pub fn with_generic_error_message(mut self, message: impl Into<String>) -> Self {
        self.generic_error_message = message.into();
        self
    }

    /// Sets whether incoming request IDs are adopted.
    #[must_use]
    pub fn with_propagate_request_id(mut self, propagate: bool) -> Self {
        self.propagate_request_id = propagate;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DispatchConfig::default();
        assert_eq!(config.max_body_bytes, 1_048_576);
        assert_eq!(config.generic_error_message, "Internal Server Error");
        assert_eq!(config.request_id_header, "x-request-id");
        assert!(config.propagate_request_id);
    }

    #[test]
    fn test_partial_deserialize() {
        let config: DispatchConfig = serde_json::from_str(r#"{"max_body_bytes": 10}"#).unwrap();
        assert_eq!(config.max_body_bytes, 10);
        assert!(config.propagate_request_id);
    }
}

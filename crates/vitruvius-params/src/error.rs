//! Binding error types.
//!
//! A [`BindingError`] is raised when request data cannot be bound to the
//! declared parameter schema. It always identifies the source and, where one
//! exists, the offending field path. Binding errors are expected conditions:
//! they map to 400-class responses and are never reported as bugs.

use crate::SourceKind;
use http::StatusCode;
use serde_json::json;
use std::fmt;
use thiserror::Error;
use vitruvius_core::ClassifiedError;

/// The kind of binding failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingErrorKind {
    /// A field with no default and no nilability was absent.
    MissingRequiredField,
    /// A present value could not be parsed as the declared type.
    TypeMismatch,
    /// The raw input could not be parsed into a tree at all.
    MalformedInput,
    /// The request body exceeded the configured limit.
    PayloadTooLarge,
}

impl BindingErrorKind {
    /// Returns the name rendered in error bodies.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MissingRequiredField => "MissingRequiredField",
            Self::TypeMismatch => "TypeMismatch",
            Self::MalformedInput => "MalformedInput",
            Self::PayloadTooLarge => "PayloadTooLarge",
        }
    }

    /// Returns a snake_case label for metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingRequiredField => "missing_required_field",
            Self::TypeMismatch => "type_mismatch",
            Self::MalformedInput => "malformed_input",
            Self::PayloadTooLarge => "payload_too_large",
        }
    }
}

impl fmt::Display for BindingErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error that occurs while binding request data.
///
/// # Example
///
/// ```rust
/// use vitruvius_params::{BindingError, BindingErrorKind, SourceKind};
/// use http::StatusCode;
///
/// let err = BindingError::missing(SourceKind::Query, "page");
/// assert_eq!(err.kind(), BindingErrorKind::MissingRequiredField);
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// assert_eq!(err.field(), Some("page"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct BindingError {
    source_kind: SourceKind,
    kind: BindingErrorKind,
    field: Option<String>,
    raw_value: Option<String>,
    message: String,
}

impl BindingError {
    /// Creates an error for a missing required field.
    #[must_use]
    pub fn missing(source: SourceKind, field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            source_kind: source,
            kind: BindingErrorKind::MissingRequiredField,
            message: format!("missing required {source} parameter: {field}"),
            field: Some(field),
            raw_value: None,
        }
    }

    /// Creates an error for a value that does not parse as the declared type.
    ///
    /// `field` is `None` when the whole source tree has the wrong shape.
    #[must_use]
    pub fn type_mismatch(
        source: SourceKind,
        field: Option<String>,
        raw_value: impl Into<String>,
        expected: impl fmt::Display,
    ) -> Self {
        let raw_value = raw_value.into();
        let message = match &field {
            Some(field) => {
                format!("invalid {source} parameter '{field}': {expected}, got '{raw_value}'")
            }
            None => format!("invalid {source} parameters: {expected}"),
        };
        Self {
            source_kind: source,
            kind: BindingErrorKind::TypeMismatch,
            field,
            raw_value: Some(raw_value),
            message,
        }
    }

    /// Creates an error for input that could not be parsed into a raw tree.
    #[must_use]
    pub fn malformed(source: SourceKind, details: impl fmt::Display) -> Self {
        Self {
            source_kind: source,
            kind: BindingErrorKind::MalformedInput,
            field: None,
            raw_value: None,
            message: format!("malformed {source} input: {details}"),
        }
    }

    /// Creates a malformed-input error attributed to a specific key.
    #[must_use]
    pub fn malformed_at(
        source: SourceKind,
        field: impl Into<String>,
        details: impl fmt::Display,
    ) -> Self {
        let field = field.into();
        Self {
            source_kind: source,
            kind: BindingErrorKind::MalformedInput,
            message: format!("malformed {source} parameter '{field}': {details}"),
            field: Some(field),
            raw_value: None,
        }
    }

    /// Creates an error for a body over the configured limit.
    #[must_use]
    pub fn payload_too_large(source: SourceKind, max_size: usize) -> Self {
        Self {
            source_kind: source,
            kind: BindingErrorKind::PayloadTooLarge,
            field: None,
            raw_value: None,
            message: format!("payload too large: max {max_size} bytes"),
        }
    }

    /// Returns the source being bound when the error occurred.
    #[must_use]
    pub fn source_kind(&self) -> SourceKind {
        self.source_kind
    }

    /// Returns the failure kind.
    #[must_use]
    pub fn kind(&self) -> BindingErrorKind {
        self.kind
    }

    /// Returns the field path if applicable.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns the offending raw value for type mismatches.
    #[must_use]
    pub fn raw_value(&self) -> Option<&str> {
        self.raw_value.as_deref()
    }

    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            BindingErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            BindingErrorKind::MissingRequiredField
            | BindingErrorKind::TypeMismatch
            | BindingErrorKind::MalformedInput => StatusCode::BAD_REQUEST,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            BindingErrorKind::MissingRequiredField => "MISSING_PARAMETER",
            BindingErrorKind::TypeMismatch => "INVALID_PARAMETER",
            BindingErrorKind::MalformedInput => "MALFORMED_INPUT",
            BindingErrorKind::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
        }
    }

    /// Converts this error into the renderer-facing classified form.
    #[must_use]
    pub fn to_classified(&self) -> ClassifiedError {
        let mut payload = json!({ "source": self.source_kind.as_str() });
        if let Some(field) = &self.field {
            payload["field"] = json!(field);
        }
        if let Some(raw) = &self.raw_value {
            payload["value"] = json!(raw);
        }
        ClassifiedError::binding(
            self.status_code(),
            self.kind.name(),
            self.message.clone(),
            Some(payload),
        )
    }
}

impl From<BindingError> for ClassifiedError {
    fn from(err: BindingError) -> Self {
        err.to_classified()
    }
}

//! Classified errors.
//!
//! Every failed dispatch ends in exactly one [`ClassifiedError`]. The
//! classification decides what the client may see:
//!
//! | Class | Status | Body |
//! |---|---|---|
//! | [`ErrorClass::Binding`] | 400-class | binding kind, offending field path |
//! | [`ErrorClass::Declared`] | declared code | declared name, message, payload |
//! | [`ErrorClass::Undeclared`] | 500 | generic name and message only |
//!
//! Detail about undeclared failures never reaches this type; it is handed to
//! the logging collaborator before classification.

use crate::RequestId;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name rendered for every undeclared failure.
pub const UNDECLARED_ERROR_NAME: &str = "InternalServerError";

/// The three terminal error classes of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Request data could not be bound to the declared parameters.
    Binding,
    /// An error the action declared up front.
    Declared,
    /// Anything else.
    Undeclared,
}

impl ErrorClass {
    /// Label used for metrics and log fields.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Binding => "binding_error",
            Self::Declared => "declared_error",
            Self::Undeclared => "undeclared_error",
        }
    }
}

/// A failure ready to be rendered.
///
/// # Example
///
/// ```
/// use vitruvius_core::{ClassifiedError, ErrorClass};
/// use http::StatusCode;
/// use serde_json::json;
///
/// let err = ClassifiedError::declared(
///     StatusCode::NOT_FOUND,
///     "UserNotFound",
///     "user 7 not found",
///     Some(json!({"id": 7})),
/// );
///
/// assert_eq!(err.class(), ErrorClass::Declared);
/// assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{name} ({status}): {message}")]
pub struct ClassifiedError {
    class: ErrorClass,
    status: StatusCode,
    name: String,
    message: String,
    payload: Option<serde_json::Value>,
}

impl ClassifiedError {
    /// Creates a binding failure.
    #[must_use]
    pub fn binding(
        status: StatusCode,
        name: impl Into<String>,
        message: impl Into<String>,
        payload: Option<serde_json::Value>,
    ) -> Self {
        Self {
            class: ErrorClass::Binding,
            status,
            name: name.into(),
            message: message.into(),
            payload,
        }
    }

    /// Creates a declared failure.
    #[must_use]
    pub fn declared(
        status: StatusCode,
        name: impl Into<String>,
        message: impl Into<String>,
        payload: Option<serde_json::Value>,
    ) -> Self {
        Self {
            class: ErrorClass::Declared,
            status,
            name: name.into(),
            message: message.into(),
            payload,
        }
    }

    /// Creates the generic undeclared failure.
    ///
    /// Only the configured generic message is carried; there is no payload.
    #[must_use]
    pub fn undeclared(message: impl Into<String>) -> Self {
        Self {
            class: ErrorClass::Undeclared,
            status: StatusCode::INTERNAL_SERVER_ERROR,
            name: UNDECLARED_ERROR_NAME.to_string(),
            message: message.into(),
            payload: None,
        }
    }

    /// Returns the error class.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        self.class
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Returns the error name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the structured payload, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&serde_json::Value> {
        self.payload.as_ref()
    }

    /// Returns `true` for binding and declared errors.
    #[must_use]
    pub const fn is_expected(&self) -> bool {
        !matches!(self.class, ErrorClass::Undeclared)
    }

    /// Converts this error to its serializable body.
    #[must_use]
    pub fn to_body(&self, request_id: Option<RequestId>) -> ErrorBody {
        ErrorBody {
            name: self.name.clone(),
            code: self.status.as_u16(),
            message: self.message.clone(),
            payload: self.payload.clone(),
            request_id: request_id.map(|id| id.to_string()),
        }
    }
}

/// Serializable error body for HTTP responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error name (declared name, binding kind, or the generic name).
    pub name: String,
    /// HTTP status code.
    pub code: u16,
    /// Human-readable message.
    pub message: String,
    /// Structured payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// The request ID for correlation with logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

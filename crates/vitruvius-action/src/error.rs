//! Startup-time definition errors.

use thiserror::Error;
use vitruvius_params::SchemaError;

/// Errors raised while compiling action definitions.
///
/// All of these surface at startup; none can occur during a dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// The action id is empty.
    #[error("action id must not be empty")]
    EmptyId,

    /// The parameter declarations did not compile.
    #[error("action '{action}': {source}")]
    Schema {
        /// Action id.
        action: String,
        /// Underlying schema error.
        #[source]
        source: SchemaError,
    },

    /// An error declaration has an empty name.
    #[error("action '{action}': error declaration with empty name")]
    EmptyErrorName {
        /// Action id.
        action: String,
    },

    /// An error declaration's status is not a client or server error.
    #[error("action '{action}': error '{name}' has status {code}, expected 400..=599")]
    InvalidErrorCode {
        /// Action id.
        action: String,
        /// Error name.
        name: String,
        /// Declared code.
        code: u16,
    },

    /// Two error declarations share a name.
    #[error("action '{action}': error '{name}' declared more than once")]
    DuplicateError {
        /// Action id.
        action: String,
        /// Error name.
        name: String,
    },

    /// A message template is malformed.
    #[error("action '{action}': error '{name}' message template: {reason}")]
    InvalidTemplate {
        /// Action id.
        action: String,
        /// Error name.
        name: String,
        /// What is wrong with the template.
        reason: String,
    },

    /// No body was supplied to the builder.
    #[error("action '{action}' has no body")]
    MissingBody {
        /// Action id.
        action: String,
    },

    /// Two definitions share an id in one registry.
    #[error("action '{action}' registered more than once")]
    DuplicateAction {
        /// Action id.
        action: String,
    },
}

impl DefinitionError {
    /// Returns the action id the error refers to, if any.
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        match self {
            Self::EmptyId => None,
            Self::Schema { action, .. }
            | Self::EmptyErrorName { action }
            | Self::InvalidErrorCode { action, .. }
            | Self::DuplicateError { action, .. }
            | Self::InvalidTemplate { action, .. }
            | Self::MissingBody { action }
            | Self::DuplicateAction { action } => Some(action),
        }
    }
}

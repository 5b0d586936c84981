//! Serde declaration surface for actions.
//!
//! These are the shapes read from configuration. They are compiled into an
//! [`ActionDefinition`](crate::ActionDefinition) once, at startup.

use serde::{Deserialize, Serialize};
use vitruvius_params::ParamsDecl;

/// Declaration of one expected error.
///
/// ```toml
/// [[actions.errors]]
/// name = "UserNotFound"
/// code = 404
/// payload = ["id"]
/// message = "user {id} not found"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorDecl {
    /// Name matched against [`Raise::Named`](crate::Raise::Named).
    pub name: String,

    /// HTTP status code, 400..=599.
    pub code: u16,

    /// Raised fields copied into the response payload, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payload: Vec<String>,

    /// Message template; `{field}` placeholders must name payload fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorDecl {
    /// Declares an error with no payload and the default message.
    #[must_use]
    pub fn new(name: impl Into<String>, code: u16) -> Self {
        Self {
            name: name.into(),
            code,
            payload: Vec::new(),
            message: None,
        }
    }

    /// Sets the payload field list.
    #[must_use]
    pub fn with_payload<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.payload = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the message template.
    #[must_use]
    pub fn with_message(mut self, template: impl Into<String>) -> Self {
        self.message = Some(template.into());
        self
    }
}

/// Declaration of one action: its identity, parameters and errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionDecl {
    /// Action identity, e.g. `users.update`.
    pub id: String,

    /// Parameter declarations per source.
    #[serde(default)]
    pub params: ParamsDecl,

    /// Expected errors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorDecl>,
}

impl ActionDecl {
    /// Creates a declaration with no params and no errors.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sets the parameter declarations.
    #[must_use]
    pub fn with_params(mut self, params: ParamsDecl) -> Self {
        self.params = params;
        self
    }

    /// Adds an error declaration.
    #[must_use]
    pub fn with_error(mut self, error: ErrorDecl) -> Self {
        self.errors.push(error);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_decl_from_json() {
        let decl: ActionDecl = serde_json::from_value(json!({
            "id": "users.show",
            "params": {"path": {"fields": [{"name": "id", "type": "int"}]}},
            "errors": [{"name": "UserNotFound", "code": 404, "payload": ["id"]}]
        }))
        .unwrap();

        assert_eq!(decl.id, "users.show");
        assert!(decl.params.path.is_some());
        assert_eq!(decl.errors[0], ErrorDecl::new("UserNotFound", 404).with_payload(["id"]));
    }

    #[test]
    fn test_unknown_error_key_rejected() {
        let result: Result<ErrorDecl, _> =
            serde_json::from_value(json!({"name": "X", "code": 404, "status": 404}));
        assert!(result.is_err());
    }

    #[test]
    fn test_minimal_action_decl() {
        let decl: ActionDecl = serde_json::from_value(json!({"id": "health"})).unwrap();
        assert_eq!(decl, ActionDecl::new("health"));
    }
}

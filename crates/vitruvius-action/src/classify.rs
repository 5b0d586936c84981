//! Error classification.
//!
//! Every raise that escapes a hook or an action body ends up here. A named
//! raise whose name is in the action's [`ErrorSet`] becomes a *declared*
//! [`ClassifiedError`] carrying the declared status, message and payload.
//! Everything else is *undeclared*: the client sees only the generic 500
//! body, and the detail goes to the [`ErrorSink`](crate::ErrorSink).

use crate::template::MessageTemplate;
use crate::{DefinitionError, ErrorDecl, Raise};
use http::StatusCode;
use serde_json::{Map, Value};
use std::collections::HashMap;
use vitruvius_core::ClassifiedError;

/// A compiled error declaration.
#[derive(Debug, Clone)]
pub struct ErrorDeclaration {
    name: String,
    status: StatusCode,
    payload: Vec<String>,
    message: Option<MessageTemplate>,
}

impl ErrorDeclaration {
    /// Compiles a declaration for the given action.
    ///
    /// # Errors
    ///
    /// Rejects empty names, codes outside 400..=599, malformed templates and
    /// templates naming a field outside the declared payload.
    pub fn compile(action: &str, decl: &ErrorDecl) -> Result<Self, DefinitionError> {
        if decl.name.is_empty() {
            return Err(DefinitionError::EmptyErrorName {
                action: action.to_string(),
            });
        }

        let status = StatusCode::from_u16(decl.code)
            .ok()
            .filter(|status| status.is_client_error() || status.is_server_error())
            .ok_or_else(|| DefinitionError::InvalidErrorCode {
                action: action.to_string(),
                name: decl.name.clone(),
                code: decl.code,
            })?;

        let message = decl
            .message
            .as_deref()
            .map(MessageTemplate::parse)
            .transpose()
            .map_err(|reason| DefinitionError::InvalidTemplate {
                action: action.to_string(),
                name: decl.name.clone(),
                reason,
            })?;

        if let Some(field) = message.iter().flat_map(MessageTemplate::placeholders).find(|field| {
            !decl.payload.iter().any(|declared| declared == field)
        }) {
            return Err(DefinitionError::InvalidTemplate {
                action: action.to_string(),
                name: decl.name.clone(),
                reason: format!("placeholder '{{{field}}}' is not a declared payload field"),
            });
        }

        Ok(Self {
            name: decl.name.clone(),
            status,
            payload: decl.payload.clone(),
            message,
        })
    }

    /// Returns the error name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the declared payload fields.
    #[must_use]
    pub fn payload_fields(&self) -> &[String] {
        &self.payload
    }

    /// Builds the client-facing error from raised fields.
    ///
    /// The payload holds exactly the declared fields; a declared field that
    /// was not raised is `null`. With no declared payload fields there is no
    /// payload at all. The message only sees the declared fields.
    #[must_use]
    pub fn instantiate(&self, fields: &Map<String, Value>) -> ClassifiedError {
        let declared: Map<String, Value> = self
            .payload
            .iter()
            .map(|key| (key.clone(), fields.get(key).cloned().unwrap_or(Value::Null)))
            .collect();

        let message = match &self.message {
            Some(template) => template.render(&declared),
            None => self
                .status
                .canonical_reason()
                .unwrap_or(self.name.as_str())
                .to_string(),
        };

        let payload = (!declared.is_empty()).then(|| Value::Object(declared));

        ClassifiedError::declared(self.status, &self.name, message, payload)
    }
}

/// Result of classifying one raise.
#[derive(Debug)]
pub enum Classification {
    /// Matched a declaration.
    Declared(ClassifiedError),
    /// Did not match; carries the raise for reporting.
    Undeclared(Raise),
}

/// The compiled error declarations of one action.
#[derive(Debug, Clone, Default)]
pub struct ErrorSet {
    by_name: HashMap<String, ErrorDeclaration>,
}

impl ErrorSet {
    /// Creates an empty set; every raise is undeclared.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles a set of declarations for one action.
    ///
    /// # Errors
    ///
    /// Returns the first invalid or duplicate declaration.
    pub fn compile<'a, I>(action: &str, decls: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = &'a ErrorDecl>,
    {
        let mut set = Self::new();
        for decl in decls {
            set.insert(ErrorDeclaration::compile(action, decl)?, action)?;
        }
        Ok(set)
    }

    /// Adds a compiled declaration.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::DuplicateError`] if the name is taken.
    pub fn insert(
        &mut self,
        declaration: ErrorDeclaration,
        action: &str,
    ) -> Result<(), DefinitionError> {
        if self.by_name.contains_key(declaration.name()) {
            return Err(DefinitionError::DuplicateError {
                action: action.to_string(),
                name: declaration.name.clone(),
            });
        }
        self.by_name.insert(declaration.name.clone(), declaration);
        Ok(())
    }

    /// Looks up a declaration by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ErrorDeclaration> {
        self.by_name.get(name)
    }

    /// Returns the number of declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns `true` if nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Classifies a raise.
    ///
    /// ```rust
    /// use vitruvius_action::{Classification, ErrorDecl, ErrorSet, Raise};
    ///
    /// let set = ErrorSet::compile(
    ///     "users.show",
    ///     &[ErrorDecl::new("UserNotFound", 404)
    ///         .with_payload(["id"])
    ///         .with_message("user {id} not found")],
    /// )
    /// .unwrap();
    ///
    /// match set.classify(Raise::named("UserNotFound").with("id", 7)) {
    ///     Classification::Declared(err) => assert_eq!(err.message(), "user 7 not found"),
    ///     Classification::Undeclared(_) => unreachable!(),
    /// }
    /// ```
    #[must_use]
    pub fn classify(&self, raise: Raise) -> Classification {
        if let Raise::Named { name, fields } = &raise {
            if let Some(declaration) = self.by_name.get(name) {
                return Classification::Declared(declaration.instantiate(fields));
            }
        }
        Classification::Undeclared(raise)
    }
}

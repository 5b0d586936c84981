//! Action definitions.
//!
//! An [`ActionDefinition`] bundles everything compiled once per action: the
//! parameter schema, the declared errors, the callback chains and the body.
//! Definitions are immutable and shared by every dispatch of the action.

use crate::{
    ActionDecl, ActionResult, Callback, CallbackSet, DefinitionError, DispatchContext, ErrorDecl,
    ErrorSet, HookResult,
};
use std::fmt;
use vitruvius_params::{ConverterRegistry, ParamsSchema};

/// The unit of work run for a request.
///
/// Implemented for any `Fn(&mut DispatchContext) -> ActionResult`, so most
/// actions are plain closures or functions.
pub trait Action: Send + Sync + 'static {
    /// Runs the action.
    ///
    /// Returning `Ok(Some(view))` produces a view unless one was already set
    /// explicitly on the context, in which case the explicit one wins.
    fn call(&self, ctx: &mut DispatchContext) -> ActionResult;
}

impl<F> Action for F
where
    F: Fn(&mut DispatchContext) -> ActionResult + Send + Sync + 'static,
{
    fn call(&self, ctx: &mut DispatchContext) -> ActionResult {
        self(ctx)
    }
}

/// A compiled action.
pub struct ActionDefinition {
    id: String,
    params: ParamsSchema,
    errors: ErrorSet,
    callbacks: CallbackSet,
    body: Box<dyn Action>,
}

impl ActionDefinition {
    /// Starts building a definition.
    ///
    /// # Example
    ///
    /// ```rust
    /// use vitruvius_action::{ActionDefinition, ActionResult, DispatchContext, ErrorDecl, Raise};
    /// use vitruvius_core::View;
    /// use vitruvius_params::{ConverterRegistry, FieldDecl, ParamsDecl, ParamsSchema, SourceDecl};
    ///
    /// let params = ParamsSchema::compile(
    ///     &ParamsDecl::new().with_path(SourceDecl::new(vec![FieldDecl::int("id")])),
    ///     &ConverterRegistry::default(),
    /// )
    /// .unwrap();
    ///
    /// let action = ActionDefinition::builder("users.show")
    ///     .params(params)
    ///     .error(ErrorDecl::new("UserNotFound", 404).with_payload(["id"]))
    ///     .before("authenticate", |_ctx| Ok(()))
    ///     .body(|ctx: &mut DispatchContext| -> ActionResult {
    ///         let id = ctx.path().and_then(|p| p.int("id")).unwrap_or_default();
    ///         if id == 0 {
    ///             return Err(Raise::named("UserNotFound").with("id", id));
    ///         }
    ///         Ok(Some(View::text(format!("user {id}"))))
    ///     })
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(action.id(), "users.show");
    /// assert_eq!(action.callbacks().before().len(), 1);
    /// ```
    #[must_use]
    pub fn builder(id: impl Into<String>) -> ActionDefinitionBuilder {
        ActionDefinitionBuilder::new(id)
    }

    /// Returns the action id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the compiled parameter schema.
    #[must_use]
    pub fn params(&self) -> &ParamsSchema {
        &self.params
    }

    /// Returns the declared errors.
    #[must_use]
    pub fn errors(&self) -> &ErrorSet {
        &self.errors
    }

    /// Returns the callback chains.
    #[must_use]
    pub fn callbacks(&self) -> &CallbackSet {
        &self.callbacks
    }

    /// Runs the body.
    pub fn call(&self, ctx: &mut DispatchContext) -> ActionResult {
        self.body.call(ctx)
    }
}

impl fmt::Debug for ActionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDefinition")
            .field("id", &self.id)
            .field("params", &self.params)
            .field("errors", &self.errors)
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ActionDefinition`].
///
/// Compilation failures are held until [`build`](Self::build) so the chain
/// stays linear; the first failure wins.
pub struct ActionDefinitionBuilder {
    id: String,
    params: ParamsSchema,
    errors: Vec<ErrorDecl>,
    callbacks: CallbackSet,
    body: Option<Box<dyn Action>>,
    failure: Option<DefinitionError>,
}

impl ActionDefinitionBuilder {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: ParamsSchema::empty(),
            errors: Vec::new(),
            callbacks: CallbackSet::new(),
            body: None,
            failure: None,
        }
    }

    /// Sets the compiled parameter schema.
    #[must_use]
    pub fn params(mut self, params: ParamsSchema) -> Self {
        self.params = params;
        self
    }

    /// Applies a declaration: compiles its params and adds its errors.
    ///
    /// The declaration's id is ignored; the builder's id is authoritative.
    #[must_use]
    pub fn declare(mut self, decl: &ActionDecl, converters: &ConverterRegistry) -> Self {
        match ParamsSchema::compile(&decl.params, converters) {
            Ok(params) => self.params = params,
            Err(source) => {
                let action = self.id.clone();
                self.fail(DefinitionError::Schema { action, source });
            }
        }
        self.errors.extend(decl.errors.iter().cloned());
        self
    }

    /// Declares an expected error.
    #[must_use]
    pub fn error(mut self, decl: ErrorDecl) -> Self {
        self.errors.push(decl);
        self
    }

    /// Appends a `before` hook.
    #[must_use]
    pub fn before<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&mut DispatchContext) -> HookResult + Send + Sync + 'static,
    {
        self.callbacks.push_before(Callback::new(name, hook));
        self
    }

    /// Appends an `after` hook.
    #[must_use]
    pub fn after<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&mut DispatchContext) -> HookResult + Send + Sync + 'static,
    {
        self.callbacks.push_after(Callback::new(name, hook));
        self
    }

    /// Appends an already-built hook to the `before` chain.
    #[must_use]
    pub fn before_callback(mut self, callback: Callback) -> Self {
        self.callbacks.push_before(callback);
        self
    }

    /// Appends an already-built hook to the `after` chain.
    #[must_use]
    pub fn after_callback(mut self, callback: Callback) -> Self {
        self.callbacks.push_after(callback);
        self
    }

    /// Sets the action body.
    #[must_use]
    pub fn body(mut self, action: impl Action) -> Self {
        self.body = Some(Box::new(action));
        self
    }

    /// Compiles the definition.
    ///
    /// # Errors
    ///
    /// Returns the first schema or error-declaration failure, or
    /// [`DefinitionError::MissingBody`].
    pub fn build(self) -> Result<ActionDefinition, DefinitionError> {
        if self.id.is_empty() {
            return Err(DefinitionError::EmptyId);
        }
        if let Some(failure) = self.failure {
            return Err(failure);
        }

        let errors = ErrorSet::compile(&self.id, &self.errors)?;
        let body = self
            .body
            .ok_or_else(|| DefinitionError::MissingBody {
                action: self.id.clone(),
            })?;

        Ok(ActionDefinition {
            id: self.id,
            params: self.params,
            errors,
            callbacks: self.callbacks,
            body,
        })
    }

    fn fail(&mut self, error: DefinitionError) {
        self.failure.get_or_insert(error);
    }
}

impl fmt::Debug for ActionDefinitionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDefinitionBuilder")
            .field("id", &self.id)
            .field("errors", &self.errors)
            .field("has_body", &self.body.is_some())
            .finish_non_exhaustive()
    }
}

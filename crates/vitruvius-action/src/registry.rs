//! The action registry.

use crate::{ActionDefinition, DefinitionError};
use std::collections::HashMap;
use std::sync::Arc;

/// Every compiled action, keyed by id.
///
/// Built once at startup and then shared behind an `Arc`; dispatches only
/// ever read from it.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<ActionDefinition>>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from definitions.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::DuplicateAction`] on a repeated id.
    pub fn from_definitions<I>(definitions: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = ActionDefinition>,
    {
        let mut registry = Self::new();
        for definition in definitions {
            registry.register(definition)?;
        }
        Ok(registry)
    }

    /// Adds a definition.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::DuplicateAction`] if the id is taken.
    pub fn register(&mut self, definition: ActionDefinition) -> Result<&mut Self, DefinitionError> {
        if self.actions.contains_key(definition.id()) {
            return Err(DefinitionError::DuplicateAction {
                action: definition.id().to_string(),
            });
        }
        tracing::debug!(action = definition.id(), "registered action");
        self.actions
            .insert(definition.id().to_string(), Arc::new(definition));
        Ok(self)
    }

    /// Looks up an action.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<ActionDefinition>> {
        self.actions.get(id)
    }

    /// Returns `true` if the id is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.actions.contains_key(id)
    }

    /// Returns all registered ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the number of actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

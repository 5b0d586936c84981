//! Callback chains.
//!
//! An action carries two ordered hook lists. `before` hooks run in
//! declaration order ahead of the action body; `after` hooks run in
//! declaration order once the body has succeeded. The first hook that raises
//! stops its chain, and a raise from any `before` hook also skips the body
//! and every `after` hook.

use crate::{DispatchContext, HookResult, Raise};
use std::fmt;
use std::sync::Arc;

type HookFn = dyn Fn(&mut DispatchContext) -> HookResult + Send + Sync;

/// A named hook.
#[derive(Clone)]
pub struct Callback {
    name: String,
    hook: Arc<HookFn>,
}

impl Callback {
    /// Wraps a closure as a named hook.
    pub fn new<F>(name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&mut DispatchContext) -> HookResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            hook: Arc::new(hook),
        }
    }

    /// Returns the hook name, used in logs and error reports.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the hook.
    pub fn call(&self, ctx: &mut DispatchContext) -> HookResult {
        (self.hook)(ctx)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").field("name", &self.name).finish()
    }
}

/// A raise from a named hook.
#[derive(Debug)]
pub struct HookFailure {
    /// The hook that raised.
    pub hook: String,
    /// What it raised.
    pub raise: Raise,
}

/// The `before` and `after` hooks of one action.
///
/// Immutable once the owning definition is built, and shared read-only by
/// every dispatch of that action.
#[derive(Debug, Clone, Default)]
pub struct CallbackSet {
    before: Vec<Callback>,
    after: Vec<Callback>,
}

impl CallbackSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a `before` hook.
    pub fn push_before(&mut self, callback: Callback) {
        self.before.push(callback);
    }

    /// Appends an `after` hook.
    pub fn push_after(&mut self, callback: Callback) {
        self.after.push(callback);
    }

    /// Returns the `before` hooks in run order.
    #[must_use]
    pub fn before(&self) -> &[Callback] {
        &self.before
    }

    /// Returns the `after` hooks in run order.
    #[must_use]
    pub fn after(&self) -> &[Callback] {
        &self.after
    }

    /// Runs the `before` chain, stopping at the first raise.
    pub fn run_before(&self, ctx: &mut DispatchContext) -> Result<(), HookFailure> {
        run_chain(&self.before, ctx)
    }

    /// Runs the `after` chain, stopping at the first raise.
    pub fn run_after(&self, ctx: &mut DispatchContext) -> Result<(), HookFailure> {
        run_chain(&self.after, ctx)
    }
}

fn run_chain(chain: &[Callback], ctx: &mut DispatchContext) -> Result<(), HookFailure> {
    for callback in chain {
        tracing::trace!(hook = callback.name(), "running hook");
        callback.call(ctx).map_err(|raise| HookFailure {
            hook: callback.name.clone(),
            raise,
        })?;
    }
    Ok(())
}

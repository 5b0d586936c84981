//! Dispatch stages.

use std::fmt;

/// The states of one dispatch, in the order they are entered.
///
/// ```text
/// Extracting → Coercing → BeforeCallbacks → Calling → AfterCallbacks → Resolving → Done
///      └───────────┴──────────────┴────────────┴────────────┴────────────┴──→ ErrorHandling → Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Looking up the action, reading the body and parsing raw trees.
    Extracting,
    /// Coercing raw trees against the schema.
    Coercing,
    /// Running `before` hooks.
    BeforeCallbacks,
    /// Running the action body.
    Calling,
    /// Running `after` hooks.
    AfterCallbacks,
    /// Choosing the final view.
    Resolving,
    /// Classifying a failure.
    ErrorHandling,
    /// Finished.
    Done,
}

impl Stage {
    /// Returns the stage name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Extracting => "extracting",
            Self::Coercing => "coercing",
            Self::BeforeCallbacks => "before_callbacks",
            Self::Calling => "calling",
            Self::AfterCallbacks => "after_callbacks",
            Self::Resolving => "resolving",
            Self::ErrorHandling => "error_handling",
            Self::Done => "done",
        }
    }

    /// Returns `true` for the binding stages, which run before any user code.
    #[must_use]
    pub const fn is_binding(&self) -> bool {
        matches!(self, Self::Extracting | Self::Coercing)
    }

    /// Returns `true` for the stages that run hooks or the body.
    #[must_use]
    pub const fn runs_user_code(&self) -> bool {
        matches!(
            self,
            Self::BeforeCallbacks | Self::Calling | Self::AfterCallbacks
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//! Raised conditions.
//!
//! Hooks and action bodies fail by returning a [`Raise`]. A raise is either
//! *named*, in which case the action's declared errors are searched for a
//! matching name, or *other*, which is always treated as undeclared.
//!
//! Any `std::error::Error` converts into [`Raise::Other`], so `?` works on
//! arbitrary library errors inside an action body:
//!
//! ```rust
//! use vitruvius_action::Raise;
//!
//! fn parse_limit(raw: &str) -> Result<u32, Raise> {
//!     Ok(raw.parse::<u32>()?)
//! }
//!
//! assert!(matches!(parse_limit("x"), Err(Raise::Other(_))));
//! ```

use serde_json::{Map, Value};
use std::fmt;
use vitruvius_core::View;

/// What an action body returns.
///
/// `Ok(None)` means the body produced no view by return; it may still have
/// set one explicitly on the context.
pub type ActionResult = Result<Option<View>, Raise>;

/// What a callback returns.
pub type HookResult = Result<(), Raise>;

/// A condition raised by a hook or an action body.
///
/// Any `std::error::Error` converts into [`Raise::Other`], so `?` works on
/// ordinary fallible calls inside hooks and bodies. `Raise` itself is not an
/// `Error`.
pub enum Raise {
    /// A raise matched by name against the action's declared errors.
    Named {
        /// Error name.
        name: String,
        /// Values bound at the raise site, available to the payload and
        /// message template.
        fields: Map<String, Value>,
    },
    /// Anything else. Always classified as undeclared.
    Other(anyhow::Error),
}

impl Raise {
    /// Starts a named raise.
    ///
    /// ```rust
    /// use vitruvius_action::Raise;
    ///
    /// let raise = Raise::named("UserNotFound").with("id", 7);
    /// assert_eq!(raise.name(), Some("UserNotFound"));
    /// ```
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            fields: Map::new(),
        }
    }

    /// Binds a field on a named raise. No-op on [`Raise::Other`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Self::Named { fields, .. } = &mut self {
            fields.insert(key.into(), value.into());
        }
        self
    }

    /// Wraps an `anyhow::Error`.
    #[must_use]
    pub fn other(error: anyhow::Error) -> Self {
        Self::Other(error)
    }

    /// Creates an undeclared raise from a message.
    #[must_use]
    pub fn msg(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self::Other(anyhow::Error::msg(message))
    }

    /// Returns the name of a named raise.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named { name, .. } => Some(name),
            Self::Other(_) => None,
        }
    }

    /// Returns the bound fields of a named raise.
    #[must_use]
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Named { fields, .. } => Some(fields),
            Self::Other(_) => None,
        }
    }
}

impl fmt::Debug for Raise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named { name, fields } => f
                .debug_struct("Named")
                .field("name", name)
                .field("fields", fields)
                .finish(),
            Self::Other(error) => f.debug_tuple("Other").field(error).finish(),
        }
    }
}

impl fmt::Display for Raise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named { name, .. } => write!(f, "raised {name}"),
            Self::Other(error) => write!(f, "{error}"),
        }
    }
}

impl<E> From<E> for Raise
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::Other(anyhow::Error::new(error))
    }
}

/// A typed error that maps onto one of an action's declared errors.
///
/// Implement this on a per-action error enum so raise sites stay typed:
///
/// ```rust
/// use serde_json::{json, Map, Value};
/// use vitruvius_action::{DeclaredError, Raise};
///
/// enum OrderError {
///     NotFound { id: i64 },
///     AlreadyShipped,
/// }
///
/// impl DeclaredError for OrderError {
///     fn error_name(&self) -> &str {
///         match self {
///             Self::NotFound { .. } => "OrderNotFound",
///             Self::AlreadyShipped => "OrderAlreadyShipped",
///         }
///     }
///
///     fn payload_fields(&self) -> Map<String, Value> {
///         let mut fields = Map::new();
///         if let Self::NotFound { id } = self {
///             fields.insert("id".into(), json!(id));
///         }
///         fields
///     }
/// }
///
/// let raise = OrderError::NotFound { id: 3 }.raise();
/// assert_eq!(raise.name(), Some("OrderNotFound"));
/// ```
pub trait DeclaredError {
    /// The declared error name this value maps to.
    fn error_name(&self) -> &str;

    /// Fields bound at the raise site.
    fn payload_fields(&self) -> Map<String, Value> {
        Map::new()
    }

    /// Converts into a named [`Raise`].
    fn raise(&self) -> Raise {
        Raise::Named {
            name: self.error_name().to_string(),
            fields: self.payload_fields(),
        }
    }
}

//! Request data sources.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the places request data can come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Path segments matched by the router (e.g., `/users/{id}`)
    Path,
    /// URL query string
    Query,
    /// URL-encoded form body
    Form,
    /// JSON body
    Json,
}

impl SourceKind {
    /// All sources, in binding order.
    pub const ALL: [SourceKind; 4] = [Self::Path, Self::Query, Self::Form, Self::Json];

    /// Returns the lowercase source name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Form => "form",
            Self::Json => "json",
        }
    }

    /// Returns `true` for sources read from the request body.
    #[must_use]
    pub const fn is_body(&self) -> bool {
        matches!(self, Self::Form | Self::Json)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

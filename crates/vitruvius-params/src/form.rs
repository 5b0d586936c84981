//! Form body extractor.

use crate::query::parse_nested;
use crate::{BindingError, SourceKind};
use serde_json::Value;

/// Parses a URL-encoded body into a raw tree.
///
/// Uses the same bracket expansion as the query string. An empty body is
/// an empty tree; the binder rejects it for required sources.
///
/// # Errors
///
/// Returns a malformed-input [`BindingError`] for undecodable bodies.
pub fn parse_form(body: &[u8]) -> Result<Value, BindingError> {
    parse_nested(body, SourceKind::Form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_form() {
        assert_eq!(
            parse_form(b"name=John&age=30").unwrap(),
            json!({"name": "John", "age": "30"})
        );
    }

    #[test]
    fn test_plus_as_space() {
        assert_eq!(
            parse_form(b"message=hello+world").unwrap(),
            json!({"message": "hello world"})
        );
    }

    #[test]
    fn test_nested_form() {
        assert_eq!(
            parse_form(b"user[name]=ada&user[roles][]=admin&user[roles][]=ops").unwrap(),
            json!({"user": {"name": "ada", "roles": ["admin", "ops"]}})
        );
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(parse_form(b"").unwrap(), json!({}));
    }
}

//! JSON body extractor.

use crate::{BindingError, SourceKind};
use serde_json::Value;

/// Parses a JSON body into a raw tree.
///
/// # Errors
///
/// Returns a malformed-input [`BindingError`] if the body is empty or is
/// not valid JSON.
pub fn parse_json(body: &[u8]) -> Result<Value, BindingError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(BindingError::malformed(SourceKind::Json, "empty request body"));
    }
    serde_json::from_slice(body).map_err(|e| BindingError::malformed(SourceKind::Json, e))
}

//! Source extractors.
//!
//! Each extractor turns one part of a [`RawRequest`] into an untyped raw
//! tree without looking at the schema. Content-type selection happens in
//! the binder, not here: calling [`extract`] always attempts the parse.

use crate::form::parse_form;
use crate::json::parse_json;
use crate::query::parse_query;
use crate::{BindingError, RawRequest, SourceKind};
use serde_json::Value;

/// Extracts the raw tree for one source.
///
/// # Errors
///
/// Returns a malformed-input [`BindingError`] if the source cannot be parsed.
///
/// # Example
///
/// ```rust
/// use vitruvius_params::{extract, RawRequest, SourceKind};
/// use http::Uri;
/// use serde_json::json;
///
/// let req = RawRequest::builder()
///     .uri(Uri::from_static("/?a[]=1&a[]=2"))
///     .build();
///
/// assert_eq!(extract(SourceKind::Query, &req).unwrap(), json!({"a": ["1", "2"]}));
/// ```
pub fn extract(source: SourceKind, request: &RawRequest) -> Result<Value, BindingError> {
    match source {
        SourceKind::Path => Ok(request.path_params().to_raw_tree()),
        SourceKind::Query => parse_query(request.uri()),
        SourceKind::Form => parse_form(request.body()),
        SourceKind::Json => parse_json(request.body()),
    }
}

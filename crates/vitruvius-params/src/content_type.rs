//! Content-type selection of body sources.

use crate::SourceKind;
use http::header::CONTENT_TYPE;
use http::HeaderMap;
use mime::Mime;

/// Parses the `Content-Type` header. Malformed values count as absent.
#[must_use]
pub fn from_headers(headers: &HeaderMap) -> Option<Mime> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Returns `true` for `application/x-www-form-urlencoded`.
#[must_use]
pub fn is_form(content_type: &Mime) -> bool {
    content_type.type_() == mime::APPLICATION
        && content_type.subtype() == mime::WWW_FORM_URLENCODED
}

/// Returns `true` for `application/json` and any `+json` suffix.
#[must_use]
pub fn is_json(content_type: &Mime) -> bool {
    content_type.type_() == mime::APPLICATION
        && (content_type.subtype() == mime::JSON
            || content_type.suffix().is_some_and(|s| s == mime::JSON))
}

/// Returns `true` if the content type selects `source`.
///
/// Path and query do not depend on the body and are always selected.
#[must_use]
pub fn selects(source: SourceKind, content_type: Option<&Mime>) -> bool {
    match source {
        SourceKind::Path | SourceKind::Query => true,
        SourceKind::Form => content_type.is_some_and(is_form),
        SourceKind::Json => content_type.is_some_and(is_json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn mime(s: &str) -> Mime {
        s.parse().unwrap()
    }

    #[test]
    fn test_json_variants() {
        assert!(is_json(&mime("application/json")));
        assert!(is_json(&mime("application/json; charset=utf-8")));
        assert!(is_json(&mime("application/vnd.api+json")));
        assert!(!is_json(&mime("text/json")));
        assert!(!is_json(&mime("application/x-www-form-urlencoded")));
    }

    #[test]
    fn test_form() {
        assert!(is_form(&mime("application/x-www-form-urlencoded")));
        assert!(!is_form(&mime("multipart/form-data; boundary=x")));
    }

    #[test]
    fn test_selects() {
        let json = mime("application/json");
        assert!(selects(SourceKind::Query, None));
        assert!(selects(SourceKind::Json, Some(&json)));
        assert!(!selects(SourceKind::Form, Some(&json)));
        assert!(!selects(SourceKind::Json, None));
    }

    #[test]
    fn test_malformed_header_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("not a mime"));
        assert!(from_headers(&headers).is_none());
    }
}

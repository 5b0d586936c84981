//! Views and response metadata.
//!
//! A [`View`] is what an action hands to the renderer on success. The
//! [`ResponseMeta`] travels alongside it and carries the status override,
//! extra headers and redirect target that hooks or the action body set while
//! the dispatch was running.

use http::header::{HeaderName, HeaderValue, InvalidHeaderValue, LOCATION};
use http::{HeaderMap, StatusCode};
use serde::Serialize;

/// A renderable action result.
///
/// The engine does not serialize views itself; it only guarantees that a
/// successful dispatch resolves to exactly one `View`.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// Structured data, rendered as JSON by the default renderer.
    Json(serde_json::Value),
    /// Plain text.
    Text(String),
    /// Pre-rendered HTML.
    Html(String),
    /// No body (redirects, `head` responses).
    Empty,
}

impl View {
    /// Builds a JSON view from any serializable value.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self::Json)
    }

    /// Builds a plain text view.
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text(body.into())
    }

    /// Builds an HTML view.
    #[must_use]
    pub fn html(body: impl Into<String>) -> Self {
        Self::Html(body.into())
    }

    /// Returns `true` for [`View::Empty`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<serde_json::Value> for View {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

/// Response metadata accumulated during a dispatch.
///
/// Mutating the metadata never changes control flow: a redirect set by a
/// `before` hook does not skip the action body.
///
/// # Example
///
/// ```
/// use vitruvius_core::ResponseMeta;
/// use http::StatusCode;
///
/// let mut meta = ResponseMeta::new();
/// meta.redirect_to("/login").unwrap();
///
/// assert!(meta.is_redirect());
/// assert_eq!(meta.status(), Some(StatusCode::FOUND));
/// assert_eq!(meta.location(), Some("/login"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResponseMeta {
    status: Option<StatusCode>,
    headers: HeaderMap,
    redirected: bool,
}

impl ResponseMeta {
    /// Creates empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the status override, if one was set.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Overrides the success status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Returns the extra response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the extra response headers mutably.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Inserts a response header, replacing any previous value.
    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Sets a `302 Found` redirect to `location`.
    pub fn redirect_to(&mut self, location: &str) -> Result<(), InvalidHeaderValue> {
        self.redirect_with(location, StatusCode::FOUND)
    }

    /// Sets a redirect to `location` with an explicit 3xx status.
    pub fn redirect_with(
        &mut self,
        location: &str,
        status: StatusCode,
    ) -> Result<(), InvalidHeaderValue> {
        let value = HeaderValue::from_str(location)?;
        self.headers.insert(LOCATION, value);
        self.status = Some(status);
        self.redirected = true;
        Ok(())
    }

    /// Returns `true` once a redirect target has been set.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        self.redirected
    }

    /// Returns the redirect target, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct User {
        id: u64,
        name: String,
    }

    #[test]
    fn test_json_view_from_struct() {
        let view = View::json(&User {
            id: 7,
            name: "Ada".into(),
        })
        .unwrap();
        assert_eq!(view, View::Json(json!({"id": 7, "name": "Ada"})));
    }

    #[test]
    fn test_empty_view() {
        assert!(View::Empty.is_empty());
        assert!(!View::text("hi").is_empty());
    }

    #[test]
    fn test_redirect_sets_status_and_location() {
        let mut meta = ResponseMeta::new();
        meta.redirect_with("/next", StatusCode::SEE_OTHER).unwrap();

        assert!(meta.is_redirect());
        assert_eq!(meta.status(), Some(StatusCode::SEE_OTHER));
        assert_eq!(meta.location(), Some("/next"));
    }

    #[test]
    fn test_invalid_redirect_target_is_rejected() {
        let mut meta = ResponseMeta::new();
        assert!(meta.redirect_to("/bad\nheader").is_err());
        assert!(!meta.is_redirect());
        assert_eq!(meta.status(), None);
    }

    #[test]
    fn test_headers_replace_previous_value() {
        let mut meta = ResponseMeta::new();
        let name = HeaderName::from_static("x-trace");
        meta.insert_header(name.clone(), HeaderValue::from_static("a"));
        meta.insert_header(name.clone(), HeaderValue::from_static("b"));
        assert_eq!(meta.headers().get(&name).unwrap(), "b");
    }
}

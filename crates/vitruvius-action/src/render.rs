//! Rendering dispatch results into HTTP responses.
//!
//! The dispatcher hands exactly one of two things to a [`Renderer`]: the
//! resolved [`View`], or the [`ClassifiedError`] the dispatch ended in.
//! [`JsonRenderer`] is the default.
//!
//! | Result | Status | Body |
//! |--------|--------|------|
//! | `View::Json` | override or 200 | JSON |
//! | `View::Text` / `View::Html` | override or 200 | text |
//! | `View::Empty` | override or 204 | none |
//! | error | error status | `{name, code, message, payload?, request_id}` |

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE, LOCATION};
use http::{Response, StatusCode};
use http_body_util::Full;
use vitruvius_core::{ClassifiedError, RequestId, ResponseMeta, View};

/// Turns dispatch results into responses.
pub trait Renderer: Send + Sync + 'static {
    /// Renders a successful view.
    fn render_view(
        &self,
        view: &View,
        meta: &ResponseMeta,
        request_id: RequestId,
    ) -> Response<Full<Bytes>>;

    /// Renders a failure.
    ///
    /// The status always comes from the error; a status override in `meta`
    /// applies to successful responses only.
    fn render_error(
        &self,
        error: &ClassifiedError,
        meta: &ResponseMeta,
        request_id: RequestId,
    ) -> Response<Full<Bytes>>;
}

/// Renders views and errors as JSON (text views as text).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

const APPLICATION_JSON: &str = "application/json";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";

impl Renderer for JsonRenderer {
    fn render_view(
        &self,
        view: &View,
        meta: &ResponseMeta,
        _request_id: RequestId,
    ) -> Response<Full<Bytes>> {
        let (body, content_type, default_status) = match view {
            View::Json(value) => (
                Bytes::from(value.to_string()),
                Some(APPLICATION_JSON),
                StatusCode::OK,
            ),
            View::Text(text) => (Bytes::from(text.clone()), Some(TEXT_PLAIN), StatusCode::OK),
            View::Html(html) => (Bytes::from(html.clone()), Some(TEXT_HTML), StatusCode::OK),
            View::Empty => (Bytes::new(), None, StatusCode::NO_CONTENT),
        };

        let mut response = Response::new(Full::new(body));
        *response.status_mut() = meta.status().unwrap_or(default_status);
        *response.headers_mut() = meta.headers().clone();
        if let Some(content_type) = content_type {
            response
                .headers_mut()
                .entry(CONTENT_TYPE)
                .or_insert(HeaderValue::from_static(content_type));
        }
        response
    }

    fn render_error(
        &self,
        error: &ClassifiedError,
        meta: &ResponseMeta,
        request_id: RequestId,
    ) -> Response<Full<Bytes>> {
        let body = serde_json::to_vec(&error.to_body(Some(request_id))).unwrap_or_default();

        let mut response = Response::new(Full::new(Bytes::from(body)));
        *response.status_mut() = error.status_code();
        *response.headers_mut() = meta.headers().clone();
        response.headers_mut().remove(LOCATION);
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        response
    }
}

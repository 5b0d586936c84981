//! The logging collaborator for undeclared errors.
//!
//! Undeclared failures never reach the client in detail. Instead, every one
//! of them is handed to an [`ErrorSink`] together with the request context.
//! The default [`TracingErrorSink`] logs at `error`.

use crate::Stage;
use http::{Method, Uri};
use std::sync::Arc;
use vitruvius_core::RequestId;

/// Full detail of one undeclared failure.
#[derive(Debug, Clone)]
pub struct UndeclaredReport {
    /// Request ID, also rendered in the client's error body.
    pub request_id: RequestId,
    /// Action id as requested.
    pub action: String,
    /// Stage the failure happened in.
    pub stage: Stage,
    /// Hook that raised, if any.
    pub hook: Option<String>,
    /// Request method.
    pub method: Method,
    /// Request URI.
    pub uri: Uri,
    /// One-line summary.
    pub summary: String,
    /// Full detail: error chain and, if captured, backtrace.
    pub detail: String,
}

/// Receives undeclared-error reports.
///
/// Implementations must be cheap and must not fail; they are called on the
/// request path.
pub trait ErrorSink: Send + Sync + 'static {
    /// Records one report.
    fn record(&self, report: &UndeclaredReport);
}

impl<T: ErrorSink + ?Sized> ErrorSink for Arc<T> {
    fn record(&self, report: &UndeclaredReport) {
        (**self).record(report);
    }
}

/// Logs reports through `tracing` at `error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn record(&self, report: &UndeclaredReport) {
        tracing::error!(
            request_id = %report.request_id,
            action = %report.action,
            stage = %report.stage,
            hook = report.hook.as_deref(),
            http.method = %report.method,
            http.path = report.uri.path(),
            detail = %report.detail,
            "undeclared error: {}",
            report.summary
        );
    }
}

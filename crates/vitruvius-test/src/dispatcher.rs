//! In-memory dispatch for tests.

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;
use parking_lot::Mutex;
use std::sync::Arc;
use vitruvius_action::{
    ActionDefinition, ActionRegistry, DefinitionError, DispatchConfig, DispatchOutcome,
    Dispatcher, ErrorSink, UndeclaredReport,
};

/// An [`ErrorSink`] that keeps every report in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    reports: Arc<Mutex<Vec<UndeclaredReport>>>,
}

impl RecordingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every report recorded so far.
    #[must_use]
    pub fn reports(&self) -> Vec<UndeclaredReport> {
        self.reports.lock().clone()
    }

    /// Returns the most recent report.
    #[must_use]
    pub fn last(&self) -> Option<UndeclaredReport> {
        self.reports.lock().last().cloned()
    }

    /// Returns the number of reports.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    /// Returns `true` if nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }

    /// Drops all reports.
    pub fn clear(&self) {
        self.reports.lock().clear();
    }
}

impl ErrorSink for RecordingSink {
    fn record(&self, report: &UndeclaredReport) {
        self.reports.lock().push(report.clone());
    }
}

/// A [`Dispatcher`] wired to a [`RecordingSink`], driven by [`TestRequest`]s.
///
/// # Example
///
/// ```rust
/// use vitruvius_action::{ActionDefinition, ActionResult, DispatchContext, Raise};
/// use vitruvius_core::View;
/// use vitruvius_test::TestDispatcher;
///
/// # tokio_test::block_on(async {
/// let dispatcher = TestDispatcher::from_definitions([
///     ActionDefinition::builder("ping")
///         .body(|_ctx: &mut DispatchContext| -> ActionResult { Ok(Some(View::text("pong"))) })
///         .build()
///         .unwrap(),
///     ActionDefinition::builder("boom")
///         .body(|_ctx: &mut DispatchContext| -> ActionResult { Err(Raise::msg("db down")) })
///         .build()
///         .unwrap(),
/// ])
/// .unwrap();
///
/// let response = dispatcher.send("ping", dispatcher.get("/ping")).await.unwrap();
/// assert_eq!(response.text().unwrap(), "pong");
///
/// let response = dispatcher.send("boom", dispatcher.get("/boom")).await.unwrap();
/// response.assert_error("InternalServerError", 500);
/// assert_eq!(dispatcher.sink().last().unwrap().summary, "db down");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TestDispatcher {
    dispatcher: Dispatcher,
    sink: RecordingSink,
}

impl TestDispatcher {
    /// Wraps a registry.
    #[must_use]
    pub fn new(registry: ActionRegistry) -> Self {
        let sink = RecordingSink::new();
        let dispatcher = Dispatcher::new(Arc::new(registry)).with_error_sink(sink.clone());
        Self { dispatcher, sink }
    }

    /// Builds a registry from definitions and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::DuplicateAction`] on a repeated id.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = ActionDefinition>,
    ) -> Result<Self, DefinitionError> {
        Ok(Self::new(ActionRegistry::from_definitions(definitions)?))
    }

    /// Replaces the dispatcher configuration.
    #[must_use]
    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.dispatcher = self.dispatcher.with_config(config);
        self
    }

    /// Returns the wrapped dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns the sink receiving undeclared-error reports.
    #[must_use]
    pub fn sink(&self) -> &RecordingSink {
        &self.sink
    }

    /// Starts a GET request. Shorthand for [`TestRequest::get`].
    pub fn get(&self, uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequest::get(uri)
    }

    /// Starts a POST request. Shorthand for [`TestRequest::post`].
    pub fn post(&self, uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequest::post(uri)
    }

    /// Dispatches a request and collects the rendered response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request does not build.
    pub async fn send(
        &self,
        action_id: &str,
        request: TestRequestBuilder,
    ) -> Result<TestResponse, TestError> {
        let (request, path_params) = request.build()?.into_parts();
        let response = self
            .dispatcher
            .dispatch(action_id, request, path_params)
            .await;
        TestResponse::from_http(response).await
    }

    /// Dispatches a request without rendering.
    ///
    /// # Errors
    ///
    /// Returns an error if the request does not build.
    pub async fn outcome(
        &self,
        action_id: &str,
        request: TestRequestBuilder,
    ) -> Result<DispatchOutcome, TestError> {
        let (request, path_params) = request.build()?.into_parts();
        Ok(self
            .dispatcher
            .dispatch_outcome(action_id, request, path_params)
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use vitruvius_action::{ActionResult, DispatchContext, Raise, Stage};
    use vitruvius_core::View;

    fn failing() -> ActionDefinition {
        ActionDefinition::builder("fail")
            .body(|_ctx: &mut DispatchContext| -> ActionResult { Err(Raise::msg("nope")) })
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_sink_records_undeclared() {
        let dispatcher = TestDispatcher::from_definitions([failing()]).unwrap();
        assert!(dispatcher.sink().is_empty());

        let outcome = dispatcher
            .outcome("fail", dispatcher.get("/"))
            .await
            .unwrap();
        assert_eq!(outcome.stage_reached, Stage::Calling);
        assert_eq!(dispatcher.sink().len(), 1);

        dispatcher.sink().clear();
        assert!(dispatcher.sink().is_empty());
    }

    #[tokio::test]
    async fn test_bad_request_surfaces_as_error() {
        let dispatcher = TestDispatcher::from_definitions([failing()]).unwrap();
        let result = dispatcher
            .send("fail", dispatcher.get("/").header("bad header", "x"))
            .await;
        assert!(matches!(result, Err(TestError::InvalidHeader(_))));
    }

    #[tokio::test]
    async fn test_send_echoes_request_id() {
        let dispatcher = TestDispatcher::from_definitions([ActionDefinition::builder("ok")
            .body(|_ctx: &mut DispatchContext| -> ActionResult { Ok(Some(View::Empty)) })
            .build()
            .unwrap()])
        .unwrap();

        let response = dispatcher.send("ok", dispatcher.get("/")).await.unwrap();
        response.assert_status(StatusCode::NO_CONTENT);
        assert!(response.request_id().is_some());
    }

    #[test]
    fn test_sink_shared_across_threads() {
        let sink = RecordingSink::new();
        let report = UndeclaredReport {
            request_id: vitruvius_core::RequestId::new(),
            action: "fail".to_string(),
            stage: Stage::Calling,
            hook: None,
            method: http::Method::GET,
            uri: http::Uri::from_static("/"),
            summary: "nope".to_string(),
            detail: "nope".to_string(),
        };

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let sink = sink.clone();
                let report = report.clone();
                scope.spawn(move || {
                    for _ in 0..25 {
                        sink.record(&report);
                    }
                });
            }
        });

        assert_eq!(sink.len(), 100);
        assert_eq!(sink.reports().len(), 100);
        assert_eq!(sink.last().unwrap().action, "fail");
    }

    #[test]
    fn test_duplicate_definitions_rejected() {
        let result = TestDispatcher::from_definitions([failing(), failing()]);
        assert!(matches!(result, Err(DefinitionError::DuplicateAction { .. })));
    }
}

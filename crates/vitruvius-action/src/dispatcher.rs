//! The dispatcher.
//!
//! One call to [`Dispatcher::dispatch_outcome`] drives a single request
//! through the whole pipeline:
//!
//! ```text
//! Extracting → Coercing → BeforeCallbacks → Calling → AfterCallbacks → Resolving → Done
//! ```
//!
//! Any failure jumps to error handling and ends the dispatch. Binding
//! failures never reach user code. Raises from hooks or the body are
//! classified against the action's declared errors; everything that does not
//! match is reported to the [`ErrorSink`] and rendered as a generic 500.
//!
//! The request body is the only thing awaited, once, and only when a
//! selected source needs it. Everything after that is synchronous.

use crate::{
    ActionDefinition, ActionRegistry, Classification, DispatchConfig, DispatchContext, ErrorSink,
    JsonRenderer, Raise, Renderer, Stage, TracingErrorSink, UndeclaredReport,
};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use http_body::Body;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use vitruvius_core::{ClassifiedError, ErrorClass, RequestId, ResponseMeta, View};
use vitruvius_params::{BindingError, ParamsSchema, PathParams, RawRequest, SourceKind};
use vitruvius_telemetry::metrics::{self, Outcome};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The single result of one dispatch.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// Request ID, generated or adopted from the request.
    pub request_id: RequestId,
    /// Action id as requested.
    pub action: String,
    /// `Done` on success, otherwise the stage the dispatch failed in.
    pub stage_reached: Stage,
    /// The resolved view or the classified failure.
    pub result: Result<View, ClassifiedError>,
    /// Response metadata set by hooks and the body.
    pub meta: ResponseMeta,
}

impl DispatchOutcome {
    /// Returns `true` if a view was resolved.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns the resolved view.
    #[must_use]
    pub fn view(&self) -> Option<&View> {
        self.result.as_ref().ok()
    }

    /// Returns the failure.
    #[must_use]
    pub fn error(&self) -> Option<&ClassifiedError> {
        self.result.as_ref().err()
    }

    /// Returns the status the default renderer responds with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.result {
            Ok(View::Empty) => self.meta.status().unwrap_or(StatusCode::NO_CONTENT),
            Ok(_) => self.meta.status().unwrap_or(StatusCode::OK),
            Err(error) => error.status_code(),
        }
    }
}

/// Drives requests through their action's pipeline.
///
/// Cheap to clone; the registry, renderer and sink are shared.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use bytes::Bytes;
/// use http::{Request, StatusCode};
/// use http_body_util::Full;
/// use vitruvius_action::{ActionDefinition, ActionRegistry, ActionResult, DispatchContext, Dispatcher};
/// use vitruvius_core::View;
/// use vitruvius_params::PathParams;
///
/// # tokio_test::block_on(async {
/// let mut registry = ActionRegistry::new();
/// registry
///     .register(
///         ActionDefinition::builder("ping")
///             .body(|_ctx: &mut DispatchContext| -> ActionResult { Ok(Some(View::text("pong"))) })
///             .build()
///             .unwrap(),
///     )
///     .unwrap();
///
/// let dispatcher = Dispatcher::new(Arc::new(registry));
/// let request = Request::get("/ping").body(Full::new(Bytes::new())).unwrap();
/// let response = dispatcher.dispatch("ping", request, PathParams::new()).await;
///
/// assert_eq!(response.status(), StatusCode::OK);
/// assert!(response.headers().contains_key("x-request-id"));
/// # });
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ActionRegistry>,
    config: DispatchConfig,
    request_id_header: Option<HeaderName>,
    renderer: Arc<dyn Renderer>,
    sink: Arc<dyn ErrorSink>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("actions", &self.registry.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Request facts carried into undeclared-error reports.
struct ReportScope<'a> {
    request_id: RequestId,
    action: &'a str,
    method: &'a Method,
    uri: &'a Uri,
}

impl Dispatcher {
    /// Creates a dispatcher with the default config, [`JsonRenderer`] and
    /// [`TracingErrorSink`].
    #[must_use]
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self {
            registry,
            config: DispatchConfig::default(),
            request_id_header: HeaderName::from_static(crate::config::DEFAULT_REQUEST_ID_HEADER)
                .into(),
            renderer: Arc::new(JsonRenderer),
            sink: Arc::new(TracingErrorSink),
        }
    }

    /// Replaces the configuration.
    ///
    /// An empty or invalid `request_id_header` disables request ID
    /// propagation and echoing.
    #[must_use]
    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.request_id_header = HeaderName::from_bytes(config.request_id_header.as_bytes()).ok();
        self.config = config;
        self
    }

    /// Replaces the renderer.
    #[must_use]
    pub fn with_renderer(mut self, renderer: impl Renderer) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Replaces the error sink.
    #[must_use]
    pub fn with_error_sink(mut self, sink: impl ErrorSink) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Dispatches a request and renders the outcome.
    pub async fn dispatch<B>(
        &self,
        action_id: &str,
        request: Request<B>,
        path_params: PathParams,
    ) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let outcome = self.dispatch_outcome(action_id, request, path_params).await;
        self.render(&outcome)
    }

    /// Renders an outcome and echoes the request ID header.
    #[must_use]
    pub fn render(&self, outcome: &DispatchOutcome) -> Response<Full<Bytes>> {
        let mut response = match &outcome.result {
            Ok(view) => self
                .renderer
                .render_view(view, &outcome.meta, outcome.request_id),
            Err(error) => self
                .renderer
                .render_error(error, &outcome.meta, outcome.request_id),
        };

        if let Some(header) = &self.request_id_header {
            if let Ok(value) = HeaderValue::from_str(&outcome.request_id.to_string()) {
                response.headers_mut().insert(header.clone(), value);
            }
        }
        response
    }

    /// Dispatches a request without rendering.
    pub async fn dispatch_outcome<B>(
        &self,
        action_id: &str,
        request: Request<B>,
        path_params: PathParams,
    ) -> DispatchOutcome
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let request_id = self.request_id_for(request.headers());
        let span = tracing::info_span!(
            "dispatch",
            request_id = %request_id,
            action = action_id,
            http.method = %request.method(),
            http.path = request.uri().path(),
        );

        self.run(action_id, request_id, request, path_params)
            .instrument(span)
            .await
    }

    fn request_id_for(&self, headers: &HeaderMap) -> RequestId {
        if !self.config.propagate_request_id {
            return RequestId::new();
        }
        self.request_id_header
            .as_ref()
            .and_then(|name| headers.get(name))
            .and_then(|value| value.to_str().ok())
            .and_then(RequestId::parse)
            .unwrap_or_default()
    }

    async fn run<B>(
        &self,
        action_id: &str,
        request_id: RequestId,
        request: Request<B>,
        path_params: PathParams,
    ) -> DispatchOutcome
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let started = Instant::now();
        let (parts, body) = request.into_parts();
        let finish = |stage: Stage, result: Result<View, ClassifiedError>, meta: ResponseMeta| {
            self.finish(action_id, request_id, started, stage, result, meta)
        };

        // Extracting
        enter(Stage::Extracting);
        let Some(definition) = self.registry.get(action_id).cloned() else {
            let scope = ReportScope {
                request_id,
                action: action_id,
                method: &parts.method,
                uri: &parts.uri,
            };
            let error = self.undeclared(
                &scope,
                Stage::Extracting,
                None,
                format!("no action registered as '{action_id}'"),
                String::new(),
            );
            return finish(Stage::Extracting, Err(error), ResponseMeta::new());
        };
        let schema = definition.params();

        let raw_body = if schema.needs_body(&parts.headers) {
            match self.read_body(body, body_source(schema, &parts.headers)).await {
                Ok(bytes) => bytes,
                Err(error) => {
                    let error = self.binding_failed(action_id, Stage::Extracting, &error);
                    return finish(Stage::Extracting, Err(error), ResponseMeta::new());
                }
            }
        } else {
            Bytes::new()
        };

        let raw_request = RawRequest::new(
            parts.method.clone(),
            parts.uri.clone(),
            parts.headers.clone(),
            raw_body,
            path_params,
        );
        let raw = match schema.extract(&raw_request) {
            Ok(raw) => raw,
            Err(error) => {
                let error = self.binding_failed(action_id, Stage::Extracting, &error);
                return finish(Stage::Extracting, Err(error), ResponseMeta::new());
            }
        };

        // Coercing
        enter(Stage::Coercing);
        let params = match schema.coerce(&raw) {
            Ok(params) => params,
            Err(error) => {
                let error = self.binding_failed(action_id, Stage::Coercing, &error);
                return finish(Stage::Coercing, Err(error), ResponseMeta::new());
            }
        };
        drop(raw_request);

        let mut ctx = DispatchContext::new(
            request_id,
            action_id,
            parts.method,
            parts.uri,
            parts.headers,
            params,
        );

        // BeforeCallbacks
        enter(Stage::BeforeCallbacks);
        if let Err(failure) = definition.callbacks().run_before(&mut ctx) {
            let error = self.raised(
                &definition,
                &ctx,
                Stage::BeforeCallbacks,
                Some(failure.hook),
                failure.raise,
            );
            return finish(Stage::BeforeCallbacks, Err(error), ctx.into_meta());
        }

        // Calling
        enter(Stage::Calling);
        let returned = match definition.call(&mut ctx) {
            Ok(view) => view,
            Err(raise) => {
                let error = self.raised(&definition, &ctx, Stage::Calling, None, raise);
                return finish(Stage::Calling, Err(error), ctx.into_meta());
            }
        };

        // AfterCallbacks
        enter(Stage::AfterCallbacks);
        if let Err(failure) = definition.callbacks().run_after(&mut ctx) {
            let error = self.raised(
                &definition,
                &ctx,
                Stage::AfterCallbacks,
                Some(failure.hook),
                failure.raise,
            );
            return finish(Stage::AfterCallbacks, Err(error), ctx.into_meta());
        }

        // Resolving: an explicitly set view beats the returned one.
        enter(Stage::Resolving);
        let view = match ctx.take_view().or(returned) {
            Some(view) => view,
            None if ctx.meta().is_redirect() => View::Empty,
            None => {
                let scope = ReportScope {
                    request_id,
                    action: action_id,
                    method: ctx.method(),
                    uri: ctx.uri(),
                };
                let error = self.undeclared(
                    &scope,
                    Stage::Resolving,
                    None,
                    "action produced no view".to_string(),
                    String::new(),
                );
                return finish(Stage::Resolving, Err(error), ctx.into_meta());
            }
        };

        finish(Stage::Done, Ok(view), ctx.into_meta())
    }

    async fn read_body<B>(&self, body: B, source: SourceKind) -> Result<Bytes, BindingError>
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let max = self.config.max_body_bytes;
        match Limited::new(body, max).collect().await {
            Ok(collected) => Ok(collected.to_bytes()),
            Err(error) if error.is::<LengthLimitError>() => {
                Err(BindingError::payload_too_large(source, max))
            }
            Err(error) => Err(BindingError::malformed(
                source,
                format!("failed to read request body: {error}"),
            )),
        }
    }

    fn binding_failed(&self, action: &str, stage: Stage, error: &BindingError) -> ClassifiedError {
        tracing::debug!(
            stage = %stage,
            source = error.source_kind().as_str(),
            field = error.field(),
            kind = error.kind().as_str(),
            "binding failed: {error}"
        );
        metrics::record_binding_failure(action, error.source_kind().as_str(), error.kind().as_str());
        error.to_classified()
    }

    fn raised(
        &self,
        definition: &ActionDefinition,
        ctx: &DispatchContext,
        stage: Stage,
        hook: Option<String>,
        raise: Raise,
    ) -> ClassifiedError {
        match definition.errors().classify(raise) {
            Classification::Declared(error) => {
                tracing::info!(
                    stage = %stage,
                    hook = hook.as_deref(),
                    error_name = error.name(),
                    http.status_code = error.status_code().as_u16(),
                    "declared error"
                );
                error
            }
            Classification::Undeclared(raise) => {
                let (summary, detail) = match &raise {
                    Raise::Named { name, fields } => (
                        format!("raised '{name}', which is not declared by this action"),
                        format!("fields: {}", serde_json::Value::Object(fields.clone())),
                    ),
                    Raise::Other(error) => (error.to_string(), format!("{error:?}")),
                };
                let scope = ReportScope {
                    request_id: ctx.request_id(),
                    action: ctx.action_id(),
                    method: ctx.method(),
                    uri: ctx.uri(),
                };
                self.undeclared(&scope, stage, hook, summary, detail)
            }
        }
    }

    fn undeclared(
        &self,
        scope: &ReportScope<'_>,
        stage: Stage,
        hook: Option<String>,
        summary: String,
        detail: String,
    ) -> ClassifiedError {
        self.sink.record(&UndeclaredReport {
            request_id: scope.request_id,
            action: scope.action.to_string(),
            stage,
            hook,
            method: scope.method.clone(),
            uri: scope.uri.clone(),
            summary,
            detail,
        });
        ClassifiedError::undeclared(&self.config.generic_error_message)
    }

    fn finish(
        &self,
        action: &str,
        request_id: RequestId,
        started: Instant,
        stage: Stage,
        result: Result<View, ClassifiedError>,
        meta: ResponseMeta,
    ) -> DispatchOutcome {
        let outcome = DispatchOutcome {
            request_id,
            action: action.to_string(),
            stage_reached: stage,
            result,
            meta,
        };

        let elapsed = started.elapsed();
        let status = outcome.status();
        metrics::record_dispatch(
            action,
            metrics_outcome(outcome.error()),
            status.as_u16(),
            elapsed,
        );
        tracing::debug!(
            stage = %stage,
            http.status_code = status.as_u16(),
            duration_ms = elapsed.as_secs_f64() * 1000.0,
            "dispatch finished"
        );
        outcome
    }
}

fn metrics_outcome(error: Option<&ClassifiedError>) -> Outcome {
    match error.map(ClassifiedError::class) {
        None => Outcome::View,
        Some(ErrorClass::Binding) => Outcome::BindingError,
        Some(ErrorClass::Declared) => Outcome::DeclaredError,
        Some(ErrorClass::Undeclared) => Outcome::UndeclaredError,
    }
}

fn enter(stage: Stage) {
    tracing::trace!(stage = %stage, "entering stage");
}

/// The body source a size or read failure is attributed to.
fn body_source(schema: &ParamsSchema, headers: &HeaderMap) -> SourceKind {
    schema
        .selected(headers)
        .find(SourceKind::is_body)
        .unwrap_or(SourceKind::Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActionResult, ErrorDecl};
    use http_body_util::BodyExt;
    use vitruvius_params::{ConverterRegistry, FieldDecl, ParamsDecl, SourceDecl};

    fn dispatcher(definition: ActionDefinition) -> Dispatcher {
        let registry = ActionRegistry::from_definitions([definition]).unwrap();
        Dispatcher::new(Arc::new(registry))
    }

    fn get(uri: &str) -> Request<Full<Bytes>> {
        Request::get(uri).body(Full::new(Bytes::new())).unwrap()
    }

    fn echo_page() -> ActionDefinition {
        let params = ParamsSchema::compile(
            &ParamsDecl::new().with_query(SourceDecl::new(vec![FieldDecl::int("page")])),
            &ConverterRegistry::default(),
        )
        .unwrap();
        ActionDefinition::builder("echo")
            .params(params)
            .body(|ctx: &mut DispatchContext| -> ActionResult {
                let page = ctx.query().and_then(|q| q.int("page")).unwrap_or_default();
                Ok(Some(View::Json(serde_json::json!({ "page": page }))))
            })
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_success_reaches_done() {
        let outcome = dispatcher(echo_page())
            .dispatch_outcome("echo", get("/?page=3"), PathParams::new())
            .await;

        assert_eq!(outcome.stage_reached, Stage::Done);
        assert_eq!(outcome.view(), Some(&View::Json(serde_json::json!({"page": 3}))));
        assert_eq!(outcome.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_binding_failure_stops_at_coercing() {
        let outcome = dispatcher(echo_page())
            .dispatch_outcome("echo", get("/?page=abc"), PathParams::new())
            .await;

        assert_eq!(outcome.stage_reached, Stage::Coercing);
        let error = outcome.error().unwrap();
        assert_eq!(error.class(), ErrorClass::Binding);
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_action_is_undeclared() {
        let outcome = dispatcher(echo_page())
            .dispatch_outcome("missing", get("/"), PathParams::new())
            .await;

        assert_eq!(outcome.stage_reached, Stage::Extracting);
        assert_eq!(outcome.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(outcome.error().unwrap().message(), "Internal Server Error");
    }

    #[tokio::test]
    async fn test_body_over_limit_is_413() {
        let params = ParamsSchema::compile(
            &ParamsDecl::new().with_json(SourceDecl::new(vec![FieldDecl::any("x")]).required()),
            &ConverterRegistry::default(),
        )
        .unwrap();
        let definition = ActionDefinition::builder("upload")
            .params(params)
            .body(|_ctx: &mut DispatchContext| -> ActionResult { Ok(Some(View::Empty)) })
            .build()
            .unwrap();
        let dispatcher = dispatcher(definition)
            .with_config(DispatchConfig::default().with_max_body_bytes(8));

        let request = Request::post("/upload")
            .header("content-type", "application/json")
            .body(Full::new(Bytes::from(r#"{"x": "0123456789"}"#)))
            .unwrap();
        let outcome = dispatcher
            .dispatch_outcome("upload", request, PathParams::new())
            .await;

        assert_eq!(outcome.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(outcome.stage_reached, Stage::Extracting);
    }

    #[tokio::test]
    async fn test_incoming_request_id_is_adopted() {
        let id = RequestId::new();
        let request = Request::get("/?page=1")
            .header("x-request-id", id.to_string())
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = dispatcher(echo_page())
            .dispatch("echo", request, PathParams::new())
            .await;

        assert_eq!(response.headers()["x-request-id"], id.to_string().as_str());
    }

    #[tokio::test]
    async fn test_incoming_request_id_ignored_without_propagation() {
        let id = RequestId::new();
        let request = Request::get("/?page=1")
            .header("x-request-id", id.to_string())
            .body(Full::new(Bytes::new()))
            .unwrap();

        let outcome = dispatcher(echo_page())
            .with_config(DispatchConfig::default().with_propagate_request_id(false))
            .dispatch_outcome("echo", request, PathParams::new())
            .await;

        assert_ne!(outcome.request_id, id);
    }

    #[tokio::test]
    async fn test_redirect_without_view_resolves_empty() {
        let definition = ActionDefinition::builder("logout")
            .body(|ctx: &mut DispatchContext| -> ActionResult {
                ctx.redirect_to("/")?;
                Ok(None)
            })
            .build()
            .unwrap();

        let response = dispatcher(definition)
            .dispatch("logout", get("/logout"), PathParams::new())
            .await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()["location"], "/");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_no_view_is_undeclared() {
        let definition = ActionDefinition::builder("silent")
            .body(|_ctx: &mut DispatchContext| -> ActionResult { Ok(None) })
            .build()
            .unwrap();

        let outcome = dispatcher(definition)
            .dispatch_outcome("silent", get("/"), PathParams::new())
            .await;

        assert_eq!(outcome.stage_reached, Stage::Resolving);
        assert_eq!(outcome.error().unwrap().class(), ErrorClass::Undeclared);
    }

    #[tokio::test]
    async fn test_declared_error_from_after_hook() {
        let definition = ActionDefinition::builder("audit")
            .error(ErrorDecl::new("AuditFailed", 503))
            .after("audit", |_ctx| Err(Raise::named("AuditFailed")))
            .body(|ctx: &mut DispatchContext| -> ActionResult {
                ctx.set_view(View::text("done"));
                Ok(None)
            })
            .build()
            .unwrap();

        let outcome = dispatcher(definition)
            .dispatch_outcome("audit", get("/"), PathParams::new())
            .await;

        assert_eq!(outcome.stage_reached, Stage::AfterCallbacks);
        assert_eq!(outcome.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(outcome.error().unwrap().class(), ErrorClass::Declared);
    }
}

//! End-to-end dispatch tests: callback ordering, short-circuiting, view
//! resolution and error rendering.

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use vitruvius_action::{
    ActionDefinition, ActionRegistry, ActionResult, DispatchContext, Dispatcher, ErrorDecl,
    ErrorSink, Raise, Stage, UndeclaredReport,
};
use vitruvius_core::View;
use vitruvius_params::{ConverterRegistry, FieldDecl, ParamsDecl, ParamsSchema, PathParams, SourceDecl};

type Trace = Arc<Mutex<Vec<&'static str>>>;

#[derive(Clone, Default)]
struct RecordingSink(Arc<Mutex<Vec<UndeclaredReport>>>);

impl ErrorSink for RecordingSink {
    fn record(&self, report: &UndeclaredReport) {
        self.0.lock().unwrap().push(report.clone());
    }
}

fn dispatcher(definition: ActionDefinition) -> Dispatcher {
    let registry = ActionRegistry::from_definitions([definition]).unwrap();
    Dispatcher::new(Arc::new(registry))
}

fn get(uri: &str) -> Request<Full<Bytes>> {
    Request::get(uri).body(Full::new(Bytes::new())).unwrap()
}

fn post(uri: &str, content_type: &str, body: &'static str) -> Request<Full<Bytes>> {
    Request::post(uri)
        .header("content-type", content_type)
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap()
}

async fn body_json(response: Response<Full<Bytes>>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn traced(trace: &Trace, step: &'static str) -> impl Fn(&mut DispatchContext) -> Result<(), Raise> {
    let trace = Arc::clone(trace);
    move |_ctx| {
        trace.lock().unwrap().push(step);
        Ok(())
    }
}

#[tokio::test]
async fn test_callbacks_run_in_declaration_order() {
    let trace = Trace::default();
    let body_trace = Arc::clone(&trace);

    let definition = ActionDefinition::builder("ordered")
        .before("b1", traced(&trace, "b1"))
        .before("b2", traced(&trace, "b2"))
        .after("a1", traced(&trace, "a1"))
        .after("a2", traced(&trace, "a2"))
        .body(move |_ctx: &mut DispatchContext| -> ActionResult {
            body_trace.lock().unwrap().push("call");
            Ok(Some(View::text("ok")))
        })
        .build()
        .unwrap();

    let outcome = dispatcher(definition)
        .dispatch_outcome("ordered", get("/"), PathParams::new())
        .await;

    assert!(outcome.is_success());
    assert_eq!(*trace.lock().unwrap(), ["b1", "b2", "call", "a1", "a2"]);
}

#[tokio::test]
async fn test_before_raise_short_circuits() {
    let trace = Trace::default();
    let first = Arc::clone(&trace);
    let body_trace = Arc::clone(&trace);

    let definition = ActionDefinition::builder("guarded")
        .error(ErrorDecl::new("Forbidden", 403))
        .before("b1", move |_ctx| {
            first.lock().unwrap().push("b1");
            Err(Raise::named("Forbidden"))
        })
        .before("b2", traced(&trace, "b2"))
        .after("a1", traced(&trace, "a1"))
        .body(move |_ctx: &mut DispatchContext| -> ActionResult {
            body_trace.lock().unwrap().push("call");
            Ok(Some(View::Empty))
        })
        .build()
        .unwrap();

    let outcome = dispatcher(definition)
        .dispatch_outcome("guarded", get("/"), PathParams::new())
        .await;

    assert_eq!(outcome.stage_reached, Stage::BeforeCallbacks);
    assert_eq!(outcome.status(), StatusCode::FORBIDDEN);
    assert_eq!(*trace.lock().unwrap(), ["b1"]);
}

#[tokio::test]
async fn test_explicit_view_beats_returned_view() {
    let definition = ActionDefinition::builder("views")
        .body(|ctx: &mut DispatchContext| -> ActionResult {
            ctx.set_view(View::text("explicit"));
            Ok(Some(View::text("returned")))
        })
        .build()
        .unwrap();

    let outcome = dispatcher(definition)
        .dispatch_outcome("views", get("/"), PathParams::new())
        .await;

    assert_eq!(outcome.view(), Some(&View::text("explicit")));
}

#[tokio::test]
async fn test_after_hook_can_replace_view() {
    let definition = ActionDefinition::builder("wrapped")
        .after("wrap", |ctx| {
            ctx.set_view(View::Json(json!({"wrapped": true})));
            Ok(())
        })
        .body(|_ctx: &mut DispatchContext| -> ActionResult { Ok(Some(View::text("inner"))) })
        .build()
        .unwrap();

    let outcome = dispatcher(definition)
        .dispatch_outcome("wrapped", get("/"), PathParams::new())
        .await;

    assert_eq!(outcome.view(), Some(&View::Json(json!({"wrapped": true}))));
}

#[tokio::test]
async fn test_declared_error_renders_body() {
    let definition = ActionDefinition::builder("users.show")
        .error(
            ErrorDecl::new("UserNotFound", 404)
                .with_payload(["id"])
                .with_message("no user {id}"),
        )
        .body(|_ctx: &mut DispatchContext| -> ActionResult {
            Err(Raise::named("UserNotFound").with("id", 42).with("secret", "hidden"))
        })
        .build()
        .unwrap();

    let sink = RecordingSink::default();
    let dispatcher = dispatcher(definition).with_error_sink(sink.clone());
    let response = dispatcher
        .dispatch("users.show", get("/users/42"), PathParams::new())
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let request_id = response.headers()["x-request-id"].to_str().unwrap().to_string();
    assert_eq!(
        body_json(response).await,
        json!({
            "name": "UserNotFound",
            "code": 404,
            "message": "no user 42",
            "payload": {"id": 42},
            "request_id": request_id,
        })
    );
    assert!(sink.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_undeclared_error_is_generic_and_reported() {
    let definition = ActionDefinition::builder("db")
        .body(|_ctx: &mut DispatchContext| -> ActionResult {
            Err(Raise::msg("password authentication failed for user admin"))
        })
        .build()
        .unwrap();

    let sink = RecordingSink::default();
    let dispatcher = dispatcher(definition).with_error_sink(sink.clone());
    let response = dispatcher.dispatch("db", get("/db"), PathParams::new()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["name"], "InternalServerError");
    assert_eq!(body["message"], "Internal Server Error");
    assert!(body.get("payload").is_none());
    assert!(!body.to_string().contains("password"));

    let reports = sink.0.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].stage, Stage::Calling);
    assert_eq!(reports[0].action, "db");
    assert!(reports[0].summary.contains("password authentication failed"));
    assert_eq!(reports[0].request_id.to_string(), body["request_id"]);
}

#[tokio::test]
async fn test_named_raise_not_declared_is_undeclared() {
    let definition = ActionDefinition::builder("strict")
        .error(ErrorDecl::new("Known", 409))
        .before("check", |_ctx| Err(Raise::named("Unknown")))
        .body(|_ctx: &mut DispatchContext| -> ActionResult { Ok(Some(View::Empty)) })
        .build()
        .unwrap();

    let sink = RecordingSink::default();
    let outcome = dispatcher(definition)
        .with_error_sink(sink.clone())
        .dispatch_outcome("strict", get("/"), PathParams::new())
        .await;

    assert_eq!(outcome.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let reports = sink.0.lock().unwrap();
    assert_eq!(reports[0].hook.as_deref(), Some("check"));
    assert!(reports[0].summary.contains("Unknown"));
}

#[tokio::test]
async fn test_body_source_follows_content_type() {
    let params = ParamsSchema::compile(
        &ParamsDecl::new()
            .with_form(SourceDecl::new(vec![FieldDecl::string("name")]))
            .with_json(SourceDecl::new(vec![FieldDecl::string("name")])),
        &ConverterRegistry::default(),
    )
    .unwrap();
    let definition = ActionDefinition::builder("create")
        .params(params)
        .body(|ctx: &mut DispatchContext| -> ActionResult {
            let source = match (ctx.form(), ctx.json()) {
                (Some(_), None) => "form",
                (None, Some(_)) => "json",
                _ => "other",
            };
            let name = ctx.body().and_then(|bag| bag.str("name")).unwrap_or_default();
            Ok(Some(View::Json(json!({ "source": source, "name": name }))))
        })
        .build()
        .unwrap();
    let dispatcher = dispatcher(definition);

    let form = dispatcher
        .dispatch_outcome(
            "create",
            post("/", "application/x-www-form-urlencoded", "name=ada"),
            PathParams::new(),
        )
        .await;
    assert_eq!(
        form.view(),
        Some(&View::Json(json!({"source": "form", "name": "ada"})))
    );

    let json = dispatcher
        .dispatch_outcome(
            "create",
            post("/", "application/json", r#"{"name": "grace"}"#),
            PathParams::new(),
        )
        .await;
    assert_eq!(
        json.view(),
        Some(&View::Json(json!({"source": "json", "name": "grace"})))
    );
}

#[tokio::test]
async fn test_malformed_json_is_binding_error() {
    let params = ParamsSchema::compile(
        &ParamsDecl::new().with_json(SourceDecl::new(vec![FieldDecl::string("name")]).required()),
        &ConverterRegistry::default(),
    )
    .unwrap();
    let called = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&called);
    let definition = ActionDefinition::builder("create")
        .params(params)
        .before("never", move |_ctx| {
            *flag.lock().unwrap() = true;
            Ok(())
        })
        .body(|_ctx: &mut DispatchContext| -> ActionResult { Ok(Some(View::Empty)) })
        .build()
        .unwrap();

    let outcome = dispatcher(definition)
        .dispatch_outcome(
            "create",
            post("/", "application/json", "{not json"),
            PathParams::new(),
        )
        .await;

    assert_eq!(outcome.stage_reached, Stage::Extracting);
    assert_eq!(outcome.status(), StatusCode::BAD_REQUEST);
    assert!(!*called.lock().unwrap());
}

#[tokio::test]
async fn test_status_override_and_headers() {
    let definition = ActionDefinition::builder("created")
        .body(|ctx: &mut DispatchContext| -> ActionResult {
            ctx.set_status(StatusCode::CREATED);
            ctx.insert_header(
                http::header::HeaderName::from_static("x-resource"),
                http::HeaderValue::from_static("users/1"),
            );
            Ok(Some(View::Json(json!({"id": 1}))))
        })
        .build()
        .unwrap();

    let response = dispatcher(definition)
        .dispatch("created", get("/"), PathParams::new())
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()["x-resource"], "users/1");
    assert_eq!(body_json(response).await, json!({"id": 1}));
}

//! # Vitruvius Test
//!
//! Test utilities for Vitruvius: dispatch actions in memory, without a
//! server, a router or a socket.
//!
//! ## Key Features
//!
//! - **Request Builder**: fluent API for method, URI, headers, JSON/form
//!   bodies and the path parameters a router would have matched
//! - **Response Assertions**: status, header, JSON and error-body helpers
//! - **Recording Sink**: every undeclared error is kept for inspection
//!
//! ## Example
//!
//! ```rust
//! use vitruvius_action::{ActionDefinition, ActionResult, DispatchContext};
//! use vitruvius_core::View;
//! use vitruvius_params::{ConverterRegistry, FieldDecl, ParamsDecl, ParamsSchema, SourceDecl};
//! use vitruvius_test::TestDispatcher;
//!
//! # tokio_test::block_on(async {
//! let params = ParamsSchema::compile(
//!     &ParamsDecl::new().with_path(SourceDecl::new(vec![FieldDecl::int("id")])),
//!     &ConverterRegistry::default(),
//! )
//! .unwrap();
//!
//! let show = ActionDefinition::builder("users.show")
//!     .params(params)
//!     .body(|ctx: &mut DispatchContext| -> ActionResult {
//!         let id = ctx.path().and_then(|path| path.int("id")).unwrap_or_default();
//!         Ok(Some(View::Json(serde_json::json!({ "id": id }))))
//!     })
//!     .build()
//!     .unwrap();
//!
//! let dispatcher = TestDispatcher::from_definitions([show]).unwrap();
//! let response = dispatcher
//!     .send("users.show", dispatcher.get("/users/7").path_param("id", "7"))
//!     .await
//!     .unwrap();
//!
//! response.assert_success().assert_json_eq(&serde_json::json!({"id": 7}));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/vitruvius-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod dispatcher;
mod error;
mod request;
mod response;

pub use dispatcher::{RecordingSink, TestDispatcher};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;

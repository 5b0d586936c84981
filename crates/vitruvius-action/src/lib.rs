//! # Vitruvius Action
//!
//! Action definitions and the dispatch pipeline.
//!
//! An action is a named unit of work with a compiled parameter schema, a set
//! of declared errors, ordered `before`/`after` callback chains and a body.
//! The [`Dispatcher`] runs one request through it:
//!
//! | Stage | Work | Failure |
//! |-------|------|---------|
//! | Extracting | look up action, read body, parse raw trees | binding (400/413/415) |
//! | Coercing | coerce raw trees against the schema | binding (400) |
//! | BeforeCallbacks | run `before` hooks in order | declared / undeclared |
//! | Calling | run the body | declared / undeclared |
//! | AfterCallbacks | run `after` hooks in order | declared / undeclared |
//! | Resolving | explicit view, else returned view, else redirect | undeclared |
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use http::{Request, StatusCode};
//! use http_body_util::Full;
//! use vitruvius_action::{
//!     ActionDefinition, ActionRegistry, ActionResult, DispatchContext, Dispatcher, ErrorDecl, Raise,
//! };
//! use vitruvius_core::View;
//! use vitruvius_params::PathParams;
//!
//! let show = ActionDefinition::builder("users.show")
//!     .error(
//!         ErrorDecl::new("NotFound", 404)
//!             .with_payload(["id"])
//!             .with_message("user {id} not found"),
//!     )
//!     .before("authenticate", |_ctx| Ok(()))
//!     .body(|_ctx: &mut DispatchContext| -> ActionResult {
//!         Err(Raise::named("NotFound").with("id", 7))
//!     })
//!     .build()
//!     .unwrap();
//!
//! let registry = ActionRegistry::from_definitions([show]).unwrap();
//! let dispatcher = Dispatcher::new(Arc::new(registry));
//!
//! # tokio_test::block_on(async {
//! let request = Request::get("/users/7").body(Full::new(Bytes::new())).unwrap();
//! let outcome = dispatcher
//!     .dispatch_outcome("users.show", request, PathParams::new())
//!     .await;
//!
//! assert_eq!(outcome.status(), StatusCode::NOT_FOUND);
//! assert_eq!(outcome.error().unwrap().message(), "user 7 not found");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/vitruvius-action/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod callback;
mod classify;
pub mod config;
mod context;
mod decl;
mod dispatcher;
mod error;
mod raise;
mod registry;
mod render;
mod sink;
mod stage;
mod template;

pub use action::{Action, ActionDefinition, ActionDefinitionBuilder};
pub use callback::{Callback, CallbackSet, HookFailure};
pub use classify::{Classification, ErrorDeclaration, ErrorSet};
pub use config::DispatchConfig;
pub use context::DispatchContext;
pub use decl::{ActionDecl, ErrorDecl};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::DefinitionError;
pub use raise::{ActionResult, DeclaredError, HookResult, Raise};
pub use registry::ActionRegistry;
pub use render::{JsonRenderer, Renderer};
pub use sink::{ErrorSink, TracingErrorSink, UndeclaredReport};
pub use stage::Stage;
pub use template::MessageTemplate;

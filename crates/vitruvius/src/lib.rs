//! # Vitruvius
//!
//! **Declarative parameter binding and action dispatch**
//!
//! Vitruvius sits between a router and application code. Each action
//! declares the request data it accepts and the errors it may raise; the
//! dispatcher binds and validates the request, runs the action's callbacks
//! and body, and turns every failure into one of three response shapes:
//!
//! - **binding errors** – the request did not fit the declared parameters (4xx)
//! - **declared errors** – the action raised an error it declared up front
//! - **undeclared errors** – anything else: a generic 500 for the client,
//!   full detail for the logs
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use vitruvius::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let decl = ActionDecl::new("users.show")
//!     .with_params(ParamsDecl::new().with_path(SourceDecl::new(vec![FieldDecl::int("id")])))
//!     .with_error(ErrorDecl::new("UserNotFound", 404).with_payload(["id"]));
//!
//! let show = ActionDefinition::builder("users.show")
//!     .declare(&decl, &ConverterRegistry::default())
//!     .body(|ctx: &mut DispatchContext| -> ActionResult {
//!         let id = ctx.path().and_then(|path| path.int("id")).unwrap_or_default();
//!         Err(Raise::named("UserNotFound").with("id", id))
//!     })
//!     .build()
//!     .unwrap();
//!
//! let registry = ActionRegistry::from_definitions([show]).unwrap();
//! let dispatcher = Dispatcher::new(Arc::new(registry));
//!
//! let request = http::Request::get("/users/9")
//!     .body(http_body_util::Full::new(bytes::Bytes::new()))
//!     .unwrap();
//! let path: PathParams = [("id", "9")].into_iter().collect();
//! let outcome = dispatcher.dispatch_outcome("users.show", request, path).await;
//!
//! assert_eq!(outcome.status(), http::StatusCode::NOT_FOUND);
//! assert_eq!(outcome.error().unwrap().payload(), Some(&serde_json::json!({"id": 9})));
//! # });
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → Extract → Coerce → before hooks → body → after hooks → Resolve → Response
//!              └─────────┴───────────┴──────────┴──────────┴──→ Classify ──┘
//! ```

#![doc(html_root_url = "https://docs.rs/vitruvius/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use vitruvius_core as core;

// Re-export parameter binding
pub use vitruvius_params as params;

// Re-export actions and the dispatcher
pub use vitruvius_action as action;

// Re-export configuration
pub use vitruvius_config as config;

// Re-export telemetry
pub use vitruvius_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use vitruvius::prelude::*;
///
/// let config = VitruviusConfig::development();
/// assert!(config.validate().is_ok());
/// ```
pub mod prelude {
    pub use vitruvius_core::{ClassifiedError, ErrorClass, RequestId, ResponseMeta, View};

    // Parameter declarations and bound values
    pub use vitruvius_params::{
        Bag, BindingError, ConverterRegistry, FieldDecl, ParamBag, ParamValue, ParamsDecl,
        ParamsSchema, PathParams, SourceDecl, SourceKind, TypeName,
    };

    // Actions, errors and dispatch
    pub use vitruvius_action::{
        Action, ActionDecl, ActionDefinition, ActionRegistry, ActionResult, DeclaredError,
        DispatchConfig, DispatchContext, DispatchOutcome, Dispatcher, ErrorDecl, ErrorSink,
        HookResult, Raise, Renderer, Stage,
    };

    // Configuration
    pub use vitruvius_config::{ConfigError, ConfigLoader, VitruviusConfig};

    // Telemetry
    pub use vitruvius_telemetry::{init_telemetry, TelemetryConfig};
}

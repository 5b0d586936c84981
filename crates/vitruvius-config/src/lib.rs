//! Typed configuration for Vitruvius.
//!
//! This crate provides a strongly-typed configuration system with support for:
//! - TOML and JSON configuration files
//! - `.env` files and environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//! - Declarative actions: parameter trees and error declarations, compiled
//!   during validation
//!
//! # Example
//!
//! ```no_run
//! use vitruvius_config::ConfigLoader;
//!
//! # fn main() -> Result<(), vitruvius_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("vitruvius.toml")?
//!     .with_env_prefix("VITRUVIUS")
//!     .load()?;
//!
//! println!("body limit: {} bytes", config.dispatch.max_body_bytes);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [dispatch]
//! max_body_bytes = 1048576
//! generic_error_message = "Internal Server Error"
//! request_id_header = "x-request-id"
//! propagate_request_id = true
//!
//! [telemetry.logging]
//! level = "info"
//! json_format = true
//!
//! [telemetry.metrics]
//! enabled = true
//!
//! [[actions]]
//! id = "users.update"
//!
//! [actions.params.path]
//! fields = [{ name = "id", type = "int" }]
//!
//! [actions.params.json]
//! fields = [
//!     { name = "name", type = "string" },
//!     { name = "tags", type = "array", items = { name = "tag", type = "string" }, default = [] },
//! ]
//!
//! [[actions.errors]]
//! name = "UserNotFound"
//! code = 404
//! payload = ["id"]
//! message = "user {id} not found"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Scalar values can be overridden via environment variables using the
//! format `PREFIX__SECTION__KEY`. For example:
//!
//! - `VITRUVIUS__DISPATCH__MAX_BODY_BYTES=2097152`
//! - `VITRUVIUS__TELEMETRY__LOGGING__LEVEL=debug`
//! - `VITRUVIUS__TELEMETRY__METRICS__ENABLED=false`

#![doc(html_root_url = "https://docs.rs/vitruvius-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{VitruviusConfig, VitruviusConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use vitruvius_action::{ActionDecl, DispatchConfig, ErrorDecl};
pub use vitruvius_telemetry::TelemetryConfig;

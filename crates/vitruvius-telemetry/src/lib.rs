//! Logging and metrics for Vitruvius.
//!
//! - **Logging**: structured JSON or pretty output via `tracing-subscriber`
//! - **Metrics**: dispatch counters and latency via the `metrics` facade,
//!   with an optional in-process Prometheus recorder
//!
//! The dispatcher emits events and metrics unconditionally; this crate only
//! decides where they go. An application that installs its own subscriber or
//! recorder can skip [`init_telemetry`] entirely.
//!
//! # Example
//!
//! ```rust,ignore
//! use vitruvius_telemetry::{init_telemetry, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig::production())?;
//!
//! // Later, from an admin endpoint:
//! let text = vitruvius_telemetry::metrics::render_metrics().unwrap_or_default();
//! ```

#![doc(html_root_url = "https://docs.rs/vitruvius-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, MetricsConfig, Outcome};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}

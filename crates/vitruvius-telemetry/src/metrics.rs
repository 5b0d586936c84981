//! Dispatch metrics.
//!
//! Metrics are recorded through the `metrics` facade, so they are free when no
//! recorder is installed. [`init_metrics`] installs an in-process Prometheus
//! recorder whose output is available from [`render_metrics`]; exposing it
//! over HTTP is left to the host application.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `vitruvius_dispatch_total` | Counter | `action`, `outcome`, `status` | Completed dispatches |
//! | `vitruvius_dispatch_duration_seconds` | Histogram | `action` | Dispatch latency |
//! | `vitruvius_binding_failures_total` | Counter | `action`, `source`, `kind` | Binding failures |
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use vitruvius_telemetry::metrics::{record_dispatch, Outcome};
//!
//! record_dispatch("users.show", Outcome::View, 200, Duration::from_millis(3));
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

/// Dispatch counter name.
pub const DISPATCH_TOTAL: &str = "vitruvius_dispatch_total";

/// Dispatch latency histogram name.
pub const DISPATCH_DURATION_SECONDS: &str = "vitruvius_dispatch_duration_seconds";

/// Binding failure counter name.
pub const BINDING_FAILURES_TOTAL: &str = "vitruvius_binding_failures_total";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    /// Whether to install the Prometheus recorder.
    pub enabled: bool,

    /// Histogram buckets for dispatch duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // 100us .. 5s
            duration_buckets: vec![
                0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0,
            ],
        }
    }
}

impl MetricsConfig {
    /// Creates a disabled configuration.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// How a dispatch ended, used as the `outcome` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// A view was rendered.
    View,
    /// Parameter binding failed.
    BindingError,
    /// A declared error was raised.
    DeclaredError,
    /// An undeclared error was raised.
    UndeclaredError,
}

impl Outcome {
    /// Returns the label value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::BindingError => "binding_error",
            Self::DeclaredError => "declared_error",
            Self::UndeclaredError => "undeclared_error",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Installs the Prometheus recorder as the global `metrics` recorder.
///
/// Calling this when a recorder is already installed fails; calling it with
/// a disabled config is a no-op.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidConfig`] for empty buckets and
/// [`TelemetryError::MetricsInit`] if the recorder cannot be installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(DISPATCH_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::InvalidConfig(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);
    describe_metrics();

    Ok(())
}

/// Returns the global metrics handle if initialized.
pub fn metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn describe_metrics() {
    describe_counter!(DISPATCH_TOTAL, "Total number of completed dispatches");
    describe_histogram!(
        DISPATCH_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Dispatch duration from extraction to resolution"
    );
    describe_counter!(
        BINDING_FAILURES_TOTAL,
        "Total parameter binding failures by source and kind"
    );
}

/// Records a completed dispatch.
///
/// Updates the following metrics:
/// - `vitruvius_dispatch_total` (incremented)
/// - `vitruvius_dispatch_duration_seconds` (histogram observation)
pub fn record_dispatch(action: &str, outcome: Outcome, status_code: u16, duration: Duration) {
    counter!(
        DISPATCH_TOTAL,
        "action" => action.to_string(),
        "outcome" => outcome.as_str(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(DISPATCH_DURATION_SECONDS, "action" => action.to_string())
        .record(duration.as_secs_f64());
}

/// Records a binding failure.
pub fn record_binding_failure(action: &str, source: &str, kind: &str) {
    counter!(
        BINDING_FAILURES_TOTAL,
        "action" => action.to_string(),
        "source" => source.to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_buckets_are_sorted() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert!(config
            .duration_buckets
            .windows(2)
            .all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_disabled_is_noop() {
        assert!(init_metrics(&MetricsConfig::disabled()).is_ok());
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::View.as_str(), "view");
        assert_eq!(Outcome::BindingError.to_string(), "binding_error");
        assert_eq!(Outcome::DeclaredError.as_str(), "declared_error");
        assert_eq!(Outcome::UndeclaredError.as_str(), "undeclared_error");
    }

    #[test]
    fn test_recording_without_recorder() {
        // No recorder installed: the facade discards these.
        record_dispatch("users.show", Outcome::View, 200, Duration::from_millis(5));
        record_binding_failure("users.show", "query", "type_mismatch");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: MetricsConfig = serde_json::from_str(r#"{"enabled": false}"#).unwrap();
        assert!(!config.enabled);
        assert_eq!(
            config.duration_buckets,
            MetricsConfig::default().duration_buckets
        );
    }
}

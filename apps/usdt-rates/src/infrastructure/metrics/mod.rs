//! Prometheus Metrics Module
//!
//! Exposes request and quote-source metrics in Prometheus format.
//!
//! # Metrics
//!
//! - `usdt_rates_requests_total{method,outcome}`: RPC calls by result
//! - `usdt_rates_quote_errors_total{kind}`: quote source failures by kind
//! - `usdt_rates_quote_fetch_seconds`: upstream request latency
//!
//! Metrics are exposed at `/metrics` on the health server port. Recording
//! before [`init_metrics`] is a no-op.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use parking_lot::Mutex;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static INIT_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Install the Prometheus recorder, once per process.
///
/// Later calls return the handle installed by the first one.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let _guard = INIT_LOCK.lock();
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "usdt_rates_requests_total",
        "Total RPC calls by method and outcome"
    );
    describe_counter!(
        "usdt_rates_quote_errors_total",
        "Total quote source failures by kind"
    );
    describe_histogram!(
        "usdt_rates_quote_fetch_seconds",
        "Time spent fetching a quote from the upstream depth API"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// RPC method label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GetRates`.
    GetRates,
    /// `HealthCheck`.
    HealthCheck,
}

impl Method {
    const fn as_str(self) -> &'static str {
        match self {
            Self::GetRates => "get_rates",
            Self::HealthCheck => "health_check",
        }
    }
}

/// RPC outcome label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Call returned a response.
    Ok,
    /// Call returned a status error.
    Error,
}

impl Outcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// Record a finished RPC call.
pub fn record_request(method: Method, outcome: Outcome) {
    counter!(
        "usdt_rates_requests_total",
        "method" => method.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record a quote source failure.
pub fn record_quote_error(kind: &'static str) {
    counter!("usdt_rates_quote_errors_total", "kind" => kind).increment(1);
}

/// Record how long an upstream request took.
pub fn record_quote_fetch(elapsed: Duration) {
    histogram!("usdt_rates_quote_fetch_seconds").record(elapsed.as_secs_f64());
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_values() {
        assert_eq!(Method::GetRates.as_str(), "get_rates");
        assert_eq!(Method::HealthCheck.as_str(), "health_check");
        assert_eq!(Outcome::Ok.as_str(), "ok");
        assert_eq!(Outcome::Error.as_str(), "error");
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        record_request(Method::GetRates, Outcome::Ok);
        record_quote_error("timeout");
        record_quote_fetch(Duration::from_millis(12));
    }

    #[test]
    fn init_is_reentrant_and_renders() {
        let first = init_metrics().unwrap();
        let second = init_metrics().unwrap();

        record_request(Method::HealthCheck, Outcome::Ok);

        assert!(get_metrics_handle().is_some());
        assert!(second.render().contains("usdt_rates_requests_total"));
        drop(first);
    }
}

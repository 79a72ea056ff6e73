//! Prometheus metrics collection for the routegate server

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use routegate_core::engine::MetricsSnapshot;
use routegate_core::{AccessDecision, Grant};
use std::time::Instant;

/// Initialize all metric descriptions
pub fn init_metrics() {
    // Counters
    describe_counter!("routegate_decisions_total", "Total number of gate decisions by outcome");
    describe_counter!("routegate_settings_updates_total", "Total number of admin settings updates");
    describe_counter!("routegate_errors_total", "Total number of errors");

    // Histograms
    describe_histogram!("routegate_decision_latency_seconds", "Gate decision latency in seconds");

    // Gauges
    describe_gauge!("routegate_public_routes", "Number of published public routes");
    describe_gauge!("routegate_publications", "Route sets published since start");
}

fn outcome(decision: &AccessDecision) -> &'static str {
    match decision {
        AccessDecision::Allow(Grant::Authenticated) => "allow_authenticated",
        AccessDecision::Allow(Grant::PublicRoute { .. }) => "allow_public",
        AccessDecision::Deny(_) => "deny",
    }
}

/// Record a gate decision
pub fn record_decision(decision: &AccessDecision) {
    counter!("routegate_decisions_total", 1, "outcome" => outcome(decision));
}

/// Record an admin settings update
pub fn record_settings_update(public_routes: usize) {
    counter!("routegate_settings_updates_total", 1);
    gauge!("routegate_public_routes", public_routes as f64);
}

/// Record an error
pub fn record_error(error_type: &str) {
    counter!("routegate_errors_total", 1, "type" => error_type.to_string());
}

/// Update gauges from the engine's own counters.
///
/// Publications also happen outside request handling (startup load, file
/// reloads), so gauges are refreshed from the engine before each scrape.
pub fn update_engine_metrics(public_routes: usize, snapshot: &MetricsSnapshot) {
    gauge!("routegate_public_routes", public_routes as f64);
    gauge!("routegate_publications", snapshot.publications as f64);
}

/// Timer for measuring operation latency
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Start timing
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Record the elapsed time into the histogram
    pub fn record(self) {
        let elapsed = self.start.elapsed().as_secs_f64();
        histogram!(self.metric_name, elapsed);
    }
}

/// Storage for Prometheus handle
static PROMETHEUS_HANDLE: std::sync::OnceLock<metrics_exporter_prometheus::PrometheusHandle> =
    std::sync::OnceLock::new();

/// Initialize Prometheus exporter and return the handle
pub fn init_prometheus() -> anyhow::Result<()> {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let handle = builder.install_recorder()?;
    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| anyhow::anyhow!("Failed to set Prometheus handle"))?;
    Ok(())
}

/// Get Prometheus metrics string
pub fn get_prometheus_metrics() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Prometheus metrics not initialized\n".to_string())
}

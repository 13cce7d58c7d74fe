//! Prometheus metrics for the sentinel hello monitor

use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::OnceLock;

/// Global metrics registry
static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Get the global metrics instance
pub fn metrics() -> &'static Metrics {
    METRICS.get_or_init(Metrics::new)
}

/// Monitor metrics collection
pub struct Metrics {
    /// Registry for all metrics
    pub registry: Registry,

    /// Check cycles started (gate passed)
    pub cycles_started_total: IntCounter,
    /// Gate refusals by reason
    pub gate_refusals_total: IntCounterVec,
    /// Hello records parsed and inserted into the live set
    pub hellos_collected_total: IntCounter,
    /// Subscription failures captured
    pub subscribe_failures_total: IntCounter,
    /// Cycle results delivered by outcome
    pub results_delivered_total: IntCounterVec,
    /// Instances currently registered for checking
    pub instances_registered: IntGauge,
}

impl Metrics {
    /// Create a new metrics collection
    pub fn new() -> Self {
        let registry = Registry::new();

        let cycles_started_total = IntCounter::new(
            "argus_cycles_started_total",
            "Total number of check cycles started",
        )
        .unwrap();

        let gate_refusals_total = IntCounterVec::new(
            Opts::new(
                "argus_gate_refusals_total",
                "Total number of check ticks refused by the gate",
            ),
            &["reason"], // throttle, whitelist, status, controller, disabled
        )
        .unwrap();

        let hellos_collected_total = IntCounter::new(
            "argus_hellos_collected_total",
            "Total number of hello records parsed and inserted",
        )
        .unwrap();

        let subscribe_failures_total = IntCounter::new(
            "argus_subscribe_failures_total",
            "Total number of subscription failures captured",
        )
        .unwrap();

        let results_delivered_total = IntCounterVec::new(
            Opts::new(
                "argus_results_delivered_total",
                "Total number of cycle results delivered to listeners",
            ),
            &["outcome"], // success, failure
        )
        .unwrap();

        let instances_registered = IntGauge::new(
            "argus_instances_registered",
            "Current number of instances registered for checking",
        )
        .unwrap();

        registry
            .register(Box::new(cycles_started_total.clone()))
            .unwrap();
        registry
            .register(Box::new(gate_refusals_total.clone()))
            .unwrap();
        registry
            .register(Box::new(hellos_collected_total.clone()))
            .unwrap();
        registry
            .register(Box::new(subscribe_failures_total.clone()))
            .unwrap();
        registry
            .register(Box::new(results_delivered_total.clone()))
            .unwrap();
        registry
            .register(Box::new(instances_registered.clone()))
            .unwrap();

        Self {
            registry,
            cycles_started_total,
            gate_refusals_total,
            hellos_collected_total,
            subscribe_failures_total,
            results_delivered_total,
            instances_registered,
        }
    }

    /// Get metrics as Prometheus text format
    pub fn gather(&self) -> String {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_metrics_singleton() {
        let a = metrics() as *const Metrics;
        let b = metrics() as *const Metrics;
        assert_eq!(a, b);
    }

    #[test]
    fn test_gather_contains_counters() {
        metrics().cycles_started_total.inc();
        metrics()
            .gate_refusals_total
            .with_label_values(&["throttle"])
            .inc();

        let text = metrics().gather();
        assert!(text.contains("argus_cycles_started_total"));
        assert!(text.contains("argus_gate_refusals_total"));
    }
}

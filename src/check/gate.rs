//! Go/no-go decision for one check cycle
//!
//! Five conditions are evaluated in order, short-circuiting on the first
//! refusal: throttle, cluster whitelist, cluster status, the controller
//! chain, and the global auto-process switch. Refusal is a normal, frequent
//! outcome; the only side effects are a debug/warn log line and a metric.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cluster::ClusterStatusProvider;
use crate::config::CheckConfigProvider;
use crate::instance::MonitoredInstance;
use crate::metrics::metrics;

use super::controller::CheckController;

/// Composite predicate deciding whether a cycle may start
pub struct Gate {
    check_config: Arc<dyn CheckConfigProvider>,
    cluster_status: Arc<dyn ClusterStatusProvider>,
    /// Veto policies in registration order; append-only
    controllers: RwLock<Vec<Arc<dyn CheckController>>>,
    /// Throttle interval for instances without an override
    default_interval: Duration,
}

impl Gate {
    pub fn new(
        check_config: Arc<dyn CheckConfigProvider>,
        cluster_status: Arc<dyn ClusterStatusProvider>,
        default_interval: Duration,
    ) -> Self {
        Self {
            check_config,
            cluster_status,
            controllers: RwLock::new(Vec::new()),
            default_interval,
        }
    }

    /// Append a controller to the chain
    pub fn add_controller(&self, controller: Arc<dyn CheckController>) {
        self.controllers.write().push(controller);
    }

    /// Effective throttle interval for an instance
    pub fn interval_for(&self, instance: &MonitoredInstance) -> Duration {
        instance
            .check_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(self.default_interval)
    }

    /// Decide whether a new cycle may start for `instance`
    pub fn should_start(&self, instance: &MonitoredInstance, last_cycle_start: Instant) -> bool {
        let elapsed = last_cycle_start.elapsed();
        if elapsed < self.interval_for(instance) {
            debug!(
                addr = %instance.addr(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Cycle too soon, skipping"
            );
            metrics().gate_refusals_total.with_label_values(&["throttle"]).inc();
            return false;
        }

        if !self.check_config.should_sentinel_check(&instance.cluster_id) {
            warn!(
                cluster = %instance.cluster_id,
                "Cluster excluded from sentinel checking, skipping"
            );
            metrics().gate_refusals_total.with_label_values(&["whitelist"]).inc();
            return false;
        }

        let status = self.cluster_status.status_of(&instance.cluster_id);
        if !status.is_some_and(|s| s.is_normal()) {
            warn!(
                cluster = %instance.cluster_id,
                status = ?status,
                "Cluster not in normal status, pausing check"
            );
            metrics().gate_refusals_total.with_label_values(&["status"]).inc();
            return false;
        }

        for controller in self.controllers.read().iter() {
            if !controller.should_check(instance) {
                debug!(
                    cluster = %instance.cluster_id,
                    shard = %instance.shard_id,
                    dc = %instance.dc_id,
                    active_dc = instance.in_active_dc,
                    controller = controller.name(),
                    "Controller refused check"
                );
                metrics().gate_refusals_total.with_label_values(&["controller"]).inc();
                return false;
            }
        }

        if !self.check_config.sentinel_auto_process() {
            debug!("Sentinel auto-process disabled, skipping");
            metrics().gate_refusals_total.with_label_values(&["disabled"]).inc();
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ClusterStatus, StatusTable};
    use crate::config::{SentinelCheckConfig, StaticCheckConfig};
    use parking_lot::Mutex;

    fn test_instance() -> MonitoredInstance {
        MonitoredInstance {
            cluster_id: "cluster-1".to_string(),
            shard_id: "shard_0".to_string(),
            dc_id: "dc-a".to_string(),
            in_active_dc: true,
            host: "10.0.0.1".to_string(),
            port: 6379,
            check_interval_ms: None,
        }
    }

    fn normal_status() -> Arc<StatusTable> {
        let table = StatusTable::new();
        table.set("cluster-1", ClusterStatus::Normal);
        Arc::new(table)
    }

    fn check_config(config: SentinelCheckConfig) -> Arc<StaticCheckConfig> {
        Arc::new(StaticCheckConfig::new(&config))
    }

    // A zero interval disarms the throttle for tests not exercising it
    const NO_THROTTLE: Duration = Duration::ZERO;

    /// Controller that records consultation order in a shared log
    struct OrderedController {
        id: &'static str,
        answer: bool,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl CheckController for OrderedController {
        fn should_check(&self, _instance: &MonitoredInstance) -> bool {
            self.log.lock().push(self.id);
            self.answer
        }
        fn name(&self) -> &'static str {
            self.id
        }
    }

    #[tokio::test]
    async fn test_all_conditions_pass() {
        let gate = Gate::new(
            check_config(SentinelCheckConfig::default()),
            normal_status(),
            NO_THROTTLE,
        );
        assert!(gate.should_start(&test_instance(), Instant::now()));
    }

    #[tokio::test]
    async fn test_throttle_refuses_recent_cycle() {
        let gate = Gate::new(
            check_config(SentinelCheckConfig::default()),
            normal_status(),
            Duration::from_secs(30),
        );
        assert!(!gate.should_start(&test_instance(), Instant::now()));
    }

    #[tokio::test]
    async fn test_per_instance_interval_override() {
        let gate = Gate::new(
            check_config(SentinelCheckConfig::default()),
            normal_status(),
            Duration::from_secs(30),
        );
        let mut instance = test_instance();
        // Zero-interval override: passes even though the default interval
        // would refuse a cycle that just started
        instance.check_interval_ms = Some(0);
        assert!(gate.should_start(&instance, Instant::now()));
        assert_eq!(gate.interval_for(&test_instance()), Duration::from_secs(30));
        assert_eq!(gate.interval_for(&instance), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_whitelist_refuses_skipped_cluster() {
        let config = SentinelCheckConfig {
            skip_clusters: vec!["cluster-1".to_string()],
            ..Default::default()
        };
        let gate = Gate::new(check_config(config), normal_status(), NO_THROTTLE);
        assert!(!gate.should_start(&test_instance(), Instant::now()));
    }

    #[tokio::test]
    async fn test_non_normal_status_refuses() {
        let table = StatusTable::new();
        table.set("cluster-1", ClusterStatus::Migrating);
        let gate = Gate::new(
            check_config(SentinelCheckConfig::default()),
            Arc::new(table),
            NO_THROTTLE,
        );
        assert!(!gate.should_start(&test_instance(), Instant::now()));
    }

    #[tokio::test]
    async fn test_unknown_cluster_refuses() {
        let gate = Gate::new(
            check_config(SentinelCheckConfig::default()),
            Arc::new(StatusTable::new()),
            NO_THROTTLE,
        );
        assert!(!gate.should_start(&test_instance(), Instant::now()));
    }

    #[tokio::test]
    async fn test_controllers_consulted_in_order_and_short_circuit() {
        let gate = Gate::new(
            check_config(SentinelCheckConfig::default()),
            normal_status(),
            NO_THROTTLE,
        );
        let log = Arc::new(Mutex::new(Vec::new()));
        gate.add_controller(Arc::new(OrderedController {
            id: "first",
            answer: true,
            log: log.clone(),
        }));
        gate.add_controller(Arc::new(OrderedController {
            id: "second",
            answer: false,
            log: log.clone(),
        }));
        gate.add_controller(Arc::new(OrderedController {
            id: "third",
            answer: true,
            log: log.clone(),
        }));

        assert!(!gate.should_start(&test_instance(), Instant::now()));
        // Third controller never consulted after the second refused
        assert_eq!(*log.lock(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_auto_process_disabled_refuses_last() {
        let provider = check_config(SentinelCheckConfig::default());
        provider.set_auto_process(false);
        let gate = Gate::new(provider, normal_status(), NO_THROTTLE);
        assert!(!gate.should_start(&test_instance(), Instant::now()));
    }
}

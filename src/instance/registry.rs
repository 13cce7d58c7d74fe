//! Registry of monitored instances and their check tasks
//!
//! Each registered instance gets its own long-running task driving the
//! check cycle on the base interval. Leadership is consulted before every
//! tick so only the elected console node actually runs checks.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use rand::Rng as _;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::check::HelloCheck;
use crate::metrics::metrics;

use super::LeaderProvider;

/// Registry spawning one leader-gated periodic check task per instance
pub struct MonitorRegistry {
    /// Check tasks by instance address
    tasks: DashMap<String, CancellationToken>,
    leader: Arc<dyn LeaderProvider>,
    /// Base scheduler tick, fixed for all instances
    base_interval: Duration,
}

impl MonitorRegistry {
    pub fn new(leader: Arc<dyn LeaderProvider>, base_interval: Duration) -> Self {
        Self {
            tasks: DashMap::new(),
            leader,
            base_interval,
        }
    }

    /// Register a check and spawn its periodic task
    ///
    /// Returns false (and spawns nothing) if the instance address is already
    /// registered.
    pub fn register(&self, check: Arc<HelloCheck>) -> bool {
        let addr = check.instance().addr();
        let entry = self.tasks.entry(addr.clone());
        let dashmap::mapref::entry::Entry::Vacant(entry) = entry else {
            warn!(addr = %addr, "Instance already registered, ignoring");
            return false;
        };

        let token = CancellationToken::new();
        entry.insert(token.clone());
        metrics().instances_registered.inc();
        info!(
            cluster = %check.instance().cluster_id,
            addr = %addr,
            "Registered instance for sentinel checking"
        );

        let leader = self.leader.clone();
        let base_interval = self.base_interval;
        tokio::spawn(async move {
            // Stagger task start so all instances do not tick together
            let stagger = rand::thread_rng().gen_range(0..base_interval.as_millis() as u64);
            tokio::time::sleep(Duration::from_millis(stagger)).await;

            let mut ticker = tokio::time::interval(base_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!(addr = %check.instance().addr(), "Check task cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        if leader.is_leader_for(check.instance()) {
                            check.tick();
                        } else {
                            debug!(
                                addr = %check.instance().addr(),
                                "Not leader for instance, skipping tick"
                            );
                        }
                    }
                }
            }
        });

        true
    }

    /// Cancel the check task for an instance
    pub fn unregister(&self, addr: &str) {
        if let Some((_, token)) = self.tasks.remove(addr) {
            token.cancel();
            metrics().instances_registered.dec();
            info!(addr = %addr, "Unregistered instance");
        }
    }

    /// Cancel every check task
    pub fn shutdown(&self) {
        for entry in self.tasks.iter() {
            entry.value().cancel();
        }
        let drained = self.tasks.len();
        self.tasks.clear();
        metrics().instances_registered.sub(drained as i64);
        info!(instances = drained, "Monitor registry shut down");
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Gate;
    use crate::cluster::{ClusterStatus, StatusTable};
    use crate::config::{SentinelCheckConfig, StaticCheckConfig};
    use crate::instance::{AlwaysLeader, MonitoredInstance};
    use crate::pubsub::{SubscribeHandler, SubscriptionGateway};

    struct NullGateway;

    impl SubscriptionGateway for NullGateway {
        fn subscribe_if_absent(&self, _channel: &str, _handler: Arc<dyn SubscribeHandler>) {}
        fn unsubscribe(&self, _channel: &str) {}
    }

    fn test_check(host: &str) -> Arc<HelloCheck> {
        let table = StatusTable::new();
        table.set("cluster-1", ClusterStatus::Normal);
        let gate = Arc::new(Gate::new(
            Arc::new(StaticCheckConfig::new(&SentinelCheckConfig::default())),
            Arc::new(table),
            Duration::from_secs(30),
        ));
        Arc::new(HelloCheck::new(
            MonitoredInstance {
                cluster_id: "cluster-1".to_string(),
                shard_id: "shard_0".to_string(),
                dc_id: "dc-a".to_string(),
                in_active_dc: true,
                host: host.to_string(),
                port: 6379,
                check_interval_ms: None,
            },
            gate,
            Arc::new(NullGateway),
            Duration::from_secs(5),
        ))
    }

    #[tokio::test]
    async fn test_register_and_unregister() {
        let registry = MonitorRegistry::new(Arc::new(AlwaysLeader), Duration::from_secs(10));

        assert!(registry.register(test_check("10.0.0.1")));
        assert!(registry.register(test_check("10.0.0.2")));
        assert_eq!(registry.len(), 2);

        registry.unregister("10.0.0.1:6379");
        assert_eq!(registry.len(), 1);

        // Unregistering an unknown address is a no-op
        registry.unregister("10.0.0.9:6379");
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_registration_refused() {
        let registry = MonitorRegistry::new(Arc::new(AlwaysLeader), Duration::from_secs(10));

        assert!(registry.register(test_check("10.0.0.1")));
        assert!(!registry.register(test_check("10.0.0.1")));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_all() {
        let registry = MonitorRegistry::new(Arc::new(AlwaysLeader), Duration::from_secs(10));
        registry.register(test_check("10.0.0.1"));
        registry.register(test_check("10.0.0.2"));

        registry.shutdown();
        assert!(registry.is_empty());
    }
}

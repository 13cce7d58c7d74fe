//! Monitored instance descriptors and the per-instance check scheduler
//!
//! This module provides:
//! - The descriptor for one health-check target (endpoint + placement +
//!   check configuration)
//! - A registry that spawns one leader-gated periodic check task per
//!   registered instance

mod leader;
mod registry;

pub use leader::{AlwaysLeader, LeaderProvider};
pub use registry::MonitorRegistry;

/// One health-check target: a Redis endpoint plus its placement and
/// per-instance check configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredInstance {
    /// Cluster the instance belongs to
    pub cluster_id: String,
    /// Shard within the cluster
    pub shard_id: String,
    /// Data center hosting the instance
    pub dc_id: String,
    /// Whether the data center is the active (primary) side
    pub in_active_dc: bool,
    /// Endpoint hostname or IP
    pub host: String,
    /// Endpoint port
    pub port: u16,
    /// Per-instance sentinel check interval override (milliseconds)
    pub check_interval_ms: Option<u64>,
}

impl MonitoredInstance {
    /// Endpoint as "host:port"
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addr() {
        let instance = MonitoredInstance {
            cluster_id: "cluster-1".to_string(),
            shard_id: "shard-1".to_string(),
            dc_id: "dc-a".to_string(),
            in_active_dc: true,
            host: "10.0.0.1".to_string(),
            port: 6379,
            check_interval_ms: None,
        };
        assert_eq!(instance.addr(), "10.0.0.1:6379");
    }
}

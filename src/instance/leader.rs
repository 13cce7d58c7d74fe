//! Leadership capability for leader-gated checks
//!
//! In a redundant console deployment only the elected leader runs sentinel
//! checks, so the same instance is never checked twice. Election itself is
//! an external concern; the scheduler only consults this capability before
//! each tick.

use super::MonitoredInstance;

/// Answers whether this node currently holds leadership for an instance
pub trait LeaderProvider: Send + Sync {
    fn is_leader_for(&self, instance: &MonitoredInstance) -> bool;
}

/// Single-node deployments: always the leader
#[derive(Debug, Default)]
pub struct AlwaysLeader;

impl LeaderProvider for AlwaysLeader {
    fn is_leader_for(&self, _instance: &MonitoredInstance) -> bool {
        true
    }
}

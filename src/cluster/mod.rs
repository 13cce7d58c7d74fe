//! Cluster status lookup
//!
//! Sentinel checks only run while a cluster sits in its steady state; any
//! migration-related status pauses checking for the whole cluster. Status
//! computation itself lives elsewhere, this module only defines the lookup
//! contract and a simple in-memory provider.

use dashmap::DashMap;
use serde::Deserialize;

/// Lifecycle status of a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterStatus {
    /// Steady state, checks may run
    Normal,
    /// Locked ahead of a migration
    Lock,
    /// Migration in progress
    Migrating,
    /// Migration being rolled back
    Rollback,
}

impl ClusterStatus {
    pub fn is_normal(&self) -> bool {
        matches!(self, ClusterStatus::Normal)
    }
}

/// Lookup of a cluster's current status by id
///
/// Returning `None` for an unknown cluster is treated as not-Normal by
/// callers: an unknown cluster is never checked.
pub trait ClusterStatusProvider: Send + Sync {
    fn status_of(&self, cluster_id: &str) -> Option<ClusterStatus>;
}

/// In-memory status table, fed from configuration or an external control
/// plane.
#[derive(Debug, Default)]
pub struct StatusTable {
    statuses: DashMap<String, ClusterStatus>,
}

impl StatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, cluster_id: impl Into<String>, status: ClusterStatus) {
        self.statuses.insert(cluster_id.into(), status);
    }
}

impl ClusterStatusProvider for StatusTable {
    fn status_of(&self, cluster_id: &str) -> Option<ClusterStatus> {
        self.statuses.get(cluster_id).map(|s| *s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_table_lookup() {
        let table = StatusTable::new();
        table.set("cluster-1", ClusterStatus::Normal);
        table.set("cluster-2", ClusterStatus::Migrating);

        assert_eq!(table.status_of("cluster-1"), Some(ClusterStatus::Normal));
        assert_eq!(table.status_of("cluster-2"), Some(ClusterStatus::Migrating));
        assert_eq!(table.status_of("cluster-3"), None);
    }

    #[test]
    fn test_only_normal_is_normal() {
        assert!(ClusterStatus::Normal.is_normal());
        assert!(!ClusterStatus::Lock.is_normal());
        assert!(!ClusterStatus::Migrating.is_normal());
        assert!(!ClusterStatus::Rollback.is_normal());
    }

    #[test]
    fn test_status_overwrite() {
        let table = StatusTable::new();
        table.set("cluster-1", ClusterStatus::Normal);
        table.set("cluster-1", ClusterStatus::Lock);
        assert_eq!(table.status_of("cluster-1"), Some(ClusterStatus::Lock));
    }
}

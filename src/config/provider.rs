//! Check configuration lookup
//!
//! The gate consults configuration through this trait so tests and
//! alternative config backends can stand in for the TOML file.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use super::SentinelCheckConfig;

/// Per-cluster whitelist query and the global auto-process switch
pub trait CheckConfigProvider: Send + Sync {
    /// Whether sentinel checks should run for this cluster at all
    fn should_sentinel_check(&self, cluster_id: &str) -> bool;

    /// Global sentinel auto-process switch
    fn sentinel_auto_process(&self) -> bool;
}

/// Provider backed by the loaded TOML configuration
///
/// The auto-process flag is atomic so an operator endpoint can flip it at
/// runtime without reloading.
#[derive(Debug)]
pub struct StaticCheckConfig {
    skip_clusters: HashSet<String>,
    auto_process: AtomicBool,
}

impl StaticCheckConfig {
    pub fn new(config: &SentinelCheckConfig) -> Self {
        Self {
            skip_clusters: config.skip_clusters.iter().cloned().collect(),
            auto_process: AtomicBool::new(config.auto_process),
        }
    }

    pub fn set_auto_process(&self, enabled: bool) {
        self.auto_process.store(enabled, Ordering::Relaxed);
    }
}

impl CheckConfigProvider for StaticCheckConfig {
    fn should_sentinel_check(&self, cluster_id: &str) -> bool {
        !self.skip_clusters.contains(cluster_id)
    }

    fn sentinel_auto_process(&self) -> bool {
        self.auto_process.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_list() {
        let config = SentinelCheckConfig {
            skip_clusters: vec!["legacy".to_string()],
            ..Default::default()
        };
        let provider = StaticCheckConfig::new(&config);

        assert!(!provider.should_sentinel_check("legacy"));
        assert!(provider.should_sentinel_check("cluster-1"));
    }

    #[test]
    fn test_auto_process_toggle() {
        let provider = StaticCheckConfig::new(&SentinelCheckConfig::default());
        assert!(provider.sentinel_auto_process());

        provider.set_auto_process(false);
        assert!(!provider.sentinel_auto_process());
    }
}

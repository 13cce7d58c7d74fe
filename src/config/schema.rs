use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Sentinel check configuration
    #[serde(default)]
    pub sentinel: SentinelCheckConfig,
    /// Monitored clusters
    #[serde(default)]
    pub clusters: Vec<ClusterConfig>,
}

// ============================================================================
// Sentinel Check Configuration
// ============================================================================

/// Configuration for the sentinel hello check
#[derive(Debug, Clone, Deserialize)]
pub struct SentinelCheckConfig {
    /// Global switch for sentinel auto-processing
    #[serde(default = "default_auto_process")]
    pub auto_process: bool,
    /// Minimum time between two check cycles per instance (milliseconds)
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    /// Collection window after the subscription opens (milliseconds)
    #[serde(default = "default_collect_window_ms")]
    pub collect_window_ms: u64,
    /// Base scheduler tick (milliseconds)
    #[serde(default = "default_base_interval_ms")]
    pub base_interval_ms: u64,
    /// Clusters excluded from sentinel checking
    #[serde(default)]
    pub skip_clusters: Vec<String>,
}

fn default_auto_process() -> bool {
    true
}

fn default_check_interval_ms() -> u64 {
    30000
}

fn default_collect_window_ms() -> u64 {
    5000
}

fn default_base_interval_ms() -> u64 {
    10000
}

impl Default for SentinelCheckConfig {
    fn default() -> Self {
        Self {
            auto_process: default_auto_process(),
            check_interval_ms: default_check_interval_ms(),
            collect_window_ms: default_collect_window_ms(),
            base_interval_ms: default_base_interval_ms(),
            skip_clusters: Vec::new(),
        }
    }
}

// ============================================================================
// Cluster / Shard / Instance Configuration
// ============================================================================

/// One monitored cluster
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    /// Unique cluster id
    pub id: String,
    /// Initial cluster status (updated at runtime by the control plane)
    #[serde(default = "default_cluster_status")]
    pub status: crate::cluster::ClusterStatus,
    /// Shards in this cluster
    #[serde(default)]
    pub shards: Vec<ShardConfig>,
}

fn default_cluster_status() -> crate::cluster::ClusterStatus {
    crate::cluster::ClusterStatus::Normal
}

/// One shard of a cluster
#[derive(Debug, Clone, Deserialize)]
pub struct ShardConfig {
    /// Shard identifier (e.g., "shard_0")
    pub id: String,
    /// Redis instances in this shard
    pub instances: Vec<InstanceConfig>,
}

/// One monitored Redis instance
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceConfig {
    /// Hostname or IP
    pub host: String,
    /// Port number
    pub port: u16,
    /// Data center hosting the instance
    pub dc: String,
    /// Whether the data center is the active side
    #[serde(default)]
    pub active: bool,
    /// Per-instance check interval override (milliseconds)
    #[serde(default)]
    pub check_interval_ms: Option<u64>,
}

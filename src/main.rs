use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use argus::check::{Gate, HelloCheck, LoggingListener};
use argus::cluster::StatusTable;
use argus::config::{self, Config, StaticCheckConfig};
use argus::instance::{AlwaysLeader, MonitorRegistry, MonitoredInstance};
use argus::pubsub::RedisSubscriptionGateway;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = load_or_default_config();

    let check_config = Arc::new(StaticCheckConfig::new(&config.sentinel));
    let status_table = Arc::new(StatusTable::new());
    for cluster in &config.clusters {
        status_table.set(cluster.id.clone(), cluster.status);
    }

    let gate = Arc::new(Gate::new(
        check_config,
        status_table,
        Duration::from_millis(config.sentinel.check_interval_ms),
    ));

    let registry = Arc::new(MonitorRegistry::new(
        Arc::new(AlwaysLeader),
        Duration::from_millis(config.sentinel.base_interval_ms),
    ));

    let collect_window = Duration::from_millis(config.sentinel.collect_window_ms);
    let listener = Arc::new(LoggingListener);

    for cluster in &config.clusters {
        for shard in &cluster.shards {
            for instance_config in &shard.instances {
                let instance = MonitoredInstance {
                    cluster_id: cluster.id.clone(),
                    shard_id: shard.id.clone(),
                    dc_id: instance_config.dc.clone(),
                    in_active_dc: instance_config.active,
                    host: instance_config.host.clone(),
                    port: instance_config.port,
                    check_interval_ms: instance_config.check_interval_ms,
                };
                let gateway = Arc::new(RedisSubscriptionGateway::new(instance.addr()));
                let check = Arc::new(HelloCheck::new(
                    instance,
                    gate.clone(),
                    gateway,
                    collect_window,
                ));
                check.add_listener(listener.clone());
                registry.register(check);
            }
        }
    }

    info!(
        instances = registry.len(),
        base_interval_ms = config.sentinel.base_interval_ms,
        collect_window_ms = config.sentinel.collect_window_ms,
        "Argus sentinel monitor started"
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    registry.shutdown();
    Ok(())
}

fn load_or_default_config() -> Config {
    // Try to load from config file
    let config_paths = ["config/argus.toml", "argus.toml"];

    for path in config_paths {
        match config::load_config(path) {
            Ok(config) => {
                info!(path = path, "Loaded configuration");
                return config;
            }
            Err(e) => {
                warn!(path = path, error = %e, "Failed to load config");
            }
        }
    }

    info!("Using default configuration");
    Config::default()
}

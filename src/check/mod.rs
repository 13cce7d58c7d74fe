//! Sentinel hello check cycle
//!
//! One cycle per tick: the [`Gate`] decides go/no-go, [`HelloCheck`] opens a
//! subscription on the hello channel, collects distinct announcements for a
//! fixed window and delivers the aggregate (or a captured subscription
//! failure) to the registered listeners.

mod controller;
mod cycle;
mod gate;

pub use controller::CheckController;
pub use cycle::HelloCheck;
pub use gate::Gate;

use std::collections::HashSet;

use tracing::{info, warn};

use crate::hello::SentinelHello;
use crate::instance::MonitoredInstance;
use crate::pubsub::SubscribeError;

/// Outcome of one completed check cycle
///
/// Exactly one result is delivered per cycle. A captured subscription
/// failure takes precedence over any records collected before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleResult {
    /// Distinct hello records observed during the window
    Success(HashSet<SentinelHello>),
    /// Subscription failure captured during the window
    Failure(SubscribeError),
}

/// Consumer of cycle results, invoked synchronously in registration order
pub trait CycleListener: Send + Sync {
    fn on_result(&self, instance: &MonitoredInstance, result: &CycleResult);
}

/// Listener that only logs the delivered result
#[derive(Debug, Default)]
pub struct LoggingListener;

impl CycleListener for LoggingListener {
    fn on_result(&self, instance: &MonitoredInstance, result: &CycleResult) {
        match result {
            CycleResult::Success(hellos) => info!(
                cluster = %instance.cluster_id,
                shard = %instance.shard_id,
                addr = %instance.addr(),
                hellos = hellos.len(),
                "Sentinel check cycle completed"
            ),
            CycleResult::Failure(error) => warn!(
                cluster = %instance.cluster_id,
                shard = %instance.shard_id,
                addr = %instance.addr(),
                error = %error,
                "Sentinel check cycle failed"
            ),
        }
    }
}

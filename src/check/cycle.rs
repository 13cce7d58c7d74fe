//! One collect-then-deliver check cycle per tick
//!
//! State machine per monitored instance: Idle -> Collecting -> Closing ->
//! Idle. A tick that passes the gate opens the hello subscription and arms a
//! one-shot window timer; inbound messages are parsed off the delivery path
//! into the live set; when the timer fires the subscription is released, the
//! live set is swapped out and the result goes to the listeners.
//!
//! Overlap protection is throttle-only: if the configured interval is
//! shorter than the collection window, two ticks can both pass the gate and
//! their collecting phases overlap. That discipline belongs to the interval
//! configuration, not to this type.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::hello::{SentinelHello, HELLO_CHANNEL};
use crate::instance::MonitoredInstance;
use crate::metrics::metrics;
use crate::pubsub::{SubscribeError, SubscribeHandler, SubscriptionGateway};

use super::gate::Gate;
use super::{CycleListener, CycleResult};

/// Sentinel hello check for one monitored instance
pub struct HelloCheck {
    instance: MonitoredInstance,
    gate: Arc<Gate>,
    gateway: Arc<dyn SubscriptionGateway>,
    /// Result consumers in registration order; append-only
    listeners: RwLock<Vec<Arc<dyn CycleListener>>>,
    /// Live collection set for the window in progress. Swapped, never
    /// cleared: late insertions land in the next cycle's set and a delivered
    /// snapshot is never touched again.
    live: Mutex<Arc<DashSet<SentinelHello>>>,
    /// Most recent subscription failure of the window in progress
    failure: Mutex<Option<SubscribeError>>,
    /// Throttle reference point; initialized at construction so the first
    /// tick waits out a full interval
    last_cycle_start: Mutex<Instant>,
    /// Collection window length
    collect_window: Duration,
}

impl HelloCheck {
    pub fn new(
        instance: MonitoredInstance,
        gate: Arc<Gate>,
        gateway: Arc<dyn SubscriptionGateway>,
        collect_window: Duration,
    ) -> Self {
        Self {
            instance,
            gate,
            gateway,
            listeners: RwLock::new(Vec::new()),
            live: Mutex::new(Arc::new(DashSet::new())),
            failure: Mutex::new(None),
            last_cycle_start: Mutex::new(Instant::now()),
            collect_window,
        }
    }

    pub fn instance(&self) -> &MonitoredInstance {
        &self.instance
    }

    /// Append a listener; notified synchronously on every delivered result
    pub fn add_listener(&self, listener: Arc<dyn CycleListener>) {
        self.listeners.write().push(listener);
    }

    /// One scheduler tick. Gate refusal leaves the cycle idle: no
    /// subscription, no timer, no notification.
    pub fn tick(self: &Arc<Self>) {
        let last_start = *self.last_cycle_start.lock();
        if !self.gate.should_start(&self.instance, last_start) {
            return;
        }

        *self.last_cycle_start.lock() = Instant::now();
        if self.instance.in_active_dc {
            info!(
                cluster = %self.instance.cluster_id,
                shard = %self.instance.shard_id,
                addr = %self.instance.addr(),
                "Starting hello collection in active dc"
            );
        }

        *self.failure.lock() = None;
        metrics().cycles_started_total.inc();

        let handler: Arc<dyn SubscribeHandler> = Arc::new(CycleHandler {
            cycle: self.clone(),
        });
        self.gateway.subscribe_if_absent(HELLO_CHANNEL, handler);

        // The window timer always fires; it is never cancelled. The
        // deadline is anchored at tick time, before the task is polled.
        let deadline = Instant::now() + self.collect_window;
        let cycle = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            cycle.close_window();
        });
    }

    /// Close the window: release the subscription, swap out the live set,
    /// build the result and notify listeners.
    fn close_window(&self) {
        self.gateway.unsubscribe(HELLO_CHANNEL);

        let collected = {
            let mut live = self.live.lock();
            std::mem::replace(&mut *live, Arc::new(DashSet::new()))
        };

        let result = match self.failure.lock().take() {
            Some(error) => CycleResult::Failure(error),
            None => {
                let hellos: HashSet<SentinelHello> =
                    collected.iter().map(|h| h.key().clone()).collect();
                CycleResult::Success(hellos)
            }
        };

        let outcome = match &result {
            CycleResult::Success(_) => "success",
            CycleResult::Failure(_) => "failure",
        };
        metrics()
            .results_delivered_total
            .with_label_values(&[outcome])
            .inc();
        debug!(
            addr = %self.instance.addr(),
            outcome = outcome,
            "Hello collection window closed"
        );

        for listener in self.listeners.read().iter() {
            listener.on_result(&self.instance, &result);
        }
    }
}

/// Subscription callbacks for one instance's cycles
struct CycleHandler {
    cycle: Arc<HelloCheck>,
}

impl SubscribeHandler for CycleHandler {
    /// Parsing and insertion run on a spawned task so the transport's
    /// delivery path is never blocked. The live set is resolved at insert
    /// time: a message parsed after the window swap lands in the next
    /// cycle's set.
    fn on_message(&self, _channel: &str, payload: &str) {
        let cycle = self.cycle.clone();
        let payload = payload.to_string();
        tokio::spawn(async move {
            match payload.parse::<SentinelHello>() {
                Ok(hello) => {
                    let live = cycle.live.lock().clone();
                    live.insert(hello);
                    metrics().hellos_collected_total.inc();
                }
                Err(e) => {
                    warn!(
                        addr = %cycle.instance.addr(),
                        error = %e,
                        "Discarding unparseable hello"
                    );
                }
            }
        });
    }

    /// Single-slot capture: the most recent failure wins, duplicates simply
    /// overwrite.
    fn on_failure(&self, error: SubscribeError) {
        if error.is_noisy() {
            error!(
                addr = %self.cycle.instance.addr(),
                "Hello subscription failed: {error}"
            );
        } else {
            error!(
                addr = %self.cycle.instance.addr(),
                error = ?error,
                "Hello subscription failed"
            );
        }
        metrics().subscribe_failures_total.inc();
        *self.cycle.failure.lock() = Some(error);
    }
}

//! Argus: Redis Sentinel hello-channel health-check monitor
//!
//! Periodically subscribes to each monitored instance's `__sentinel__:hello`
//! channel, aggregates the distinct gossip announcements seen during a fixed
//! collection window and delivers the aggregate (or a captured subscription
//! failure) to registered listeners.

pub mod check;
pub mod cluster;
pub mod config;
pub mod hello;
pub mod instance;
pub mod metrics;
pub mod pubsub;

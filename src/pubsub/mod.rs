//! Pub/sub subscription gateway
//!
//! The check cycle consumes subscriptions through the [`SubscriptionGateway`]
//! trait; [`RedisSubscriptionGateway`] is the concrete adapter speaking RESP
//! over a plain TCP connection to the monitored instance.

mod redis;
mod resp;

pub use redis::RedisSubscriptionGateway;
pub use resp::{RespCodec, RespValue};

use std::sync::Arc;

use thiserror::Error;

/// Failure reported by an open subscription
///
/// Clonable so a captured failure can both live in the cycle's failure slot
/// and be delivered inside the cycle result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubscribeError {
    #[error("Connect failed: {0}")]
    Connect(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Connection closed by peer")]
    Closed,
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl SubscribeError {
    /// Connection-level failures recur constantly against unreachable
    /// instances; they are logged without the full error chain.
    pub fn is_noisy(&self) -> bool {
        matches!(self, SubscribeError::Connect(_) | SubscribeError::Closed)
    }
}

/// Receives messages and failures from an open subscription
///
/// Both callbacks may be invoked concurrently with each other. More than one
/// `on_failure` per subscription must be tolerated.
pub trait SubscribeHandler: Send + Sync {
    fn on_message(&self, channel: &str, payload: &str);
    fn on_failure(&self, error: SubscribeError);
}

/// Subscribe/unsubscribe to named pub/sub channels
pub trait SubscriptionGateway: Send + Sync {
    /// Open a subscription unless one is already active for `channel`.
    /// Opening twice neither duplicates delivery nor replaces the handler.
    fn subscribe_if_absent(&self, channel: &str, handler: Arc<dyn SubscribeHandler>);

    /// Release the subscription for `channel`; safe to call when not
    /// subscribed.
    fn unsubscribe(&self, channel: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noisy_errors() {
        assert!(SubscribeError::Connect("refused".into()).is_noisy());
        assert!(SubscribeError::Closed.is_noisy());
        assert!(!SubscribeError::Io("reset".into()).is_noisy());
        assert!(!SubscribeError::Protocol("bad frame".into()).is_noisy());
    }
}

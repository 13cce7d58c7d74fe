//! RESP subscription gateway over plain TCP
//!
//! One gateway per monitored instance. Each subscribed channel gets its own
//! reader task; `subscribe_if_absent` is a no-op while that task is alive
//! and `unsubscribe` cancels it.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::resp::{RespCodec, RespValue};
use super::{SubscribeError, SubscribeHandler, SubscriptionGateway};

/// Subscription gateway for one Redis endpoint
pub struct RedisSubscriptionGateway {
    /// Endpoint as "host:port"
    addr: String,
    /// Active reader tasks by channel
    subscriptions: DashMap<String, CancellationToken>,
}

impl RedisSubscriptionGateway {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            subscriptions: DashMap::new(),
        }
    }
}

impl SubscriptionGateway for RedisSubscriptionGateway {
    fn subscribe_if_absent(&self, channel: &str, handler: Arc<dyn SubscribeHandler>) {
        match self.subscriptions.entry(channel.to_string()) {
            Entry::Occupied(_) => {
                debug!(addr = %self.addr, channel = channel, "Already subscribed");
            }
            Entry::Vacant(entry) => {
                let token = CancellationToken::new();
                entry.insert(token.clone());

                let addr = self.addr.clone();
                let channel = channel.to_string();
                tokio::spawn(async move {
                    run_subscription(addr, channel, handler, token).await;
                });
            }
        }
    }

    fn unsubscribe(&self, channel: &str) {
        if let Some((_, token)) = self.subscriptions.remove(channel) {
            token.cancel();
            debug!(addr = %self.addr, channel = channel, "Unsubscribed");
        }
    }
}

/// Reader task: connect, send SUBSCRIBE, forward pushes until cancelled
async fn run_subscription(
    addr: String,
    channel: String,
    handler: Arc<dyn SubscribeHandler>,
    token: CancellationToken,
) {
    let stream = match TcpStream::connect(&addr).await {
        Ok(stream) => stream,
        Err(e) => {
            handler.on_failure(SubscribeError::Connect(e.to_string()));
            return;
        }
    };
    let mut framed = Framed::new(stream, RespCodec);

    if let Err(e) = framed
        .send(vec!["SUBSCRIBE".to_string(), channel.clone()])
        .await
    {
        handler.on_failure(SubscribeError::Io(e.to_string()));
        return;
    }
    debug!(addr = %addr, channel = %channel, "Subscription opened");

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                debug!(addr = %addr, channel = %channel, "Subscription reader cancelled");
                break;
            }
            frame = framed.next() => match frame {
                Some(Ok(value)) => dispatch(value, &handler),
                Some(Err(e)) => {
                    let error = if e.kind() == std::io::ErrorKind::InvalidData {
                        SubscribeError::Protocol(e.to_string())
                    } else {
                        SubscribeError::Io(e.to_string())
                    };
                    handler.on_failure(error);
                    break;
                }
                None => {
                    handler.on_failure(SubscribeError::Closed);
                    break;
                }
            }
        }
    }
}

/// Route one decoded frame to the handler
fn dispatch(value: RespValue, handler: &Arc<dyn SubscribeHandler>) {
    match value {
        RespValue::Array(Some(items)) if items.len() == 3 => {
            let kind = items[0].as_text().unwrap_or_default();
            match kind.as_str() {
                "message" => {
                    let channel = items[1].as_text().unwrap_or_default();
                    let payload = items[2].as_text().unwrap_or_default();
                    handler.on_message(&channel, &payload);
                }
                // Subscribe/unsubscribe confirmations carry no payload
                "subscribe" | "unsubscribe" => {
                    debug!(kind = %kind, "Subscription acknowledged");
                }
                other => {
                    warn!(kind = %other, "Unexpected push frame");
                }
            }
        }
        RespValue::Error(message) => {
            handler.on_failure(SubscribeError::Protocol(message));
        }
        other => {
            warn!(frame = ?other, "Unexpected frame on subscriber connection");
        }
    }
}

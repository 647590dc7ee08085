//! Redis pub/sub-backed broker (optional).
//!
//! Topic = Redis channel, payload = JSON-serialized envelope. Redis pub/sub is
//! not durable: messages published while nobody is subscribed are gone. That
//! matches the fire-and-forget channel contract; nothing here retries.

use std::sync::mpsc;
use std::thread;

use redis::Commands;
use tracing::{debug, warn};

use funcstream_events::{ChannelError, MessageBroker, MessageEnvelope, Subscription};

#[derive(Debug, Clone)]
pub struct RedisPubSubBroker {
    client: redis::Client,
}

impl RedisPubSubBroker {
    /// Validates the URL; no connection is opened until first use.
    pub fn new(redis_url: impl AsRef<str>) -> Result<Self, ChannelError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| ChannelError::Unavailable(e.to_string()))?;
        Ok(Self { client })
    }
}

impl MessageBroker for RedisPubSubBroker {
    fn publish(&self, envelope: MessageEnvelope) -> Result<(), ChannelError> {
        let payload =
            serde_json::to_string(&envelope).map_err(|e| ChannelError::Encode(e.to_string()))?;

        let mut conn = self
            .client
            .get_connection()
            .map_err(|e| ChannelError::Unavailable(e.to_string()))?;

        let receivers: i64 = conn
            .publish(envelope.topic(), payload)
            .map_err(|e| ChannelError::Unavailable(e.to_string()))?;

        debug!(topic = envelope.topic(), receivers, "published to redis");
        Ok(())
    }

    fn subscribe(&self, topic: &str) -> Result<Subscription<MessageEnvelope>, ChannelError> {
        let (tx, rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), ChannelError>>();

        let client = self.client.clone();
        let topic = topic.to_string();

        // Background thread that receives pub/sub messages and forwards them.
        thread::Builder::new()
            .name(format!("redis-sub-{topic}"))
            .spawn(move || {
                let mut conn = match client.get_connection() {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = ready_tx.send(Err(ChannelError::Unavailable(e.to_string())));
                        return;
                    }
                };

                let mut pubsub = conn.as_pubsub();
                if let Err(e) = pubsub.subscribe(&topic) {
                    let _ = ready_tx.send(Err(ChannelError::Unavailable(e.to_string())));
                    return;
                }
                let _ = ready_tx.send(Ok(()));

                loop {
                    let msg = match pubsub.get_message() {
                        Ok(m) => m,
                        Err(e) => {
                            warn!(topic = %topic, error = %e, "redis subscription closed");
                            return;
                        }
                    };

                    let payload: String = match msg.get_payload() {
                        Ok(p) => p,
                        Err(_) => continue,
                    };

                    let envelope: MessageEnvelope = match serde_json::from_str(&payload) {
                        Ok(e) => e,
                        Err(e) => {
                            warn!(topic = %topic, error = %e, "skipping malformed envelope");
                            continue;
                        }
                    };

                    if tx.send(envelope).is_err() {
                        return;
                    }
                }
            })
            .map_err(|e| ChannelError::Unavailable(e.to_string()))?;

        // Only hand out the subscription once Redis has acknowledged it, so
        // nothing published after this call returns can be missed.
        ready_rx
            .recv()
            .map_err(|_| ChannelError::Unavailable("redis subscriber thread exited".to_string()))??;

        Ok(Subscription::new(rx))
    }
}

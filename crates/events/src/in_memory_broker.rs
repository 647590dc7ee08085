//! In-memory broker for tests/dev.
//!
//! Two kinds of listener hang off each topic:
//!
//! - **Subscriptions**: `mpsc` receivers handed out by `subscribe`, drained
//!   by whoever holds them (typically a worker thread)
//! - **Consumers**: closures registered with `register_consumer` or `bind`,
//!   run on the publishing thread before `publish` returns
//!
//! Consumers run after the topic lock is released, so a consumer may publish
//! in turn. That is how a bound `createEmployee` function answers on
//! `employeeCreated` within the same `send` call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};

use tracing::{debug, warn};

use crate::binding::{FunctionBinding, dispatch};
use crate::channel::{ChannelError, MessageBroker, Subscription};
use crate::envelope::MessageEnvelope;
use crate::registry::RegisteredFunction;

type Consumer = Arc<dyn Fn(&MessageEnvelope) + Send + Sync>;

#[derive(Default)]
struct TopicRoutes {
    subscribers: Vec<mpsc::Sender<MessageEnvelope>>,
    consumers: Vec<Consumer>,
}

/// In-memory pub/sub broker.
///
/// - No IO
/// - Per-topic fan-out to `mpsc` subscriptions (best effort, dead receivers
///   are dropped on the next publish)
/// - Registered consumers run synchronously on the publishing thread, so a
///   `send` returns only after the whole choreography it triggers has run
/// - Messages on a topic nobody listens to are dropped
#[derive(Default)]
pub struct InMemoryBroker {
    topics: Mutex<HashMap<String, TopicRoutes>>,
    disconnected: AtomicBool,
}

impl core::fmt::Debug for InMemoryBroker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let topics: Vec<String> = self
            .topics
            .lock()
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default();
        f.debug_struct("InMemoryBroker")
            .field("topics", &topics)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing the broker: publishing fails until [`reconnect`](Self::reconnect).
    pub fn disconnect(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }

    pub fn reconnect(&self) {
        self.disconnected.store(false, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        !self.disconnected.load(Ordering::SeqCst)
    }

    /// Run `consumer` synchronously for every envelope published to `topic`.
    pub fn register_consumer<F>(&self, topic: &str, consumer: F) -> Result<(), ChannelError>
    where
        F: Fn(&MessageEnvelope) + Send + Sync + 'static,
    {
        let mut topics = self.lock_topics()?;
        topics
            .entry(topic.to_string())
            .or_default()
            .consumers
            .push(Arc::new(consumer));
        Ok(())
    }

    /// Route `binding.input()` into `function`, publishing its output on
    /// `binding.output()`.
    ///
    /// Failures are logged and swallowed: the publisher already handed the
    /// message off and never sees the consumer's outcome.
    pub fn bind(
        self: &Arc<Self>,
        function: RegisteredFunction,
        binding: &FunctionBinding,
    ) -> Result<(), ChannelError> {
        // Weak: the broker owns its consumers, so a strong handle here would leak.
        let broker = Arc::downgrade(self);
        let output = binding.output().map(str::to_owned);

        self.register_consumer(binding.input(), move |envelope| {
            let Some(broker) = broker.upgrade() else {
                return;
            };
            if let Err(err) = dispatch(&*broker, &function, output.as_deref(), envelope) {
                warn!(
                    function = function.name(),
                    topic = envelope.topic(),
                    message_id = %envelope.message_id(),
                    error = %err,
                    "message handling failed"
                );
            }
        })
    }

    fn lock_topics(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, TopicRoutes>>, ChannelError> {
        self.topics
            .lock()
            .map_err(|_| ChannelError::Unavailable("in-memory broker lock poisoned".to_string()))
    }
}

impl MessageBroker for InMemoryBroker {
    fn publish(&self, envelope: MessageEnvelope) -> Result<(), ChannelError> {
        if !self.is_connected() {
            return Err(ChannelError::Unavailable(
                "in-memory broker is disconnected".to_string(),
            ));
        }

        // Consumers may publish in turn, so they run after the lock is released.
        let consumers = {
            let mut topics = self.lock_topics()?;
            let Some(routes) = topics.get_mut(envelope.topic()) else {
                debug!(topic = envelope.topic(), "no listeners on topic; message dropped");
                return Ok(());
            };
            routes.subscribers.retain(|tx| tx.send(envelope.clone()).is_ok());
            routes.consumers.clone()
        };

        for consumer in consumers {
            consumer(&envelope);
        }
        Ok(())
    }

    fn subscribe(&self, topic: &str) -> Result<Subscription<MessageEnvelope>, ChannelError> {
        let (tx, rx) = mpsc::channel();
        self.lock_topics()?
            .entry(topic.to_string())
            .or_default()
            .subscribers
            .push(tx);
        Ok(Subscription::new(rx))
    }
}

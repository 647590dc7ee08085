//! Broker and command-channel abstractions (mechanics only).
//!
//! The broker is a black box: it moves envelopes from publishers to
//! subscribers of a topic. Domain code never talks to it directly; the
//! frontend hands commands to a [`CommandChannel`], and registry functions
//! are attached to topics through bindings.
//!
//! ## Design
//!
//! - **Topic-addressed**: the envelope's topic is the only routing key
//! - **Transport-agnostic**: in-memory channels and Redis pub/sub implement
//!   the same [`MessageBroker`] trait
//! - **Fire-and-forget sends**: a successful send means the broker accepted
//!   the envelope; the sender never learns what the consumer did with it
//! - **No persistence**: a topic with no listeners drops what is published
//!   to it
//!
//! ## Delivery
//!
//! Delivery guarantees are whatever the concrete broker gives; at-least-once
//! or better is assumed. Nothing here retries, acknowledges, or dead-letters.
//! Handlers that observe events must tolerate seeing one twice.
//!
//! ## Failures
//!
//! Only [`ChannelError::Unavailable`] reaches a sender as a transport
//! failure. Encoding problems are caught before anything is published.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvError, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::envelope::MessageEnvelope;
use crate::message::Command;

/// Failures surfaced to whoever hands a message to a channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The broker could not be reached (the `ChannelUnavailable` case).
    ///
    /// Surfaced to the sender as-is; retry policy belongs to the caller.
    #[error("channel unavailable: {0}")]
    Unavailable(String),

    /// The message could not be turned into a broker payload.
    #[error("failed to encode message: {0}")]
    Encode(String),

    /// A received payload did not match the expected message shape.
    #[error("failed to decode message: {0}")]
    Decode(String),
}

/// A subscription to one broker topic.
///
/// Each subscription receives its own copy of every envelope published to the
/// topic after it was created (broadcast semantics).
///
/// ## Usage Pattern
///
/// ```ignore
/// let subscription = broker.subscribe("createEmployee")?;
/// loop {
///     match subscription.recv_timeout(Duration::from_millis(250)) {
///         Ok(envelope) => handle(envelope),
///         Err(RecvTimeoutError::Timeout) => continue, // check for shutdown
///         Err(RecvTimeoutError::Disconnected) => break,
///     }
/// }
/// ```
///
/// ## Thread Safety
///
/// A subscription is meant to be drained by one thread. Fan work out behind
/// it (a worker pool, another channel) if more are needed.
///
/// ## Message Ordering
///
/// Envelopes from a single publisher arrive in publish order. Ordering
/// between concurrent publishers is not guaranteed.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Topic-addressed pub/sub transport.
///
/// ```text
/// frontend --send--> [createEmployee] --> createEmployee fn --> [employeeCreated] --> employeeCreated handler
/// ```
///
/// Implementations must be shareable across threads; publishing from several
/// threads at once is expected. Ordering between different publishers is not
/// guaranteed.
pub trait MessageBroker: Send + Sync {
    /// Hand an envelope to the broker. The envelope's topic selects the
    /// destination.
    fn publish(&self, envelope: MessageEnvelope) -> Result<(), ChannelError>;

    /// Start receiving envelopes published to `topic` from now on.
    fn subscribe(&self, topic: &str) -> Result<Subscription<MessageEnvelope>, ChannelError>;
}

impl<B> MessageBroker for Arc<B>
where
    B: MessageBroker + ?Sized,
{
    fn publish(&self, envelope: MessageEnvelope) -> Result<(), ChannelError> {
        (**self).publish(envelope)
    }

    fn subscribe(&self, topic: &str) -> Result<Subscription<MessageEnvelope>, ChannelError> {
        (**self).subscribe(topic)
    }
}

impl<B> MessageBroker for &B
where
    B: MessageBroker + ?Sized,
{
    fn publish(&self, envelope: MessageEnvelope) -> Result<(), ChannelError> {
        (**self).publish(envelope)
    }

    fn subscribe(&self, topic: &str) -> Result<Subscription<MessageEnvelope>, ChannelError> {
        (**self).subscribe(topic)
    }
}

/// "Publish a named command to a broker topic."
///
/// Fire-and-forget: `Ok(())` means the broker accepted the message, nothing
/// more. There is no acknowledgement from the consumer and no built-in retry.
pub trait CommandChannel {
    fn send<C: Command>(&self, topic: &str, command: &C) -> Result<(), ChannelError>;
}

impl<B> CommandChannel for B
where
    B: MessageBroker + ?Sized,
{
    fn send<C: Command>(&self, topic: &str, command: &C) -> Result<(), ChannelError> {
        let envelope = MessageEnvelope::wrap(topic, command)?;
        debug!(topic, message_id = %envelope.message_id(), "sending command");
        self.publish(envelope)
    }
}

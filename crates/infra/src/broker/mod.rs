//! Broker connections.
//!
//! The broker abstraction lives in `funcstream-events`; this module picks a
//! concrete implementation from configuration.

#[cfg(feature = "redis")]
pub mod redis_pubsub;

#[cfg(feature = "redis")]
pub use redis_pubsub::RedisPubSubBroker;

use std::sync::Arc;

use thiserror::Error;

use funcstream_events::{ChannelError, InMemoryBroker, MessageBroker};

use crate::config::BrokerKind;

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to connect to broker: {0}")]
    Channel(#[from] ChannelError),

    #[error("broker `{0}` is not compiled in (enable the `{0}` feature)")]
    NotCompiled(&'static str),
}

/// Open the configured broker.
pub fn connect(kind: &BrokerKind) -> Result<Arc<dyn MessageBroker>, ConnectError> {
    match kind {
        BrokerKind::InMemory => Ok(Arc::new(InMemoryBroker::new())),
        #[cfg(feature = "redis")]
        BrokerKind::Redis { url } => Ok(Arc::new(RedisPubSubBroker::new(url)?)),
        #[cfg(not(feature = "redis"))]
        BrokerKind::Redis { .. } => Err(ConnectError::NotCompiled("redis")),
    }
}

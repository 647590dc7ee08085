use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use funcstream_core::MessageId;

use crate::channel::ChannelError;

/// Envelope for anything handed to a broker.
///
/// The payload is kept as JSON so that brokers and bindings stay
/// type-agnostic; typed access goes through [`MessageEnvelope::decode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    message_id: MessageId,
    topic: String,
    published_at: DateTime<Utc>,
    payload: JsonValue,
}

impl MessageEnvelope {
    pub fn new(topic: impl Into<String>, payload: JsonValue) -> Self {
        Self {
            message_id: MessageId::new(),
            topic: topic.into(),
            published_at: Utc::now(),
            payload,
        }
    }

    /// Serialize `message` into a fresh envelope addressed to `topic`.
    pub fn wrap<M: Serialize>(topic: impl Into<String>, message: &M) -> Result<Self, ChannelError> {
        let payload =
            serde_json::to_value(message).map_err(|e| ChannelError::Encode(e.to_string()))?;
        Ok(Self::new(topic, payload))
    }

    /// Decode the payload into a typed message.
    pub fn decode<M: DeserializeOwned>(&self) -> Result<M, ChannelError> {
        M::deserialize(&self.payload).map_err(|e| ChannelError::Decode(e.to_string()))
    }

    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    pub fn payload(&self) -> &JsonValue {
        &self.payload
    }
}

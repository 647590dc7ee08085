//! Bindings: which function consumes which topic, and where its output goes.

use thiserror::Error;
use tracing::debug;

use crate::channel::{ChannelError, MessageBroker};
use crate::envelope::MessageEnvelope;
use crate::registry::{FunctionError, RegisteredFunction};

/// A function definition bound to an input topic, with an optional output topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionBinding {
    function: String,
    input: String,
    output: Option<String>,
}

impl FunctionBinding {
    pub fn new(function: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            input: input.into(),
            output: None,
        }
    }

    /// Publish whatever the function returns on `topic`.
    pub fn with_output(mut self, topic: impl Into<String>) -> Self {
        self.output = Some(topic.into());
        self
    }

    /// Registry definition (a name or a `|` composition).
    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Function(#[from] FunctionError),

    #[error("failed to publish function output: {0}")]
    Publish(#[from] ChannelError),
}

/// Run one delivered envelope through `function` and publish the result.
///
/// Returns the published output envelope, if any. A function error means
/// nothing is published for this delivery.
pub fn dispatch<B>(
    broker: &B,
    function: &RegisteredFunction,
    output: Option<&str>,
    envelope: &MessageEnvelope,
) -> Result<Option<MessageEnvelope>, DispatchError>
where
    B: MessageBroker + ?Sized,
{
    let span = tracing::debug_span!(
        "dispatch",
        topic = envelope.topic(),
        message_id = %envelope.message_id(),
    );
    let _entered = span.enter();

    let produced = function.invoke(envelope.payload().clone())?;

    match (produced, output) {
        (Some(payload), Some(topic)) => {
            let out = MessageEnvelope::new(topic, payload);
            broker.publish(out.clone())?;
            Ok(Some(out))
        }
        (Some(_), None) => {
            debug!(function = function.name(), "binding has no output topic; output dropped");
            Ok(None)
        }
        (None, _) => Ok(None),
    }
}

//! Frontend side of the exchange: send commands, observe confirmations.

use tracing::info;

use funcstream_events::{ChannelError, CommandChannel, EventHandler, FunctionRegistryBuilder};

use crate::messages::{CREATE_EMPLOYEE_TOPIC, CreateEmployeeCommand, EmployeeCreatedEvent};

/// Registry name of the confirmation consumer.
pub const EMPLOYEE_CREATED: &str = "employeeCreated";

/// Sends creation commands to the backend through a [`CommandChannel`].
#[derive(Debug, Clone)]
pub struct EmployeeBackendGateway<C> {
    channel: C,
    topic: String,
}

impl<C: CommandChannel> EmployeeBackendGateway<C> {
    pub fn new(channel: C) -> Self {
        Self::with_topic(channel, CREATE_EMPLOYEE_TOPIC)
    }

    pub fn with_topic(channel: C, topic: impl Into<String>) -> Self {
        Self {
            channel,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Ask the backend to create an employee.
    ///
    /// Returns once the broker has the command; the confirmation, if any,
    /// arrives later as an [`EmployeeCreatedEvent`].
    pub fn send(&self, name: impl Into<String>) -> Result<(), ChannelError> {
        self.channel
            .send(&self.topic, &CreateEmployeeCommand::new(name))
    }
}

/// Logs every confirmation it sees. Nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmployeeCreatedLogger;

impl EventHandler for EmployeeCreatedLogger {
    type Ev = EmployeeCreatedEvent;

    fn on_event(&self, event: &Self::Ev) {
        info!(employee_id = %event.id, name = %event.name, "employee created");
    }
}

/// Register `employeeCreated` backed by `handler`.
pub fn register_frontend<H>(builder: FunctionRegistryBuilder, handler: H) -> FunctionRegistryBuilder
where
    H: EventHandler<Ev = EmployeeCreatedEvent> + Send + Sync + 'static,
{
    builder.event_handler(EMPLOYEE_CREATED, handler)
}

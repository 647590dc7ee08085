use std::sync::Arc;

use crate::registry::FunctionRegistryBuilder;
use crate::{Command, Event};

/// Handles a command and reports the outcome as exactly one event.
///
/// An error means the command was rejected and no event exists for it.
pub trait CommandHandler {
    type Cmd: Command;
    type Ev: Event;
    type Error: std::error::Error + Send + Sync + 'static;

    fn handle(&self, command: Self::Cmd) -> Result<Self::Ev, Self::Error>;
}

/// Reacts to a delivered event.
///
/// Observational: implementations should not assume they are called exactly
/// once per event, and are never retried.
pub trait EventHandler {
    type Ev: Event;

    fn on_event(&self, event: &Self::Ev);
}

impl<H> EventHandler for Arc<H>
where
    H: EventHandler + ?Sized,
{
    type Ev = H::Ev;

    fn on_event(&self, event: &Self::Ev) {
        (**self).on_event(event)
    }
}

impl FunctionRegistryBuilder {
    /// Register a command handler as a function `Cmd -> Ev`.
    pub fn command_handler<H>(self, name: &str, handler: H) -> Self
    where
        H: CommandHandler + Send + Sync + 'static,
    {
        self.function(name, move |command: H::Cmd| handler.handle(command))
    }

    /// Register an event handler as a consumer of `Ev`.
    pub fn event_handler<H>(self, name: &str, handler: H) -> Self
    where
        H: EventHandler + Send + Sync + 'static,
    {
        self.consumer(name, move |event: H::Ev| handler.on_event(&event))
    }
}

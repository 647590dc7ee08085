//! Messaging mechanics: commands, events, brokers, and the function registry.
//!
//! Nothing in here knows about employees or calculators. Domain crates
//! register plain functions in a [`FunctionRegistry`]; bindings connect those
//! functions to broker topics.

pub mod binding;
pub mod channel;
pub mod envelope;
pub mod handler;
pub mod in_memory_broker;
pub mod message;
pub mod registry;

pub use binding::{DispatchError, FunctionBinding, dispatch};
pub use channel::{ChannelError, CommandChannel, MessageBroker, Subscription};
pub use envelope::MessageEnvelope;
pub use handler::{CommandHandler, EventHandler};
pub use in_memory_broker::InMemoryBroker;
pub use message::{Command, Event};
pub use registry::{
    FunctionError, FunctionKind, FunctionRegistry, FunctionRegistryBuilder, RegisteredFunction,
    RegistryError,
};

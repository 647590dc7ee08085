use serde::Serialize;
use serde::de::DeserializeOwned;

/// A message expressing intent to change state.
///
/// Commands are consumed by exactly one handler. They carry no identity and
/// are not persisted; a handler either accepts one (and reports what happened
/// through an [`Event`]) or rejects it.
///
/// Commands cross process boundaries, so they must be serde round-trippable
/// and own all of their data.
pub trait Command:
    Serialize + DeserializeOwned + Clone + core::fmt::Debug + Send + Sync + 'static
{
}

/// A message reporting that a state change already happened.
///
/// Events are facts: immutable, and potentially observed by any number of
/// handlers.
pub trait Event:
    Serialize + DeserializeOwned + Clone + core::fmt::Debug + Send + Sync + 'static
{
}

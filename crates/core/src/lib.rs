//! `funcstream-core`: domain building blocks shared by the demo services.
//!
//! Pure types only: identifiers, the domain error model, and the entity /
//! value-object vocabulary. No IO, no transport concerns.

pub mod error;
pub mod id;
pub mod model;

pub use error::{DomainError, DomainResult};
pub use id::{EntityId, MessageId};
pub use model::{Entity, ValueObject};

//! Entity and value-object vocabulary.
//!
//! - **Entity**: has an identity that survives state changes. Two employees
//!   with the same name are still two employees.
//! - **Value object**: defined entirely by its values. Two calculation requests
//!   with the same operands are the same request.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by value. To "change" one, build
/// a new one. Floating-point payloads only get `PartialEq`, so that is all this
/// trait asks for.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

//! Entity trait: records identified by a stable key in the document store.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier (the document key).
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

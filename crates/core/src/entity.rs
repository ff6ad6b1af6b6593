//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Claims and projects are created and mutated by the remote API; this
/// workspace only ever reads them through types implementing this trait.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

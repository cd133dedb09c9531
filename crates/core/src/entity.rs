//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Catalog rows (hubs, tenants, sellers, products, SKUs) carry a store-assigned
/// identifier; `with_id` lets a repository stamp it on insert.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;

    /// Returns a copy of the entity carrying `id`.
    fn with_id(self, id: Self::Id) -> Self;
}

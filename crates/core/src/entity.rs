//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Logistics entities (warehouses, trucks, factories) are identified by name; the
/// distribution algorithms look them up and report on them by that name.
pub trait Entity {
    /// Stable, human-readable name of the entity.
    fn name(&self) -> &str;
}

//! Value object trait: equality by value, not identity.
//!
//! Products, arrival records and delivery lines are value objects: two of them with the
//! same attributes are interchangeable. A product line in a warehouse is keyed by name
//! only, so storing a product under an existing name replaces the old value.

/// Marker trait for value objects.
///
/// Requires `Clone + PartialEq + Debug` so values can be copied into reports, compared
/// in tests and logged.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq)]
/// struct Pallet { product: String, units: u64 }
///
/// impl ValueObject for Pallet {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

use depotnet_core::{Entity, Quantity};

/// Anything the drain can push stock into (in practice, a truck).
///
/// Implementations guard their own load state; each method is one atomic step so a
/// drain and a foreground delivery feeding the same carrier cannot interleave inside a
/// load or a flush.
pub trait Carrier: Entity + Send + Sync {
    /// Units that can still be loaded right now.
    fn free_space(&self) -> Quantity;

    /// Load as many of `max` units of `product` as fit; returns the units accepted.
    fn accept(&self, product: &str, max: Quantity) -> Quantity;

    /// Deliver the current load to `shop` and empty the carrier; returns units delivered
    /// (0 when the carrier was already empty).
    fn flush(&self, shop: &str) -> Quantity;
}

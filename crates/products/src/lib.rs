//! Product model shared by factories, warehouses and trucks.
//!
//! A product is a named line of goods with a unit weight, packaging and a unit count.
//! Two products sharing a name are the same inventory line.

pub mod product;

pub use product::Product;

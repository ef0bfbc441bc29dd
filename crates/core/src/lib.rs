//! `depotnet-core` — building blocks shared by every logistics crate.
//!
//! Pure domain primitives only: the error model, the entity/value-object markers and
//! the quantity unit. No IO, no threads.

pub mod entity;
pub mod error;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, ensure_name};
pub use value_object::ValueObject;

/// Count of product units (warehouse stock, truck load, batch size).
pub type Quantity = u64;

//! Factories and batch placement across warehouses.

pub mod events;
pub mod factory;

pub use events::FactoryEvent;
pub use factory::{Factory, Placement, PlacementMode, PlacementReport};

//! Trucks and delivery allocation.
//!
//! A truck loads goods drawn from one or more warehouses and flushes them to a shop.
//! Load state lives behind a per-truck lock, so a warehouse drain (through the
//! [`depotnet_inventory::Carrier`] impl) and a foreground delivery can share a truck.

pub mod delivery;
pub mod events;
pub mod truck;

pub use delivery::{
    DeliveryLine, DeliveryOutcome, DeliveryReport, DeliveryRequest, DeliveryStrategy, SourcedQuantity,
};
pub use events::TruckEvent;
pub use truck::{Shipment, Truck, TruckStatistics};

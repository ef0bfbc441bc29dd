//! Warehouse inventory and the overload drain.
//!
//! A warehouse owns its stock behind one lock; every store, unload and drain transfer
//! is a single locked step. The drain reaches trucks through the [`Carrier`] seam so
//! this crate does not depend on the fleet.

pub mod carrier;
pub mod drain;
pub mod events;
pub mod warehouse;

pub use carrier::Carrier;
pub use drain::{DrainHandle, DrainReport, DrainTransfer};
pub use events::WarehouseEvent;
pub use warehouse::{
    ArrivalRecord, DEFAULT_ARRIVAL_SOURCE, DEFAULT_OVERLOAD_THRESHOLD_PERCENT, StoreReceipt,
    Warehouse, WarehouseSnapshot,
};

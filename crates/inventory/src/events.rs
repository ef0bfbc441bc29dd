use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use depotnet_core::Quantity;
use depotnet_events::Event;

/// Outcome events emitted by a warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarehouseEvent {
    ProductStored {
        warehouse: String,
        source: String,
        product: String,
        quantity: Quantity,
        /// Residual stock replaced by the overwrite of an existing line.
        discarded: Quantity,
        current_load: Quantity,
        occurred_at: DateTime<Utc>,
    },
    StoreRefused {
        warehouse: String,
        product: String,
        requested: Quantity,
        available: Quantity,
        occurred_at: DateTime<Utc>,
    },
    ProductUnloaded {
        warehouse: String,
        product: String,
        requested: Quantity,
        quantity: Quantity,
        occurred_at: DateTime<Utc>,
    },
    Overloaded {
        warehouse: String,
        current_load: Quantity,
        capacity: Quantity,
        occurred_at: DateTime<Utc>,
    },
    DrainStarted {
        warehouse: String,
        shop: String,
        trucks: usize,
        occurred_at: DateTime<Utc>,
    },
    DrainTransferred {
        warehouse: String,
        truck: String,
        product: String,
        quantity: Quantity,
        shop: String,
        occurred_at: DateTime<Utc>,
    },
    DrainFinished {
        warehouse: String,
        moved: Quantity,
        relieved: bool,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for WarehouseEvent {
    fn event_type(&self) -> &'static str {
        match self {
            WarehouseEvent::ProductStored { .. } => "inventory.warehouse.product_stored",
            WarehouseEvent::StoreRefused { .. } => "inventory.warehouse.store_refused",
            WarehouseEvent::ProductUnloaded { .. } => "inventory.warehouse.product_unloaded",
            WarehouseEvent::Overloaded { .. } => "inventory.warehouse.overloaded",
            WarehouseEvent::DrainStarted { .. } => "inventory.drain.started",
            WarehouseEvent::DrainTransferred { .. } => "inventory.drain.transferred",
            WarehouseEvent::DrainFinished { .. } => "inventory.drain.finished",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            WarehouseEvent::ProductStored { occurred_at, .. }
            | WarehouseEvent::StoreRefused { occurred_at, .. }
            | WarehouseEvent::ProductUnloaded { occurred_at, .. }
            | WarehouseEvent::Overloaded { occurred_at, .. }
            | WarehouseEvent::DrainStarted { occurred_at, .. }
            | WarehouseEvent::DrainTransferred { occurred_at, .. }
            | WarehouseEvent::DrainFinished { occurred_at, .. } => *occurred_at,
        }
    }
}

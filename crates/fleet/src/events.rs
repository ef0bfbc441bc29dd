use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use depotnet_core::Quantity;
use depotnet_events::Event;

/// Outcome events emitted by a truck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TruckEvent {
    Loaded {
        truck: String,
        product: String,
        quantity: Quantity,
        current_load: Quantity,
        occurred_at: DateTime<Utc>,
    },
    LoadRefused {
        truck: String,
        product: String,
        requested: Quantity,
        available: Quantity,
        occurred_at: DateTime<Utc>,
    },
    Flushed {
        truck: String,
        shop: String,
        quantity: Quantity,
        manifest: BTreeMap<String, Quantity>,
        occurred_at: DateTime<Utc>,
    },
    Shortfall {
        truck: String,
        product: String,
        requested: Quantity,
        delivered: Quantity,
        occurred_at: DateTime<Utc>,
    },
    DeliveryRefused {
        truck: String,
        shop: String,
        required: Quantity,
        available: Quantity,
        occurred_at: DateTime<Utc>,
    },
    DeliveryCompleted {
        truck: String,
        shop: String,
        strategy: String,
        delivered: Quantity,
        shortfall: Quantity,
        occurred_at: DateTime<Utc>,
    },
    DeliveryCancelled {
        truck: String,
        shop: String,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for TruckEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TruckEvent::Loaded { .. } => "fleet.truck.loaded",
            TruckEvent::LoadRefused { .. } => "fleet.truck.load_refused",
            TruckEvent::Flushed { .. } => "fleet.truck.flushed",
            TruckEvent::Shortfall { .. } => "fleet.delivery.shortfall",
            TruckEvent::DeliveryRefused { .. } => "fleet.delivery.refused",
            TruckEvent::DeliveryCompleted { .. } => "fleet.delivery.completed",
            TruckEvent::DeliveryCancelled { .. } => "fleet.delivery.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            TruckEvent::Loaded { occurred_at, .. }
            | TruckEvent::LoadRefused { occurred_at, .. }
            | TruckEvent::Flushed { occurred_at, .. }
            | TruckEvent::Shortfall { occurred_at, .. }
            | TruckEvent::DeliveryRefused { occurred_at, .. }
            | TruckEvent::DeliveryCompleted { occurred_at, .. }
            | TruckEvent::DeliveryCancelled { occurred_at, .. } => *occurred_at,
        }
    }
}

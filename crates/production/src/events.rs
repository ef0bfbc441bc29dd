use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use depotnet_core::Quantity;
use depotnet_events::Event;

/// Outcome events emitted by a factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FactoryEvent {
    BatchPlaced {
        factory: String,
        product: String,
        produced: Quantity,
        placed: Quantity,
        warehouses: Vec<String>,
        split: bool,
        occurred_at: DateTime<Utc>,
    },
    BatchUnplaced {
        factory: String,
        product: String,
        remainder: Quantity,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for FactoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            FactoryEvent::BatchPlaced { .. } => "production.batch.placed",
            FactoryEvent::BatchUnplaced { .. } => "production.batch.unplaced",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            FactoryEvent::BatchPlaced { occurred_at, .. }
            | FactoryEvent::BatchUnplaced { occurred_at, .. } => *occurred_at,
        }
    }
}

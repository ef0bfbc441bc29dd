use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use depotnet_core::{DomainError, DomainResult, Entity, Quantity, ensure_name};
use depotnet_events::EventPublisher;
use depotnet_inventory::Warehouse;
use depotnet_products::Product;

use crate::events::FactoryEvent;

/// How a batch ended up in the warehouses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementMode {
    /// One warehouse took the whole batch.
    Whole,
    /// The batch was carved into sub-batches across warehouses.
    Split,
    /// No warehouse had any room.
    Unplaced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub warehouse: String,
    pub quantity: Quantity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementReport {
    pub factory: String,
    pub product: String,
    pub produced: Quantity,
    pub mode: PlacementMode,
    pub placements: Vec<Placement>,
    /// Units no warehouse could take; dropped.
    pub unplaced: Quantity,
}

impl PlacementReport {
    pub fn placed(&self) -> Quantity {
        self.placements.iter().map(|p| p.quantity).sum()
    }
}

/// Produces fixed-size batches of one product.
///
/// The factory name doubles as the product name.
#[derive(Debug, Clone)]
pub struct Factory {
    name: String,
    unit_weight: f64,
    packaging: String,
    production_rate: Quantity,
    events: EventPublisher,
}

impl Entity for Factory {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Factory {
    pub fn new(
        name: impl Into<String>,
        unit_weight: f64,
        packaging: impl Into<String>,
        production_rate: Quantity,
    ) -> DomainResult<Self> {
        let name = name.into();
        ensure_name("factory", &name)?;
        if production_rate == 0 {
            return Err(DomainError::validation("production rate must be positive"));
        }
        if !(unit_weight.is_finite() && unit_weight >= 0.0) {
            return Err(DomainError::validation("unit weight must be a non-negative number"));
        }

        Ok(Self {
            name,
            unit_weight,
            packaging: packaging.into(),
            production_rate,
            events: EventPublisher::disabled(),
        })
    }

    pub fn with_events(mut self, events: EventPublisher) -> Self {
        self.events = events;
        self
    }

    pub fn production_rate(&self) -> Quantity {
        self.production_rate
    }

    /// One fresh batch of `production_rate` units.
    pub fn create_product(&self) -> Product {
        Product::new(self.name.clone(), self.unit_weight, self.packaging.clone(), self.production_rate)
    }

    /// Produce one batch and place it.
    ///
    /// Whole-fit first: the first warehouse (list order) with room for the entire batch
    /// takes it. Only if none has room is the batch split, filling warehouses in list
    /// order with `min(remaining, free_space)` units each. Whatever is left after that
    /// is reported and dropped.
    pub fn storage(&self, warehouses: &[Arc<Warehouse>]) -> PlacementReport {
        let batch = self.create_product();
        let produced = batch.quantity();

        for warehouse in warehouses {
            if warehouse.free_space() < produced {
                continue;
            }
            // A concurrent store can still take the space between check and store.
            if warehouse.store_from(&self.name, batch.clone()).is_ok() {
                info!(factory = %self.name, warehouse = %warehouse.name(), quantity = produced, "batch placed whole");
                return self.finish(
                    produced,
                    PlacementMode::Whole,
                    vec![Placement {
                        warehouse: warehouse.name().to_string(),
                        quantity: produced,
                    }],
                );
            }
        }

        let mut remaining = produced;
        let mut placements = Vec::new();
        for warehouse in warehouses {
            if remaining == 0 {
                break;
            }
            let free_space = warehouse.free_space();
            if free_space == 0 {
                continue;
            }
            let quantity = remaining.min(free_space);
            if warehouse.store_from(&self.name, batch.with_quantity(quantity)).is_ok() {
                debug!(factory = %self.name, warehouse = %warehouse.name(), quantity, "sub-batch placed");
                remaining -= quantity;
                placements.push(Placement {
                    warehouse: warehouse.name().to_string(),
                    quantity,
                });
            }
        }

        let mode = if placements.is_empty() {
            PlacementMode::Unplaced
        } else {
            PlacementMode::Split
        };
        self.finish(produced, mode, placements)
    }

    fn finish(&self, produced: Quantity, mode: PlacementMode, placements: Vec<Placement>) -> PlacementReport {
        let report = PlacementReport {
            factory: self.name.clone(),
            product: self.name.clone(),
            produced,
            mode,
            unplaced: produced - placements.iter().map(|p| p.quantity).sum::<Quantity>(),
            placements,
        };

        if !report.placements.is_empty() {
            self.events.publish(
                &self.name,
                &FactoryEvent::BatchPlaced {
                    factory: self.name.clone(),
                    product: report.product.clone(),
                    produced,
                    placed: report.placed(),
                    warehouses: report.placements.iter().map(|p| p.warehouse.clone()).collect(),
                    split: mode == PlacementMode::Split,
                    occurred_at: Utc::now(),
                },
            );
        }
        if report.unplaced > 0 {
            warn!(factory = %self.name, product = %report.product, remainder = report.unplaced, "could not store the whole batch");
            self.events.publish(
                &self.name,
                &FactoryEvent::BatchUnplaced {
                    factory: self.name.clone(),
                    product: report.product.clone(),
                    remainder: report.unplaced,
                    occurred_at: Utc::now(),
                },
            );
        }

        report
    }
}

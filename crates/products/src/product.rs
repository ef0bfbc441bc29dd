use serde::{Deserialize, Serialize};

use depotnet_core::{Quantity, ValueObject};

/// A batch (or stock line) of one named good.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub unit_weight: f64,
    pub packaging: String,
    pub quantity: Quantity,
}

impl ValueObject for Product {}

impl Product {
    pub fn new(
        name: impl Into<String>,
        unit_weight: f64,
        packaging: impl Into<String>,
        quantity: Quantity,
    ) -> Self {
        Self {
            name: name.into(),
            unit_weight,
            packaging: packaging.into(),
            quantity,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Same good, different unit count (sub-batches, unload results).
    pub fn with_quantity(&self, quantity: Quantity) -> Self {
        Self {
            name: self.name.clone(),
            unit_weight: self.unit_weight,
            packaging: self.packaging.clone(),
            quantity,
        }
    }

    /// Remove up to `amount` units; returns how many were actually removed.
    pub fn take(&mut self, amount: Quantity) -> Quantity {
        let taken = amount.min(self.quantity);
        self.quantity -= taken;
        taken
    }

    /// Total weight of the units in this line.
    pub fn total_weight(&self) -> f64 {
        self.unit_weight * self.quantity as f64
    }
}

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use depotnet_core::{DomainError, DomainResult, Entity, Quantity, ensure_name};
use depotnet_events::EventPublisher;
use depotnet_inventory::Carrier;

use crate::events::TruckEvent;

/// Goods handed to a shop by one flush.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shipment {
    pub truck: String,
    pub shop: String,
    pub quantity: Quantity,
    pub manifest: BTreeMap<String, Quantity>,
}

/// Cumulative truck statistics (only ever grow) plus the current load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TruckStatistics {
    pub name: String,
    pub max_capacity: Quantity,
    pub current_load: Quantity,
    pub total_delivered: Quantity,
    pub delivered_by_product: BTreeMap<String, Quantity>,
    /// Number of flushes that carried each product.
    pub delivery_count_by_product: BTreeMap<String, u64>,
    pub trips: u64,
}

#[derive(Debug, Default)]
struct TruckState {
    current_load: Quantity,
    manifest: BTreeMap<String, Quantity>,
    total_delivered: Quantity,
    delivered_by_product: BTreeMap<String, Quantity>,
    delivery_count_by_product: BTreeMap<String, u64>,
    trips: u64,
}

/// A capacity-bounded vehicle moving goods from warehouses to shops.
///
/// Lifecycle of the load: empty → loading (load calls) → empty on flush.
#[derive(Debug)]
pub struct Truck {
    name: String,
    max_capacity: Quantity,
    state: Mutex<TruckState>,
    pub(crate) events: EventPublisher,
}

impl Entity for Truck {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Truck {
    pub fn new(name: impl Into<String>, max_capacity: Quantity) -> DomainResult<Self> {
        let name = name.into();
        ensure_name("truck", &name)?;
        if max_capacity == 0 {
            return Err(DomainError::validation("truck capacity must be positive"));
        }

        Ok(Self {
            name,
            max_capacity,
            state: Mutex::new(TruckState::default()),
            events: EventPublisher::disabled(),
        })
    }

    pub fn with_events(mut self, events: EventPublisher) -> Self {
        self.events = events;
        self
    }

    fn lock_state(&self) -> MutexGuard<'_, TruckState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn max_capacity(&self) -> Quantity {
        self.max_capacity
    }

    pub fn current_load(&self) -> Quantity {
        self.lock_state().current_load
    }

    pub fn free_space(&self) -> Quantity {
        self.max_capacity - self.lock_state().current_load
    }

    /// Stage goods on the truck without counting them as delivered.
    ///
    /// All-or-nothing: a load that does not fit is refused entirely.
    pub fn load_product(&self, product: &str, count: Quantity) -> DomainResult<()> {
        self.load(product, count, false)
    }

    /// Load goods drawn for delivery, updating the delivery statistics.
    ///
    /// All-or-nothing: a load that does not fit is refused entirely.
    pub fn add_product(&self, product: &str, count: Quantity) -> DomainResult<()> {
        self.load(product, count, true)
    }

    fn load(&self, product: &str, count: Quantity, record: bool) -> DomainResult<()> {
        let mut state = self.lock_state();
        let available = self.max_capacity - state.current_load;
        if count > available {
            drop(state);
            warn!(truck = %self.name, product, requested = count, available, "not enough room on truck");
            self.events.publish(
                &self.name,
                &TruckEvent::LoadRefused {
                    truck: self.name.clone(),
                    product: product.to_string(),
                    requested: count,
                    available,
                    occurred_at: Utc::now(),
                },
            );
            return Err(DomainError::insufficient_capacity(count, available));
        }

        let current_load = Self::load_locked(&mut state, product, count, record);
        drop(state);
        self.publish_loaded(product, count, current_load);
        Ok(())
    }

    /// Load as much of `max` as fits, recording statistics; returns the units loaded.
    pub(crate) fn load_up_to(&self, product: &str, max: Quantity) -> Quantity {
        let mut state = self.lock_state();
        let count = max.min(self.max_capacity - state.current_load);
        if count == 0 {
            return 0;
        }
        let current_load = Self::load_locked(&mut state, product, count, true);
        drop(state);
        self.publish_loaded(product, count, current_load);
        count
    }

    fn load_locked(state: &mut TruckState, product: &str, count: Quantity, record: bool) -> Quantity {
        state.current_load += count;
        *state.manifest.entry(product.to_string()).or_insert(0) += count;
        if record {
            state.total_delivered += count;
            *state.delivered_by_product.entry(product.to_string()).or_insert(0) += count;
        }
        state.current_load
    }

    fn publish_loaded(&self, product: &str, quantity: Quantity, current_load: Quantity) {
        debug!(truck = %self.name, product, quantity, current_load, "loaded");
        self.events.publish(
            &self.name,
            &TruckEvent::Loaded {
                truck: self.name.clone(),
                product: product.to_string(),
                quantity,
                current_load,
                occurred_at: Utc::now(),
            },
        );
    }

    /// Deliver the whole load to `shop` and empty the truck.
    ///
    /// Flushing an empty truck is a no-op: returns `None` and leaves statistics unchanged.
    pub fn unload_product(&self, shop: &str) -> Option<Shipment> {
        let mut state = self.lock_state();
        if state.current_load == 0 {
            drop(state);
            debug!(truck = %self.name, shop, "truck is empty; nothing to unload");
            return None;
        }

        let quantity = std::mem::take(&mut state.current_load);
        let manifest = std::mem::take(&mut state.manifest);
        for product in manifest.keys() {
            *state.delivery_count_by_product.entry(product.clone()).or_insert(0) += 1;
        }
        state.trips += 1;
        drop(state);

        info!(truck = %self.name, shop, quantity, "truck unloaded at shop");
        self.events.publish(
            &self.name,
            &TruckEvent::Flushed {
                truck: self.name.clone(),
                shop: shop.to_string(),
                quantity,
                manifest: manifest.clone(),
                occurred_at: Utc::now(),
            },
        );

        Some(Shipment {
            truck: self.name.clone(),
            shop: shop.to_string(),
            quantity,
            manifest,
        })
    }

    pub fn statistics(&self) -> TruckStatistics {
        let state = self.lock_state();
        TruckStatistics {
            name: self.name.clone(),
            max_capacity: self.max_capacity,
            current_load: state.current_load,
            total_delivered: state.total_delivered,
            delivered_by_product: state.delivered_by_product.clone(),
            delivery_count_by_product: state.delivery_count_by_product.clone(),
            trips: state.trips,
        }
    }
}

impl Carrier for Truck {
    fn free_space(&self) -> Quantity {
        Truck::free_space(self)
    }

    fn accept(&self, product: &str, max: Quantity) -> Quantity {
        self.load_up_to(product, max)
    }

    fn flush(&self, shop: &str) -> Quantity {
        self.unload_product(shop).map(|s| s.quantity).unwrap_or(0)
    }
}

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use depotnet_core::{DomainError, DomainResult, Entity, Quantity, ValueObject, ensure_name};
use depotnet_events::EventPublisher;
use depotnet_products::Product;

use crate::carrier::Carrier;
use crate::events::WarehouseEvent;

/// Fill level (percent of capacity) at or above which a warehouse is overloaded.
pub const DEFAULT_OVERLOAD_THRESHOLD_PERCENT: u8 = 95;

/// Arrival source recorded when the caller does not name one.
pub const DEFAULT_ARRIVAL_SOURCE: &str = "Factory";

/// One line of the arrival log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrivalRecord {
    pub source: String,
    pub product: String,
    pub quantity: Quantity,
    pub received_at: DateTime<Utc>,
}

impl ValueObject for ArrivalRecord {}

/// Result of a successful store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreReceipt {
    pub warehouse: String,
    pub product: String,
    pub quantity: Quantity,
    /// Units of a previous line with the same name lost to the overwrite.
    pub discarded: Quantity,
    pub free_space: Quantity,
}

/// Point-in-time view of a warehouse for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehouseSnapshot {
    pub name: String,
    pub capacity: Quantity,
    pub current_load: Quantity,
    pub free_space: Quantity,
    pub fill_percentage: f64,
    pub overloaded: bool,
    pub overload_threshold_percent: u8,
    pub draining: bool,
    pub inventory: Vec<Product>,
    pub arrivals: usize,
}

/// Mutable part of a warehouse, only ever touched under the warehouse lock.
#[derive(Debug, Default)]
pub(crate) struct WarehouseState {
    pub(crate) current_load: Quantity,
    pub(crate) inventory: BTreeMap<String, Product>,
    pub(crate) arrival_log: Vec<ArrivalRecord>,
}

impl WarehouseState {
    pub(crate) fn quantity_of(&self, product: &str) -> Quantity {
        self.inventory.get(product).map(Product::quantity).unwrap_or(0)
    }

    /// Remove up to `max` units of `product`, keeping `current_load` in step.
    pub(crate) fn take(&mut self, product: &str, max: Quantity) -> Quantity {
        let Some(line) = self.inventory.get_mut(product) else {
            return 0;
        };
        let taken = line.take(max);
        self.current_load = self.current_load.saturating_sub(taken);
        taken
    }
}

/// A storage site with fixed capacity and an inventory keyed by product name.
///
/// Shared between threads as `Arc<Warehouse>`: every method takes `&self` and all
/// inventory mutation goes through one internal mutex. The `draining` flag makes the
/// auto-unload single-flight.
#[derive(Debug)]
pub struct Warehouse {
    name: String,
    capacity: Quantity,
    overload_threshold_percent: u8,
    state: Mutex<WarehouseState>,
    pub(crate) draining: AtomicBool,
    pub(crate) events: EventPublisher,
}

impl Entity for Warehouse {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Warehouse {
    pub fn new(name: impl Into<String>, capacity: Quantity) -> DomainResult<Self> {
        let name = name.into();
        ensure_name("warehouse", &name)?;
        if capacity == 0 {
            return Err(DomainError::validation("warehouse capacity must be positive"));
        }

        Ok(Self {
            name,
            capacity,
            overload_threshold_percent: DEFAULT_OVERLOAD_THRESHOLD_PERCENT,
            state: Mutex::new(WarehouseState::default()),
            draining: AtomicBool::new(false),
            events: EventPublisher::disabled(),
        })
    }

    pub fn with_overload_threshold(mut self, percent: u8) -> DomainResult<Self> {
        if percent == 0 || percent > 100 {
            return Err(DomainError::validation(
                "overload threshold must be within 1..=100 percent",
            ));
        }
        self.overload_threshold_percent = percent;
        Ok(self)
    }

    pub fn with_events(mut self, events: EventPublisher) -> Self {
        self.events = events;
        self
    }

    pub fn capacity(&self) -> Quantity {
        self.capacity
    }

    pub fn overload_threshold_percent(&self) -> u8 {
        self.overload_threshold_percent
    }

    /// A poisoned lock still holds consistent state: every mutation below completes
    /// without panicking once it has started.
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, WarehouseState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn overloaded_at(&self, current_load: Quantity) -> bool {
        u128::from(current_load) * 100
            >= u128::from(self.capacity) * u128::from(self.overload_threshold_percent)
    }

    pub fn current_load(&self) -> Quantity {
        self.lock_state().current_load
    }

    pub fn free_space(&self) -> Quantity {
        let state = self.lock_state();
        self.capacity.saturating_sub(state.current_load)
    }

    /// Store a batch, recording [`DEFAULT_ARRIVAL_SOURCE`] in the arrival log.
    pub fn store_product(&self, product: Product) -> DomainResult<StoreReceipt> {
        self.store_from(DEFAULT_ARRIVAL_SOURCE, product)
    }

    /// Store a batch that arrived from `source`.
    ///
    /// Refused without any mutation when the batch is larger than the free space. On
    /// success the inventory line for the product name is replaced by the incoming batch
    /// (not merged): residual units of an older line with the same name are dropped from
    /// the inventory while `current_load` keeps counting them. The receipt reports the
    /// dropped units.
    pub fn store_from(&self, source: &str, product: Product) -> DomainResult<StoreReceipt> {
        let mut state = self.lock_state();
        let available = self.capacity.saturating_sub(state.current_load);
        let requested = product.quantity();

        if requested > available {
            drop(state);
            warn!(
                warehouse = %self.name,
                product = %product.name(),
                requested,
                available,
                "not enough free space to store product"
            );
            self.events.publish(
                &self.name,
                &WarehouseEvent::StoreRefused {
                    warehouse: self.name.clone(),
                    product: product.name().to_string(),
                    requested,
                    available,
                    occurred_at: Utc::now(),
                },
            );
            return Err(DomainError::insufficient_capacity(requested, available));
        }

        let was_overloaded = self.overloaded_at(state.current_load);
        let product_name = product.name().to_string();
        state.current_load += requested;
        let discarded = state
            .inventory
            .insert(product_name.clone(), product)
            .map(|previous| previous.quantity())
            .unwrap_or(0);
        let received_at = Utc::now();
        state.arrival_log.push(ArrivalRecord {
            source: source.to_string(),
            product: product_name.clone(),
            quantity: requested,
            received_at,
        });
        let current_load = state.current_load;
        drop(state);

        if discarded > 0 {
            warn!(
                warehouse = %self.name,
                product = %product_name,
                discarded,
                "store replaced an existing line; residual stock dropped"
            );
        }
        info!(warehouse = %self.name, source, product = %product_name, quantity = requested, "product stored");

        self.events.publish(
            &self.name,
            &WarehouseEvent::ProductStored {
                warehouse: self.name.clone(),
                source: source.to_string(),
                product: product_name.clone(),
                quantity: requested,
                discarded,
                current_load,
                occurred_at: received_at,
            },
        );
        if !was_overloaded && self.overloaded_at(current_load) {
            self.publish_overloaded(current_load);
        }

        Ok(StoreReceipt {
            warehouse: self.name.clone(),
            product: product_name,
            quantity: requested,
            discarded,
            free_space: self.capacity.saturating_sub(current_load),
        })
    }

    /// Take up to `max_quantity` units of `product_name` in one locked step.
    ///
    /// Returns a map holding a fresh product with the units taken, or an empty map when
    /// the product is absent or out of stock. Never fails.
    pub fn unload(&self, product_name: &str, max_quantity: Quantity) -> BTreeMap<String, Product> {
        let mut load = BTreeMap::new();
        let mut state = self.lock_state();
        let template = state.inventory.get(product_name).cloned();
        let taken = state.take(product_name, max_quantity);
        drop(state);

        debug!(warehouse = %self.name, product = product_name, requested = max_quantity, taken, "unload");

        if let Some(template) = template.filter(|_| taken > 0) {
            load.insert(product_name.to_string(), template.with_quantity(taken));
            self.events.publish(
                &self.name,
                &WarehouseEvent::ProductUnloaded {
                    warehouse: self.name.clone(),
                    product: product_name.to_string(),
                    requested: max_quantity,
                    quantity: taken,
                    occurred_at: Utc::now(),
                },
            );
        }

        load
    }

    /// Move up to `max_quantity` units of `product_name` straight into `carrier`.
    ///
    /// The carrier is asked to accept first and only what it accepted leaves the
    /// inventory, all under the warehouse lock (warehouse before carrier, as in the
    /// drain). Returns the units moved: 0 when the product is out of stock or the
    /// carrier is full.
    pub fn unload_into(&self, product_name: &str, max_quantity: Quantity, carrier: &dyn Carrier) -> Quantity {
        let mut state = self.lock_state();
        let wanted = max_quantity.min(state.quantity_of(product_name));
        if wanted == 0 {
            return 0;
        }
        let accepted = carrier.accept(product_name, wanted);
        let moved = state.take(product_name, accepted);
        drop(state);

        debug!(warehouse = %self.name, carrier = %carrier.name(), product = product_name, requested = max_quantity, moved, "unload into carrier");
        if moved > 0 {
            self.events.publish(
                &self.name,
                &WarehouseEvent::ProductUnloaded {
                    warehouse: self.name.clone(),
                    product: product_name.to_string(),
                    requested: max_quantity,
                    quantity: moved,
                    occurred_at: Utc::now(),
                },
            );
        }
        moved
    }

    /// Units of `product_name` on hand (0 if the product was never stored).
    pub fn product_quantity(&self, product_name: &str) -> Quantity {
        self.lock_state().quantity_of(product_name)
    }

    pub fn is_overloaded(&self) -> bool {
        let current_load = self.current_load();
        let overloaded = self.overloaded_at(current_load);
        if overloaded {
            debug!(warehouse = %self.name, current_load, capacity = self.capacity, "warehouse overloaded");
        }
        overloaded
    }

    pub fn fill_percentage(&self) -> f64 {
        self.current_load() as f64 / self.capacity as f64 * 100.0
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    pub fn arrival_log(&self) -> Vec<ArrivalRecord> {
        self.lock_state().arrival_log.clone()
    }

    /// Inventory lines in product-name order, zero-quantity lines included.
    pub fn inventory(&self) -> Vec<Product> {
        self.lock_state().inventory.values().cloned().collect()
    }

    pub fn snapshot(&self) -> WarehouseSnapshot {
        let state = self.lock_state();
        WarehouseSnapshot {
            name: self.name.clone(),
            capacity: self.capacity,
            current_load: state.current_load,
            free_space: self.capacity.saturating_sub(state.current_load),
            fill_percentage: state.current_load as f64 / self.capacity as f64 * 100.0,
            overloaded: self.overloaded_at(state.current_load),
            overload_threshold_percent: self.overload_threshold_percent(),
            draining: self.is_draining(),
            inventory: state.inventory.values().cloned().collect(),
            arrivals: state.arrival_log.len(),
        }
    }

    pub(crate) fn publish_overloaded(&self, current_load: Quantity) {
        self.events.publish(
            &self.name,
            &WarehouseEvent::Overloaded {
                warehouse: self.name.clone(),
                current_load,
                capacity: self.capacity,
                occurred_at: Utc::now(),
            },
        );
    }
}

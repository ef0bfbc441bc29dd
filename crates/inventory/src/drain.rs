//! Overload drain: empties an overloaded warehouse into trucks on a background thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use depotnet_core::{Entity, Quantity};

use crate::carrier::Carrier;
use crate::events::WarehouseEvent;
use crate::warehouse::Warehouse;

/// One drain step: units moved from the warehouse into a truck (and on to the shop).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrainTransfer {
    pub truck: String,
    pub product: String,
    pub quantity: Quantity,
}

/// Summary of a finished drain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub warehouse: String,
    pub shop: String,
    pub transfers: Vec<DrainTransfer>,
    /// Whether the warehouse was below the overload threshold when the drain ended.
    pub relieved: bool,
}

impl DrainReport {
    pub fn total_moved(&self) -> Quantity {
        self.transfers.iter().map(|t| t.quantity).sum()
    }
}

/// Handle to a background drain.
///
/// Dropping the handle detaches the drain; it keeps running to completion.
#[derive(Debug)]
pub struct DrainHandle {
    join: thread::JoinHandle<DrainReport>,
}

impl DrainHandle {
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the drain to finish. `None` if the drain thread panicked.
    pub fn join(self) -> Option<DrainReport> {
        self.join.join().ok()
    }
}

/// Clears the draining flag however the drain exits.
struct DrainingGuard<'a>(&'a AtomicBool);

impl Drop for DrainingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Warehouse {
    fn try_begin_drain(&self) -> bool {
        self.draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Start a background drain if the warehouse is overloaded and not already draining.
    ///
    /// Returns immediately. `None` means nothing was started (already draining, not
    /// overloaded, or the thread could not be spawned).
    pub fn start_auto_unload(
        self: &Arc<Self>,
        trucks: Vec<Arc<dyn Carrier>>,
        shop: impl Into<String>,
    ) -> Option<DrainHandle> {
        if !self.try_begin_drain() {
            debug!(warehouse = %self.name(), "auto-unload already running");
            return None;
        }

        let current_load = self.current_load();
        if !self.overloaded_at(current_load) {
            self.draining.store(false, Ordering::Release);
            return None;
        }
        self.publish_overloaded(current_load);

        let warehouse = Arc::clone(self);
        let shop = shop.into();
        let spawned = thread::Builder::new()
            .name(format!("drain-{}", self.name()))
            .spawn(move || {
                let _guard = DrainingGuard(&warehouse.draining);
                warehouse.run_drain(&trucks, &shop)
            });

        match spawned {
            Ok(join) => Some(DrainHandle { join }),
            Err(err) => {
                self.draining.store(false, Ordering::Release);
                warn!(warehouse = %self.name(), error = %err, "failed to spawn auto-unload thread");
                None
            }
        }
    }

    /// Run the drain on the caller's thread.
    ///
    /// Shares the single-flight flag with [`Warehouse::start_auto_unload`]; returns `None`
    /// when a drain is already in progress.
    pub fn auto_unload(&self, trucks: &[Arc<dyn Carrier>], shop: &str) -> Option<DrainReport> {
        if !self.try_begin_drain() {
            return None;
        }
        let _guard = DrainingGuard(&self.draining);
        Some(self.run_drain(trucks, shop))
    }

    /// Drain body. Holds the warehouse lock for the whole run; trucks are locked one
    /// call at a time inside it (warehouse before truck, never the reverse).
    fn run_drain(&self, trucks: &[Arc<dyn Carrier>], shop: &str) -> DrainReport {
        info!(warehouse = %self.name(), shop, trucks = trucks.len(), "auto-unload started");
        self.events.publish(
            self.name(),
            &WarehouseEvent::DrainStarted {
                warehouse: self.name().to_string(),
                shop: shop.to_string(),
                trucks: trucks.len(),
                occurred_at: Utc::now(),
            },
        );

        let mut transfers = Vec::new();
        let mut state = self.lock_state();

        'trucks: for truck in trucks {
            if !self.overloaded_at(state.current_load) {
                break;
            }

            let products: Vec<String> = state.inventory.keys().cloned().collect();
            for product in products {
                let available = state.quantity_of(&product);
                let space = truck.free_space();
                if available == 0 || space == 0 {
                    continue;
                }

                let accepted = truck.accept(&product, available.min(space));
                if accepted == 0 {
                    continue;
                }
                let moved = state.take(&product, accepted);

                debug!(warehouse = %self.name(), truck = %truck.name(), product = %product, quantity = moved, "drain transfer");
                self.events.publish(
                    self.name(),
                    &WarehouseEvent::DrainTransferred {
                        warehouse: self.name().to_string(),
                        truck: truck.name().to_string(),
                        product: product.clone(),
                        quantity: moved,
                        shop: shop.to_string(),
                        occurred_at: Utc::now(),
                    },
                );
                transfers.push(DrainTransfer {
                    truck: truck.name().to_string(),
                    product,
                    quantity: moved,
                });

                truck.flush(shop);

                if !self.overloaded_at(state.current_load) {
                    break 'trucks;
                }
            }
        }

        let relieved = !self.overloaded_at(state.current_load);
        drop(state);

        let report = DrainReport {
            warehouse: self.name().to_string(),
            shop: shop.to_string(),
            transfers,
            relieved,
        };

        info!(warehouse = %self.name(), moved = report.total_moved(), relieved, "auto-unload finished");
        self.events.publish(
            self.name(),
            &WarehouseEvent::DrainFinished {
                warehouse: self.name().to_string(),
                moved: report.total_moved(),
                relieved,
                occurred_at: Utc::now(),
            },
        );

        report
    }
}

//! Delivery allocation: which warehouse supplies which part of an order.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use depotnet_core::{Entity, Quantity, ValueObject};
use depotnet_inventory::Warehouse;

use crate::events::TruckEvent;
use crate::truck::{Shipment, Truck};

/// Requested units per product name.
pub type DeliveryRequest = BTreeMap<String, Quantity>;

/// How the order was sourced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryStrategy {
    /// Single-warehouse delivery.
    Direct { warehouse: String },
    /// One warehouse could cover the whole order on its own.
    SingleSource { warehouse: String },
    /// Each product drawn from as many warehouses as needed.
    Fragmented,
}

impl DeliveryStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryStrategy::Direct { .. } => "direct",
            DeliveryStrategy::SingleSource { .. } => "single_source",
            DeliveryStrategy::Fragmented => "fragmented",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// Every requested unit was delivered.
    Completed,
    /// Something was delivered, some requests fell short.
    Partial,
    /// Nothing requested could be found; the truck stayed empty.
    Cancelled,
    /// The deliverable quantity did not fit on the truck; nothing was moved.
    Refused { required: Quantity, available: Quantity },
}

/// Units drawn from one warehouse for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourcedQuantity {
    pub warehouse: String,
    pub quantity: Quantity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryLine {
    pub product: String,
    pub requested: Quantity,
    pub delivered: Quantity,
    pub sources: Vec<SourcedQuantity>,
}

impl ValueObject for DeliveryLine {}

impl DeliveryLine {
    fn new(product: &str, requested: Quantity) -> Self {
        Self {
            product: product.to_string(),
            requested,
            delivered: 0,
            sources: Vec::new(),
        }
    }

    fn record(&mut self, warehouse: &Warehouse, quantity: Quantity) {
        if quantity == 0 {
            return;
        }
        self.delivered += quantity;
        self.sources.push(SourcedQuantity {
            warehouse: warehouse.name().to_string(),
            quantity,
        });
    }

    pub fn shortfall(&self) -> Quantity {
        self.requested.saturating_sub(self.delivered)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub truck: String,
    pub shop: String,
    pub strategy: DeliveryStrategy,
    pub outcome: DeliveryOutcome,
    pub lines: Vec<DeliveryLine>,
    /// One entry per flush, in order.
    pub shipments: Vec<Shipment>,
}

impl DeliveryReport {
    pub fn delivered_total(&self) -> Quantity {
        self.lines.iter().map(|l| l.delivered).sum()
    }

    pub fn shortfall_total(&self) -> Quantity {
        self.lines.iter().map(DeliveryLine::shortfall).sum()
    }

    pub fn line(&self, product: &str) -> Option<&DeliveryLine> {
        self.lines.iter().find(|l| l.product == product)
    }
}

impl Truck {
    /// Deliver an order from a single warehouse (strict variant).
    ///
    /// Each request is capped by what the warehouse holds. If the capped total does not
    /// fit in the truck's free space the whole delivery is refused and nothing moves;
    /// otherwise everything is loaded and flushed once.
    pub fn deliver_from(&self, warehouse: &Warehouse, shop: &str, requests: &DeliveryRequest) -> DeliveryReport {
        let strategy = DeliveryStrategy::Direct {
            warehouse: warehouse.name().to_string(),
        };
        let mut lines: Vec<DeliveryLine> = requests
            .iter()
            .map(|(product, requested)| DeliveryLine::new(product, *requested))
            .collect();

        let required: Quantity = requests
            .iter()
            .map(|(product, requested)| (*requested).min(warehouse.product_quantity(product)))
            .sum();
        let available = self.free_space();
        if required > available {
            warn!(truck = %self.name(), shop, required, available, "delivery exceeds truck capacity; refused");
            self.events.publish(
                self.name(),
                &TruckEvent::DeliveryRefused {
                    truck: self.name().to_string(),
                    shop: shop.to_string(),
                    required,
                    available,
                    occurred_at: Utc::now(),
                },
            );
            return self.report(shop, strategy, DeliveryOutcome::Refused { required, available }, lines, Vec::new());
        }

        let mut shipments = Vec::new();
        for line in &mut lines {
            let drawn = self.draw(warehouse, &line.product, line.requested, shop, &mut shipments);
            line.record(warehouse, drawn);
        }

        self.finish(shop, strategy, lines, shipments)
    }

    /// Deliver an order from a list of warehouses.
    ///
    /// 1. Single source: the first warehouse (list order) that alone holds every
    ///    requested product at full quantity supplies the whole order.
    /// 2. Fragmented: otherwise each product is drawn from the warehouses in order until
    ///    its request is met or the list is exhausted.
    ///
    /// Loading is capacity-aware: an order that fits goes out in one flush, a larger one
    /// goes out in waves, flushing whenever the truck fills up mid-order.
    pub fn deliver(&self, warehouses: &[Arc<Warehouse>], shop: &str, requests: &DeliveryRequest) -> DeliveryReport {
        let mut lines: Vec<DeliveryLine> = requests
            .iter()
            .map(|(product, requested)| DeliveryLine::new(product, *requested))
            .collect();
        let mut shipments = Vec::new();

        let planned = planned_quantity(warehouses, requests);
        if planned > self.free_space() {
            info!(truck = %self.name(), shop, planned, capacity = self.max_capacity(), "order exceeds truck capacity; delivering in waves");
        }

        let single_source = warehouses.iter().find(|w| {
            requests
                .iter()
                .all(|(product, requested)| w.product_quantity(product) >= *requested)
        });

        let strategy = match single_source {
            Some(warehouse) => {
                for line in &mut lines {
                    let drawn = self.draw(warehouse, &line.product, line.requested, shop, &mut shipments);
                    line.record(warehouse, drawn);
                }
                DeliveryStrategy::SingleSource {
                    warehouse: warehouse.name().to_string(),
                }
            }
            None => {
                for line in &mut lines {
                    for warehouse in warehouses {
                        let remaining = line.shortfall();
                        if remaining == 0 {
                            break;
                        }
                        let available = warehouse.product_quantity(&line.product);
                        if available == 0 {
                            continue;
                        }
                        let drawn = self.draw(warehouse, &line.product, available.min(remaining), shop, &mut shipments);
                        line.record(warehouse, drawn);
                    }
                }
                DeliveryStrategy::Fragmented
            }
        };

        self.finish(shop, strategy, lines, shipments)
    }

    /// Move up to `wanted` units of `product` from `warehouse` onto this truck, flushing
    /// to `shop` whenever the truck is full. Returns the units actually moved.
    ///
    /// Truck space is reserved before stock leaves the warehouse, so a drain loading the
    /// same truck concurrently can only make this wait for a flush, never lose units.
    fn draw(
        &self,
        warehouse: &Warehouse,
        product: &str,
        wanted: Quantity,
        shop: &str,
        shipments: &mut Vec<Shipment>,
    ) -> Quantity {
        let mut drawn = 0;
        while drawn < wanted {
            let moved = warehouse.unload_into(product, wanted - drawn, self);
            if moved > 0 {
                drawn += moved;
                continue;
            }
            if warehouse.product_quantity(product) == 0 {
                break;
            }
            // Stock is there but the truck was full. An empty truck here means another
            // loader already flushed it, so just retry.
            if let Some(shipment) = self.unload_product(shop) {
                shipments.push(shipment);
            }
        }
        drawn
    }

    /// Final flush, shortfall reporting and outcome classification.
    fn finish(
        &self,
        shop: &str,
        strategy: DeliveryStrategy,
        lines: Vec<DeliveryLine>,
        mut shipments: Vec<Shipment>,
    ) -> DeliveryReport {
        let delivered: Quantity = lines.iter().map(|l| l.delivered).sum();

        if delivered == 0 && lines.iter().any(|l| l.requested > 0) {
            warn!(truck = %self.name(), shop, "no requested product found in any warehouse; delivery cancelled");
            self.events.publish(
                self.name(),
                &TruckEvent::DeliveryCancelled {
                    truck: self.name().to_string(),
                    shop: shop.to_string(),
                    occurred_at: Utc::now(),
                },
            );
            return self.report(shop, strategy, DeliveryOutcome::Cancelled, lines, shipments);
        }

        if let Some(shipment) = self.unload_product(shop) {
            shipments.push(shipment);
        }

        for line in lines.iter().filter(|l| l.shortfall() > 0) {
            warn!(
                truck = %self.name(),
                product = %line.product,
                requested = line.requested,
                delivered = line.delivered,
                "product not available in the requested quantity"
            );
            self.events.publish(
                self.name(),
                &TruckEvent::Shortfall {
                    truck: self.name().to_string(),
                    product: line.product.clone(),
                    requested: line.requested,
                    delivered: line.delivered,
                    occurred_at: Utc::now(),
                },
            );
        }

        let shortfall: Quantity = lines.iter().map(DeliveryLine::shortfall).sum();
        let outcome = if shortfall == 0 {
            DeliveryOutcome::Completed
        } else {
            DeliveryOutcome::Partial
        };

        info!(truck = %self.name(), shop, strategy = strategy.label(), delivered, shortfall, "delivery finished");
        self.events.publish(
            self.name(),
            &TruckEvent::DeliveryCompleted {
                truck: self.name().to_string(),
                shop: shop.to_string(),
                strategy: strategy.label().to_string(),
                delivered,
                shortfall,
                occurred_at: Utc::now(),
            },
        );

        self.report(shop, strategy, outcome, lines, shipments)
    }

    fn report(
        &self,
        shop: &str,
        strategy: DeliveryStrategy,
        outcome: DeliveryOutcome,
        lines: Vec<DeliveryLine>,
        shipments: Vec<Shipment>,
    ) -> DeliveryReport {
        DeliveryReport {
            truck: self.name().to_string(),
            shop: shop.to_string(),
            strategy,
            outcome,
            lines,
            shipments,
        }
    }
}

/// Units the warehouses could supply for the order right now (each request capped by
/// the combined stock).
pub fn planned_quantity(warehouses: &[Arc<Warehouse>], requests: &DeliveryRequest) -> Quantity {
    requests
        .iter()
        .map(|(product, requested)| {
            let stocked: Quantity = warehouses.iter().map(|w| w.product_quantity(product)).sum();
            (*requested).min(stocked)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use depotnet_products::Product;

    fn stocked(name: &str, capacity: Quantity, lines: &[(&str, Quantity)]) -> Arc<Warehouse> {
        let w = Warehouse::new(name, capacity).unwrap();
        for (product, quantity) in lines {
            w.store_product(Product::new(*product, 1.0, "Box", *quantity)).unwrap();
        }
        Arc::new(w)
    }

    fn request(items: &[(&str, Quantity)]) -> DeliveryRequest {
        items.iter().map(|(p, q)| (p.to_string(), *q)).collect()
    }

    #[test]
    fn direct_delivery_is_capped_by_availability() {
        let w = stocked("A", 100, &[("Widget", 10)]);
        let truck = Truck::new("T1", 1000).unwrap();

        let report = truck.deliver_from(&w, "Shop", &request(&[("Widget", 15)]));

        assert_eq!(report.outcome, DeliveryOutcome::Partial);
        assert_eq!(report.delivered_total(), 10);
        assert_eq!(report.line("Widget").unwrap().shortfall(), 5);
        assert_eq!(report.shipments.len(), 1);
        assert_eq!(report.shipments[0].quantity, 10);
        assert_eq!(truck.current_load(), 0);
        assert_eq!(w.product_quantity("Widget"), 0);
    }

    #[test]
    fn report_serializes_with_tagged_strategy_and_outcome() {
        let w = stocked("A", 100, &[("Widget", 4)]);
        let truck = Truck::new("T1", 10).unwrap();

        let report = truck.deliver_from(&w, "Shop", &request(&[("Widget", 4)]));
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["strategy"]["kind"], "direct");
        assert_eq!(json["strategy"]["warehouse"], "A");
        assert_eq!(json["outcome"]["kind"], "completed");
        assert_eq!(json["lines"][0]["sources"][0]["quantity"], 4);
        assert_eq!(json["shipments"][0]["manifest"]["Widget"], 4);
    }

    #[test]
    fn direct_delivery_refuses_what_does_not_fit() {
        let w = stocked("A", 100, &[("Widget", 30), ("Gadget", 30)]);
        let truck = Truck::new("T1", 50).unwrap();

        let report = truck.deliver_from(&w, "Shop", &request(&[("Widget", 30), ("Gadget", 30)]));

        assert_eq!(report.outcome, DeliveryOutcome::Refused { required: 60, available: 50 });
        assert_eq!(report.delivered_total(), 0);
        assert!(report.shipments.is_empty());
        assert_eq!(w.current_load(), 60);
        assert_eq!(truck.statistics().total_delivered, 0);
    }

    #[test]
    fn direct_delivery_of_missing_product_is_cancelled() {
        let w = stocked("A", 100, &[("Widget", 10)]);
        let truck = Truck::new("T1", 10).unwrap();

        let report = truck.deliver_from(&w, "Shop", &request(&[("Gadget", 3)]));

        assert_eq!(report.outcome, DeliveryOutcome::Cancelled);
        assert!(report.shipments.is_empty());
    }

    #[test]
    fn single_source_is_preferred_and_leaves_other_warehouses_untouched() {
        // W2 is listed second but W1 already covers everything: first fit wins.
        let partial = stocked("W0", 100, &[("Widget", 5), ("Gadget", 50)]);
        let full = stocked("W1", 100, &[("Widget", 20), ("Gadget", 20)]);
        let other = stocked("W2", 200, &[("Widget", 90), ("Gadget", 90)]);
        let truck = Truck::new("T1", 100).unwrap();

        let report = truck.deliver(
            &[partial.clone(), full.clone(), other.clone()],
            "Shop",
            &request(&[("Widget", 10), ("Gadget", 12)]),
        );

        assert_eq!(report.strategy, DeliveryStrategy::SingleSource { warehouse: "W1".to_string() });
        assert_eq!(report.outcome, DeliveryOutcome::Completed);
        assert_eq!(full.product_quantity("Widget"), 10);
        assert_eq!(full.product_quantity("Gadget"), 8);
        assert_eq!(partial.current_load(), 55);
        assert_eq!(other.current_load(), 180);
        assert_eq!(report.shipments.len(), 1);
        assert_eq!(report.shipments[0].quantity, 22);
    }

    #[test]
    fn fragmented_delivery_walks_warehouses_in_order() {
        let first = stocked("W1", 100, &[("Widget", 6)]);
        let second = stocked("W2", 100, &[("Widget", 3), ("Gadget", 4)]);
        let truck = Truck::new("T1", 100).unwrap();

        let report = truck.deliver(
            &[first.clone(), second.clone()],
            "Shop",
            &request(&[("Widget", 8), ("Gadget", 10)]),
        );

        assert_eq!(report.strategy, DeliveryStrategy::Fragmented);
        assert_eq!(report.outcome, DeliveryOutcome::Partial);

        let widget = report.line("Widget").unwrap();
        assert_eq!(widget.delivered, 8);
        assert_eq!(widget.sources, vec![
            SourcedQuantity { warehouse: "W1".to_string(), quantity: 6 },
            SourcedQuantity { warehouse: "W2".to_string(), quantity: 2 },
        ]);
        assert_eq!(report.line("Gadget").unwrap().shortfall(), 6);
        assert_eq!(second.product_quantity("Widget"), 1);
        assert_eq!(report.shipments.len(), 1);
    }

    #[test]
    fn nothing_found_anywhere_cancels_and_keeps_truck_empty() {
        let first = stocked("W1", 100, &[("Widget", 6)]);
        let truck = Truck::new("T1", 100).unwrap();

        let report = truck.deliver(&[first], "Shop", &request(&[("Gadget", 1)]));

        assert_eq!(report.outcome, DeliveryOutcome::Cancelled);
        assert_eq!(truck.current_load(), 0);
        assert_eq!(truck.statistics().trips, 0);
    }

    #[test]
    fn oversize_order_is_delivered_in_waves() {
        let first = stocked("W1", 100, &[("Widget", 10), ("Gadget", 12)]);
        let truck = Truck::new("T1", 8).unwrap();

        let report = truck.deliver(&[first.clone()], "Shop", &request(&[("Gadget", 12), ("Widget", 10)]));

        assert_eq!(report.outcome, DeliveryOutcome::Completed);
        let flushed: Vec<Quantity> = report.shipments.iter().map(|s| s.quantity).collect();
        assert_eq!(flushed, vec![8, 8, 6]);
        assert_eq!(first.current_load(), 0);

        let stats = truck.statistics();
        assert_eq!(stats.total_delivered, 22);
        assert_eq!(stats.trips, 3);
        assert_eq!(stats.current_load, 0);
    }

    #[test]
    fn all_zero_requests_complete_without_moving_anything() {
        let w = stocked("W1", 100, &[("Widget", 5)]);
        let truck = Truck::new("T1", 10).unwrap();

        let report = truck.deliver(&[w.clone()], "Shop", &request(&[("Widget", 0)]));
        assert_eq!(report.outcome, DeliveryOutcome::Completed);
        assert!(report.shipments.is_empty());

        let report = truck.deliver_from(&w, "Shop", &request(&[("Widget", 0), ("Gadget", 0)]));
        assert_eq!(report.outcome, DeliveryOutcome::Completed);
        assert_eq!(report.delivered_total(), 0);
        assert_eq!(w.product_quantity("Widget"), 5);
        assert_eq!(truck.statistics().trips, 0);
    }

    #[test]
    fn delivery_racing_a_loader_and_a_refilling_store_loses_no_units() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::thread;

        use depotnet_inventory::Carrier;

        for _ in 0..20 {
            let w = stocked("W", 100, &[("X", 60)]);
            let truck = Arc::new(Truck::new("T", 3).unwrap());
            let stop = AtomicBool::new(false);

            let delivered = thread::scope(|s| {
                s.spawn(|| {
                    while !stop.load(Ordering::Acquire) {
                        Carrier::accept(truck.as_ref(), "Y", 1);
                        Carrier::flush(truck.as_ref(), "Outlet");
                    }
                });
                s.spawn(|| {
                    while !stop.load(Ordering::Acquire) {
                        let room = w.free_space();
                        if room > 0 {
                            let _ = w.store_product(Product::new("F", 1.0, "Box", room));
                        }
                    }
                });

                let delivered: Quantity = (0..60)
                    .map(|_| truck.deliver(&[w.clone()], "Shop", &request(&[("X", 1)])).delivered_total())
                    .sum();
                stop.store(true, Ordering::Release);
                delivered
            });

            assert_eq!(w.product_quantity("X") + delivered, 60);
            assert_eq!(delivered, 60);
        }
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 128,
                ..ProptestConfig::default()
            })]

            /// Property: units leaving the warehouses equal units delivered, and the truck
            /// never ends a delivery loaded.
            #[test]
            fn delivery_conserves_units(
                stock in prop::collection::vec((0u64..40, 0u64..40), 1..4),
                wanted in (0u64..60, 0u64..60),
                capacity in 1u64..50
            ) {
                let warehouses: Vec<Arc<Warehouse>> = stock
                    .iter()
                    .enumerate()
                    .map(|(i, (a, b))| stocked(&format!("W{i}"), 100, &[("A", *a), ("B", *b)]))
                    .collect();
                let before: Quantity = warehouses.iter().map(|w| w.current_load()).sum();
                let truck = Truck::new("T", capacity).unwrap();

                let report = truck.deliver(&warehouses, "Shop", &request(&[("A", wanted.0), ("B", wanted.1)]));

                let after: Quantity = warehouses.iter().map(|w| w.current_load()).sum();
                let shipped: Quantity = report.shipments.iter().map(|s| s.quantity).sum();
                prop_assert_eq!(before - after, report.delivered_total());
                prop_assert_eq!(shipped, report.delivered_total());
                prop_assert_eq!(truck.current_load(), 0);
                prop_assert!(report.delivered_total() <= wanted.0 + wanted.1);
            }
        }
    }
}

//! End-to-end runs across factories, warehouses, drains and trucks.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use serde_json::Value as JsonValue;

use depotnet_core::{DomainError, Quantity};
use depotnet_events::{EventEnvelope, EventPublisher, InMemoryEventBus, JsonEventBus};
use depotnet_fleet::{DeliveryOutcome, DeliveryRequest, DeliveryStrategy, Truck};
use depotnet_inventory::{Carrier, Warehouse};
use depotnet_observability::EventLogWorker;
use depotnet_production::{Factory, PlacementMode};
use depotnet_products::Product;

use crate::config::SimConfig;
use crate::scenario;

fn widget(quantity: Quantity) -> Product {
    Product::new("Widget", 10.0, "Box", quantity)
}

fn order(lines: &[(&str, Quantity)]) -> DeliveryRequest {
    lines.iter().map(|(p, q)| (p.to_string(), *q)).collect()
}

#[test]
fn scenario_a_factory_batch_fits_one_warehouse() {
    let warehouse = Arc::new(Warehouse::new("W1", 100).unwrap());
    let factory = Factory::new("Widget", 10.0, "Box", 90).unwrap();

    let report = factory.storage(&[warehouse.clone()]);

    assert_eq!(report.mode, PlacementMode::Whole);
    assert_eq!(warehouse.free_space(), 10);
    let log = warehouse.arrival_log();
    assert_eq!(log.len(), 1);
    assert_eq!((log[0].product.as_str(), log[0].quantity), ("Widget", 90));
}

#[test]
fn scenario_b_second_batch_is_refused_without_mutation() {
    let warehouse = Warehouse::new("W1", 100).unwrap();
    warehouse.store_product(widget(90)).unwrap();
    let before = warehouse.snapshot();

    let err = warehouse.store_product(widget(90)).unwrap_err();

    assert_eq!(err, DomainError::insufficient_capacity(90, 10));
    assert_eq!(warehouse.snapshot().inventory, before.inventory);
    assert_eq!(warehouse.current_load(), 90);
    assert_eq!(warehouse.arrival_log().len(), 1);
}

#[test]
fn scenario_c_partial_delivery_reports_shortfall() {
    let warehouse = Warehouse::new("W1", 100).unwrap();
    warehouse.store_product(widget(10)).unwrap();
    let truck = Truck::new("T1", 1000).unwrap();

    let report = truck.deliver_from(&warehouse, "Shop", &order(&[("Widget", 15)]));

    assert_eq!(report.outcome, DeliveryOutcome::Partial);
    assert_eq!(report.delivered_total(), 10);
    assert_eq!(report.line("Widget").unwrap().shortfall(), 5);
    assert_eq!(report.shipments.len(), 1);
    assert_eq!(report.shipments[0].quantity, 10);
    assert_eq!(truck.current_load(), 0);
    assert_eq!(warehouse.product_quantity("Widget"), 0);
}

#[test]
fn scenario_d_drain_moves_exactly_the_truck_space() {
    let warehouse = Arc::new(Warehouse::new("W1", 52).unwrap());
    warehouse.store_product(widget(50)).unwrap();
    assert!(warehouse.is_overloaded());

    let truck = Arc::new(Truck::new("T1", 10).unwrap());
    truck.load_product("Gadget", 5).unwrap();

    let handle = warehouse
        .start_auto_unload(vec![truck.clone() as Arc<dyn Carrier>], "Shop")
        .unwrap();
    let report = handle.join().unwrap();

    assert_eq!(report.total_moved(), 5);
    assert!(report.relieved);
    assert_eq!(warehouse.product_quantity("Widget"), 45);
    assert!(!warehouse.is_draining());
    assert_eq!(truck.current_load(), 0);
    assert_eq!(truck.statistics().delivered_by_product["Widget"], 5);
}

#[test]
fn demo_run_conserves_stock_across_concurrent_drains() {
    let config = SimConfig::default();
    let outcome = scenario::run(&config, &EventPublisher::disabled()).unwrap();

    let modes: Vec<PlacementMode> = outcome.placements.iter().map(|p| p.mode).collect();
    assert_eq!(modes, vec![PlacementMode::Whole, PlacementMode::Whole, PlacementMode::Split]);
    assert_eq!(outcome.placements[2].placed(), 20);
    assert_eq!(outcome.placements[2].unplaced, 70);

    // Both warehouses are full after the split batch, so both drains start. They share
    // the fleet, so how much each one moves depends on scheduling.
    assert_eq!(outcome.drains.len(), 2);

    let delivery = &outcome.delivery;
    assert!(matches!(delivery.outcome, DeliveryOutcome::Completed | DeliveryOutcome::Partial));
    assert_eq!(delivery.delivered_total() + delivery.shortfall_total(), 22);
    assert_eq!(delivery.line("Product 1").unwrap().delivered, 12);

    let (name, arrivals) = &outcome.arrivals[0];
    assert_eq!(name, "Warehouse A");
    let quantities: Vec<Quantity> = arrivals.iter().map(|a| a.quantity).collect();
    assert_eq!(quantities, vec![90, 10]);
    assert!(arrivals.iter().all(|a| a.source == "Product A"));

    let drained: Quantity = outcome.drains.iter().map(|d| d.total_moved()).sum();
    let trucked: Quantity = outcome.trucks.iter().map(|t| t.total_delivered).sum();
    assert_eq!(trucked, drained + delivery.delivered_total());
    assert!(outcome.trucks.iter().all(|t| t.current_load == 0));
    assert!(outcome.warehouses.iter().all(|w| !w.draining));
}

#[test]
fn settled_demo_network_serves_the_order_from_one_warehouse() {
    let config = SimConfig::default();
    let network = scenario::Network::build(&config, &EventPublisher::disabled()).unwrap();
    for factory in &network.factories {
        factory.storage(&network.warehouses);
    }

    // Drain one warehouse at a time on this thread.
    for warehouse in &network.warehouses {
        let report = warehouse.auto_unload(&network.carriers(), &config.shop).unwrap();
        assert_eq!(report.total_moved(), 10);
        assert!(report.relieved);
    }
    assert_eq!(network.warehouses[0].product_quantity("Product A"), 0);
    assert_eq!(network.warehouses[1].product_quantity("Product 1"), 80);
    assert_eq!(network.warehouses[1].product_quantity("Product A"), 10);

    let delivery = network.trucks[0].deliver(&network.warehouses, &config.shop, &config.order);

    assert_eq!(delivery.strategy, DeliveryStrategy::SingleSource { warehouse: "Warehouse B".to_string() });
    assert_eq!(delivery.outcome, DeliveryOutcome::Completed);
    let waves: Vec<Quantity> = delivery.shipments.iter().map(|s| s.quantity).collect();
    assert_eq!(waves, vec![10, 10, 2]);

    let stats = network.trucks[0].statistics();
    assert_eq!(stats.total_delivered, 42);
    assert_eq!(stats.trips, 5);
}

#[test]
fn demo_run_publishes_every_outcome_on_the_bus() {
    let bus: Arc<JsonEventBus> = Arc::new(InMemoryEventBus::<EventEnvelope<JsonValue>>::new());
    let worker = EventLogWorker::spawn("event-log-sim", bus.as_ref()).unwrap();

    scenario::run(&SimConfig::default(), &EventPublisher::new(bus.clone())).unwrap();
    let summary = worker.shutdown();

    assert_eq!(summary.count("production.batch.placed"), 3);
    assert_eq!(summary.count("production.batch.unplaced"), 1);
    assert_eq!(summary.count("inventory.warehouse.product_stored"), 4);
    assert_eq!(summary.count("inventory.drain.started"), 2);
    assert_eq!(summary.count("inventory.drain.finished"), 2);
    assert_eq!(summary.count("fleet.delivery.completed"), 1);
    assert_eq!(summary.last_sequence, summary.events);
}

#[test]
fn invalid_configuration_surfaces_as_an_error() {
    let mut config = SimConfig::default();
    config.trucks[0].capacity = 0;

    let err = scenario::run(&config, &EventPublisher::disabled()).unwrap_err();
    assert!(format!("{err:#}").contains("Truck 1"));
}

#[test]
fn drain_racing_deliveries_conserves_stock() {
    let products = ["Bolt", "Nut", "Washer"];
    let warehouses: Vec<Arc<Warehouse>> = (0..3)
        .map(|i| {
            let w = Warehouse::new(format!("W{i}"), 100).unwrap();
            for (p, name) in products.iter().enumerate() {
                let quantity = if p == 0 { 34 } else { 32 };
                w.store_product(Product::new(*name, 1.0, "Crate", quantity)).unwrap();
            }
            Arc::new(w)
        })
        .collect();
    let stocked: Quantity = warehouses.iter().map(|w| w.current_load()).sum();
    assert!(warehouses.iter().all(|w| w.is_overloaded()));

    let trucks: Vec<Arc<Truck>> = (0..3)
        .map(|i| Arc::new(Truck::new(format!("T{i}"), 7 + i as Quantity).unwrap()))
        .collect();
    let carriers: Vec<Arc<dyn Carrier>> = trucks.iter().map(|t| t.clone() as Arc<dyn Carrier>).collect();

    let drains: Vec<_> = warehouses
        .iter()
        .filter_map(|w| w.start_auto_unload(carriers.clone(), "Outlet"))
        .collect();
    assert_eq!(drains.len(), 3);

    let delivered: Quantity = thread::scope(|scope| {
        let workers: Vec<_> = trucks
            .iter()
            .map(|truck| {
                let warehouses = &warehouses;
                scope.spawn(move || {
                    let mut total = 0;
                    for _ in 0..5 {
                        let report = truck.deliver(warehouses, "Shop", &order(&[("Bolt", 6), ("Nut", 4), ("Washer", 5)]));
                        total += report.delivered_total();
                    }
                    total
                })
            })
            .collect();
        workers.into_iter().map(|h| h.join().unwrap()).sum()
    });

    let drained: Quantity = drains
        .into_iter()
        .map(|h| h.join().unwrap().total_moved())
        .sum();

    let remaining: Quantity = warehouses.iter().map(|w| w.current_load()).sum();
    let on_inventory: Quantity = warehouses
        .iter()
        .flat_map(|w| w.inventory())
        .map(|p| p.quantity)
        .sum();
    let trucked: Quantity = trucks.iter().map(|t| t.statistics().total_delivered).sum();

    assert_eq!(remaining, on_inventory);
    assert_eq!(stocked, remaining + delivered + drained);
    assert_eq!(trucked, delivered + drained);
    for w in &warehouses {
        assert!(w.current_load() <= w.capacity());
        assert!(!w.is_draining());
    }
    for t in &trucks {
        assert_eq!(t.current_load(), 0);
    }

    let by_product: BTreeMap<String, Quantity> = trucks.iter().fold(BTreeMap::new(), |mut acc, t| {
        for (product, quantity) in t.statistics().delivered_by_product {
            *acc.entry(product).or_insert(0) += quantity;
        }
        acc
    });
    assert!(by_product.keys().all(|p| products.contains(&p.as_str())));
}

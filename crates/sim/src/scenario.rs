//! The demo run: factories fill the warehouses, overloaded warehouses drain to the shop,
//! then one truck fulfils a multi-warehouse order.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use depotnet_core::Entity;
use depotnet_events::EventPublisher;
use depotnet_fleet::{DeliveryReport, Truck, TruckStatistics};
use depotnet_inventory::{ArrivalRecord, Carrier, DrainReport, Warehouse, WarehouseSnapshot};
use depotnet_production::{Factory, PlacementReport};

use crate::config::SimConfig;

/// The wired-up network.
#[derive(Debug)]
pub struct Network {
    pub warehouses: Vec<Arc<Warehouse>>,
    pub trucks: Vec<Arc<Truck>>,
    pub factories: Vec<Factory>,
}

impl Network {
    pub fn build(config: &SimConfig, events: &EventPublisher) -> anyhow::Result<Self> {
        let warehouses = config
            .warehouses
            .iter()
            .map(|entry| {
                let warehouse = Warehouse::new(entry.name.clone(), entry.capacity)
                    .and_then(|w| w.with_overload_threshold(config.overload_threshold_percent))
                    .with_context(|| format!("invalid warehouse {:?}", entry.name))?;
                Ok(Arc::new(warehouse.with_events(events.clone())))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let trucks = config
            .trucks
            .iter()
            .map(|entry| {
                let truck = Truck::new(entry.name.clone(), entry.capacity)
                    .with_context(|| format!("invalid truck {:?}", entry.name))?;
                Ok(Arc::new(truck.with_events(events.clone())))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let factories = config
            .factories
            .iter()
            .map(|entry| {
                let factory = Factory::new(
                    entry.name.clone(),
                    entry.unit_weight,
                    entry.packaging.clone(),
                    entry.production_rate,
                )
                .with_context(|| format!("invalid factory {:?}", entry.name))?;
                Ok(factory.with_events(events.clone()))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            warehouses,
            trucks,
            factories,
        })
    }

    pub fn carriers(&self) -> Vec<Arc<dyn Carrier>> {
        self.trucks
            .iter()
            .map(|truck| Arc::clone(truck) as Arc<dyn Carrier>)
            .collect()
    }
}

/// Everything the demo produced, for reporting and assertions.
#[derive(Debug)]
pub struct SimOutcome {
    pub placements: Vec<PlacementReport>,
    pub drains: Vec<DrainReport>,
    pub delivery: DeliveryReport,
    pub warehouses: Vec<WarehouseSnapshot>,
    pub arrivals: Vec<(String, Vec<ArrivalRecord>)>,
    pub trucks: Vec<TruckStatistics>,
}

/// Run the demo once on a fresh network.
pub fn run(config: &SimConfig, events: &EventPublisher) -> anyhow::Result<SimOutcome> {
    let network = Network::build(config, events)?;
    run_on(&network, config)
}

/// Run the demo on an existing network.
///
/// Drains are joined before the order is placed, so the delivery sees settled stock.
pub fn run_on(network: &Network, config: &SimConfig) -> anyhow::Result<SimOutcome> {
    info!(
        warehouses = network.warehouses.len(),
        trucks = network.trucks.len(),
        factories = network.factories.len(),
        "loading warehouses"
    );
    let placements: Vec<PlacementReport> = network
        .factories
        .iter()
        .map(|factory| factory.storage(&network.warehouses))
        .collect();

    info!(shop = %config.shop, "starting auto-unload");
    let handles: Vec<_> = network
        .warehouses
        .iter()
        .filter_map(|warehouse| warehouse.start_auto_unload(network.carriers(), config.shop.clone()))
        .collect();

    let mut drains = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.join() {
            Some(report) => drains.push(report),
            None => warn!("auto-unload thread panicked"),
        }
    }

    let truck = network
        .trucks
        .first()
        .context("the demo needs at least one truck")?;
    info!(truck = %truck.name(), products = config.order.len(), "processing delivery order");
    let delivery = truck.deliver(&network.warehouses, &config.shop, &config.order);

    Ok(SimOutcome {
        placements,
        drains,
        delivery,
        warehouses: network.warehouses.iter().map(|w| w.snapshot()).collect(),
        arrivals: network
            .warehouses
            .iter()
            .map(|w| (w.name().to_string(), w.arrival_log()))
            .collect(),
        trucks: network.trucks.iter().map(|t| t.statistics()).collect(),
    })
}

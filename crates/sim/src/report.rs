//! Human-oriented summaries of a run, emitted through `tracing`.

use tracing::info;

use depotnet_fleet::{DeliveryOutcome, TruckStatistics};
use depotnet_inventory::ArrivalRecord;

use crate::scenario::SimOutcome;

pub fn log_outcome(outcome: &SimOutcome) {
    for placement in &outcome.placements {
        info!(
            factory = %placement.factory,
            produced = placement.produced,
            placed = placement.placed(),
            unplaced = placement.unplaced,
            mode = ?placement.mode,
            "placement"
        );
    }

    for drain in &outcome.drains {
        info!(
            warehouse = %drain.warehouse,
            moved = drain.total_moved(),
            transfers = drain.transfers.len(),
            relieved = drain.relieved,
            "drain"
        );
    }

    let delivery = &outcome.delivery;
    let outcome_label = match &delivery.outcome {
        DeliveryOutcome::Completed => "completed",
        DeliveryOutcome::Partial => "partial",
        DeliveryOutcome::Cancelled => "cancelled",
        DeliveryOutcome::Refused { .. } => "refused",
    };
    info!(
        truck = %delivery.truck,
        shop = %delivery.shop,
        strategy = delivery.strategy.label(),
        outcome = outcome_label,
        delivered = delivery.delivered_total(),
        shortfall = delivery.shortfall_total(),
        flushes = delivery.shipments.len(),
        "delivery"
    );

    for (warehouse, arrivals) in &outcome.arrivals {
        log_arrivals(warehouse, arrivals);
    }
    for snapshot in &outcome.warehouses {
        info!(
            warehouse = %snapshot.name,
            current_load = snapshot.current_load,
            capacity = snapshot.capacity,
            fill_percentage = snapshot.fill_percentage,
            overloaded = snapshot.overloaded,
            overload_threshold_percent = snapshot.overload_threshold_percent,
            "warehouse state"
        );
    }
    for stats in &outcome.trucks {
        log_truck_statistics(stats);
    }
}

/// One line per arrival, oldest first.
pub fn log_arrivals(warehouse: &str, arrivals: &[ArrivalRecord]) {
    if arrivals.is_empty() {
        info!(warehouse, "no arrivals");
        return;
    }
    for record in arrivals {
        info!(
            warehouse,
            source = %record.source,
            product = %record.product,
            quantity = record.quantity,
            received_at = %record.received_at.format("%Y-%m-%d %H:%M:%S"),
            "arrival"
        );
    }
}

pub fn log_truck_statistics(stats: &TruckStatistics) {
    info!(
        truck = %stats.name,
        max_capacity = stats.max_capacity,
        current_load = stats.current_load,
        total_delivered = stats.total_delivered,
        trips = stats.trips,
        "truck statistics"
    );
    for (product, delivered) in &stats.delivered_by_product {
        let deliveries = stats.delivery_count_by_product.get(product).copied().unwrap_or(0);
        info!(truck = %stats.name, product = %product, delivered, deliveries, "delivered product");
    }
}

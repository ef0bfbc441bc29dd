use std::sync::Arc;

use anyhow::Context;
use serde_json::Value as JsonValue;

use depotnet_events::{EventEnvelope, EventPublisher, InMemoryEventBus};
use depotnet_observability::EventLogWorker;
use depotnet_sim::{SimConfig, report, scenario};

fn main() -> anyhow::Result<()> {
    depotnet_observability::init();

    let config = SimConfig::from_env().context("invalid simulation configuration")?;

    let bus = Arc::new(InMemoryEventBus::<EventEnvelope<JsonValue>>::new());
    let event_log = EventLogWorker::spawn("event-log", bus.as_ref())
        .context("failed to start the event log worker")?;
    tracing::info!(subscribers = bus.subscriber_count(), "event bus ready");

    let outcome = scenario::run(&config, &EventPublisher::new(bus.clone()))?;
    report::log_outcome(&outcome);

    let summary = event_log.shutdown();
    tracing::info!(events = summary.events, last_sequence = summary.last_sequence, "simulation finished");
    Ok(())
}

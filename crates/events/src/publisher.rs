//! Entity-side handle for emitting outcome events.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::warn;
use uuid::Uuid;

use crate::{Event, EventBus, EventEnvelope};

/// Bus carrying JSON-wrapped domain events.
pub type JsonEventBus = dyn EventBus<EventEnvelope<JsonValue>>;

/// Wraps domain events in envelopes and hands them to a bus.
///
/// Clones share the bus and the sequence counter, so every entity wired to the same
/// publisher produces one totally ordered stream. The default publisher is disabled and
/// drops everything.
#[derive(Clone, Default)]
pub struct EventPublisher {
    bus: Option<Arc<JsonEventBus>>,
    sequence: Arc<AtomicU64>,
}

impl core::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("enabled", &self.bus.is_some())
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish()
    }
}

impl EventPublisher {
    pub fn new(bus: Arc<JsonEventBus>) -> Self {
        Self {
            bus: Some(bus),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.bus.is_some()
    }

    /// Publish `event` on behalf of `source`.
    ///
    /// Failures (serialization, poisoned bus) are logged and swallowed: losing an
    /// observability event never aborts a logistics operation.
    pub fn publish<E>(&self, source: &str, event: &E)
    where
        E: Event + Serialize,
    {
        let Some(bus) = &self.bus else {
            return;
        };

        let payload = match serde_json::to_value(event) {
            Ok(v) => v,
            Err(err) => {
                warn!(source, event_type = event.event_type(), error = %err, "failed to serialize event");
                return;
            }
        };

        let sequence_number = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let envelope = EventEnvelope::new(
            Uuid::now_v7(),
            source,
            event.event_type(),
            event.version(),
            event.occurred_at(),
            sequence_number,
            payload,
        );

        if let Err(err) = bus.publish(envelope) {
            warn!(source, event_type = event.event_type(), error = %err, "failed to publish event");
        }
    }
}

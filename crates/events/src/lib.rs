//! Structured outcome events (mechanics only).
//!
//! Domain crates describe what happened as typed events; this crate wraps them in
//! envelopes and fans them out to subscribers (loggers, tests, reporting).

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod publisher;

pub use bus::{BusError, EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::InMemoryEventBus;
pub use publisher::{EventPublisher, JsonEventBus};

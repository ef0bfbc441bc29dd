use std::collections::BTreeMap;
use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde_json::Value as JsonValue;
use tracing::{info, warn};

use depotnet_events::{EventBus, EventEnvelope, Subscription};

type JsonEnvelope = EventEnvelope<JsonValue>;

/// What the worker saw before it stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLogSummary {
    pub events: u64,
    pub by_type: BTreeMap<String, u64>,
    /// Highest sequence number observed.
    pub last_sequence: u64,
}

impl EventLogSummary {
    fn record(&mut self, envelope: &JsonEnvelope) {
        self.events += 1;
        *self.by_type.entry(envelope.event_type().to_string()).or_insert(0) += 1;
        self.last_sequence = self.last_sequence.max(envelope.sequence_number());
    }

    pub fn count(&self, event_type: &str) -> u64 {
        self.by_type.get(event_type).copied().unwrap_or(0)
    }
}

/// Handle to stop the worker and collect its summary.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<EventLogSummary>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    ///
    /// Events already queued when shutdown is requested are still logged.
    pub fn shutdown(mut self) -> EventLogSummary {
        let _ = self.shutdown.send(());
        match self.join.take().map(thread::JoinHandle::join) {
            Some(Ok(summary)) => summary,
            Some(Err(_)) => {
                warn!("event log worker panicked");
                EventLogSummary::default()
            }
            None => EventLogSummary::default(),
        }
    }
}

/// Logs every envelope published on the bus as a structured line.
#[derive(Debug)]
pub struct EventLogWorker;

impl EventLogWorker {
    /// Subscribe to `bus` and spawn the logging thread.
    ///
    /// Only events published after this call are seen.
    pub fn spawn<B>(name: &'static str, bus: &B) -> io::Result<WorkerHandle>
    where
        B: EventBus<JsonEnvelope> + ?Sized,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub = bus.subscribe();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, sub, shutdown_rx))?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn worker_loop(
    name: &'static str,
    sub: Subscription<JsonEnvelope>,
    shutdown_rx: mpsc::Receiver<()>,
) -> EventLogSummary {
    let tick = Duration::from_millis(250);
    let mut summary = EventLogSummary::default();

    loop {
        if shutdown_rx.try_recv().is_ok() {
            for envelope in sub.drain() {
                log_envelope(name, &envelope);
                summary.record(&envelope);
            }
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(envelope) => {
                log_envelope(name, &envelope);
                summary.record(&envelope);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    summary
}

fn log_envelope(worker: &str, envelope: &JsonEnvelope) {
    info!(
        worker,
        event_id = %envelope.event_id(),
        source = envelope.source(),
        event_type = envelope.event_type(),
        sequence = envelope.sequence_number(),
        payload = %envelope.payload(),
        "event"
    );
}

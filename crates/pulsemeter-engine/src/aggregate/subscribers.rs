//! Update subscriptions.
//!
//! Each subscriber owns a bounded mpsc receiver. Publishing is lossy
//! (`try_send`): a slow subscriber misses events rather than stalling the
//! recording path. Closed receivers are pruned on the next publish.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use pulsemeter_core::{Metrics, SecurityEventKind};

/// Notifications emitted by the engine.
#[derive(Debug, Clone)]
pub enum MetricsEvent {
    /// One measured (non-technical) request.
    RequestRecorded {
        endpoint: String,
        successful: bool,
        response_time_ms: f64,
    },
    ErrorRecorded { error_type: String, endpoint: String },
    Security(SecurityEventKind),
    /// Emitted after each scheduler refresh tick.
    Refreshed(Arc<Metrics>),
    /// Emitted by the hourly audit tick.
    Audit(Arc<Metrics>),
}

pub const SUBSCRIBER_QUEUE: usize = 256;

#[derive(Default)]
pub struct Subscribers {
    senders: DashMap<u64, mpsc::Sender<MetricsEvent>>,
    seq: AtomicU64,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::Receiver<MetricsEvent> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE);
        let id = self.seq.fetch_add(1, Ordering::Relaxed);
        self.senders.insert(id, tx);
        rx
    }

    pub fn publish(&self, event: MetricsEvent) {
        if self.senders.is_empty() {
            return;
        }
        self.senders.retain(|_, tx| !tx.is_closed());
        for tx in self.senders.iter() {
            let _ = tx.value().try_send(event.clone());
        }
    }

    /// Like `publish`, but the event is only built when someone listens.
    pub fn publish_with(&self, make: impl FnOnce() -> MetricsEvent) {
        if self.senders.is_empty() {
            return;
        }
        self.publish(make());
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

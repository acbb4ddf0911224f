// ── Metric sinks ──
//
// The push-side boundary of the poller. A sink receives one batch per
// state change of a device; how it renders or stores the batch is its own
// business.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::registry::MetricEntry;

/// One published update of a device's metrics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricBatch {
    /// Display name of the device.
    pub device: String,
    /// Device-wide availability after this poll.
    pub available: bool,
    /// Keys first seen in this poll.
    pub created: Vec<String>,
    /// Entries carried by this batch: the updated ones after a successful
    /// poll, every known entry when the device became unavailable.
    pub entries: Vec<Arc<MetricEntry>>,
}

/// Consumer of metric batches.
///
/// Called from the poll task after the registry lock is released; keep
/// implementations cheap and non-blocking.
pub trait MetricSink: Send + Sync + 'static {
    fn publish(&self, batch: &MetricBatch);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MetricSink for NullSink {
    fn publish(&self, _batch: &MetricBatch) {}
}

/// Fans batches out to any number of `broadcast` subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<Arc<MetricBatch>>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<MetricBatch>> {
        self.tx.subscribe()
    }
}

impl MetricSink for BroadcastSink {
    fn publish(&self, batch: &MetricBatch) {
        // No subscribers is fine.
        let _ = self.tx.send(Arc::new(batch.clone()));
    }
}

// ── Reactive metric streams ──
//
// Pull-side counterpart to `MetricSink`: a subscription to the full,
// atomically published entry set of one device.

use std::sync::Arc;

use tokio::sync::watch;

use crate::registry::MetricEntry;

/// Every entry of one device, as published after a poll cycle.
pub type MetricSnapshot = Arc<Vec<Arc<MetricEntry>>>;

/// A subscription to a device's metric entries.
///
/// Provides point-in-time snapshot access and change notification via
/// [`changed()`](Self::changed).
pub struct MetricStream {
    current: MetricSnapshot,
    receiver: watch::Receiver<MetricSnapshot>,
}

impl MetricStream {
    pub(crate) fn new(receiver: watch::Receiver<MetricSnapshot>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Get the snapshot captured at creation time (or at the last
    /// `changed()`).
    pub fn current(&self) -> &MetricSnapshot {
        &self.current
    }

    /// Wait for the next published cycle, returning the new snapshot.
    /// Returns `None` once the coordinator has been dropped.
    pub async fn changed(&mut self) -> Option<MetricSnapshot> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }
}

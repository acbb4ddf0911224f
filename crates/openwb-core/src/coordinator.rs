// ── Poll coordinator ──
//
// Per-device driver of the fetch, coerce, reconcile, publish cycle.
// Owns the device's key registry, its availability state, and the single
// background task that polls on a fixed period.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::Utc;
use serde::Serialize;
use strum::Display;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use openwb_api::transport::{TlsMode, TransportConfig};
use openwb_api::{DeviceEndpoint, OpenWbClient, RawSnapshot};

use crate::config::CoordinatorConfig;
use crate::error::CoreError;
use crate::names::NameTable;
use crate::registry::{KeyRegistry, MetricEntry};
use crate::sink::{MetricBatch, MetricSink};
use crate::source::StatusSource;
use crate::stream::{MetricSnapshot, MetricStream};
use crate::value::{MetricValue, coerce};

// ── State ────────────────────────────────────────────────────────

/// Lifecycle state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PollState {
    Unstarted,
    /// A fetch is in flight.
    Polling,
    Available,
    Unavailable,
    /// Terminal.
    Stopped,
}

/// Device-wide availability, as of the most recent completed poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Availability {
    /// No poll has completed yet.
    Unknown,
    Available,
    Unavailable,
}

/// Result of a single [`PollCoordinator::poll_once`] call.
#[derive(Debug)]
pub enum PollOutcome {
    /// The snapshot was applied.
    Updated {
        /// Keys seen for the first time.
        created: Vec<String>,
        /// Number of entries whose value was written.
        updated: usize,
    },
    /// The fetch failed; entries were flagged unavailable.
    Failed {
        error: CoreError,
        /// `true` if this failure moved the device into Unavailable.
        became_unavailable: bool,
    },
    /// Another poll was already in flight.
    Skipped,
    /// The coordinator was stopped before the result could be applied.
    Discarded,
}

// ── PollCoordinator ──────────────────────────────────────────────

/// Polls one openWB device and maintains its metric entries.
///
/// Cheaply cloneable via `Arc`. The background task started by
/// [`start()`](Self::start) holds a clone; call [`stop()`](Self::stop) to
/// end it.
pub struct PollCoordinator<S: StatusSource = OpenWbClient> {
    inner: Arc<CoordinatorInner<S>>,
}

impl<S: StatusSource> Clone for PollCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct CoordinatorInner<S> {
    config: CoordinatorConfig,
    endpoint: DeviceEndpoint,
    source: S,
    source_url: String,
    sink: Arc<dyn MetricSink>,
    /// Mutated only inside one critical section per poll cycle.
    registry: Mutex<KeyRegistry>,
    state: watch::Sender<PollState>,
    availability: watch::Sender<Availability>,
    metrics: watch::Sender<MetricSnapshot>,
    device_name: ArcSwap<String>,
    in_flight: AtomicBool,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PollCoordinator<OpenWbClient> {
    /// Validate `config` and build a coordinator polling the device over
    /// HTTP. Does NOT start polling: call [`start()`](Self::start).
    pub fn new(
        config: CoordinatorConfig,
        names: Arc<NameTable>,
        sink: Arc<dyn MetricSink>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let endpoint = DeviceEndpoint::parse(&config.host, config.name.as_deref())?;
        let transport = TransportConfig {
            tls: if config.insecure {
                TlsMode::DangerAcceptInvalid
            } else {
                TlsMode::System
            },
            timeout: config.timeout,
        };
        let client = OpenWbClient::new(endpoint, &transport)?;
        Self::with_source(config, client, names, sink)
    }
}

impl<S: StatusSource> PollCoordinator<S> {
    /// Build a coordinator over an arbitrary status source.
    pub fn with_source(
        config: CoordinatorConfig,
        source: S,
        names: Arc<NameTable>,
        sink: Arc<dyn MetricSink>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let endpoint = DeviceEndpoint::parse(&config.host, config.name.as_deref())?;
        let device_name = endpoint
            .label()
            .map_or_else(|| endpoint.fallback_name(), String::from);
        let registry = KeyRegistry::new(names, config.language);
        let (state, _) = watch::channel(PollState::Unstarted);
        let (availability, _) = watch::channel(Availability::Unknown);
        let (metrics, _) = watch::channel(Arc::new(Vec::new()));
        let source_url = source.describe();

        Ok(Self {
            inner: Arc::new(CoordinatorInner {
                config,
                endpoint,
                source,
                source_url,
                sink,
                registry: Mutex::new(registry),
                state,
                availability,
                metrics,
                device_name: ArcSwap::from_pointee(device_name),
                in_flight: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                task: Mutex::new(None),
            }),
        })
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    pub fn endpoint(&self) -> &DeviceEndpoint {
        &self.inner.endpoint
    }

    /// Display name: the configured label, else the device's
    /// `systemName` once seen, else `openWB {host}`.
    pub fn device_name(&self) -> Arc<String> {
        self.inner.device_name.load_full()
    }

    pub fn state(&self) -> PollState {
        *self.inner.state.borrow()
    }

    pub fn availability(&self) -> Availability {
        *self.inner.availability.borrow()
    }

    pub fn is_available(&self) -> bool {
        self.availability() == Availability::Available
    }

    /// Every known entry as of the last completed poll.
    pub fn entries(&self) -> MetricSnapshot {
        self.inner.metrics.borrow().clone()
    }

    /// Look up one entry as of the last completed poll.
    pub fn entry(&self, key: &str) -> Option<Arc<MetricEntry>> {
        self.inner
            .metrics
            .borrow()
            .iter()
            .find(|e| e.key == key)
            .cloned()
    }

    /// Subscribe to the published entry set.
    pub fn metrics(&self) -> MetricStream {
        MetricStream::new(self.inner.metrics.subscribe())
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn the periodic poll task. The first poll runs immediately.
    /// Calling `start` on a running coordinator is a no-op.
    pub async fn start(&self) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::Stopped);
        }
        let mut task = self.inner.task.lock().await;
        if task.is_some() {
            return Ok(());
        }

        info!(
            device = %self.device_name(),
            url = %self.inner.source_url,
            interval_secs = self.inner.config.interval.as_secs_f64(),
            "starting poller"
        );
        *task = Some(tokio::spawn(poll_task(
            self.clone(),
            self.inner.config.interval,
            self.inner.cancel.clone(),
        )));
        Ok(())
    }

    /// Stop polling. Safe to call at any time, including mid-fetch: an
    /// in-flight fetch completes but its result is discarded. Waits for the
    /// poll task to exit.
    pub async fn stop(&self) {
        self.inner.cancel.cancel();
        self.inner.state.send_replace(PollState::Stopped);

        let handle = self.inner.task.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(device = %self.device_name(), error = %e, "poll task ended abnormally");
            }
        }
        info!(device = %self.device_name(), "poller stopped");
    }

    // ── Poll cycle ───────────────────────────────────────────────

    /// Run one fetch, coerce, reconcile, publish cycle.
    ///
    /// Never fails: fetch errors degrade the device to Unavailable and are
    /// reported through [`PollOutcome::Failed`].
    pub async fn poll_once(&self) -> PollOutcome {
        let inner = &self.inner;
        if inner.cancel.is_cancelled() {
            return PollOutcome::Discarded;
        }
        let Some(_guard) = InFlightGuard::acquire(&inner.in_flight) else {
            debug!(device = %self.device_name(), "poll already in flight, skipping tick");
            return PollOutcome::Skipped;
        };

        self.set_state(PollState::Polling);
        let result = match tokio::time::timeout(inner.config.timeout, inner.source.fetch()).await
        {
            Ok(fetched) => fetched.map_err(|e| CoreError::from_api(e, &inner.source_url)),
            Err(_elapsed) => Err(CoreError::Timeout {
                timeout_secs: inner.config.timeout.as_secs(),
            }),
        };

        if inner.cancel.is_cancelled() {
            debug!(device = %self.device_name(), "coordinator stopped mid-fetch, discarding result");
            return PollOutcome::Discarded;
        }

        match result {
            Ok(snapshot) => self.apply_success(&snapshot).await,
            Err(error) => self.apply_failure(error).await,
        }
    }

    async fn apply_success(&self, snapshot: &RawSnapshot) -> PollOutcome {
        let inner = &self.inner;
        let coerced: Vec<(String, MetricValue)> = snapshot
            .iter()
            .map(|(key, raw)| (key.clone(), coerce(raw)))
            .collect();

        if inner.endpoint.label().is_none() {
            if let Some(system_name) = snapshot.system_name() {
                if inner.device_name.load().as_str() != system_name {
                    inner.device_name.store(Arc::new(system_name.to_owned()));
                }
            }
        }

        let (created, updated, previous) = {
            let mut registry = inner.registry.lock().await;
            if inner.cancel.is_cancelled() {
                return PollOutcome::Discarded;
            }
            let created: Vec<String> = registry
                .reconcile(snapshot)
                .into_iter()
                .filter(|r| r.created)
                .map(|r| r.key)
                .collect();
            let updated = registry.apply(coerced, Utc::now());
            let previous = inner.availability.send_replace(Availability::Available);
            inner.metrics.send_replace(Arc::new(registry.snapshot()));
            (created, updated, previous)
        };
        self.set_state(PollState::Available);

        let device = self.device_name();
        if previous == Availability::Unavailable {
            info!(device = %device, "openWB reachable again");
        }
        if !created.is_empty() {
            info!(device = %device, count = created.len(), keys = ?created, "discovered new keys");
        }
        trace!(device = %device, updated = updated.len(), "snapshot applied");

        let updated_count = updated.len();
        inner.sink.publish(&MetricBatch {
            device: device.to_string(),
            available: true,
            created: created.clone(),
            entries: updated,
        });

        PollOutcome::Updated {
            created,
            updated: updated_count,
        }
    }

    async fn apply_failure(&self, error: CoreError) -> PollOutcome {
        let inner = &self.inner;
        let (became_unavailable, entries) = {
            let mut registry = inner.registry.lock().await;
            if inner.cancel.is_cancelled() {
                return PollOutcome::Discarded;
            }
            let previous = inner.availability.send_replace(Availability::Unavailable);
            let became_unavailable = previous != Availability::Unavailable;
            let mut entries = Vec::new();
            if became_unavailable {
                registry.mark_unavailable();
                entries = registry.snapshot();
                inner.metrics.send_replace(Arc::new(entries.clone()));
            }
            (became_unavailable, entries)
        };
        self.set_state(PollState::Unavailable);

        let device = self.device_name();
        if became_unavailable {
            warn!(
                device = %device,
                url = %inner.source_url,
                error = %error,
                "openWB unavailable, keeping last known values"
            );
            inner.sink.publish(&MetricBatch {
                device: device.to_string(),
                available: false,
                created: Vec::new(),
                entries,
            });
        } else {
            debug!(device = %device, error = %error, "openWB still unavailable");
        }

        PollOutcome::Failed {
            error,
            became_unavailable,
        }
    }

    /// `Stopped` is terminal: later transitions are ignored.
    fn set_state(&self, next: PollState) {
        self.inner.state.send_if_modified(|state| {
            if *state == PollState::Stopped || *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
    }
}

// ── In-flight guard ──────────────────────────────────────────────

/// Holds the per-device "fetch in flight" flag; released on drop.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ── Background task ──────────────────────────────────────────────

/// Fixed-period poller. Ticks that fire while a poll is still running are
/// skipped, not queued.
async fn poll_task<S: StatusSource>(
    coordinator: PollCoordinator<S>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let outcome = coordinator.poll_once().await;
                trace!(device = %coordinator.device_name(), ?outcome, "poll tick");
            }
        }
    }
    debug!(device = %coordinator.device_name(), "poll task exiting");
}

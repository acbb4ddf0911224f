// openwb-core: Polling, type coercion and metric registry between openwb-api and consumers.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod metadata;
pub mod names;
pub mod registry;
pub mod sink;
pub mod source;
pub mod stream;
pub mod value;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{CoordinatorConfig, DEFAULT_INTERVAL, DEFAULT_TIMEOUT};
pub use coordinator::{Availability, PollCoordinator, PollOutcome, PollState};
pub use error::CoreError;
pub use metadata::{DeviceClass, SensorMeta, StateClass, Unit};
pub use names::{Language, NameTable, derive_name};
pub use registry::{KeyRegistry, MetricEntry, Reconciled};
pub use sink::{BroadcastSink, MetricBatch, MetricSink, NullSink};
pub use source::StatusSource;
pub use stream::{MetricSnapshot, MetricStream};
pub use value::{MetricValue, ValueKind, coerce};

pub use openwb_api::{DeviceEndpoint, OpenWbClient, RawSnapshot};

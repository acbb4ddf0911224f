// openwb-api: Async Rust client for the openWB wallbox status API

pub mod client;
pub mod endpoint;
pub mod error;
pub mod snapshot;
pub mod transport;

pub use client::OpenWbClient;
pub use endpoint::{API_PATH, DeviceEndpoint};
pub use error::{Error, FailureKind};
pub use snapshot::RawSnapshot;
pub use transport::{TlsMode, TransportConfig};

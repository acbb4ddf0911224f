// Shared transport configuration for building reqwest::Client instances.

use std::time::Duration;

/// Default per-request timeout. Must stay below the poll interval.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// TLS verification mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Accept any certificate (wallboxes behind self-signed reverse proxies).
    DangerAcceptInvalid,
}

/// Transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("openwb-poller/", env!("CARGO_PKG_VERSION")));

        if self.tls == TlsMode::DangerAcceptInvalid {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
            .build()
            .map_err(|e| crate::error::Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

// ── Runtime polling configuration ──
//
// These types describe *what* to poll and how often. They never touch
// disk: the CLI (via openwb-config) builds a `CoordinatorConfig` and hands
// it in.

use std::time::Duration;

use crate::error::CoreError;
use crate::names::Language;

/// Default poll period.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Default fetch timeout; must stay below the poll period.
pub const DEFAULT_TIMEOUT: Duration = openwb_api::transport::DEFAULT_TIMEOUT;

/// Configuration for polling a single device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Bare host or URL (e.g. `192.168.1.168`, `https://wallbox.local`).
    pub host: String,
    /// Display label; falls back to the device's `systemName`.
    pub name: Option<String>,
    /// Poll period.
    pub interval: Duration,
    /// Per-fetch timeout.
    pub timeout: Duration,
    /// Language for friendly names.
    pub language: Language,
    /// Accept invalid TLS certificates.
    pub insecure: bool,
}

impl CoordinatorConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Check the invariants polling relies on.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.host.trim().is_empty() {
            return Err(CoreError::Config {
                message: "host must not be empty".into(),
            });
        }
        if self.interval.is_zero() {
            return Err(CoreError::Config {
                message: "poll interval must be greater than zero".into(),
            });
        }
        if self.timeout.is_zero() || self.timeout >= self.interval {
            return Err(CoreError::Config {
                message: format!(
                    "timeout ({}s) must be non-zero and shorter than the poll interval ({}s)",
                    self.timeout.as_secs_f64(),
                    self.interval.as_secs_f64()
                ),
            });
        }
        Ok(())
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            name: None,
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            language: Language::default(),
            insecure: false,
        }
    }
}

// ── Core error types ──
//
// Domain-level errors from openwb-core. Consumers never match on HTTP
// details; the `From<openwb_api::Error>` impl folds transport-layer
// errors into the two failure kinds the poller distinguishes.

use thiserror::Error;

use openwb_api::FailureKind;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Fetch failures (device unreachable this cycle) ──────────────
    #[error("Cannot reach openWB at {url}: {reason}")]
    Connectivity { url: String, reason: String },

    #[error("openWB at {url} returned an unusable response: {reason}")]
    MalformedResponse { url: String, reason: String },

    #[error("openWB status request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("Poller has been stopped")]
    Stopped,
}

impl CoreError {
    /// `true` for every error that only means "device unreachable this
    /// cycle", as opposed to a setup problem.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::Connectivity { .. } | Self::MalformedResponse { .. } | Self::Timeout { .. }
        )
    }

    pub(crate) fn from_api(err: openwb_api::Error, url: &str) -> Self {
        if let openwb_api::Error::Timeout { timeout_secs } = err {
            return Self::Timeout { timeout_secs };
        }
        let reason = err.to_string();
        match err.kind() {
            FailureKind::Connectivity => Self::Connectivity {
                url: url.to_owned(),
                reason,
            },
            FailureKind::MalformedResponse => Self::MalformedResponse {
                url: url.to_owned(),
                reason,
            },
            FailureKind::Configuration => Self::Config { message: reason },
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<openwb_api::Error> for CoreError {
    fn from(err: openwb_api::Error) -> Self {
        let url = match &err {
            openwb_api::Error::Transport(e) => e.url().map(ToString::to_string),
            _ => None,
        };
        Self::from_api(err, url.as_deref().unwrap_or("<unknown>"))
    }
}

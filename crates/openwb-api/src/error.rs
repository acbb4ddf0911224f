use thiserror::Error;

/// Top-level error type for the `openwb-api` crate.
///
/// Every failure of a status request lands here. Callers that only care
/// whether the device was reachable use [`Error::kind`].
#[derive(Debug, Error)]
pub enum Error {
    // ── Endpoint ────────────────────────────────────────────────────
    /// The configured host could not be turned into a usable base URL.
    #[error("Invalid host '{host}': {reason}")]
    InvalidHost { host: String, reason: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Response ────────────────────────────────────────────────────
    /// The device answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Valid JSON, but not the flat object the status API returns.
    #[error("Unexpected payload: expected a JSON object, got {found}")]
    UnexpectedPayload { found: &'static str },
}

/// Coarse classification of a failed status request.
///
/// Both kinds mean "device unreachable this cycle" to the poller; the
/// distinction only matters for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network unreachable, refused, timed out.
    Connectivity,
    /// The device answered, but not with a usable payload.
    MalformedResponse,
    /// The request could not even be built.
    Configuration,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidHost { .. } | Self::InvalidUrl(_) | Self::Tls(_) => {
                FailureKind::Configuration
            }
            Self::Transport(e) if e.is_status() || e.is_decode() => FailureKind::MalformedResponse,
            Self::Transport(_) | Self::Timeout { .. } => FailureKind::Connectivity,
            Self::Status { .. } | Self::Deserialization { .. } | Self::UnexpectedPayload { .. } => {
                FailureKind::MalformedResponse
            }
        }
    }
}

//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use openwb_config::ConfigError;
use openwb_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach openWB at {url}")]
    #[diagnostic(
        code(openwb::connection_failed),
        help(
            "Check that the wallbox is powered and reachable from this machine.\n\
             Cause: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("openWB at {url} returned an unusable response")]
    #[diagnostic(
        code(openwb::malformed_response),
        help(
            "The status endpoint did not return a JSON object. Is this an openWB?\n\
             Cause: {reason}"
        )
    )]
    MalformedResponse { url: String, reason: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(openwb::timeout),
        help("Increase the timeout with --timeout or check the wallbox's network link.")
    )]
    Timeout { seconds: u64 },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(openwb::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Device '{name}' not found in configuration")]
    #[diagnostic(
        code(openwb::device_not_found),
        help(
            "Available devices: {available}\n\
             Add one with: openwb config add-device <NAME> --host <HOST>"
        )
    )]
    DeviceNotFound { name: String, available: String },

    #[error("No devices configured")]
    #[diagnostic(
        code(openwb::no_devices),
        help(
            "Pass --host, or add a device with: openwb config add-device <NAME> --host <HOST>\n\
             Expected config at: {path}"
        )
    )]
    NoDevices { path: String },

    #[error("Several devices configured; choose one")]
    #[diagnostic(
        code(openwb::ambiguous_device),
        help("Pass --device with one of: {available}")
    )]
    AmbiguousDevice { available: String },

    #[error(transparent)]
    #[diagnostic(code(openwb::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to encode output: {0}")]
    #[diagnostic(code(openwb::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to encode configuration: {0}")]
    #[diagnostic(code(openwb::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::AmbiguousDevice { .. } => exit_code::USAGE,
            Self::DeviceNotFound { .. } | Self::NoDevices { .. } | Self::Config(_) => {
                exit_code::CONFIG
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Connectivity { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::MalformedResponse { url, reason } => Self::MalformedResponse { url, reason },
            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            CoreError::Config { message } => Self::Validation {
                field: "device".into(),
                reason: message,
            },
            CoreError::Stopped => Self::Validation {
                field: "poller".into(),
                reason: "already stopped".into(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

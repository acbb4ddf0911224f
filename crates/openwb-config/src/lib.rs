//! Shared configuration for openWB tools.
//!
//! TOML device profiles layered with `OPENWB_*` environment overrides, and
//! translation to `openwb_core::CoordinatorConfig`. The CLI adds
//! flag-aware wrappers on top.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use openwb_core::{CoordinatorConfig, Language, NameTable};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no device named '{name}' in the config file")]
    UnknownDevice { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Global defaults, overridable per device.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named devices.
    #[serde(default)]
    pub devices: BTreeMap<String, DeviceProfile>,

    /// Friendly-name overrides, keyed by language code then status key.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub names: HashMap<String, HashMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub language: Language,

    #[serde(default)]
    pub insecure: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            timeout_secs: default_timeout(),
            language: Language::default(),
            insecure: false,
        }
    }
}

fn default_interval() -> u64 {
    openwb_core::DEFAULT_INTERVAL.as_secs()
}
fn default_timeout() -> u64 {
    openwb_core::DEFAULT_TIMEOUT.as_secs()
}

/// A named device.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceProfile {
    /// Host or base URL (e.g. "192.168.1.168").
    pub host: String,

    /// Display label. Falls back to the device's `systemName`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,
}

impl DeviceProfile {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            name: None,
            interval_secs: None,
            timeout_secs: None,
            language: None,
            insecure: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "openwb", "openwb").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("openwb");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` (missing file is fine) layered with `OPENWB_*`
/// variables, `__` separating nested keys
/// (`OPENWB_DEFAULTS__INTERVAL_SECS=15`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("OPENWB_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation to core config ──────────────────────────────────────

/// Build a `CoordinatorConfig` for the named device, applying defaults
/// for anything the profile leaves unset.
pub fn device_to_coordinator_config(
    cfg: &Config,
    device: &str,
) -> Result<CoordinatorConfig, ConfigError> {
    validated(resolve_device(cfg, device)?, &format!("devices.{device}"))
}

/// Build a `CoordinatorConfig` for an ad-hoc host using the defaults.
pub fn host_to_coordinator_config(
    cfg: &Config,
    host: &str,
) -> Result<CoordinatorConfig, ConfigError> {
    validated(resolve_host(cfg, host), "host")
}

/// Like [`device_to_coordinator_config`] but without validation, for
/// callers that layer further overrides first.
pub fn resolve_device(cfg: &Config, device: &str) -> Result<CoordinatorConfig, ConfigError> {
    let profile = cfg
        .devices
        .get(device)
        .ok_or_else(|| ConfigError::UnknownDevice {
            name: device.into(),
        })?;

    let defaults = &cfg.defaults;
    Ok(CoordinatorConfig {
        host: profile.host.clone(),
        name: profile.name.clone(),
        interval: Duration::from_secs(profile.interval_secs.unwrap_or(defaults.interval_secs)),
        timeout: Duration::from_secs(profile.timeout_secs.unwrap_or(defaults.timeout_secs)),
        language: profile.language.unwrap_or(defaults.language),
        insecure: profile.insecure.unwrap_or(defaults.insecure),
    })
}

/// Like [`host_to_coordinator_config`] but without validation.
pub fn resolve_host(cfg: &Config, host: &str) -> CoordinatorConfig {
    let defaults = &cfg.defaults;
    CoordinatorConfig {
        host: host.into(),
        name: None,
        interval: Duration::from_secs(defaults.interval_secs),
        timeout: Duration::from_secs(defaults.timeout_secs),
        language: defaults.language,
        insecure: defaults.insecure,
    }
}

fn validated(coordinator: CoordinatorConfig, field: &str) -> Result<CoordinatorConfig, ConfigError> {
    coordinator
        .validate()
        .map_err(|e| ConfigError::Validation {
            field: field.into(),
            reason: e.to_string(),
        })?;
    Ok(coordinator)
}

/// The built-in name table with the config's `[names.*]` overrides
/// applied.
pub fn name_table(cfg: &Config) -> Result<NameTable, ConfigError> {
    for code in cfg.names.keys() {
        code.parse::<Language>()
            .map_err(|_| ConfigError::Validation {
                field: format!("names.{code}"),
                reason: "unsupported language (expected 'en' or 'de')".into(),
            })?;
    }
    let mut table = NameTable::builtin();
    table.extend_sections(cfg.names.clone());
    Ok(table)
}

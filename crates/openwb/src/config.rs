//! CLI-specific configuration wrappers.
//!
//! Loads the shared `openwb-config` file and layers `GlobalOpts` flag
//! overrides on top.

use std::path::PathBuf;
use std::time::Duration;

use openwb_config::{Config, load_config_from, resolve_device, resolve_host};
use openwb_core::{CoordinatorConfig, NameTable};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// `--config`, else the platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(openwb_config::config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config_from(&config_path(global))?)
}

pub fn name_table(cfg: &Config) -> Result<NameTable, CliError> {
    Ok(openwb_config::name_table(cfg)?)
}

/// What to poll: an ad-hoc host or a configured device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Host(String),
    Device(String),
}

/// Resolve targets into validated coordinator configs. No targets means
/// every configured device.
pub fn resolve_targets(
    cfg: &Config,
    global: &GlobalOpts,
    targets: Vec<Target>,
) -> Result<Vec<CoordinatorConfig>, CliError> {
    let targets = if targets.is_empty() {
        if cfg.devices.is_empty() {
            return Err(CliError::NoDevices {
                path: config_path(global).display().to_string(),
            });
        }
        cfg.devices.keys().cloned().map(Target::Device).collect()
    } else {
        targets
    };

    targets
        .into_iter()
        .map(|target| resolve_target(cfg, global, &target))
        .collect()
}

/// Resolve the single device `fetch` should poll.
pub fn resolve_single(
    cfg: &Config,
    global: &GlobalOpts,
    target: Option<Target>,
) -> Result<CoordinatorConfig, CliError> {
    let target = match target {
        Some(target) => target,
        None => {
            let mut names = cfg.devices.keys();
            match (names.next(), names.next()) {
                (Some(only), None) => Target::Device(only.clone()),
                (None, _) => {
                    return Err(CliError::NoDevices {
                        path: config_path(global).display().to_string(),
                    });
                }
                (Some(_), Some(_)) => {
                    return Err(CliError::AmbiguousDevice {
                        available: available_devices(cfg),
                    });
                }
            }
        }
    };
    resolve_target(cfg, global, &target)
}

fn resolve_target(
    cfg: &Config,
    global: &GlobalOpts,
    target: &Target,
) -> Result<CoordinatorConfig, CliError> {
    let base = match target {
        Target::Host(host) => resolve_host(cfg, host),
        Target::Device(name) => {
            resolve_device(cfg, name).map_err(|_| CliError::DeviceNotFound {
                name: name.clone(),
                available: available_devices(cfg),
            })?
        }
    };
    with_overrides(base, global)
}

/// Apply `--timeout`, `--interval`, `--language` and `--insecure`.
pub fn with_overrides(
    mut config: CoordinatorConfig,
    global: &GlobalOpts,
) -> Result<CoordinatorConfig, CliError> {
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = global.interval {
        config.interval = Duration::from_secs(secs);
    }
    if let Some(language) = global.language {
        config.language = language;
    }
    if global.insecure {
        config.insecure = true;
    }
    config.validate().map_err(|e| CliError::Validation {
        field: "poll settings".into(),
        reason: e.to_string(),
    })?;
    Ok(config)
}

fn available_devices(cfg: &Config) -> String {
    if cfg.devices.is_empty() {
        "(none)".into()
    } else {
        cfg.devices.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

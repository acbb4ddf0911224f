//! Config subcommand handlers.

use openwb_config::{DeviceProfile, save_config_to};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path(global).display().to_string(), false);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let rendered = match global.output {
                OutputFormat::Json => output::render_json(&cfg, false)?,
                OutputFormat::JsonCompact => output::render_json(&cfg, true)?,
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&cfg)?,
            };
            output::print_output(rendered.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::AddDevice {
            name,
            host,
            label,
            interval_secs,
            timeout_secs,
        } => {
            let path = config::config_path(global);
            let mut cfg = config::load(global)?;
            let profile = DeviceProfile {
                name: label,
                interval_secs,
                timeout_secs,
                ..DeviceProfile::new(host)
            };
            let replaced = cfg.devices.insert(name.clone(), profile).is_some();
            // Reject before writing anything.
            openwb_config::device_to_coordinator_config(&cfg, &name)?;
            save_config_to(&cfg, &path)?;

            let verb = if replaced { "Updated" } else { "Added" };
            if !global.quiet {
                eprintln!("{verb} device '{name}' in {}", path.display());
            }
            Ok(())
        }
    }
}

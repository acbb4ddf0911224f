//! Clap derive structures for the `openwb` CLI.

use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};

use openwb_core::Language;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// openwb -- poll openWB wallboxes from the command line
#[derive(Debug, Parser)]
#[command(
    name = "openwb",
    version,
    about = "Poll openWB wallbox status from the command line",
    long_about = "Reads the flat status document of one or more openWB wallboxes,\n\
        infers value types and prints friendly-named metrics.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "OPENWB_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Language for metric names (en, de)
    #[arg(long, short = 'l', global = true)]
    pub language: Option<Language>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Poll interval in seconds
    #[arg(long, global = true)]
    pub interval: Option<u64>,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain `key=value` lines (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll a device once and print every metric
    #[command(alias = "get")]
    Fetch(FetchArgs),

    /// Poll devices periodically and print each update
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

// ── Fetch / Watch ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Device host or URL (bypasses the config file's devices)
    #[arg(long, short = 'H', conflicts_with = "device")]
    pub host: Option<String>,

    /// Configured device name
    #[arg(long, short = 'd')]
    pub device: Option<String>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Device host or URL (repeatable)
    #[arg(long, short = 'H')]
    pub host: Vec<String>,

    /// Configured device name (repeatable; default: every configured device)
    #[arg(long, short = 'd')]
    pub device: Vec<String>,

    /// Exit after this many updates (at least 1)
    #[arg(long, short = 'n', value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub count: Option<usize>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Print the effective configuration (file + environment)
    Show,

    /// Add or replace a device in the config file
    AddDevice {
        /// Name to refer to the device by
        name: String,

        /// Host or base URL
        #[arg(long, short = 'H')]
        host: String,

        /// Display label
        #[arg(long)]
        label: Option<String>,

        /// Poll interval override in seconds
        #[arg(long = "device-interval")]
        interval_secs: Option<u64>,

        /// Timeout override in seconds
        #[arg(long = "device-timeout")]
        timeout_secs: Option<u64>,
    },
}

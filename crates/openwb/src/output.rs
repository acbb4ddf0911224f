//! Output formatting: table, JSON, plain.
//!
//! Renders metric entries in the format selected by `--output`. Table uses
//! `tabled`, structured formats use serde, plain emits `key=value` lines.

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use openwb_core::{MetricEntry, MetricValue};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Rows ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Type")]
    kind: String,
}

impl MetricRow {
    fn from_entry(entry: &MetricEntry) -> Self {
        Self {
            key: entry.key.clone(),
            name: entry.name.clone(),
            value: display_value(entry),
            unit: entry.meta.unit.map(|u| u.to_string()).unwrap_or_default(),
            kind: entry.kind().map(|k| k.to_string()).unwrap_or_default(),
        }
    }
}

/// Presented value, or `-` before the first successful poll.
pub fn display_value(entry: &MetricEntry) -> String {
    entry
        .native_value()
        .as_ref()
        .map_or_else(|| "-".into(), MetricValue::to_string)
}

/// One device's metrics as serialized for `json` output.
#[derive(Debug, Serialize)]
pub struct DeviceReport<'a> {
    pub device: &'a str,
    pub url: &'a str,
    pub available: bool,
    pub metrics: Vec<MetricView<'a>>,
}

/// An entry with both its coerced and presented value.
#[derive(Debug, Serialize)]
pub struct MetricView<'a> {
    #[serde(flatten)]
    pub entry: &'a MetricEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<MetricValue>,
}

impl<'a> MetricView<'a> {
    pub fn new(entry: &'a MetricEntry) -> Self {
        let display = entry.native_value().filter(|v| Some(v) != entry.value.as_ref());
        Self { entry, display }
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render one device's entries in the chosen format.
pub fn render_device(
    format: OutputFormat,
    report: &DeviceReport<'_>,
    entries: &[Arc<MetricEntry>],
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(entries_table(entries)),
        OutputFormat::Json => render_json(report, false),
        OutputFormat::JsonCompact => render_json(report, true),
        OutputFormat::Plain => Ok(entries
            .iter()
            .map(|e| plain_line(e))
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

pub fn entries_table(entries: &[Arc<MetricEntry>]) -> String {
    let rows: Vec<MetricRow> = entries.iter().map(|e| MetricRow::from_entry(e)).collect();
    render_table(&rows)
}

/// `key=value` with the presented value.
pub fn plain_line(entry: &MetricEntry) -> String {
    format!("{}={}", entry.key, display_value(entry))
}

/// Colored availability marker.
pub fn availability_label(available: bool, color: bool) -> String {
    match (available, color) {
        (true, true) => "available".green().to_string(),
        (false, true) => "unavailable".red().bold().to_string(),
        (true, false) => "available".into(),
        (false, false) => "unavailable".into(),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(rendered)
}

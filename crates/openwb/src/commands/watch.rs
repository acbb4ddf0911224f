//! `openwb watch`: periodic polling until Ctrl-C.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Local;
use owo_colors::OwoColorize;
use tokio::sync::Notify;
use tracing::info;

use openwb_core::{MetricBatch, MetricSink, PollCoordinator};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config::{self, Target};
use crate::error::CliError;
use crate::output;

// ── Console sink ─────────────────────────────────────────────────────

/// Prints every batch to stdout as it arrives.
struct ConsoleSink {
    format: OutputFormat,
    color: bool,
    quiet: bool,
    remaining: Option<AtomicUsize>,
    done: Notify,
}

impl ConsoleSink {
    fn new(global: &GlobalOpts, count: Option<usize>) -> Self {
        Self {
            format: global.output,
            color: output::should_color(global.color),
            quiet: global.quiet,
            remaining: count.map(AtomicUsize::new),
            done: Notify::new(),
        }
    }

    /// Resolves once `--count` batches were printed; never without it.
    async fn finished(&self) {
        if self.remaining.is_none() {
            std::future::pending::<()>().await;
        }
        self.done.notified().await;
    }

    fn render(&self, batch: &MetricBatch) -> Result<String, CliError> {
        match self.format {
            OutputFormat::Json => output::render_json(batch, false),
            OutputFormat::JsonCompact => output::render_json(batch, true),
            OutputFormat::Plain => {
                if !batch.available {
                    return Ok(format!("{} unavailable", batch.device));
                }
                Ok(batch
                    .entries
                    .iter()
                    .map(|e| format!("{} {}", batch.device, output::plain_line(e)))
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            OutputFormat::Table => {
                let device = if self.color {
                    batch.device.bold().to_string()
                } else {
                    batch.device.clone()
                };
                let discovered = if batch.created.is_empty() {
                    String::new()
                } else {
                    format!(" (+{} new)", batch.created.len())
                };
                let header = format!(
                    "{} {device} {}{discovered}",
                    Local::now().format("%H:%M:%S"),
                    output::availability_label(batch.available, self.color),
                );
                if batch.entries.is_empty() || !batch.available {
                    return Ok(header);
                }
                Ok(format!("{header}\n{}", output::entries_table(&batch.entries)))
            }
        }
    }
}

impl MetricSink for ConsoleSink {
    fn publish(&self, batch: &MetricBatch) {
        if !self.quiet {
            match self.render(batch) {
                Ok(rendered) => output::print_output(&rendered, false),
                Err(e) => tracing::warn!(error = %e, "failed to render update"),
            }
        }
        if let Some(remaining) = &self.remaining {
            let previous =
                remaining.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            if previous == Ok(1) {
                self.done.notify_one();
            }
        }
    }
}

// ── Handler ──────────────────────────────────────────────────────────

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let targets: Vec<Target> = args
        .host
        .into_iter()
        .map(Target::Host)
        .chain(args.device.into_iter().map(Target::Device))
        .collect();
    let configs = config::resolve_targets(&cfg, global, targets)?;
    let names = Arc::new(config::name_table(&cfg)?);

    let console = Arc::new(ConsoleSink::new(global, args.count));
    let sink: Arc<dyn MetricSink> = console.clone();
    let coordinators = configs
        .into_iter()
        .map(|c| PollCoordinator::new(c, Arc::clone(&names), Arc::clone(&sink)))
        .collect::<Result<Vec<_>, _>>()?;

    for coordinator in &coordinators {
        coordinator.start().await?;
    }
    info!(devices = coordinators.len(), "watching, press Ctrl-C to stop");

    let signal = tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        () = console.finished() => Ok(()),
    };

    for coordinator in &coordinators {
        coordinator.stop().await;
    }
    signal?;
    Ok(())
}

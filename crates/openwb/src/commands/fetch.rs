//! `openwb fetch`: one poll, every metric.

use std::sync::Arc;

use tracing::debug;

use openwb_core::{CoreError, NullSink, PollCoordinator, PollOutcome};

use crate::cli::{FetchArgs, GlobalOpts};
use crate::config::{self, Target};
use crate::error::CliError;
use crate::output::{self, DeviceReport, MetricView};

pub async fn handle(args: FetchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let target = args
        .host
        .map(Target::Host)
        .or_else(|| args.device.map(Target::Device));
    let coordinator_config = config::resolve_single(&cfg, global, target)?;
    let names = Arc::new(config::name_table(&cfg)?);

    let coordinator = PollCoordinator::new(coordinator_config, names, Arc::new(NullSink))?;
    debug!(url = %coordinator.endpoint(), "fetching status");

    match coordinator.poll_once().await {
        PollOutcome::Updated { .. } => {}
        PollOutcome::Failed { error, .. } => return Err(error.into()),
        PollOutcome::Skipped | PollOutcome::Discarded => return Err(CoreError::Stopped.into()),
    }

    let entries = coordinator.entries();
    let device = coordinator.device_name();
    let url = coordinator.endpoint().base().to_owned();
    let report = DeviceReport {
        device: &device,
        url: &url,
        available: coordinator.is_available(),
        metrics: entries.iter().map(|e| MetricView::new(e)).collect(),
    };

    let rendered = output::render_device(global.output, &report, &entries)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

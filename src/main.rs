mod collector;
mod config;
mod error;
mod export;
mod inventory;
mod lldp;
mod topology;

#[cfg(test)]
mod test_utils;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::task;
use tracing::{error, info, warn};

use collector::LldpCollector;
use config::{Cli, CollectorArgs, Command, OutputArgs};
use error::Result;
use export::{graphml, layout};
use lldp::{LldpSnapshot, RawSnapshot};
use topology::TopologyBuilder;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = config::init_logging(&cli.log_level) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "lldp-topology failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Collect { collector, output } => {
            let raw = collect(&collector).await?;
            lldp::save_snapshot(&output, &raw)?;
        }
        Command::Plot { input, output } => {
            let raw = lldp::load_snapshot(&input)?;
            plot(&raw, &output).await?;
        }
        Command::Discover {
            collector,
            snapshot,
            output,
        } => {
            let raw = collect(&collector).await?;
            if let Some(path) = snapshot {
                lldp::save_snapshot(&path, &raw)?;
            }
            plot(&raw, &output).await?;
        }
        Command::Inspect { graphml } => inspect(&graphml)?,
    }
    Ok(())
}

async fn collect(args: &CollectorArgs) -> Result<RawSnapshot> {
    let config = args.to_config()?;
    if config.username.is_none() {
        warn!("No username configured (SW_ADMIN), polling without authentication");
    }

    let devices = inventory::load_inventory(&args.inventory)?;
    let collector = LldpCollector::new(config)?;
    let report = collector.collect(&devices).await;
    info!(collected_at = %report.collected_at, "Collection complete");

    let failed: Vec<&str> = report
        .failures()
        .map(|(device, _)| device.hostname.as_str())
        .collect();
    if !failed.is_empty() {
        warn!(count = failed.len(), devices = ?failed, "Some devices could not be polled");
    }

    Ok(report.into_snapshot())
}

/// Build the topology once, then write both exports from the shared snapshot.
async fn plot(raw: &RawSnapshot, args: &OutputArgs) -> Result<()> {
    let layout_config = args.layout_config()?;
    let filter = args.filter();
    if let Some(prefix) = filter.prefix() {
        info!(prefix, "Excluding devices by prefix");
    }

    let snapshot = LldpSnapshot::from_raw(raw);
    let topology = Arc::new(TopologyBuilder::from_snapshot(&snapshot, filter));

    let image = {
        let topology = topology.clone();
        let path = args.image.clone();
        task::spawn_blocking(move || layout::write_svg(&path, &topology, &layout_config))
    };
    let exchange = {
        let topology = topology.clone();
        let path = args.graphml.clone();
        task::spawn_blocking(move || graphml::write_file(&path, &topology))
    };

    let (image, exchange) = tokio::join!(image, exchange);
    image??;
    exchange??;
    Ok(())
}

/// Log a per-device summary of an exported GraphML file.
fn inspect(path: &Path) -> Result<()> {
    let topology = graphml::read_file(path)?;
    if topology.is_empty() {
        warn!(path = %path.display(), "GraphML contains no devices");
        return Ok(());
    }

    info!(
        devices = topology.device_count(),
        links = topology.link_count(),
        "Topology summary"
    );
    for device in topology.devices() {
        info!(device = %device.name, degree = topology.degree(&device.name), "Device");
    }

    for ((a, b), count) in topology.pair_link_counts() {
        if count > 1 {
            info!(a, b, links = count, "Parallel links");
        }
    }

    for link in topology.links().iter().filter(|link| link.is_self_link()) {
        warn!(device = %link.local.device, ports = %link.label(), "Self link");
    }
    Ok(())
}

//! Command line interface and logging setup.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::collector::CollectorConfig;
use crate::error::{Result, TopologyError};
use crate::export::layout::LayoutConfig;
use crate::topology::PrefixFilter;

#[derive(Debug, Parser)]
#[command(name = "lldp-topology")]
#[command(about = "Build a physical network topology graph from switch LLDP neighbor data")]
pub struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll every inventory device and save the raw LLDP snapshot
    Collect {
        #[command(flatten)]
        collector: CollectorArgs,

        /// Where to write the raw snapshot
        #[arg(long, default_value = "lldp_data.json")]
        output: PathBuf,
    },
    /// Build the topology from a saved snapshot and export it
    Plot {
        /// Raw snapshot produced by `collect`
        #[arg(long, default_value = "lldp_data.json")]
        input: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Collect and plot in a single run
    Discover {
        #[command(flatten)]
        collector: CollectorArgs,

        /// Also keep the raw snapshot
        #[arg(long)]
        snapshot: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Summarize a previously exported GraphML file
    Inspect {
        #[arg(long, default_value = "network_graph.graphml")]
        graphml: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
pub struct CollectorArgs {
    /// CSV inventory with hostname and switchip columns
    #[arg(long, default_value = "switches.csv")]
    pub inventory: PathBuf,

    #[arg(long, env = "SW_ADMIN")]
    pub username: Option<String>,

    #[arg(long, env = "SW_PASS", hide_env_values = true)]
    pub password: Option<String>,

    /// Maximum number of devices polled at once
    #[arg(long, default_value_t = 16)]
    pub concurrency: usize,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Verify device TLS certificates
    #[arg(long)]
    pub verify_tls: bool,
}

#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Drop devices whose name starts with this prefix, and their links. Empty disables.
    #[arg(long)]
    pub exclude_prefix: Option<String>,

    /// SVG image path
    #[arg(long, default_value = "network_graph.svg")]
    pub image: PathBuf,

    /// GraphML exchange file path
    #[arg(long, default_value = "network_graph.graphml")]
    pub graphml: PathBuf,

    /// Layout random seed
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Spring constant (optimal node distance)
    #[arg(long, default_value_t = 0.3)]
    pub spring_k: f64,

    /// Canvas width and height in pixels
    #[arg(long, default_value_t = 2000)]
    pub canvas_size: u32,
}

impl CollectorArgs {
    pub fn to_config(&self) -> Result<CollectorConfig> {
        if self.concurrency == 0 {
            return Err(TopologyError::Config("--concurrency must be at least 1".to_string()));
        }

        Ok(CollectorConfig {
            username: self.username.clone(),
            password: self.password.clone(),
            concurrency: self.concurrency,
            timeout_ms: self.timeout_ms,
            verify_tls: self.verify_tls,
        })
    }
}

impl OutputArgs {
    pub fn filter(&self) -> PrefixFilter {
        PrefixFilter::from_option(self.exclude_prefix.as_deref())
    }

    pub fn layout_config(&self) -> Result<LayoutConfig> {
        if !(self.spring_k.is_finite() && self.spring_k > 0.0) {
            return Err(TopologyError::Config(format!(
                "--spring-k must be a positive number, got {}",
                self.spring_k
            )));
        }

        Ok(LayoutConfig {
            seed: self.seed,
            spring_k: Some(self.spring_k),
            width: self.canvas_size,
            height: self.canvas_size,
            ..LayoutConfig::default()
        })
    }
}

/// Install the global tracing subscriber. `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| TopologyError::Config(format!("Invalid log level '{}': {}", level, e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init()
        .map_err(|e| TopologyError::Config(format!("Failed to set logger: {}", e)))
}

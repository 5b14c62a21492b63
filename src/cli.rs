//! Flags and logging setup shared by the binaries.

use crate::config::PipelineConfig;
use crate::error::Result;
use clap::Args;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// JSON file overriding the default pipeline configuration
    #[arg(short, long, env = "INVOICE_YOLO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Debug level logs (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,
}

impl CommonArgs {
    /// Starts logging to stderr and loads the configuration.
    pub fn init(&self) -> Result<PipelineConfig> {
        init_tracing(self.verbose);
        PipelineConfig::load(self.config.as_deref())
    }
}

pub fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();
}

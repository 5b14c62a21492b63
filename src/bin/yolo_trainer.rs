use anyhow::Result;
use clap::Parser;
use invoice_yolo::cli::CommonArgs;
use invoice_yolo::training::train;
use std::path::PathBuf;

/// Trains the text detector on the split dataset
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Dataset descriptor, defaults to the one written by split_dataset
    #[arg(long)]
    data: Option<PathBuf>,

    /// Pretrained weights
    #[arg(long)]
    model: Option<PathBuf>,

    #[arg(long)]
    epochs: Option<u32>,

    #[arg(long)]
    batch: Option<u32>,

    /// Print the trainer command instead of running it
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = cli.common.init()?.training;
    if let Some(data) = cli.data {
        config.data = data;
    }
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(epochs) = cli.epochs {
        config.epochs = epochs;
    }
    if let Some(batch) = cli.batch {
        config.batch = batch;
    }

    if cli.dry_run {
        println!("yolo {}", config.to_args().join(" "));
        return Ok(());
    }
    train(&config)?;
    Ok(())
}

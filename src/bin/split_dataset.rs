use anyhow::Result;
use clap::Parser;
use invoice_yolo::cli::CommonArgs;
use invoice_yolo::dataset::split::split_dataset;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

/// Splits the labelled page images into train and val sets for the trainer
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long)]
    image_dir: Option<PathBuf>,

    #[arg(long)]
    label_dir: Option<PathBuf>,

    #[arg(long)]
    dataset_dir: Option<PathBuf>,

    /// Fraction of the images used for training
    #[arg(long)]
    train_fraction: Option<f64>,

    /// Fixed shuffle; random when absent
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = cli.common.init()?;
    if let Some(dir) = cli.image_dir {
        config.layout.image_dir = dir;
    }
    if let Some(dir) = cli.label_dir {
        config.layout.yolo_label_dir = dir;
    }
    if let Some(dir) = cli.dataset_dir {
        config.layout.dataset_dir = dir;
    }
    if let Some(fraction) = cli.train_fraction {
        config.split.train_fraction = fraction;
    }
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    split_dataset(&config.layout, &config.split, &mut rng)?;
    Ok(())
}

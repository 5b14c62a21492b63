use anyhow::{Context, Result};
use clap::Parser;
use invoice_yolo::cli::CommonArgs;
use invoice_yolo::dataset::data_augmenters::augment_dataset::augment_dataset;
use invoice_yolo::{AugmentationConfig, Augmenter};
use std::path::PathBuf;
use tracing::info;

/// Writes augmented copies of a set of labelled images
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Defaults to the train split of the dataset directory
    #[arg(long)]
    image_dir: Option<PathBuf>,

    /// Defaults to the train split of the dataset directory
    #[arg(long)]
    label_dir: Option<PathBuf>,

    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Augmented variants per image
    #[arg(long, default_value_t = 3)]
    copies: usize,

    /// Random when absent
    #[arg(long)]
    seed: Option<u64>,

    /// Skip the perspective warp; labels are copied unchanged
    #[arg(long)]
    photometric_only: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.common.init()?;
    let layout = &config.layout;
    let image_dir = cli
        .image_dir
        .unwrap_or_else(|| layout.dataset_dir.join("images").join("train"));
    let label_dir = cli
        .label_dir
        .unwrap_or_else(|| layout.dataset_dir.join("labels").join("train"));
    let out_dir = cli.out_dir.unwrap_or_else(|| layout.augmented_dir.clone());

    let augmentation = if cli.photometric_only {
        AugmentationConfig {
            stages: AugmentationConfig::photometric_only().stages,
            ..config.augmentation.clone()
        }
    } else {
        config.augmentation.clone()
    };
    let augmenter = Augmenter::new(augmentation).context("invalid augmentation settings")?;
    let seed = cli.seed.unwrap_or_else(rand::random);
    info!("Seed {}", seed);

    augment_dataset(&image_dir, &label_dir, &out_dir, cli.copies, seed, &augmenter)?;
    Ok(())
}

use anyhow::Result;
use clap::Parser;
use invoice_yolo::cli::CommonArgs;
use invoice_yolo::dataset::data_transformers::invoice_annotations::annotations_to_yolo;
use std::path::PathBuf;

/// Converts the word annotation files into one YOLO label file per page image
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long)]
    image_dir: Option<PathBuf>,

    #[arg(long)]
    annotation_dir: Option<PathBuf>,

    #[arg(long)]
    label_dir: Option<PathBuf>,

    /// Class id given to every word
    #[arg(long, default_value_t = 0)]
    class: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = cli.common.init()?;
    if let Some(dir) = cli.image_dir {
        config.layout.image_dir = dir;
    }
    if let Some(dir) = cli.annotation_dir {
        config.layout.annotation_dir = dir;
    }
    if let Some(dir) = cli.label_dir {
        config.layout.yolo_label_dir = dir;
    }
    annotations_to_yolo(&config.layout, cli.class)?;
    Ok(())
}

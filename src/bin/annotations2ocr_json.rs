use anyhow::Result;
use clap::Parser;
use invoice_yolo::cli::CommonArgs;
use invoice_yolo::dataset::data_transformers::ocr_json::annotations_to_ocr_json;
use std::path::PathBuf;

/// Converts the word annotation files into one OCR json document per page
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long)]
    annotation_dir: Option<PathBuf>,

    #[arg(long)]
    image_dir: Option<PathBuf>,

    #[arg(long)]
    ocr_json_dir: Option<PathBuf>,

    /// Where page images referenced by the json files are copied
    #[arg(long)]
    ocr_image_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = cli.common.init()?;
    let layout = &mut config.layout;
    if let Some(dir) = cli.annotation_dir {
        layout.annotation_dir = dir;
    }
    if let Some(dir) = cli.image_dir {
        layout.image_dir = dir;
    }
    if let Some(dir) = cli.ocr_json_dir {
        layout.ocr_json_dir = dir;
    }
    if let Some(dir) = cli.ocr_image_dir {
        layout.ocr_image_dir = dir;
    }
    annotations_to_ocr_json(&config.layout)?;
    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use invoice_yolo::cli::CommonArgs;
use invoice_yolo::pdf::{bind_pdfium, extract_annotations_dir};
use std::path::PathBuf;
use tracing::info;

/// Reads the word boxes of every PDF and writes them, in page image pixels,
/// to one annotation file per PDF. Run after pdf2img.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long)]
    pdf_dir: Option<PathBuf>,

    /// Page images rendered by pdf2img
    #[arg(long)]
    image_dir: Option<PathBuf>,

    #[arg(long)]
    annotation_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = cli.common.init()?;
    if let Some(dir) = cli.pdf_dir {
        config.layout.pdf_dir = dir;
    }
    if let Some(dir) = cli.image_dir {
        config.layout.image_dir = dir;
    }
    if let Some(dir) = cli.annotation_dir {
        config.layout.annotation_dir = dir;
    }

    let pdfium = bind_pdfium().context("PDFium is required to read the text layer")?;
    let written = extract_annotations_dir(&pdfium, &config.layout)?;
    info!("Wrote {} annotation files", written);
    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use invoice_yolo::cli::CommonArgs;
use invoice_yolo::pdf::{bind_pdfium, rasterize_dir};
use std::path::PathBuf;

/// Renders every PDF in the invoice directory to one PNG per page
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Directory with the source PDFs
    #[arg(long)]
    pdf_dir: Option<PathBuf>,

    /// Where `<pdf>_page<N>.png` files are written
    #[arg(long)]
    image_dir: Option<PathBuf>,

    #[arg(long)]
    dpi: Option<u32>,
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
    let dpi = cli.dpi.unwrap_or(config.render.dpi);

    let pdfium = bind_pdfium().context("PDFium is required to render pages")?;
    rasterize_dir(&pdfium, &config.layout, dpi)?;
    Ok(())
}

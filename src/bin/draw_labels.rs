use anyhow::Result;
use clap::Parser;
use invoice_yolo::dataset::debug_drawing::draw_labels_to_file;
use invoice_yolo::dataset::yolo_labels::label_path_for;
use std::path::PathBuf;
use tracing::info;

/// Draws the boxes of a label file over its image
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    image: PathBuf,

    /// Directory holding `<image stem>.txt`
    #[arg(long)]
    label_dir: PathBuf,

    /// Output image, defaults to `<image stem>_boxes.png` next to the input
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    invoice_yolo::cli::init_tracing(cli.verbose);

    let label_path = label_path_for(&cli.image, &cli.label_dir);
    let output = cli.output.unwrap_or_else(|| {
        let stem = cli.image.file_stem().unwrap_or_default().to_string_lossy();
        cli.image.with_file_name(format!("{}_boxes.png", stem))
    });
    let boxes = draw_labels_to_file(&cli.image, &label_path, &output)?;
    info!("Drew {} boxes into {}", boxes, output.display());
    Ok(())
}

//! Word annotation files to one OCR json document per page.

use super::invoice_annotations::read_annotation_file;
use crate::config::DatasetLayout;
use crate::dataset::common_structs::{OcrPage, OcrWord, WordAnnotation};
use crate::dataset::data_loaders::list_files;
use crate::error::{InvoiceYoloError, Result};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::{error, info, warn};

/// Keeps words with non blank text and at least four bbox numbers.
/// None when nothing is left.
pub fn page_to_ocr_page(
    words: &[WordAnnotation],
    image_path: &str,
    width: u32,
    height: u32,
) -> Option<OcrPage> {
    let words: Vec<OcrWord> = words
        .iter()
        .filter_map(|word| {
            let text = word.text.trim();
            if text.is_empty() || word.bbox.len() < 4 {
                return None;
            }
            Some(OcrWord {
                text: text.to_string(),
                bbox: word.bbox.clone(),
            })
        })
        .collect();
    if words.is_empty() {
        return None;
    }
    Some(OcrPage {
        image_path: image_path.to_string(),
        width,
        height,
        words,
    })
}

/// Converts every page of one `<pdf>.json` file and returns how many pages
/// were written. Page images are copied next to the json output.
pub fn annotation_file_to_ocr_json(annotation_file: &Path, layout: &DatasetLayout) -> usize {
    let pdf_name = annotation_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let pages = match read_annotation_file(annotation_file) {
        Ok(pages) => pages,
        Err(e) => {
            error!("Error loading {}: {}", annotation_file.display(), e);
            return 0;
        }
    };

    let mut converted = 0;
    for (page_index, words) in pages.iter().enumerate() {
        let page_name = format!("{}_page{}", pdf_name, page_index + 1);
        match convert_page(&page_name, words, layout) {
            Ok(true) => converted += 1,
            Ok(false) => {}
            Err(e) => warn!("Skipping {}: {}", page_name, e),
        }
    }
    converted
}

fn convert_page(page_name: &str, words: &[WordAnnotation], layout: &DatasetLayout) -> Result<bool> {
    let image_file = layout.image_dir.join(format!("{}.png", page_name));
    if !image_file.exists() {
        warn!("Image not found: {}, skipping page", image_file.display());
        return Ok(false);
    }
    let (width, height) =
        image::image_dimensions(&image_file).map_err(|e| InvoiceYoloError::image(&image_file, e))?;

    let target_image = layout.ocr_image_dir.join(format!("{}.png", page_name));
    if !target_image.exists() {
        fs::copy(&image_file, &target_image).map_err(|e| InvoiceYoloError::io(&target_image, e))?;
    }

    let page = match page_to_ocr_page(words, &target_image.to_string_lossy(), width, height) {
        Some(page) => page,
        None => return Ok(false),
    };
    let json_file = layout.ocr_json_dir.join(format!("{}.json", page_name));
    let writer = BufWriter::new(File::create(&json_file).map_err(|e| InvoiceYoloError::io(&json_file, e))?);
    serde_json::to_writer_pretty(writer, &page).map_err(|e| InvoiceYoloError::json(&json_file, e))?;
    info!("Converted {} ({} words)", page_name, page.words.len());
    Ok(true)
}

/// Converts all `*.json` files in `layout.annotation_dir`, in name order.
pub fn annotations_to_ocr_json(layout: &DatasetLayout) -> Result<usize> {
    let annotation_files = list_files(&layout.annotation_dir, &["json"])?;
    for dir in [&layout.ocr_json_dir, &layout.ocr_image_dir] {
        fs::create_dir_all(dir).map_err(|e| InvoiceYoloError::io(dir, e))?;
    }
    info!("Found {} annotation files", annotation_files.len());
    let total: usize = annotation_files
        .iter()
        .map(|file| annotation_file_to_ocr_json(file, layout))
        .sum();
    info!(
        "Converted {} pages, OCR json files in {}",
        total,
        layout.ocr_json_dir.display()
    );
    Ok(total)
}

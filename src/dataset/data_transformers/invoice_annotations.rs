//! Word annotation files to YOLO labels.
//!
//! An annotation file `<pdf>.json` holds one list of [`WordAnnotation`]s per
//! page. Page images are named `<pdf>_page<N>.png` with `N` starting at 1.

use crate::config::DatasetLayout;
use crate::dataset::common_structs::{WordAnnotation, YoloBbox};
use crate::dataset::data_loaders::list_files;
use crate::dataset::yolo_labels::{label_path_for, write_label_file};
use crate::error::{InvoiceYoloError, Result};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    /// Label files written
    pub pages: usize,
    pub boxes: usize,
    pub skipped: usize,
}

/// `inv_042_page3` -> `("inv_042", 2)`
pub fn parse_page_image_name(stem: &str) -> Option<(String, usize)> {
    let (pdf_name, page) = stem.rsplit_once("_page")?;
    let page: usize = page.parse().ok()?;
    let page_index = page.checked_sub(1)?;
    Some((pdf_name.to_string(), page_index))
}

pub fn read_annotation_file(path: impl AsRef<Path>) -> Result<Vec<Vec<WordAnnotation>>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| InvoiceYoloError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| InvoiceYoloError::json(path, e))
}

/// Words without a full bbox or with no area are left out.
pub fn page_to_yolo_labels(
    words: &[WordAnnotation],
    img_width: u32,
    img_height: u32,
    class: u32,
) -> Vec<YoloBbox> {
    words
        .iter()
        .filter_map(|word| {
            let (x0, y0, x1, y1) = word.rect()?;
            YoloBbox::from_pixel_rect(class, x0, y0, x1, y1, img_width, img_height)
        })
        .collect()
}

/// Writes one label file per page image in `layout.image_dir` to
/// `layout.yolo_label_dir`.
pub fn annotations_to_yolo(layout: &DatasetLayout, class: u32) -> Result<ConversionStats> {
    let images = list_files(&layout.image_dir, &["png"])?;
    fs::create_dir_all(&layout.yolo_label_dir)
        .map_err(|e| InvoiceYoloError::io(&layout.yolo_label_dir, e))?;
    let mut stats = ConversionStats::default();

    for image_path in images {
        match convert_page(&image_path, layout, class) {
            Ok(Some(boxes)) => {
                stats.pages += 1;
                stats.boxes += boxes;
            }
            Ok(None) => stats.skipped += 1,
            Err(e) => {
                warn!("Skipping {}: {}", image_path.display(), e);
                stats.skipped += 1;
            }
        }
    }
    info!(
        "Wrote {} label files ({} boxes) to {}, skipped {} images",
        stats.pages,
        stats.boxes,
        layout.yolo_label_dir.display(),
        stats.skipped
    );
    Ok(stats)
}

fn convert_page(image_path: &Path, layout: &DatasetLayout, class: u32) -> Result<Option<usize>> {
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (pdf_name, page_index) = parse_page_image_name(&stem)
        .ok_or(InvoiceYoloError::InvalidPageImageName { name: stem.clone() })?;

    let annotation_file = layout.annotation_dir.join(format!("{}.json", pdf_name));
    if !annotation_file.exists() {
        warn!("Annotation file missing: {}", annotation_file.display());
        return Ok(None);
    }
    let (width, height) =
        image::image_dimensions(image_path).map_err(|e| InvoiceYoloError::image(image_path, e))?;
    let pages = read_annotation_file(&annotation_file)?;
    let words = match pages.get(page_index) {
        Some(words) => words,
        None => {
            warn!(
                "Page index {} out of range in {} ({} pages)",
                page_index,
                annotation_file.display(),
                pages.len()
            );
            return Ok(None);
        }
    };

    let labels = page_to_yolo_labels(words, width, height, class);
    write_label_file(label_path_for(image_path, &layout.yolo_label_dir), &labels)?;
    debug!("{}: {} boxes", stem, labels.len());
    Ok(Some(labels.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::yolo_labels::read_label_file;
    use image::RgbImage;

    fn word(text: &str, bbox: &[f64]) -> WordAnnotation {
        WordAnnotation {
            text: text.to_string(),
            bbox: bbox.to_vec(),
            page: 0,
        }
    }

    #[test]
    fn parses_page_image_names() {
        assert_eq!(
            parse_page_image_name("inv_042_page3"),
            Some(("inv_042".to_string(), 2))
        );
        assert_eq!(
            parse_page_image_name("a_page_b_page10"),
            Some(("a_page_b".to_string(), 9))
        );
        assert_eq!(parse_page_image_name("inv_page0"), None);
        assert_eq!(parse_page_image_name("inv_pageX"), None);
        assert_eq!(parse_page_image_name("scan"), None);
    }

    #[test]
    fn normalizes_word_boxes() {
        let words = vec![
            word("Invoice", &[100., 50., 300., 90.]),
            word("flat", &[10., 10., 50., 10.]),
            word("short", &[1., 2., 3.]),
            word("inverted", &[50., 50., 40., 60.]),
        ];
        let labels = page_to_yolo_labels(&words, 1000, 500, 0);
        assert_eq!(labels, vec![YoloBbox::new(0, 0.2, 0.14, 0.2, 0.08)]);
    }

    #[test]
    fn converts_directory_and_skips_unmatched_pages() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DatasetLayout {
            image_dir: dir.path().join("img"),
            annotation_dir: dir.path().join("ann"),
            yolo_label_dir: dir.path().join("labels"),
            ..Default::default()
        };
        fs::create_dir_all(&layout.image_dir).unwrap();
        fs::create_dir_all(&layout.annotation_dir).unwrap();
        for name in ["inv_page1", "inv_page2", "inv_page3", "other_page1"] {
            RgbImage::new(200, 100)
                .save(layout.image_dir.join(format!("{}.png", name)))
                .unwrap();
        }
        let pages = vec![
            vec![word("Total", &[20., 10., 60., 30.])],
            vec![word("", &[0., 0., 100., 50.]), word("x", &[0., 0., 0., 0.])],
        ];
        fs::write(
            layout.annotation_dir.join("inv.json"),
            serde_json::to_string(&pages).unwrap(),
        )
        .unwrap();

        let stats = annotations_to_yolo(&layout, 0).unwrap();
        assert_eq!(
            stats,
            ConversionStats {
                pages: 2,
                boxes: 2,
                skipped: 2
            }
        );
        let page1 = read_label_file(layout.yolo_label_dir.join("inv_page1.txt")).unwrap();
        assert_eq!(page1, vec![YoloBbox::new(0, 0.2, 0.2, 0.2, 0.2)]);
        let page2 = read_label_file(layout.yolo_label_dir.join("inv_page2.txt")).unwrap();
        assert_eq!(page2, vec![YoloBbox::new(0, 0.25, 0.25, 0.5, 0.5)]);
        assert!(!layout.yolo_label_dir.join("inv_page3.txt").exists());
        assert!(!layout.yolo_label_dir.join("other_page1.txt").exists());
    }
}

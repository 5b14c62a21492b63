//! Reading and writing YOLO label files.
//!
//! One file per image, one `<class> <cx> <cy> <w> <h>` line per box, with the
//! four geometric fields normalized and written with 6 decimals.

use crate::dataset::common_structs::YoloBbox;
use crate::error::{InvoiceYoloError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Lines that do not parse as a box are skipped.
pub fn parse_labels(contents: &str) -> Vec<YoloBbox> {
    contents
        .lines()
        .filter_map(|line| line.parse::<YoloBbox>().ok())
        .collect()
}

pub fn format_labels(labels: &[YoloBbox]) -> String {
    labels.iter().map(|bb| format!("{}\n", bb)).collect()
}

/// A missing label file means the image has no boxes.
pub fn read_label_file(path: impl AsRef<Path>) -> Result<Vec<YoloBbox>> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(contents) => Ok(parse_labels(&contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(vec![]),
        Err(e) => Err(InvoiceYoloError::io(path, e)),
    }
}

pub fn write_label_file(path: impl AsRef<Path>, labels: &[YoloBbox]) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, format_labels(labels)).map_err(|e| InvoiceYoloError::io(path, e))
}

/// `<label_dir>/<image stem>.txt`
pub fn label_path_for(image_path: &Path, label_dir: &Path) -> PathBuf {
    let mut file_name = image_path.file_stem().unwrap_or_default().to_os_string();
    file_name.push(".txt");
    label_dir.join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_line_with_non_numeric_field() {
        let labels = parse_labels("0 0.5 0.5 0.2 0.1\n1 abc 0.1 0.1 0.1");
        assert_eq!(labels, vec![YoloBbox::new(0, 0.5, 0.5, 0.2, 0.1)]);
    }

    #[test]
    fn skips_wrong_field_counts_and_blank_lines() {
        let labels = parse_labels("\n0 0.1 0.2 0.3\n2 0.1 0.2 0.3 0.4 0.5\n  \n1 0.1 0.2 0.3 0.4\n");
        assert_eq!(labels, vec![YoloBbox::new(1, 0.1, 0.2, 0.3, 0.4)]);
    }

    #[test]
    fn written_labels_parse_back_to_six_digits() {
        let labels = vec![
            YoloBbox::new(0, 0.123456789, 0.5, 0.2, 0.1),
            YoloBbox::new(4, 0.999999, 0.000001, 1.0, 0.3333333),
        ];
        let parsed = parse_labels(&format_labels(&labels));
        assert_eq!(parsed.len(), labels.len());
        for (original, back) in labels.iter().zip(&parsed) {
            assert_eq!(original.class, back.class);
            assert!((original.center_x - back.center_x).abs() <= 5e-7);
            assert!((original.center_y - back.center_y).abs() <= 5e-7);
            assert!((original.width - back.width).abs() <= 5e-7);
            assert!((original.height - back.height).abs() <= 5e-7);
        }
    }

    #[test]
    fn missing_label_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let labels = read_label_file(dir.path().join("nope.txt")).unwrap();
        assert!(labels.is_empty());
    }

    #[test]
    fn write_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a_page1.txt");
        let labels = vec![YoloBbox::new(0, 0.5, 0.5, 0.2, 0.1)];
        write_label_file(&path, &labels).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "0 0.500000 0.500000 0.200000 0.100000\n"
        );
        assert_eq!(read_label_file(&path).unwrap(), labels);
    }

    #[test]
    fn label_path_uses_image_stem() {
        let path = label_path_for(Path::new("imgs/inv_page2.png"), Path::new("labels"));
        assert_eq!(path, PathBuf::from("labels/inv_page2.txt"));
        let path = label_path_for(Path::new("imgs/inv.v2_page1.png"), Path::new("labels"));
        assert_eq!(path, PathBuf::from("labels/inv.v2_page1.txt"));
    }
}

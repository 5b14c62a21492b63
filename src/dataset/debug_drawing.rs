//! Box overlays for checking labels by eye.

use crate::dataset::common_structs::YoloBbox;
use crate::dataset::yolo_labels::read_label_file;
use crate::error::{InvoiceYoloError, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::path::Path;

pub const DEFAULT_BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Pixel rectangle of `bb`, at least 1x1.
pub fn bbox_rect(bb: &YoloBbox, img_width: u32, img_height: u32) -> Rect {
    let [(x1, y1), _, (x2, y2), _] = bb.to_corners(img_width, img_height);
    let width = (x2 - x1).round().max(1.) as u32;
    let height = (y2 - y1).round().max(1.) as u32;
    Rect::at(x1.round() as i32, y1.round() as i32).of_size(width, height)
}

pub fn draw_labels(img: &mut RgbImage, labels: &[YoloBbox], color: Rgb<u8>) {
    let (width, height) = img.dimensions();
    for bb in labels {
        draw_hollow_rect_mut(img, bbox_rect(bb, width, height), color);
    }
}

/// Draws the boxes of `label_path` on the image at `img_path` and saves the result to `out_path`.
/// Returns the number of boxes drawn.
pub fn draw_labels_to_file(img_path: &Path, label_path: &Path, out_path: &Path) -> Result<usize> {
    let mut img = image::open(img_path)
        .map_err(|e| InvoiceYoloError::image(img_path, e))?
        .to_rgb8();
    let labels = read_label_file(label_path)?;
    draw_labels(&mut img, &labels, DEFAULT_BOX_COLOR);
    img.save(out_path)
        .map_err(|e| InvoiceYoloError::image(out_path, e))?;
    Ok(labels.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_matches_box_in_pixels() {
        let rect = bbox_rect(&YoloBbox::new(0, 0.5, 0.5, 0.2, 0.1), 1000, 800);
        assert_eq!((rect.left(), rect.top()), (400, 360));
        assert_eq!((rect.width(), rect.height()), (200, 80));
    }

    #[test]
    fn tiny_box_still_has_a_pixel() {
        let rect = bbox_rect(&YoloBbox::new(0, 0.5, 0.5, 0.0001, 0.0001), 100, 100);
        assert_eq!((rect.width(), rect.height()), (1, 1));
    }

    #[test]
    fn draws_outline_only() {
        let mut img = RgbImage::new(20, 20);
        draw_labels(&mut img, &[YoloBbox::new(0, 0.5, 0.5, 0.5, 0.5)], DEFAULT_BOX_COLOR);
        assert_eq!(img.get_pixel(5, 5), &DEFAULT_BOX_COLOR);
        assert_eq!(img.get_pixel(14, 14), &DEFAULT_BOX_COLOR);
        assert_eq!(img.get_pixel(10, 10), &Rgb([0, 0, 0]));
        assert_eq!(img.get_pixel(2, 2), &Rgb([0, 0, 0]));
    }

    #[test]
    fn draws_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let img_path = dir.path().join("p.png");
        let label_path = dir.path().join("p.txt");
        let out_path = dir.path().join("p_boxes.png");
        RgbImage::new(10, 10).save(&img_path).unwrap();
        std::fs::write(&label_path, "0 0.5 0.5 0.4 0.4\n").unwrap();
        assert_eq!(draw_labels_to_file(&img_path, &label_path, &out_path).unwrap(), 1);
        let out = image::open(&out_path).unwrap().to_rgb8();
        assert_eq!(out.get_pixel(3, 3), &DEFAULT_BOX_COLOR);
    }
}

//! Offline augmentation of a whole image/label directory pair.

use super::Augmenter;
use crate::dataset::common_structs::LabeledImage;
use crate::dataset::data_loaders::list_files;
use crate::dataset::data_loaders::yolo_dataset_loader::{load_sample, IMAGE_EXTENSIONS};
use crate::dataset::yolo_labels::{label_path_for, write_label_file};
use crate::error::{InvoiceYoloError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::fs;
use std::ops::Add;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AugmentStats {
    /// Source images that were read successfully
    pub images: usize,
    /// Augmented images written
    pub written: usize,
    pub boxes_in: usize,
    pub boxes_out: usize,
    /// Source images that could not be read or written
    pub skipped: usize,
}

impl Add for AugmentStats {
    type Output = AugmentStats;

    fn add(self, other: AugmentStats) -> AugmentStats {
        AugmentStats {
            images: self.images + other.images,
            written: self.written + other.written,
            boxes_in: self.boxes_in + other.boxes_in,
            boxes_out: self.boxes_out + other.boxes_out,
            skipped: self.skipped + other.skipped,
        }
    }
}

/// `<stem>_aug<copy>.<ext>`
pub fn augmented_file_name(stem: &str, copy: usize, extension: &str) -> String {
    format!("{}_aug{}.{}", stem, copy, extension)
}

/// Writes `copies` augmented variants of every image in `image_dir` to
/// `out_dir/images`, with their labels in `out_dir/labels`.
///
/// Image `i` (in file name order) gets its own generator seeded with
/// `seed + i`, so the output does not depend on thread scheduling.
pub fn augment_dataset(
    image_dir: &Path,
    label_dir: &Path,
    out_dir: &Path,
    copies: usize,
    seed: u64,
    augmenter: &Augmenter,
) -> Result<AugmentStats> {
    let image_paths = list_files(image_dir, &IMAGE_EXTENSIONS)?;
    let out_images = out_dir.join("images");
    let out_labels = out_dir.join("labels");
    for dir in [&out_images, &out_labels] {
        fs::create_dir_all(dir).map_err(|e| InvoiceYoloError::io(dir, e))?;
    }
    info!(
        "Augmenting {} images from {} ({} copies each)",
        image_paths.len(),
        image_dir.display(),
        copies
    );

    let stats = image_paths
        .par_iter()
        .enumerate()
        .map(|(index, image_path)| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
            let result = augment_one(
                image_path,
                label_dir,
                &out_images,
                &out_labels,
                copies,
                augmenter,
                &mut rng,
            );
            match result {
                Ok(stats) => stats,
                Err(e) => {
                    warn!("Skipping {}: {}", image_path.display(), e);
                    AugmentStats {
                        skipped: 1,
                        ..Default::default()
                    }
                }
            }
        })
        .reduce(AugmentStats::default, |a, b| a + b);

    info!(
        "Wrote {} augmented images to {} ({} of {} boxes kept, {} images skipped)",
        stats.written,
        out_dir.display(),
        stats.boxes_out,
        stats.boxes_in,
        stats.skipped
    );
    Ok(stats)
}

/// Copies written before a failed one stay on disk and are counted; the image
/// is then reported as skipped.
fn augment_one(
    image_path: &Path,
    label_dir: &Path,
    out_images: &Path,
    out_labels: &Path,
    copies: usize,
    augmenter: &Augmenter,
    rng: &mut StdRng,
) -> Result<AugmentStats> {
    let source = load_sample(image_path, label_dir)?;
    let extension = image_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("png");
    let mut stats = AugmentStats {
        images: 1,
        ..Default::default()
    };
    for copy in 0..copies {
        let augmented = augmenter.augment_labeled(rng, &source.sample);
        let out_image = out_images.join(augmented_file_name(&source.stem, copy, extension));
        if let Err(e) = write_copy(&augmented, &out_image, out_labels) {
            warn!(
                "Stopped {} after {} of {} copies: {}",
                image_path.display(),
                copy,
                copies,
                e
            );
            stats.skipped = 1;
            break;
        }
        stats.written += 1;
        stats.boxes_in += source.sample.labels.len();
        stats.boxes_out += augmented.labels.len();
    }
    Ok(stats)
}

/// Image and label file, or neither.
fn write_copy(augmented: &LabeledImage, out_image: &Path, out_labels: &Path) -> Result<()> {
    augmented
        .image
        .save(out_image)
        .map_err(|e| InvoiceYoloError::image(out_image, e))?;
    if let Err(e) = write_label_file(label_path_for(out_image, out_labels), &augmented.labels) {
        let _ = fs::remove_file(out_image);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AugmentationConfig;
    use crate::dataset::common_structs::YoloBbox;
    use crate::dataset::yolo_labels::read_label_file;
    use image::{Rgb, RgbImage};
    use std::path::PathBuf;

    fn setup(dir: &Path) -> (PathBuf, PathBuf) {
        let images = dir.join("images");
        let labels = dir.join("labels");
        fs::create_dir_all(&images).unwrap();
        fs::create_dir_all(&labels).unwrap();
        for name in ["inv_page1", "inv_page2"] {
            RgbImage::from_fn(40, 30, |x, _| Rgb([(x * 5) as u8, 200, 100]))
                .save(images.join(format!("{}.png", name)))
                .unwrap();
            write_label_file(
                labels.join(format!("{}.txt", name)),
                &[YoloBbox::new(0, 0.5, 0.5, 0.3, 0.3)],
            )
            .unwrap();
        }
        fs::write(images.join("broken_page1.png"), b"garbage").unwrap();
        (images, labels)
    }

    #[test]
    fn file_names_carry_copy_index() {
        assert_eq!(augmented_file_name("inv_page3", 2, "jpg"), "inv_page3_aug2.jpg");
    }

    #[test]
    fn writes_copies_and_counts_skips() {
        let dir = tempfile::tempdir().unwrap();
        let (images, labels) = setup(dir.path());
        let out = dir.path().join("out");
        let augmenter = Augmenter::new(AugmentationConfig::photometric_only()).unwrap();

        let stats = augment_dataset(&images, &labels, &out, 3, 7, &augmenter).unwrap();
        assert_eq!(stats.images, 2);
        assert_eq!(stats.written, 6);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.boxes_in, 6);
        assert_eq!(stats.boxes_out, 6);

        for copy in 0..3 {
            let image_path = out.join("images").join(format!("inv_page2_aug{}.png", copy));
            let image = image::open(&image_path).unwrap();
            assert_eq!((image.width(), image.height()), (40, 30));
            let labels = read_label_file(out.join("labels").join(format!("inv_page2_aug{}.txt", copy)))
                .unwrap();
            assert_eq!(labels, vec![YoloBbox::new(0, 0.5, 0.5, 0.3, 0.3)]);
        }
    }

    #[test]
    fn same_seed_gives_same_files() {
        let dir = tempfile::tempdir().unwrap();
        let (images, labels) = setup(dir.path());
        let augmenter = Augmenter::new(AugmentationConfig::default()).unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        augment_dataset(&images, &labels, &a, 2, 99, &augmenter).unwrap();
        augment_dataset(&images, &labels, &b, 2, 99, &augmenter).unwrap();
        for name in ["inv_page1_aug0", "inv_page1_aug1", "inv_page2_aug1"] {
            let file = format!("{}.png", name);
            assert_eq!(
                fs::read(a.join("images").join(&file)).unwrap(),
                fs::read(b.join("images").join(&file)).unwrap()
            );
            let file = format!("{}.txt", name);
            assert_eq!(
                fs::read_to_string(a.join("labels").join(&file)).unwrap(),
                fs::read_to_string(b.join("labels").join(&file)).unwrap()
            );
        }
    }

    #[test]
    fn failed_copy_keeps_earlier_copies_in_stats() {
        let dir = tempfile::tempdir().unwrap();
        let (images, labels) = setup(dir.path());
        let out = dir.path().join("out");
        // a directory where the second copy of page 2 should go
        fs::create_dir_all(out.join("images").join("inv_page2_aug1.png")).unwrap();
        let augmenter = Augmenter::new(AugmentationConfig::photometric_only()).unwrap();

        let stats = augment_dataset(&images, &labels, &out, 3, 7, &augmenter).unwrap();
        assert_eq!(stats.images, 2);
        assert_eq!(stats.written, 4);
        assert_eq!(stats.boxes_in, 4);
        assert_eq!(stats.boxes_out, 4);
        assert_eq!(stats.skipped, 2);

        let labels_out = out.join("labels");
        assert!(out.join("images").join("inv_page2_aug0.png").is_file());
        assert!(labels_out.join("inv_page2_aug0.txt").is_file());
        assert!(!labels_out.join("inv_page2_aug1.txt").exists());
        assert!(!out.join("images").join("inv_page2_aug2.png").exists());
    }

    #[test]
    fn label_write_failure_removes_the_image() {
        let dir = tempfile::tempdir().unwrap();
        let (images, labels) = setup(dir.path());
        let out = dir.path().join("out");
        fs::create_dir_all(out.join("labels").join("inv_page1_aug0.txt")).unwrap();
        let augmenter = Augmenter::new(AugmentationConfig::photometric_only()).unwrap();

        let stats = augment_dataset(&images, &labels, &out, 1, 7, &augmenter).unwrap();
        assert_eq!(stats.written, 1);
        assert_eq!(stats.skipped, 2);
        assert!(!out.join("images").join("inv_page1_aug0.png").exists());
        assert!(out.join("images").join("inv_page2_aug0.png").is_file());
    }
}

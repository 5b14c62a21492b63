//! Train/validation split of the labelled page images, in the directory
//! layout the YOLO trainer expects.

use crate::config::{DatasetLayout, SplitConfig};
use crate::dataset::data_loaders::list_files;
use crate::dataset::yolo_labels::label_path_for;
use crate::error::{InvoiceYoloError, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitStats {
    pub train: usize,
    pub val: usize,
    /// Images without a label file
    pub skipped: usize,
}

/// `floor(train_fraction * total)`
pub fn split_index(total: usize, train_fraction: f64) -> usize {
    (train_fraction * total as f64) as usize
}

/// The `data.yaml` dataset descriptor read by the trainer.
pub fn dataset_descriptor(dataset_dir: &Path, class_names: &[String]) -> String {
    let names = class_names
        .iter()
        .map(|name| format!("'{}'", name.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "path: {}\ntrain: images/train\nval: images/val\nnc: {}\nnames: [{}]\n",
        dataset_dir.display(),
        class_names.len(),
        names
    )
}

/// Shuffles the page images and copies the first `train_fraction` of them
/// (with their labels) into the train split, the rest into val.
///
/// An image without a label file is skipped but keeps its position, so the
/// split point is computed over all images.
pub fn split_dataset<R: Rng + ?Sized>(
    layout: &DatasetLayout,
    config: &SplitConfig,
    rng: &mut R,
) -> Result<SplitStats> {
    config.validate()?;
    let mut images = list_files(&layout.image_dir, &["png"])?;
    images.shuffle(rng);
    let split_idx = split_index(images.len(), config.train_fraction);

    let dataset_dir = &layout.dataset_dir;
    let dir = |kind: &str, split: &str| -> PathBuf { dataset_dir.join(kind).join(split) };
    let (train_img, val_img) = (dir("images", "train"), dir("images", "val"));
    let (train_lbl, val_lbl) = (dir("labels", "train"), dir("labels", "val"));
    for p in [&train_img, &val_img, &train_lbl, &val_lbl] {
        fs::create_dir_all(p).map_err(|e| InvoiceYoloError::io(p, e))?;
    }

    let mut stats = SplitStats::default();
    for (i, image_path) in images.iter().enumerate() {
        let label_path = label_path_for(image_path, &layout.yolo_label_dir);
        if !label_path.exists() {
            stats.skipped += 1;
            continue;
        }
        let (img_dir, lbl_dir) = if i < split_idx {
            stats.train += 1;
            (&train_img, &train_lbl)
        } else {
            stats.val += 1;
            (&val_img, &val_lbl)
        };
        copy_into(image_path, img_dir)?;
        copy_into(&label_path, lbl_dir)?;
    }

    let descriptor_path = dataset_dir.join("data.yaml");
    fs::write(
        &descriptor_path,
        dataset_descriptor(dataset_dir, &config.class_names),
    )
    .map_err(|e| InvoiceYoloError::io(&descriptor_path, e))?;

    info!("Train samples: {}", stats.train);
    info!("Validation samples: {}", stats.val);
    info!("Dataset location: {}", dataset_dir.display());
    Ok(stats)
}

fn copy_into(file: &Path, dir: &Path) -> Result<()> {
    let target = dir.join(file.file_name().unwrap_or_default());
    fs::copy(file, &target).map_err(|e| InvoiceYoloError::io(file, e))?;
    Ok(())
}

use super::list_files;
use crate::dataset::common_structs::LabeledImage;
use crate::dataset::yolo_labels::{label_path_for, read_label_file};
use crate::dataset::DataLoader;
use crate::error::{InvoiceYoloError, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// An image loaded together with its label file
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSample {
    pub stem: String,
    pub image_path: PathBuf,
    pub sample: LabeledImage,
}

/// Reads `<image_dir>/<stem>.<ext>` and `<label_dir>/<stem>.txt` pairs.
/// Images without a label file come back with no boxes.
pub struct YoloDataLoader {
    label_dir: PathBuf,
    image_paths: Vec<PathBuf>,
    max_elem_index: usize,
    next_element_index: usize,
}

impl YoloDataLoader {
    pub fn new(image_dir: impl AsRef<Path>, label_dir: impl AsRef<Path>) -> Result<YoloDataLoader> {
        let image_paths = list_files(image_dir.as_ref(), &IMAGE_EXTENSIONS)?;
        Ok(YoloDataLoader {
            label_dir: label_dir.as_ref().to_owned(),
            max_elem_index: image_paths.len(),
            image_paths,
            next_element_index: 0,
        })
    }
}

pub fn load_sample(image_path: &Path, label_dir: &Path) -> Result<LabeledSample> {
    let image = image::open(image_path)
        .map_err(|e| InvoiceYoloError::image(image_path, e))?
        .to_rgb8();
    let labels = read_label_file(label_path_for(image_path, label_dir))?;
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(LabeledSample {
        stem,
        image_path: image_path.to_owned(),
        sample: LabeledImage::new(image, labels),
    })
}

impl Iterator for YoloDataLoader {
    type Item = LabeledSample;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let image_path = self.image_paths.get(self.next_element_index)?;
            self.next_element_index += 1;
            match load_sample(image_path, &self.label_dir) {
                Ok(sample) => return Some(sample),
                Err(e) => warn!("Skipping {}: {}", image_path.display(), e),
            }
        }
    }
}

impl DataLoader for YoloDataLoader {
    fn next_element_index(&self) -> usize {
        self.next_element_index
    }

    fn max_elem_index(&self) -> usize {
        self.max_elem_index
    }
}

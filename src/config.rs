//! Pipeline configuration.
//!
//! Every binary starts from [`PipelineConfig::default()`], optionally loads a
//! JSON file over it and then applies its own command line flags. Keys missing
//! from the JSON file keep their default value.

use crate::dataset::data_augmenters::Stage;
use crate::error::{InvoiceYoloError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub layout: DatasetLayout,
    pub render: RenderConfig,
    pub augmentation: AugmentationConfig,
    pub split: SplitConfig,
    pub training: TrainingConfig,
}

impl PipelineConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<PipelineConfig> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| InvoiceYoloError::io(path, e))?;
        let config: PipelineConfig =
            serde_json::from_reader(file).map_err(|e| InvoiceYoloError::json(path, e))?;
        config.augmentation.validate()?;
        config.split.validate()?;
        Ok(config)
    }

    /// Defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<PipelineConfig> {
        match path {
            Some(path) => PipelineConfig::from_json_file(path),
            None => Ok(PipelineConfig::default()),
        }
    }
}

/// Where each step of the pipeline reads and writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetLayout {
    /// Source invoices, `*.pdf`.
    pub pdf_dir: PathBuf,
    /// Rasterised pages, `<pdf>_page<N>.png`.
    pub image_dir: PathBuf,
    /// Word boxes per PDF, `<pdf>.json`.
    pub annotation_dir: PathBuf,
    /// YOLO label files, `<pdf>_page<N>.txt`.
    pub yolo_label_dir: PathBuf,
    /// Train/val split consumed by the trainer.
    pub dataset_dir: PathBuf,
    pub ocr_json_dir: PathBuf,
    pub ocr_image_dir: PathBuf,
    pub augmented_dir: PathBuf,
}

impl Default for DatasetLayout {
    fn default() -> Self {
        DatasetLayout {
            pdf_dir: PathBuf::from("data/invoice"),
            image_dir: PathBuf::from("data/processed/invoiceIMG"),
            annotation_dir: PathBuf::from("data/annotations/invoiceANNOTATIONS"),
            yolo_label_dir: PathBuf::from("data/yolo_labels"),
            dataset_dir: PathBuf::from("data/yolo_dataset"),
            ocr_json_dir: PathBuf::from("data/raw/invoices/ocr_json"),
            ocr_image_dir: PathBuf::from("data/raw/invoices/images"),
            augmented_dir: PathBuf::from("data/augmented"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub dpi: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        // 300 dpi gives 2550x3300 for US letter
        RenderConfig { dpi: 300 }
    }
}

/// Parameter ranges of the augmentation stages. All ranges are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentationConfig {
    /// Largest inward corner displacement, as a fraction of width/height.
    pub max_shift: f64,
    pub illumination_strength: (f32, f32),
    pub blur_kernel_sizes: Vec<u32>,
    pub contrast_alpha: (f32, f32),
    pub brightness_beta: (i32, i32),
    pub jpeg_quality: (u8, u8),
    pub noise_probability: f64,
    pub noise_std: f32,
    /// Stages to run. They always run in [`Stage::PIPELINE`] order.
    pub stages: Vec<Stage>,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        AugmentationConfig {
            max_shift: 0.12,
            illumination_strength: (0.2, 0.4),
            blur_kernel_sizes: vec![3, 5, 7],
            contrast_alpha: (0.85, 1.15),
            brightness_beta: (-20, 20),
            jpeg_quality: (40, 80),
            noise_probability: 0.5,
            noise_std: 6.0,
            stages: Stage::PIPELINE.to_vec(),
        }
    }
}

impl AugmentationConfig {
    /// Only the five pixel-value stages.
    pub fn photometric_only() -> Self {
        AugmentationConfig {
            stages: Stage::PIPELINE
                .iter()
                .copied()
                .filter(|stage| !stage.is_geometric())
                .collect(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(InvoiceYoloError::InvalidConfig(msg)) };
        if !(0.0..0.5).contains(&self.max_shift) {
            return invalid(format!("max_shift must be in [0, 0.5), got {}", self.max_shift));
        }
        let (s_min, s_max) = self.illumination_strength;
        if !(s_min >= 0.0 && s_min <= s_max && s_max < 1.0) {
            return invalid(format!(
                "illumination_strength must satisfy 0 <= min <= max < 1, got {:?}",
                self.illumination_strength
            ));
        }
        if self.blur_kernel_sizes.is_empty() {
            return invalid("blur_kernel_sizes is empty".to_string());
        }
        if let Some(k) = self.blur_kernel_sizes.iter().find(|k| **k % 2 == 0) {
            return invalid(format!("blur kernel sizes must be odd, got {}", k));
        }
        let (a_min, a_max) = self.contrast_alpha;
        if !(a_min >= 0.0 && a_min <= a_max) {
            return invalid(format!("contrast_alpha range {:?} is invalid", self.contrast_alpha));
        }
        if self.brightness_beta.0 > self.brightness_beta.1 {
            return invalid(format!("brightness_beta range {:?} is inverted", self.brightness_beta));
        }
        let (q_min, q_max) = self.jpeg_quality;
        if q_min == 0 || q_min > q_max || q_max > 100 {
            return invalid(format!(
                "jpeg_quality must satisfy 1 <= min <= max <= 100, got {:?}",
                self.jpeg_quality
            ));
        }
        if !(0.0..=1.0).contains(&self.noise_probability) {
            return invalid(format!(
                "noise_probability must be in [0, 1], got {}",
                self.noise_probability
            ));
        }
        if !self.noise_std.is_finite() || self.noise_std < 0.0 {
            return invalid(format!("noise_std must be finite and >= 0, got {}", self.noise_std));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub train_fraction: f64,
    /// Index in this list is the class id.
    pub class_names: Vec<String>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig {
            train_fraction: 0.8,
            class_names: vec!["text".to_string()],
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.train_fraction) {
            return Err(InvoiceYoloError::InvalidConfig(format!(
                "train_fraction must be in [0, 1], got {}",
                self.train_fraction
            )));
        }
        if self.class_names.is_empty() {
            return Err(InvoiceYoloError::InvalidConfig(
                "class_names is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings handed to the external YOLO trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Pretrained weights to start from.
    pub model: PathBuf,
    /// Dataset descriptor written by `split_dataset`.
    pub data: PathBuf,
    pub epochs: u32,
    pub image_size: u32,
    pub batch: u32,
    pub workers: u32,
    pub device: String,
    /// Mixed precision; needed to fit batch 4 in 4GB of VRAM.
    pub amp: bool,
    pub project: PathBuf,
    pub name: String,
    pub exist_ok: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            model: PathBuf::from("models/yolov8n.pt"),
            data: PathBuf::from("data/yolo_dataset/data.yaml"),
            epochs: 50,
            image_size: 640,
            batch: 4,
            workers: 2,
            device: "0".to_string(),
            amp: true,
            project: PathBuf::from("outputs/yolo_results"),
            name: "invoice_yolo".to_string(),
            exist_ok: true,
        }
    }
}

//! Label aware augmentation of page images.
//!
//! [`Augmenter::augment`] runs the configured [`Stage`]s in [`Stage::PIPELINE`]
//! order. Only [`Stage::Perspective`] moves pixels, so it is the only stage that
//! rewrites (and possibly drops) boxes; the five photometric stages pass the
//! labels through untouched.
//!
//! All randomness comes from the `rng` argument, so a seeded generator gives
//! the same output for the same input.

use crate::config::AugmentationConfig;
use crate::dataset::common_structs::{LabeledImage, YoloBbox};
use crate::error::{InvoiceYoloError, Result};
use image::RgbImage;
use rand::Rng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub mod augment_dataset;
pub mod image_augmentations;
pub mod perspective;

use image_augmentations::{
    random_blur, random_brightness_contrast, random_illumination, random_jpeg_roundtrip,
    random_noise,
};
use perspective::random_perspective;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Perspective,
    Illumination,
    Blur,
    BrightnessContrast,
    JpegCompression,
    Noise,
}

impl Stage {
    /// Execution order.
    pub const PIPELINE: [Stage; 6] = [
        Stage::Perspective,
        Stage::Illumination,
        Stage::Blur,
        Stage::BrightnessContrast,
        Stage::JpegCompression,
        Stage::Noise,
    ];

    pub fn is_geometric(self) -> bool {
        matches!(self, Stage::Perspective)
    }

    pub fn description(self) -> &'static str {
        match self {
            Stage::Perspective => "Perspective distortion",
            Stage::Illumination => "Illumination gradient",
            Stage::Blur => "Gaussian blur",
            Stage::BrightnessContrast => "Brightness / contrast jitter",
            Stage::JpegCompression => "JPEG compression",
            Stage::Noise => "Gaussian noise (optional)",
        }
    }
}

pub struct Augmenter {
    config: AugmentationConfig,
    noise: Normal<f32>,
}

impl Augmenter {
    pub fn new(config: AugmentationConfig) -> Result<Augmenter> {
        config.validate()?;
        let noise = Normal::new(0., config.noise_std)
            .map_err(|e| InvoiceYoloError::InvalidConfig(format!("noise_std: {}", e)))?;
        let augmenter = Augmenter { config, noise };
        info!("Augmentation stages: {}", augmenter.stage_summary());
        Ok(augmenter)
    }

    /// The stages that run, in order, or `none`.
    pub fn stage_summary(&self) -> String {
        let names: Vec<&str> = self.stages().map(Stage::description).collect();
        if names.is_empty() {
            "none".to_string()
        } else {
            names.join(", ")
        }
    }

    fn stages(&self) -> impl Iterator<Item = Stage> + '_ {
        Stage::PIPELINE
            .iter()
            .copied()
            .filter(move |stage| self.config.stages.contains(stage))
    }

    pub fn config(&self) -> &AugmentationConfig {
        &self.config
    }

    /// Returns a new image of the same size and the boxes that survived the
    /// warp. The inputs are left untouched.
    pub fn augment<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        image: &RgbImage,
        labels: &[YoloBbox],
    ) -> LabeledImage {
        let mut sample = LabeledImage::new(image.clone(), labels.to_vec());
        for stage in self.stages() {
            debug!("{}", stage.description());
            sample = self.apply(stage, rng, sample);
        }
        sample
    }

    pub fn augment_labeled<R: Rng + ?Sized>(&self, rng: &mut R, input: &LabeledImage) -> LabeledImage {
        self.augment(rng, &input.image, &input.labels)
    }

    fn apply<R: Rng + ?Sized>(&self, stage: Stage, rng: &mut R, sample: LabeledImage) -> LabeledImage {
        let LabeledImage { image, labels } = sample;
        let config = &self.config;
        let image = match stage {
            Stage::Perspective => {
                let warped = random_perspective(&image, &labels, config.max_shift, rng);
                if warped.labels.len() < labels.len() {
                    debug!(
                        "Dropped {} of {} boxes after warp",
                        labels.len() - warped.labels.len(),
                        labels.len()
                    );
                }
                return warped;
            }
            Stage::Illumination => random_illumination(&image, config.illumination_strength, rng),
            Stage::Blur => random_blur(&image, &config.blur_kernel_sizes, rng),
            Stage::BrightnessContrast => {
                random_brightness_contrast(&image, config.contrast_alpha, config.brightness_beta, rng)
            }
            Stage::JpegCompression => match random_jpeg_roundtrip(&image, config.jpeg_quality, rng) {
                Ok(compressed) => compressed,
                Err(e) => {
                    warn!("JPEG round trip failed, keeping image as is: {}", e);
                    image
                }
            },
            Stage::Noise => random_noise(&image, config.noise_probability, &self.noise, rng),
        };
        LabeledImage { image, labels }
    }
}

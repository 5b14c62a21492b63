//! Data preparation for the invoice text detector.
//!
//! ```text
//! PDF ─▶ pdf2img ─▶ extract_words ─▶ annotations2yolo ─▶ split_dataset ─▶ augment_dataset ─▶ yolo_trainer
//! ```
//!
//! The only stage with real geometry in it is the augmenter in
//! [`dataset::data_augmenters`]; everything else moves files between the
//! on-disk layouts described in [`config::DatasetLayout`].

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod training;

pub use config::{
    AugmentationConfig, DatasetLayout, PipelineConfig, RenderConfig, SplitConfig, TrainingConfig,
};
pub use dataset::common_structs::{LabeledImage, YoloBbox};
pub use dataset::data_augmenters::{Augmenter, Stage};
pub use error::{InvoiceYoloError, Result};

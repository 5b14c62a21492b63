//! Error type shared by the library.
//!
//! Batch drivers only return these for problems that stop the whole run
//! (bad config, unwritable output, no GPU). A single bad page or image is
//! logged with `warn!` and skipped instead.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, InvoiceYoloError>;

#[derive(Debug, Error)]
pub enum InvoiceYoloError {
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image error on '{path}': {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Invalid JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Page images must be named `<pdf>_page<N>.<ext>`.
    #[error("Not a page image name: '{name}'")]
    InvalidPageImageName { name: String },

    #[error("PDF engine error: {0}")]
    Pdf(String),

    #[error("No compute accelerator available: {0}")]
    NoAccelerator(String),

    #[error("Training process exited with {status}")]
    TrainingFailed { status: String },
}

impl InvoiceYoloError {
    /// Maps a `NotFound` I/O error to [`InvoiceYoloError::FileNotFound`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            InvoiceYoloError::FileNotFound { path }
        } else {
            InvoiceYoloError::Io { path, source }
        }
    }

    pub fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        InvoiceYoloError::Image {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        InvoiceYoloError::Json {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_io_error_becomes_file_not_found() {
        let err = InvoiceYoloError::io(
            "data/missing.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        match err {
            InvoiceYoloError::FileNotFound { path } => {
                assert_eq!(path, PathBuf::from("data/missing.json"))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn other_io_errors_keep_their_source() {
        let err = InvoiceYoloError::io(
            "out",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(err.to_string().contains("nope"), "got: {}", err);
    }

    #[test]
    fn training_failure_display() {
        let err = InvoiceYoloError::TrainingFailed {
            status: "exit status: 2".into(),
        };
        assert!(err.to_string().contains("exit status: 2"));
    }
}

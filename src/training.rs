//! Detector training, delegated to the external `yolo` command line trainer.

use crate::config::TrainingConfig;
use crate::error::{InvoiceYoloError, Result};
use std::process::{Command, Stdio};
use tracing::info;

pub const TRAINER_COMMAND: &str = "yolo";

/// Name of the first CUDA device. Training without one is not supported.
pub fn check_accelerator() -> Result<String> {
    let output = Command::new("nvidia-smi")
        .arg("-L")
        .stderr(Stdio::null())
        .output()
        .map_err(|e| InvoiceYoloError::NoAccelerator(format!("nvidia-smi: {}", e)))?;
    if !output.status.success() {
        return Err(InvoiceYoloError::NoAccelerator(format!(
            "nvidia-smi exited with {}",
            output.status
        )));
    }
    first_gpu(&String::from_utf8_lossy(&output.stdout))
        .ok_or_else(|| InvoiceYoloError::NoAccelerator("no GPU listed by nvidia-smi".to_string()))
}

/// `GPU 0: NVIDIA GeForce GTX 1050 (UUID: ...)` -> `NVIDIA GeForce GTX 1050`
fn first_gpu(listing: &str) -> Option<String> {
    listing
        .lines()
        .find(|line| line.starts_with("GPU "))
        .map(|line| {
            let name = line.split_once(": ").map(|(_, rest)| rest).unwrap_or(line);
            name.split(" (UUID").next().unwrap_or(name).trim().to_string()
        })
}

impl TrainingConfig {
    /// Arguments for `yolo`, in its `key=value` syntax.
    pub fn to_args(&self) -> Vec<String> {
        vec![
            "detect".to_string(),
            "train".to_string(),
            format!("model={}", self.model.display()),
            format!("data={}", self.data.display()),
            format!("epochs={}", self.epochs),
            format!("imgsz={}", self.image_size),
            format!("batch={}", self.batch),
            format!("workers={}", self.workers),
            format!("device={}", self.device),
            format!("amp={}", python_bool(self.amp)),
            format!("project={}", self.project.display()),
            format!("name={}", self.name),
            format!("exist_ok={}", python_bool(self.exist_ok)),
            "verbose=True".to_string(),
        ]
    }
}

fn python_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Runs the trainer in the foreground with inherited stdio. Results end up
/// in `<project>/<name>`.
pub fn train(config: &TrainingConfig) -> Result<()> {
    if !config.data.exists() {
        return Err(InvoiceYoloError::FileNotFound {
            path: config.data.clone(),
        });
    }
    let gpu = check_accelerator()?;
    info!("Using GPU: {}", gpu);

    let args = config.to_args();
    info!("Running {} {}", TRAINER_COMMAND, args.join(" "));
    let status = Command::new(TRAINER_COMMAND)
        .args(&args)
        .status()
        .map_err(|e| InvoiceYoloError::TrainingFailed {
            status: format!("could not start {}: {}", TRAINER_COMMAND, e),
        })?;
    if !status.success() {
        return Err(InvoiceYoloError::TrainingFailed {
            status: status.to_string(),
        });
    }
    info!(
        "Training finished, results in {}",
        config.project.join(&config.name).display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_args() {
        let args = TrainingConfig::default().to_args();
        assert_eq!(&args[..2], &["detect", "train"]);
        for expected in [
            "model=models/yolov8n.pt",
            "data=data/yolo_dataset/data.yaml",
            "epochs=50",
            "imgsz=640",
            "batch=4",
            "workers=2",
            "device=0",
            "amp=True",
            "project=outputs/yolo_results",
            "name=invoice_yolo",
            "exist_ok=True",
        ] {
            assert!(args.iter().any(|a| a == expected), "missing {}", expected);
        }
    }

    #[test]
    fn parses_gpu_listing() {
        let listing = "GPU 0: NVIDIA GeForce GTX 1050 (UUID: GPU-1234)\nGPU 1: Other (UUID: GPU-5678)\n";
        assert_eq!(first_gpu(listing).as_deref(), Some("NVIDIA GeForce GTX 1050"));
        assert_eq!(first_gpu("No devices were found\n"), None);
    }

    #[test]
    fn missing_descriptor_fails_before_anything_runs() {
        let config = TrainingConfig {
            data: PathBuf::from("does/not/exist/data.yaml"),
            ..Default::default()
        };
        assert!(matches!(
            train(&config),
            Err(InvoiceYoloError::FileNotFound { .. })
        ));
    }
}

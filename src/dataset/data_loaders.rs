use crate::error::{InvoiceYoloError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub mod yolo_dataset_loader;

/// Files in `dir` whose extension is one of `extensions` (case insensitive), sorted by name.
pub fn list_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| InvoiceYoloError::io(dir, e))?;
    let mut files = vec![];
    for entry in entries {
        let path = entry.map_err(|e| InvoiceYoloError::io(dir, e))?.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false);
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

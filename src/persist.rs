use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::predict::PredictionResult;

const FILE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PredictionFile {
    version: u32,
    generated_at: String,
    predictions: Vec<PredictionResult>,
}

/// Writes predictions as pretty JSON. An existing file is copied to `<stem>.bak.json`,
/// and the new content lands through a temp file and rename. On failure the previous
/// file stays at `path` and no temp file is left behind.
pub fn save_predictions(path: &Path, predictions: &[PredictionResult]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let file = PredictionFile {
        version: FILE_VERSION,
        generated_at: chrono::Utc::now().to_rfc3339(),
        predictions: predictions.to_vec(),
    };
    let json = serde_json::to_string_pretty(&file).context("serialize predictions")?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).context("write predictions")?;
    if let Err(err) = swap_in(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    info!("saved {} predictions to {}", predictions.len(), path.display());
    Ok(())
}

fn swap_in(tmp: &Path, path: &Path) -> Result<()> {
    if path.exists() {
        let backup = backup_path(path);
        fs::copy(path, &backup).with_context(|| format!("copy backup {}", backup.display()))?;
    }
    fs::rename(tmp, path).context("swap predictions")
}

/// Reads a file written by [`save_predictions`], or a bare JSON array of predictions.
pub fn load_predictions(path: &Path) -> Result<Vec<PredictionResult>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read predictions {}", path.display()))?;
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("invalid predictions array");
    }
    let file: PredictionFile = serde_json::from_str(trimmed).context("invalid predictions file")?;
    Ok(file.predictions)
}

pub fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "predictions".to_string());
    path.with_file_name(format!("{stem}.bak.json"))
}

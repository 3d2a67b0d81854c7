use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::ocr::ClusterReport;

#[derive(Debug, Clone)]
pub struct OcrDebugConfig {
    output_dir: PathBuf,
    base_name: String,
}

impl OcrDebugConfig {
    pub fn json_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_clusters.json", self.base_name))
    }
}

/// Debug files land in the cache dir, named after the input file.
pub fn build_ocr_debug_config(src_path: Option<&Path>) -> Result<OcrDebugConfig> {
    let base = src_path
        .and_then(|path| path.file_stem())
        .and_then(|value| value.to_str())
        .unwrap_or("stdin");
    let dir = default_debug_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create debug dir: {}", dir.display()))?;
    Ok(OcrDebugConfig {
        output_dir: dir,
        base_name: sanitize_filename_component(base),
    })
}

pub fn write_cluster_debug(config: &OcrDebugConfig, report: &ClusterReport) -> Result<PathBuf> {
    let path = config.json_path();
    let json = serde_json::to_string_pretty(report)
        .with_context(|| "failed to serialize cluster report")?;
    std::fs::write(&path, json)
        .with_context(|| format!("failed to write debug json: {}", path.display()))?;
    Ok(path)
}

fn default_debug_dir() -> PathBuf {
    match crate::settings::home_dir() {
        Some(home) => home.join(".cache").join("ocr"),
        None => Path::new(".handwriting-ocr-rust/.cache/ocr").to_path_buf(),
    }
}

fn sanitize_filename_component(value: &str) -> String {
    let mut out = String::new();
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
        } else if ch.is_whitespace() {
            out.push('_');
        }
    }
    if out.is_empty() {
        "input".to_string()
    } else {
        out
    }
}

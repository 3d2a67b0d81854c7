use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ocr::{ClusterParams, ImageSize};
use crate::vision::DEFAULT_MAX_WORDS;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:11400";

#[derive(Debug, Clone)]
pub struct Settings {
    pub cluster: ClusterParams,
    pub default_image: ImageSize,
    pub vision_max_words: usize,
    pub server_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cluster: ClusterParams::default(),
            default_image: ImageSize::default(),
            vision_max_words: DEFAULT_MAX_WORDS,
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    cluster: Option<ClusterSettings>,
    image: Option<ImageSettings>,
    vision: Option<VisionSettings>,
    server: Option<ServerSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ClusterSettings {
    strict_distance_factor: Option<f64>,
    overlap_ratio_threshold: Option<f64>,
    relaxed_distance_factor: Option<f64>,
    gap_factor: Option<f64>,
    slope_epsilon: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ImageSettings {
    default_width: Option<f64>,
    default_height: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct VisionSettings {
    max_words: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            settings
                .merge_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
        }
    }

    Ok(settings)
}

impl Settings {
    pub fn merge_str(&mut self, content: &str) -> Result<()> {
        let parsed: SettingsFile = toml::from_str(content)?;
        self.merge(parsed);
        Ok(())
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(cluster) = incoming.cluster {
            let params = &mut self.cluster;
            merge_positive(&mut params.strict_distance_factor, cluster.strict_distance_factor);
            merge_non_negative(&mut params.overlap_ratio_threshold, cluster.overlap_ratio_threshold);
            merge_positive(&mut params.relaxed_distance_factor, cluster.relaxed_distance_factor);
            merge_positive(&mut params.gap_factor, cluster.gap_factor);
            merge_positive(&mut params.slope_epsilon, cluster.slope_epsilon);
        }
        if let Some(image) = incoming.image {
            merge_positive(&mut self.default_image.width, image.default_width);
            merge_positive(&mut self.default_image.height, image.default_height);
        }
        if let Some(vision) = incoming.vision {
            if let Some(limit) = vision.max_words {
                if limit > 0 {
                    self.vision_max_words = limit;
                }
            }
        }
        if let Some(server) = incoming.server {
            if let Some(addr) = server.addr {
                if !addr.trim().is_empty() {
                    self.server_addr = addr.trim().to_string();
                }
            }
        }
    }
}

fn merge_positive(target: &mut f64, value: Option<f64>) {
    if let Some(value) = value {
        if value.is_finite() && value > 0.0 {
            *target = value;
        }
    }
}

/// Zero is meaningful here: any overlap at all unlocks the relaxed distance.
fn merge_non_negative(target: &mut f64, value: Option<f64>) {
    if let Some(value) = value {
        if value.is_finite() && value >= 0.0 {
            *target = value;
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

pub(crate) fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".handwriting-ocr-rust"))
        }
    })
}

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

pub mod logging;
pub mod ocr;
pub mod server;
pub mod settings;
mod test_util;
pub mod vision;

pub use ocr::{
    ClusterDebug, ClusterOutput, ClusterParams, ClusterReport, ImageSize, LineReport, PlacedText,
    Point, WordDetection, cluster_report, cluster_text, cluster_text_with,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    #[default]
    Auto,
    Words,
    Vision,
}

impl FromStr for InputFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "words" => Ok(Self::Words),
            "vision" => Ok(Self::Vision),
            other => Err(anyhow!(
                "unknown input format: {} (expected auto, words or vision)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub data: Option<String>,
    pub format: InputFormat,
    pub image: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub settings_path: Option<String>,
    pub debug_ocr: bool,
    pub compact: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WordsInput {
    Bare(Vec<WordDetection>),
    Wrapped {
        words: Vec<WordDetection>,
        #[serde(rename = "imageWidth")]
        image_width: Option<f64>,
        #[serde(rename = "imageHeight")]
        image_height: Option<f64>,
    },
}

struct DecodedInput {
    words: Vec<WordDetection>,
    width: Option<f64>,
    height: Option<f64>,
}

/// Reads detections from `config.data` (or `input`), clusters them and
/// returns the JSON response body.
pub fn run(config: Config, input: Option<String>) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;

    let raw = match config.data.as_deref() {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input: {}", path))?,
        None => input.unwrap_or_default(),
    };
    if raw.trim().is_empty() {
        return Err(anyhow!("input is empty"));
    }

    let decoded = decode_input(&raw, config.format, settings.vision_max_words)?;
    ocr::validate_words(&decoded.words)?;
    let image = resolve_image_size(&config, &decoded, settings.default_image)?;

    let report = ocr::cluster_report(&decoded.words, image, &settings.cluster);
    info!(
        "clustered {} words into {} segments on {} lines",
        report.output.debug.total_words,
        report.output.debug.total_clusters,
        report.lines.len()
    );
    if config.debug_ocr {
        let debug_config =
            ocr::debug::build_ocr_debug_config(config.data.as_deref().map(Path::new))?;
        let path = ocr::debug::write_cluster_debug(&debug_config, &report)?;
        info!("wrote cluster debug: {}", path.display());
    }

    let rendered = if config.compact {
        serde_json::to_string(&report.output)
    } else {
        serde_json::to_string_pretty(&report.output)
    };
    rendered.with_context(|| "failed to serialize output")
}

fn decode_input(raw: &str, format: InputFormat, max_words: usize) -> Result<DecodedInput> {
    let value: serde_json::Value =
        serde_json::from_str(raw).with_context(|| "input is not valid JSON")?;
    let format = match format {
        InputFormat::Auto if looks_like_vision(&value) => InputFormat::Vision,
        InputFormat::Auto => InputFormat::Words,
        other => other,
    };

    if format == InputFormat::Vision {
        let width = value.get("imageWidth").and_then(|value| value.as_f64());
        let height = value.get("imageHeight").and_then(|value| value.as_f64());
        let response = vision::parse_annotate_value(value)?;
        let parsed = vision::words_from_response(response, max_words)?;
        return Ok(DecodedInput {
            words: parsed.words,
            width: parsed.image.map(|size| size.width).or(width),
            height: parsed.image.map(|size| size.height).or(height),
        });
    }

    let input: WordsInput =
        serde_json::from_value(value).with_context(|| "failed to parse word detections")?;
    Ok(match input {
        WordsInput::Bare(words) => DecodedInput {
            words,
            width: None,
            height: None,
        },
        WordsInput::Wrapped {
            words,
            image_width,
            image_height,
        } => DecodedInput {
            words,
            width: image_width,
            height: image_height,
        },
    })
}

fn looks_like_vision(value: &serde_json::Value) -> bool {
    value.get("responses").is_some() || value.get("textAnnotations").is_some()
}

/// Flags beat the image file, which beats sizes carried by the input.
fn resolve_image_size(
    config: &Config,
    decoded: &DecodedInput,
    fallback: ImageSize,
) -> Result<ImageSize> {
    let base = match config.image.as_deref() {
        Some(path) => {
            let (width, height) = image::image_dimensions(path)
                .with_context(|| format!("failed to read image dimensions: {}", path))?;
            ImageSize::new(width as f64, height as f64)
        }
        None => ImageSize::new(
            decoded.width.unwrap_or(fallback.width),
            decoded.height.unwrap_or(fallback.height),
        ),
    };
    Ok(ImageSize::new(
        config.width.unwrap_or(base.width),
        config.height.unwrap_or(base.height),
    ))
}

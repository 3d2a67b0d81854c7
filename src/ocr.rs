pub mod debug;
mod engine;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

pub const DEFAULT_IMAGE_EDGE: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A single OCR token with the quadrilateral reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordDetection {
    pub text: String,
    pub corners: [Point; 4],
}

impl WordDetection {
    /// Builds a detection from an axis-aligned box given by its top-left corner.
    pub fn from_rect(
        text: impl Into<String>,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    ) -> Self {
        Self {
            text: text.into(),
            corners: [
                Point::new(left, top),
                Point::new(left + width, top),
                Point::new(left + width, top + height),
                Point::new(left, top + height),
            ],
        }
    }

    /// Builds an axis-aligned detection around a center point.
    pub fn centered(
        text: impl Into<String>,
        cx: f64,
        cy: f64,
        width: f64,
        height: f64,
    ) -> Self {
        Self::from_rect(text, cx - width / 2.0, cy - height / 2.0, width, height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

impl Default for ImageSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_IMAGE_EDGE,
            height: DEFAULT_IMAGE_EDGE,
        }
    }
}

impl ImageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Replaces unusable edges with the default so normalization stays finite.
    pub fn sanitized(self) -> Self {
        let fix = |value: f64| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                DEFAULT_IMAGE_EDGE
            }
        };
        Self {
            width: fix(self.width),
            height: fix(self.height),
        }
    }
}

/// One returned phrase: text plus its centroid in percent of the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedText {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDebug {
    pub total_words: usize,
    pub total_clusters: usize,
    pub image_size: ImageSize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterOutput {
    pub texts: Vec<PlacedText>,
    pub debug: ClusterDebug,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineReport {
    /// Input indices of the member words, in reading order per segment.
    pub segments: Vec<Vec<usize>>,
    pub slope: f64,
    pub intercept: f64,
    pub center_y: f64,
    pub avg_height: f64,
    pub rtl: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterReport {
    pub output: ClusterOutput,
    pub lines: Vec<LineReport>,
}

/// Thresholds of the clustering pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterParams {
    /// A word joins a line when its distance is within this many heights.
    pub strict_distance_factor: f64,
    /// Vertical overlap ratio that unlocks the relaxed distance.
    pub overlap_ratio_threshold: f64,
    pub relaxed_distance_factor: f64,
    /// Gap threshold factor, applied to word length and line height.
    pub gap_factor: f64,
    pub slope_epsilon: f64,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            strict_distance_factor: 0.75,
            overlap_ratio_threshold: 0.35,
            relaxed_distance_factor: 1.1,
            gap_factor: 0.9,
            slope_epsilon: 0.0001,
        }
    }
}

pub fn cluster_text(words: &[WordDetection], image: ImageSize) -> ClusterOutput {
    cluster_text_with(words, image, &ClusterParams::default())
}

pub fn cluster_text_with(
    words: &[WordDetection],
    image: ImageSize,
    params: &ClusterParams,
) -> ClusterOutput {
    engine::run(words, image, params).output
}

/// Runs the pass and keeps per-line diagnostics next to the output.
pub fn cluster_report(
    words: &[WordDetection],
    image: ImageSize,
    params: &ClusterParams,
) -> ClusterReport {
    engine::run(words, image, params)
}

pub fn validate_words(words: &[WordDetection]) -> Result<()> {
    for (idx, word) in words.iter().enumerate() {
        if word
            .corners
            .iter()
            .any(|point| !point.x.is_finite() || !point.y.is_finite())
        {
            return Err(anyhow!(
                "word #{} ({:?}) has non-finite corner coordinates",
                idx,
                word.text
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_replaces_unusable_edges() {
        let size = ImageSize::new(0.0, f64::NAN).sanitized();
        assert_eq!(size, ImageSize::default());
        let size = ImageSize::new(640.0, -3.0).sanitized();
        assert_eq!(size, ImageSize::new(640.0, DEFAULT_IMAGE_EDGE));
    }

    #[test]
    fn validate_words_rejects_infinite_corners() {
        let mut word = WordDetection::from_rect("a", 0.0, 0.0, 10.0, 10.0);
        assert!(validate_words(std::slice::from_ref(&word)).is_ok());
        word.corners[2].x = f64::INFINITY;
        let err = validate_words(&[word]).expect_err("infinite corner");
        assert!(err.to_string().contains("word #0"));
    }

    #[test]
    fn output_serializes_camel_case_debug() {
        let output = cluster_text(&[], ImageSize::new(800.0, 600.0));
        let value = serde_json::to_value(&output).expect("serialize");
        assert_eq!(value["debug"]["totalWords"], 0);
        assert_eq!(value["debug"]["totalClusters"], 0);
        assert_eq!(value["debug"]["imageSize"]["width"], 800.0);
        assert!(value["texts"].as_array().expect("texts").is_empty());
    }
}

//! Adapter for Google Cloud Vision `images:annotate` responses.
//!
//! Only the parts needed to rebuild word detections are modelled; everything
//! else in the payload is ignored.

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tracing::warn;

use crate::ocr::{ImageSize, Point, WordDetection};

pub const DEFAULT_MAX_WORDS: usize = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateResponse {
    #[serde(default)]
    pub text_annotations: Vec<TextAnnotation>,
    pub full_text_annotation: Option<FullTextAnnotation>,
    pub error: Option<VisionError>,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    responses: Vec<AnnotateResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnnotation {
    #[serde(default)]
    pub description: String,
    pub bounding_poly: Option<BoundingPoly>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BoundingPoly {
    #[serde(default)]
    pub vertices: Vec<Vertex>,
}

/// Vision omits zero coordinates, so both default to 0.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct Vertex {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

#[derive(Debug, Deserialize)]
pub struct FullTextAnnotation {
    #[serde(default)]
    pub pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
pub struct Page {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct VisionError {
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisionWords {
    pub words: Vec<WordDetection>,
    /// Page size reported by the provider, if any.
    pub image: Option<ImageSize>,
}

/// Accepts either the batch envelope or a single response object.
pub fn parse_annotate_value(value: serde_json::Value) -> Result<AnnotateResponse> {
    if value.get("responses").is_some() {
        let batch: BatchResponse =
            serde_json::from_value(value).with_context(|| "failed to parse vision batch response")?;
        return batch
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("vision response contains no results"));
    }
    serde_json::from_value(value).with_context(|| "failed to parse vision response")
}

/// Converts word annotations into detections. `max_words` caps the provider
/// entries read after the full-text block, so malformed entries still count
/// toward it.
pub fn words_from_response(response: AnnotateResponse, max_words: usize) -> Result<VisionWords> {
    if let Some(err) = response.error {
        return Err(anyhow!(
            "vision error{}: {}",
            err.code.map(|code| format!(" {}", code)).unwrap_or_default(),
            err.message.trim()
        ));
    }

    let image = response
        .full_text_annotation
        .as_ref()
        .and_then(|full| full.pages.first())
        .and_then(|page| match (page.width, page.height) {
            (Some(width), Some(height)) => Some(ImageSize::new(width, height)),
            _ => None,
        });

    let mut words = Vec::new();
    // The first annotation is the whole text block.
    for (idx, annotation) in response
        .text_annotations
        .into_iter()
        .enumerate()
        .skip(1)
        .take(max_words)
    {
        let vertices = annotation
            .bounding_poly
            .map(|poly| poly.vertices)
            .unwrap_or_default();
        if vertices.len() < 4 {
            warn!(
                "skipping vision annotation {} ({:?}): {} vertices",
                idx,
                annotation.description,
                vertices.len()
            );
            continue;
        }
        let corner = |vertex: &Vertex| Point::new(vertex.x, vertex.y);
        words.push(WordDetection {
            text: annotation.description,
            corners: [
                corner(&vertices[0]),
                corner(&vertices[1]),
                corner(&vertices[2]),
                corner(&vertices[3]),
            ],
        });
    }

    Ok(VisionWords { words, image })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn annotation(text: &str, x: f64, y: f64) -> serde_json::Value {
        json!({
            "description": text,
            "boundingPoly": { "vertices": [
                { "x": x, "y": y },
                { "x": x + 40.0, "y": y },
                { "x": x + 40.0, "y": y + 20.0 },
                { "x": x, "y": y + 20.0 }
            ]}
        })
    }

    #[test]
    fn batch_envelope_skips_full_text_block() {
        let value = json!({
            "responses": [{
                "textAnnotations": [
                    { "description": "lace hem\n", "boundingPoly": { "vertices": [] } },
                    annotation("lace", 10.0, 10.0),
                    annotation("hem", 60.0, 10.0)
                ],
                "fullTextAnnotation": { "pages": [{ "width": 640, "height": 480 }] }
            }]
        });
        let response = parse_annotate_value(value).expect("parse");
        let parsed = words_from_response(response, DEFAULT_MAX_WORDS).expect("words");
        assert_eq!(parsed.words.len(), 2);
        assert_eq!(parsed.words[0].text, "lace");
        assert_eq!(parsed.words[1].corners[2], Point::new(100.0, 30.0));
        assert_eq!(parsed.image, Some(ImageSize::new(640.0, 480.0)));
    }

    #[test]
    fn omitted_coordinates_read_as_zero() {
        let value = json!({
            "textAnnotations": [
                { "description": "all" },
                { "description": "top", "boundingPoly": { "vertices": [
                    {}, { "x": 30 }, { "x": 30, "y": 12 }, { "y": 12 }
                ]}}
            ]
        });
        let response = parse_annotate_value(value).expect("parse");
        let parsed = words_from_response(response, DEFAULT_MAX_WORDS).expect("words");
        assert_eq!(parsed.words[0].corners[0], Point::new(0.0, 0.0));
        assert_eq!(parsed.words[0].corners[3], Point::new(0.0, 12.0));
        assert_eq!(parsed.image, None);
    }

    #[test]
    fn cap_counts_provider_entries_including_skipped_ones() {
        let mut annotations = vec![json!({ "description": "all" })];
        annotations.push(json!({
            "description": "broken",
            "boundingPoly": { "vertices": [{ "x": 1, "y": 1 }] }
        }));
        for i in 0..5 {
            annotations.push(annotation(&format!("w{i}"), i as f64 * 50.0, 0.0));
        }
        let response = parse_annotate_value(json!({ "textAnnotations": annotations.clone() })).expect("parse");
        let parsed = words_from_response(response, 3).expect("words");
        let texts = parsed.words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, vec!["w0", "w1"]);

        let response = parse_annotate_value(json!({ "textAnnotations": annotations })).expect("parse");
        let parsed = words_from_response(response, DEFAULT_MAX_WORDS).expect("words");
        assert_eq!(parsed.words.len(), 5);
    }

    #[test]
    fn provider_error_is_reported() {
        let value = json!({ "error": { "code": 3, "message": "Bad image data." } });
        let response = parse_annotate_value(value).expect("parse");
        let err = words_from_response(response, DEFAULT_MAX_WORDS).expect_err("error");
        assert_eq!(err.to_string(), "vision error 3: Bad image data.");
    }

    #[test]
    fn empty_batch_is_an_error() {
        assert!(parse_annotate_value(json!({ "responses": [] })).is_err());
    }
}

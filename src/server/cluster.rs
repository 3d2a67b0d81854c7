use axum::http::StatusCode;
use tracing::info;

use crate::ocr::{self, ClusterOutput, ImageSize, WordDetection};
use crate::vision;

use super::models::ClusterRequest;
use super::state::ServerState;

#[derive(Debug)]
pub(crate) struct ServerError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl ServerError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

pub(crate) fn cluster_request(
    state: &ServerState,
    request: ClusterRequest,
) -> Result<ClusterOutput, ServerError> {
    let image = request_size(state, request.image_width, request.image_height, None);
    run_cluster(state, &request.words, image)
}

/// Vision page size wins over the request's fallback fields.
pub(crate) fn cluster_vision_request(
    state: &ServerState,
    payload: serde_json::Value,
) -> Result<ClusterOutput, ServerError> {
    let width = payload.get("imageWidth").and_then(|value| value.as_f64());
    let height = payload.get("imageHeight").and_then(|value| value.as_f64());
    let response = vision::parse_annotate_value(payload)
        .map_err(|err| ServerError::bad_request(format!("{:#}", err)))?;
    let parsed = vision::words_from_response(response, state.settings.vision_max_words)
        .map_err(|err| ServerError::bad_request(err.to_string()))?;
    let image = request_size(state, width, height, parsed.image);
    run_cluster(state, &parsed.words, image)
}

fn request_size(
    state: &ServerState,
    width: Option<f64>,
    height: Option<f64>,
    reported: Option<ImageSize>,
) -> ImageSize {
    if let Some(size) = reported {
        return size;
    }
    let fallback = state.settings.default_image;
    ImageSize::new(
        width.unwrap_or(fallback.width),
        height.unwrap_or(fallback.height),
    )
}

fn run_cluster(
    state: &ServerState,
    words: &[WordDetection],
    image: ImageSize,
) -> Result<ClusterOutput, ServerError> {
    ocr::validate_words(words).map_err(|err| ServerError::bad_request(err.to_string()))?;
    let output = ocr::cluster_text_with(words, image, &state.settings.cluster);
    info!(
        "clustered {} words into {} segments ({}x{})",
        output.debug.total_words,
        output.debug.total_clusters,
        output.debug.image_size.width,
        output.debug.image_size.height
    );
    Ok(output)
}

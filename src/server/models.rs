use serde::{Deserialize, Serialize};

use crate::ocr::{ClusterOutput, WordDetection};

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct ClusterRequest {
    pub(crate) words: Vec<WordDetection>,
    pub(crate) image_width: Option<f64>,
    pub(crate) image_height: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ServerResponse {
    pub(crate) success: bool,
    #[serde(flatten)]
    pub(crate) output: ClusterOutput,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) success: bool,
    pub(crate) error: String,
}

impl ErrorResponse {
    pub(crate) fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

//! Image endpoints (`/api/analyze-valve`, `/api/vision-analyze`) and the
//! OpenAI connection check.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::domain::image::ImageData;
use crate::domain::model::{AnalysisOutcome, ConnectionStatus, VisionAnnotations};

const ANALYZE_FAILURE: &str = "Error processing valve image";
const VISION_FAILURE: &str = "Error analyzing image";

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    /// `data:image/...;base64,...`; any other JSON type is an invalid image.
    #[serde(default)]
    pub image: Option<Value>,
}

impl ImageRequest {
    fn decode(&self) -> crate::Result<ImageData> {
        let data_url = match &self.image {
            Some(Value::String(s)) => s.as_str(),
            _ => "",
        };
        ImageData::from_data_url(data_url)
    }
}

/// Handler for `POST /api/analyze-valve`
pub async fn analyze_valve(
    State(state): State<AppState>,
    payload: Result<Json<ImageRequest>, JsonRejection>,
) -> Result<Json<AnalysisOutcome>, ApiError> {
    let Json(request) = payload.map_err(ApiError::bad_body)?;
    let image = request
        .decode()
        .map_err(|e| ApiError::scan_failure(ANALYZE_FAILURE, e))?;

    let outcome = state
        .service
        .analyze_valve(&image)
        .await
        .map_err(|e| ApiError::scan_failure(ANALYZE_FAILURE, e))?;

    Ok(Json(outcome))
}

/// Handler for `POST /api/vision-analyze`
pub async fn vision_analyze(
    State(state): State<AppState>,
    payload: Result<Json<ImageRequest>, JsonRejection>,
) -> Result<Json<VisionAnnotations>, ApiError> {
    let Json(request) = payload.map_err(ApiError::bad_body)?;
    let image = request
        .decode()
        .map_err(|e| ApiError::scan_failure(VISION_FAILURE, e))?;

    let annotations = state
        .service
        .annotate_image(&image)
        .await
        .map_err(|e| ApiError::scan_failure(VISION_FAILURE, e))?;

    Ok(Json(annotations))
}

/// Handler for `GET /api/test-openai`
pub async fn test_openai(State(state): State<AppState>) -> Json<ConnectionStatus> {
    Json(state.service.test_connection().await)
}

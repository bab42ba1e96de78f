use crate::adapters::{check_status, join_url};
use crate::config::toml_config::{GoogleVisionConfig, Secret};
use crate::domain::image::ImageData;
use crate::domain::model::{VisionAnnotations, ANNOTATION_SUCCESS_MESSAGE, NO_TEXT_FOUND};
use crate::domain::ports::ImageAnnotator;
use crate::utils::error::{GlanceError, Result};
use crate::utils::validation::validate_required_field;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

pub const PROVIDER: &str = "Google Vision";

const MAX_LABELS: usize = 10;
const MAX_LOGOS: usize = 5;

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    label_annotations: Vec<EntityAnnotation>,
    #[serde(default)]
    text_annotations: Vec<EntityAnnotation>,
    #[serde(default)]
    logo_annotations: Vec<EntityAnnotation>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    #[serde(default)]
    description: String,
}

/// `google.rpc.Status`; `code` is a gRPC code, not an HTTP status.
#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

impl Status {
    /// HTTP equivalent of the gRPC code, as Google documents for `google.rpc.Code`.
    fn http_status(&self) -> u16 {
        match self.code {
            1 => 499,
            3 | 9 | 11 => 400,
            4 => 504,
            5 => 404,
            6 | 10 => 409,
            7 => 403,
            8 => 429,
            12 => 501,
            14 => 503,
            16 => 401,
            _ => 500,
        }
    }
}

/// Google Cloud Vision `images:annotate` over REST with an API key.
pub struct GoogleVisionClient {
    client: Client,
    api_key: Secret,
    base_url: String,
}

impl GoogleVisionClient {
    pub fn new(client: Client, config: &GoogleVisionConfig) -> Result<Self> {
        let api_key = validate_required_field("google_vision.api_key", &config.api_key)?.clone();
        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.clone(),
        })
    }

    fn request_body(image: &ImageData) -> Value {
        json!({
            "requests": [{
                "image": { "content": image.to_base64() },
                "features": [
                    { "type": "LABEL_DETECTION", "maxResults": MAX_LABELS },
                    { "type": "TEXT_DETECTION" },
                    { "type": "LOGO_DETECTION", "maxResults": MAX_LOGOS }
                ]
            }]
        })
    }
}

impl From<AnnotateImageResponse> for VisionAnnotations {
    fn from(result: AnnotateImageResponse) -> Self {
        // 第一筆 textAnnotation 是整張圖的全文
        let text = result
            .text_annotations
            .first()
            .map(|a| a.description.trim())
            .filter(|t| !t.is_empty())
            .unwrap_or(NO_TEXT_FOUND)
            .to_string();

        Self {
            labels: result
                .label_annotations
                .into_iter()
                .take(MAX_LABELS)
                .map(|a| a.description)
                .collect(),
            text,
            logos: result
                .logo_annotations
                .into_iter()
                .take(MAX_LOGOS)
                .map(|a| a.description)
                .collect(),
            message: ANNOTATION_SUCCESS_MESSAGE.to_string(),
        }
    }
}

#[async_trait]
impl ImageAnnotator for GoogleVisionClient {
    async fn annotate(&self, image: &ImageData) -> Result<VisionAnnotations> {
        let url = join_url(&self.base_url, "images:annotate");
        tracing::debug!("Annotating {:?} via {}", image, url);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.expose())])
            .json(&Self::request_body(image))
            .send()
            .await?;
        let response = check_status(PROVIDER, response).await?;

        let body: AnnotateResponse = response.json().await?;
        let result = body.responses.into_iter().next().unwrap_or_default();

        if let Some(status) = &result.error {
            return Err(GlanceError::vendor(
                PROVIDER,
                status.http_status(),
                status.message.clone(),
            ));
        }

        Ok(result.into())
    }
}

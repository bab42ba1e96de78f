use crate::adapters::{check_status, join_url};
use crate::config::toml_config::{OpenAiConfig, Secret};
use crate::domain::image::ImageData;
use crate::domain::model::{AnalysisOutcome, ValveIdentification};
use crate::domain::ports::{ConnectionProbe, ValveAnalyzer};
use crate::utils::error::{GlanceError, Result};
use crate::utils::validation::validate_required_field;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

pub const PROVIDER: &str = "OpenAI";

const IDENTIFICATION_PROMPT: &str = "You are an industrial valve identification expert. \
Analyze the valve in this image and respond with a single JSON object with exactly these keys: \
\"size\" (nominal size, e.g. \"2 inch\"), \
\"material\" (body material), \
\"brand\" (manufacturer), \
\"partNumber\" (model or part number), \
\"specifications\" (object of camelCase keys to string values such as pressureRating, endConnection, temperatureRange, valveType), \
\"features\" (array of short strings), \
\"confidence\" (integer 0-100 for how sure you are). \
Use \"Unknown\" for anything you cannot read from the image. Do not add any other text.";

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI multimodal chat completion client.
pub struct OpenAiVisionClient {
    client: Client,
    api_key: Secret,
    model: String,
    base_url: String,
    max_tokens: u32,
}

impl OpenAiVisionClient {
    pub fn new(client: Client, config: &OpenAiConfig) -> Result<Self> {
        let api_key = validate_required_field("openai.api_key", &config.api_key)?.clone();
        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            max_tokens: config.max_tokens,
        })
    }

    fn request_body(&self, image: &ImageData) -> Value {
        json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "response_format": { "type": "json_object" },
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": IDENTIFICATION_PROMPT },
                    { "type": "image_url", "image_url": { "url": image.to_data_url() } }
                ]
            }]
        })
    }

    pub async fn identify(&self, image: &ImageData) -> Result<ValveIdentification> {
        let url = join_url(&self.base_url, "chat/completions");
        tracing::debug!(
            "Sending {:?} to {} ({})",
            image,
            url,
            self.model
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&self.request_body(image))
            .send()
            .await?;
        let response = check_status(PROVIDER, response).await?;

        let completion: ChatCompletionResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GlanceError::malformed(PROVIDER, "completion has no message content"))?;

        let raw = extract_json_content(&content)?;
        ValveIdentification::from_model_output(&raw)
            .ok_or_else(|| GlanceError::malformed(PROVIDER, "expected a JSON object"))
    }
}

/// Pulls the JSON object out of a model reply, tolerating ```json fences
/// and chatter around the object.
pub fn extract_json_content(content: &str) -> Result<Value> {
    let trimmed = strip_code_fence(content.trim());

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => serde_json::from_str(&trimmed[start..=end])
            .map_err(|e| GlanceError::malformed(PROVIDER, format!("invalid JSON content: {}", e))),
        _ => Err(GlanceError::malformed(
            PROVIDER,
            "reply does not contain a JSON object",
        )),
    }
}

fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    // 去掉語言標記 (```json)
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    rest.trim_end().trim_end_matches("```").trim()
}

#[async_trait]
impl ValveAnalyzer for OpenAiVisionClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn analyze(&self, image: &ImageData) -> Result<AnalysisOutcome> {
        self.identify(image).await.map(AnalysisOutcome::Identified)
    }
}

#[async_trait]
impl ConnectionProbe for OpenAiVisionClient {
    async fn check(&self) -> Result<()> {
        let url = join_url(&self.base_url, "models");
        let response = self
            .client
            .get(&url)
            .bearer_auth(self.api_key.expose())
            .send()
            .await?;
        check_status(PROVIDER, response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::image::ImageMime;
    use crate::domain::model::ConfidenceBand;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> OpenAiVisionClient {
        let config = OpenAiConfig {
            api_key: Some(Secret::new("sk-test")),
            base_url: server.url("/v1"),
            ..OpenAiConfig::default()
        };
        OpenAiVisionClient::new(Client::new(), &config).unwrap()
    }

    fn sample_image() -> ImageData {
        ImageData::new(ImageMime::Jpeg, vec![0xff, 0xd8, 0xff, 0xe0]).unwrap()
    }

    fn completion(content: &str) -> Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }

    #[test]
    fn test_extract_json_content_variants() {
        let plain = extract_json_content(r#"{"size": "1 inch"}"#).unwrap();
        assert_eq!(plain["size"], "1 inch");

        let fenced = extract_json_content("```json\n{\"brand\": \"Watts\"}\n```").unwrap();
        assert_eq!(fenced["brand"], "Watts");

        let chatty =
            extract_json_content("Here is the result: {\"material\": \"Brass\"} Hope it helps")
                .unwrap();
        assert_eq!(chatty["material"], "Brass");

        assert!(extract_json_content("I cannot identify this valve.").is_err());
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = OpenAiVisionClient::new(Client::new(), &OpenAiConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, GlanceError::MissingConfigError { .. }));
    }

    #[tokio::test]
    async fn test_identify_sends_image_and_parses_reply() {
        let server = MockServer::start();
        let content = json!({
            "size": "1 inch",
            "material": "Cast Iron",
            "brand": "Bluefin",
            "partNumber": "B2-100",
            "specifications": {"pressureRating": "150 PSI"},
            "features": ["Threaded connections"],
            "confidence": 88
        })
        .to_string();

        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer sk-test")
                .body_contains("data:image/jpeg;base64,/9j/4A==")
                .body_contains("\"model\":\"gpt-4o\"");
            then.status(200).json_body(completion(&content));
        });

        let id = client_for(&server).identify(&sample_image()).await.unwrap();

        mock.assert();
        assert_eq!(id.brand, "Bluefin");
        assert_eq!(id.part_number, "B2-100");
        assert_eq!(id.specifications["pressureRating"], "150 PSI");
        assert_eq!(id.confidence_band, ConfidenceBand::Medium);
    }

    #[tokio::test]
    async fn test_identify_surfaces_auth_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(401)
                .json_body(json!({"error": {"message": "Incorrect API key provided"}}));
        });

        let err = client_for(&server)
            .identify(&sample_image())
            .await
            .unwrap_err();
        assert!(err.is_auth_failure());
        assert!(err.to_string().contains("Incorrect API key"));
    }

    #[tokio::test]
    async fn test_identify_rejects_non_json_reply() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .json_body(completion("Sorry, I can't help with that."));
        });

        let err = client_for(&server)
            .identify(&sample_image())
            .await
            .unwrap_err();
        assert!(matches!(err, GlanceError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_probe_lists_models() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v1/models")
                .header("authorization", "Bearer sk-test");
            then.status(200).json_body(json!({"object": "list", "data": []}));
        });

        assert!(client_for(&server).check().await.is_ok());
        mock.assert();
    }
}

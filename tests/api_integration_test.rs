use base64::{engine::general_purpose::STANDARD, Engine};
use glance::api::{router, serve, AppState};
use glance::config::Secret;
use glance::{AnalyzerProvider, GlanceConfig, GlanceService};
use httpmock::prelude::*;
use serde_json::{json, Value};
use tokio::net::TcpListener;

const JPEG_BYTES: [u8; 4] = [0xff, 0xd8, 0xff, 0xe0];

fn jpeg_data_url() -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(JPEG_BYTES))
}

/// Config pointing every provider at `vendor`.
fn config_for(vendor: &MockServer) -> GlanceConfig {
    let mut config = GlanceConfig::default();
    config.openai.api_key = Some(Secret::new("sk-test"));
    config.openai.base_url = vendor.url("/v1");
    config.google_vision.api_key = Some(Secret::new("vision-key"));
    config.google_vision.base_url = vendor.url("/vision/v1");
    config.google_search.api_key = Some(Secret::new("search-key"));
    config.google_search.engine_id = Some("cx-test".to_string());
    config.google_search.base_url = vendor.base_url();
    config.analyzer.simulated_delay_ms = 0;
    config
}

async fn spawn_app(config: GlanceConfig) -> String {
    let service = GlanceService::from_config(&config).unwrap();
    let app = router(AppState::new(service), config.server.max_body_bytes);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn post_image(base: &str, path: &str, image: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{}{}", base, path))
        .json(&json!({ "image": image }))
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

async fn get_json(url: &str) -> (u16, Value) {
    let response = reqwest::get(url).await.unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_analyze_valve_with_openai() {
    let vendor = MockServer::start();
    let content = json!({
        "size": "1 inch",
        "material": "Cast Iron",
        "brand": "Bluefin",
        "partNumber": "B2-1",
        "specifications": { "pressureRating": "150 PSI", "connectionType": "Threaded" },
        "features": ["Manual operation", "Flow control capability"],
        "confidence": 91
    })
    .to_string();

    let openai = vendor.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .header("authorization", "Bearer sk-test")
            .body_contains(jpeg_data_url());
        then.status(200).json_body(json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        }));
    });

    let base = spawn_app(config_for(&vendor)).await;
    let (status, body) = post_image(&base, "/api/analyze-valve", json!(jpeg_data_url())).await;

    openai.assert();
    assert_eq!(status, 200);
    assert_eq!(body["brand"], "Bluefin");
    assert_eq!(body["partNumber"], "B2-1");
    assert_eq!(body["specifications"]["pressureRating"], "150 PSI");
    assert_eq!(body["features"].as_array().unwrap().len(), 2);
    assert_eq!(body["confidence"], 91.0);
    assert_eq!(body["confidenceBand"], "high");
}

#[tokio::test]
async fn test_analyze_valve_simulated_provider() {
    let vendor = MockServer::start();
    let mut config = config_for(&vendor);
    config.analyzer.provider = AnalyzerProvider::Simulated;

    let base = spawn_app(config).await;
    let (status, body) = post_image(&base, "/api/analyze-valve", json!(jpeg_data_url())).await;

    assert_eq!(status, 200);
    assert_eq!(body["matches"].as_array().unwrap().len(), 3);
    assert_eq!(body["matches"][0]["matchScore"], 95);
    assert_eq!(body["analysis"]["predicted_type"], "Control Valve");
}

#[tokio::test]
async fn test_analyze_valve_rejects_bad_images() {
    let vendor = MockServer::start();
    let openai = vendor.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200);
    });
    let base = spawn_app(config_for(&vendor)).await;

    let (status, body) = post_image(
        &base,
        "/api/analyze-valve",
        json!("data:image/gif;base64,R0lGODlhAQABAAAAACw="),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(
        body["message"],
        "Invalid image format. Only JPEG and PNG are supported."
    );

    let (status, _) = post_image(&base, "/api/analyze-valve", Value::Null).await;
    assert_eq!(status, 400);

    openai.assert_hits(0);
}

#[tokio::test]
async fn test_analyze_valve_vendor_failure() {
    let vendor = MockServer::start();
    vendor.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(429)
            .json_body(json!({ "error": { "message": "Rate limit reached" } }));
    });
    let base = spawn_app(config_for(&vendor)).await;

    let (status, body) = post_image(&base, "/api/analyze-valve", json!(jpeg_data_url())).await;
    assert_eq!(status, 500);
    assert_eq!(body["message"], "Error processing valve image");
    assert!(body["error"].as_str().unwrap().contains("Rate limit reached"));
}

#[tokio::test]
async fn test_scan_endpoints_reject_other_methods() {
    let vendor = MockServer::start();
    let base = spawn_app(config_for(&vendor)).await;

    for path in ["/api/analyze-valve", "/api/vision-analyze"] {
        let (status, body) = get_json(&format!("{}{}", base, path)).await;
        assert_eq!(status, 405);
        assert_eq!(body, json!({ "message": "Method not allowed" }));
    }
}

#[tokio::test]
async fn test_non_json_body_gets_json_error() {
    let vendor = MockServer::start();
    let base = spawn_app(config_for(&vendor)).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/vision-analyze", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_large_photos_fit_within_body_limit() {
    let vendor = MockServer::start();
    let mut config = config_for(&vendor);
    config.analyzer.provider = AnalyzerProvider::Simulated;
    config.server.max_body_bytes = 8 * 1024 * 1024;
    let base = spawn_app(config).await;

    // 3 MB 照片，超過 axum 預設上限
    let photo = vec![0xabu8; 3 * 1024 * 1024];
    let url = format!("data:image/jpeg;base64,{}", STANDARD.encode(&photo));
    let (status, _) = post_image(&base, "/api/analyze-valve", json!(url)).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_vision_analyze() {
    let vendor = MockServer::start();
    let vision = vendor.mock(|when, then| {
        when.method(POST)
            .path("/vision/v1/images:annotate")
            .query_param("key", "vision-key");
        then.status(200).json_body(json!({
            "responses": [{
                "labelAnnotations": [{ "description": "Valve" }, { "description": "Gas" }],
                "textAnnotations": [{ "description": "WATTS 600WOG" }],
                "logoAnnotations": [{ "description": "Watts" }]
            }]
        }));
    });
    let base = spawn_app(config_for(&vendor)).await;

    let (status, body) = post_image(&base, "/api/vision-analyze", json!(jpeg_data_url())).await;

    vision.assert();
    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "labels": ["Valve", "Gas"],
            "text": "WATTS 600WOG",
            "logos": ["Watts"],
            "message": "Image analyzed successfully"
        })
    );
}

#[tokio::test]
async fn test_vision_analyze_without_credentials() {
    let vendor = MockServer::start();
    let mut config = config_for(&vendor);
    config.google_vision.api_key = None;
    let base = spawn_app(config).await;

    let (status, body) = post_image(&base, "/api/vision-analyze", json!(jpeg_data_url())).await;
    assert_eq!(status, 500);
    assert_eq!(body["message"], "Error analyzing image");
    assert!(body["error"].as_str().unwrap().contains("Google Vision"));
}

#[tokio::test]
async fn test_valve_search() {
    let vendor = MockServer::start();
    let search = vendor.mock(|when, then| {
        when.method(GET)
            .path("/customsearch/v1")
            .query_param("cx", "cx-test")
            .query_param("q", "industrial valve butterfly Kitz 4 inch");
        then.status(200).json_body(json!({
            "items": [{
                "title": "Kitz 4\" Butterfly Valve",
                "link": "https://example.com/kitz",
                "snippet": "Lug style",
                "displayLink": "example.com",
                "pagemap": { "cse_image": [{ "src": "https://example.com/kitz.jpg" }] }
            }]
        }));
    });
    let base = spawn_app(config_for(&vendor)).await;

    let (status, body) = get_json(&format!(
        "{}/api/valve-search?query=butterfly&manufacturer=Kitz&type=all&size=4%20inch",
        base
    ))
    .await;

    search.assert();
    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!([{
            "title": "Kitz 4\" Butterfly Valve",
            "link": "https://example.com/kitz",
            "snippet": "Lug style",
            "image": "https://example.com/kitz.jpg",
            "source": "example.com"
        }])
    );
}

#[tokio::test]
async fn test_valve_search_errors() {
    let vendor = MockServer::start();
    vendor.mock(|when, then| {
        when.method(GET).path("/customsearch/v1");
        then.status(403).body("API key not valid");
    });
    let base = spawn_app(config_for(&vendor)).await;

    let (status, body) = get_json(&format!("{}/api/valve-search", base)).await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({ "error": "Search query is required" }));

    let (status, body) = get_json(&format!("{}/api/valve-search?query=gate", base)).await;
    assert_eq!(status, 500);
    assert_eq!(body, json!({ "error": "Failed to perform search" }));
}

#[tokio::test]
async fn test_openai_connection_check() {
    let vendor = MockServer::start();
    let models = vendor.mock(|when, then| {
        when.method(GET).path("/v1/models");
        then.status(200).json_body(json!({ "object": "list", "data": [] }));
    });
    let base = spawn_app(config_for(&vendor)).await;

    let (status, body) = get_json(&format!("{}/api/test-openai", base)).await;
    models.assert();
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "success": true }));
}

#[tokio::test]
async fn test_openai_connection_check_failure() {
    let vendor = MockServer::start();
    vendor.mock(|when, then| {
        when.method(GET).path("/v1/models");
        then.status(401).body("invalid_api_key");
    });
    let base = spawn_app(config_for(&vendor)).await;

    let (status, body) = get_json(&format!("{}/api/test-openai", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "OpenAI rejected the credentials");
}

#[tokio::test]
async fn test_health() {
    let vendor = MockServer::start();
    let mut config = config_for(&vendor);
    config.analyzer.provider = AnalyzerProvider::Simulated;
    let base = spawn_app(config).await;

    let (status, body) = get_json(&format!("{}/api/health", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["analyzer"], "simulated");
    assert!(body["uptime_seconds"].is_u64());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_unreachable_google_endpoints_do_not_expose_keys() {
    let vendor = MockServer::start();
    let mut config = config_for(&vendor);
    config.google_vision.api_key = Some(Secret::new("SUPER-SECRET-VISION-KEY"));
    config.google_vision.base_url = "http://127.0.0.1:1/v1".to_string();
    config.google_search.api_key = Some(Secret::new("SUPER-SECRET-SEARCH-KEY"));
    config.google_search.base_url = "http://127.0.0.1:1".to_string();
    let base = spawn_app(config).await;

    let (status, body) = post_image(&base, "/api/vision-analyze", json!(jpeg_data_url())).await;
    assert_eq!(status, 500);
    assert_eq!(body["message"], "Error analyzing image");
    let detail = body["error"].as_str().unwrap();
    assert!(detail.starts_with("API request failed"));
    assert!(!detail.contains("SUPER-SECRET-VISION-KEY"));
    assert!(!detail.contains("key="));

    let (status, body) = get_json(&format!("{}/api/valve-search?query=gate", base)).await;
    assert_eq!(status, 500);
    assert!(!body.to_string().contains("SUPER-SECRET-SEARCH-KEY"));
}

#[tokio::test]
async fn test_non_string_image_is_invalid_format() {
    let vendor = MockServer::start();
    let base = spawn_app(config_for(&vendor)).await;

    for path in ["/api/analyze-valve", "/api/vision-analyze"] {
        let (status, body) = post_image(&base, path, json!(123)).await;
        assert_eq!(status, 400);
        assert_eq!(
            body,
            json!({ "message": "Invalid image format. Only JPEG and PNG are supported." })
        );
    }
}

#[tokio::test]
async fn test_malformed_search_query_gets_json_error() {
    let vendor = MockServer::start();
    let search = vendor.mock(|when, then| {
        when.method(GET).path("/customsearch/v1");
        then.status(200).json_body(json!({}));
    });
    let base = spawn_app(config_for(&vendor)).await;

    let (status, body) =
        get_json(&format!("{}/api/valve-search?query=a&query=b", base)).await;
    assert_eq!(status, 400);
    assert!(body["error"].is_string());
    search.assert_hits(0);
}

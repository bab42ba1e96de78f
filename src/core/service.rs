use crate::adapters::google_search::GoogleSearchClient;
use crate::adapters::google_vision::GoogleVisionClient;
use crate::adapters::openai::OpenAiVisionClient;
use crate::adapters::simulated::SimulatedAnalyzer;
use crate::adapters::http_client;
use crate::config::toml_config::{AnalyzerProvider, GlanceConfig};
use crate::domain::image::ImageData;
use crate::domain::model::{
    AnalysisOutcome, ConnectionStatus, SearchQuery, SearchResult, VisionAnnotations,
};
use crate::domain::ports::{ConnectionProbe, ImageAnnotator, ValveAnalyzer, ValveSearcher};
use crate::utils::error::{GlanceError, Result};
use std::sync::Arc;
use std::time::Instant;

/// Entry point for every GLANCE operation, shared by the HTTP API and the CLI.
#[derive(Clone)]
pub struct GlanceService {
    analyzer: Arc<dyn ValveAnalyzer>,
    annotator: Option<Arc<dyn ImageAnnotator>>,
    searcher: Option<Arc<dyn ValveSearcher>>,
    probe: Option<Arc<dyn ConnectionProbe>>,
}

impl GlanceService {
    pub fn new(analyzer: Arc<dyn ValveAnalyzer>) -> Self {
        Self {
            analyzer,
            annotator: None,
            searcher: None,
            probe: None,
        }
    }

    pub fn with_annotator(mut self, annotator: Arc<dyn ImageAnnotator>) -> Self {
        self.annotator = Some(annotator);
        self
    }

    pub fn with_searcher(mut self, searcher: Arc<dyn ValveSearcher>) -> Self {
        self.searcher = Some(searcher);
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn ConnectionProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Wires the providers the configuration has credentials for.
    pub fn from_config(config: &GlanceConfig) -> Result<Self> {
        let client = http_client(config.request_timeout())?;

        // OpenAI 金鑰存在時，即使使用模擬分析也能測試連線
        let openai = match &config.openai.api_key {
            Some(_) => Some(Arc::new(OpenAiVisionClient::new(
                client.clone(),
                &config.openai,
            )?)),
            None => None,
        };

        let analyzer: Arc<dyn ValveAnalyzer> = match (config.analyzer.provider, &openai) {
            (AnalyzerProvider::OpenAi, Some(openai)) => openai.clone(),
            (AnalyzerProvider::OpenAi, None) => {
                return Err(GlanceError::MissingConfigError {
                    field: "openai.api_key".to_string(),
                })
            }
            (AnalyzerProvider::Simulated, _) => {
                Arc::new(SimulatedAnalyzer::new(config.simulated_delay()))
            }
        };

        let mut service = Self::new(analyzer);

        if let Some(openai) = openai {
            service = service.with_probe(openai);
        }

        if config.vision_enabled() {
            service = service.with_annotator(Arc::new(GoogleVisionClient::new(
                client.clone(),
                &config.google_vision,
            )?));
        } else {
            tracing::warn!("Google Vision API key not configured, image annotation disabled");
        }

        if config.search_enabled() {
            service = service.with_searcher(Arc::new(GoogleSearchClient::new(
                client,
                &config.google_search,
            )?));
        } else {
            tracing::warn!("Google Custom Search not configured, valve search disabled");
        }

        tracing::info!(
            "Analyzer: {}, annotation: {}, search: {}",
            service.analyzer_name(),
            service.annotator.is_some(),
            service.searcher.is_some()
        );

        Ok(service)
    }

    pub fn analyzer_name(&self) -> &str {
        self.analyzer.name()
    }

    pub async fn analyze_valve(&self, image: &ImageData) -> Result<AnalysisOutcome> {
        tracing::info!("Analyzing valve image with {}", self.analyzer.name());
        let started = Instant::now();

        let outcome = self.analyzer.analyze(image).await?;

        tracing::info!("Valve analysis finished in {:?}", started.elapsed());
        Ok(outcome)
    }

    pub async fn annotate_image(&self, image: &ImageData) -> Result<VisionAnnotations> {
        let annotator = self
            .annotator
            .as_ref()
            .ok_or_else(|| GlanceError::ConfigError {
                message: "Google Vision is not configured".to_string(),
            })?;

        tracing::info!("Annotating image");
        let annotations = annotator.annotate(image).await?;
        tracing::info!(
            "Found {} labels and {} logos",
            annotations.labels.len(),
            annotations.logos.len()
        );
        Ok(annotations)
    }

    pub async fn search_valves(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        if query.text().is_empty() {
            return Err(GlanceError::ValidationError {
                message: "Search query is required".to_string(),
            });
        }

        let searcher = self
            .searcher
            .as_ref()
            .ok_or_else(|| GlanceError::ConfigError {
                message: "Google Custom Search is not configured".to_string(),
            })?;

        tracing::info!("Searching valves for '{}'", query.text());
        let results = searcher.search(query).await?;
        tracing::info!("Search returned {} results", results.len());
        Ok(results)
    }

    /// Never fails: problems are reported inside the status.
    pub async fn test_connection(&self) -> ConnectionStatus {
        let Some(probe) = &self.probe else {
            return ConnectionStatus::failed("OpenAI API key is not configured");
        };

        match probe.check().await {
            Ok(()) => {
                tracing::info!("OpenAI connection check passed");
                ConnectionStatus::ok()
            }
            Err(e) => {
                tracing::warn!("OpenAI connection check failed: {}", e);
                ConnectionStatus::failed(e.user_friendly_message())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::image::ImageMime;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingSearcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ValveSearcher for CountingSearcher {
        async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![SearchResult {
                title: query.search_terms(),
                link: "https://example.com".to_string(),
                snippet: String::new(),
                image: None,
                source: "example.com".to_string(),
            }])
        }
    }

    struct FailingProbe;

    #[async_trait]
    impl ConnectionProbe for FailingProbe {
        async fn check(&self) -> Result<()> {
            Err(GlanceError::vendor("OpenAI", 401, "invalid_api_key"))
        }
    }

    fn simulated_service() -> GlanceService {
        GlanceService::new(Arc::new(SimulatedAnalyzer::new(Duration::ZERO)))
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected_before_searching() {
        let searcher = Arc::new(CountingSearcher::default());
        let service = simulated_service().with_searcher(searcher.clone());

        let err = service
            .search_valves(&SearchQuery::new("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, GlanceError::ValidationError { .. }));
        assert_eq!(searcher.calls.load(Ordering::SeqCst), 0);

        let results = service
            .search_valves(&SearchQuery::new("check valve"))
            .await
            .unwrap();
        assert_eq!(results[0].title, "industrial valve check valve");
        assert_eq!(searcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_providers_are_config_errors() {
        let service = simulated_service();
        let image = ImageData::new(ImageMime::Jpeg, vec![0xff]).unwrap();

        assert!(matches!(
            service.annotate_image(&image).await,
            Err(GlanceError::ConfigError { .. })
        ));
        assert!(matches!(
            service.search_valves(&SearchQuery::new("gate")).await,
            Err(GlanceError::ConfigError { .. })
        ));
    }

    #[tokio::test]
    async fn test_connection_status() {
        let status = simulated_service().test_connection().await;
        assert!(!status.success);
        assert_eq!(status.error.as_deref(), Some("OpenAI API key is not configured"));

        let status = simulated_service()
            .with_probe(Arc::new(FailingProbe))
            .test_connection()
            .await;
        assert!(!status.success);
        assert_eq!(status.error.as_deref(), Some("OpenAI rejected the credentials"));
    }

    #[test]
    fn test_from_config_wires_simulated_analyzer() {
        let mut config = GlanceConfig::default();
        config.analyzer.provider = AnalyzerProvider::Simulated;

        let service = GlanceService::from_config(&config).unwrap();
        assert_eq!(service.analyzer_name(), "simulated");
        assert!(service.annotator.is_none());
        assert!(service.searcher.is_none());
        assert!(service.probe.is_none());
    }

    #[test]
    fn test_from_config_requires_openai_key() {
        let config = GlanceConfig::default();
        assert!(matches!(
            GlanceService::from_config(&config),
            Err(GlanceError::MissingConfigError { .. })
        ));
    }
}

use crate::domain::image::ImageData;
use crate::domain::model::{AnalysisOutcome, SearchQuery, SearchResult, VisionAnnotations};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Identifies a valve from a photo.
#[async_trait]
pub trait ValveAnalyzer: Send + Sync {
    fn name(&self) -> &str;
    async fn analyze(&self, image: &ImageData) -> Result<AnalysisOutcome>;
}

/// Label, OCR and logo detection.
#[async_trait]
pub trait ImageAnnotator: Send + Sync {
    async fn annotate(&self, image: &ImageData) -> Result<VisionAnnotations>;
}

#[async_trait]
pub trait ValveSearcher: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>>;
}

/// Cheap authenticated call used to check provider credentials.
#[async_trait]
pub trait ConnectionProbe: Send + Sync {
    async fn check(&self) -> Result<()>;
}

pub mod service;

pub use crate::domain::image::ImageData;
pub use crate::domain::model::{AnalysisOutcome, SearchQuery, SearchResult, VisionAnnotations};
pub use crate::domain::ports::{ConnectionProbe, ImageAnnotator, ValveAnalyzer, ValveSearcher};
pub use crate::utils::error::Result;
pub use service::GlanceService;

use crate::domain::image::ImageData;
use crate::domain::model::{
    AnalysisOutcome, AnalysisSummary, MatchDetails, SimulatedAnalysis, SimulatedMatch,
};
use crate::domain::ports::ValveAnalyzer;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

const PLACEHOLDER_IMAGE: &str = "/api/placeholder/400/400";
const SPEC: &str = "ASTM A126-04 | Bluefin";

/// Stand-in analyzer returning a fixed catalogue after `delay`.
#[derive(Debug, Clone)]
pub struct SimulatedAnalyzer {
    delay: Duration,
}

impl SimulatedAnalyzer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedAnalyzer {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500))
    }
}

fn valve_match(
    name: &str,
    match_score: u8,
    valve_type: &str,
    size: &str,
    material: &str,
    connections: &str,
    pressure_rating: &str,
) -> SimulatedMatch {
    SimulatedMatch {
        name: name.to_string(),
        spec: SPEC.to_string(),
        image: PLACEHOLDER_IMAGE.to_string(),
        match_score,
        details: MatchDetails {
            valve_type: valve_type.to_string(),
            size: size.to_string(),
            material: material.to_string(),
            connections: connections.to_string(),
            pressure_rating: pressure_rating.to_string(),
        },
    }
}

pub fn canned_analysis() -> SimulatedAnalysis {
    SimulatedAnalysis {
        matches: vec![
            valve_match(
                "1\" B2 Series, 2-Way Control Valve",
                95,
                "Control Valve",
                "1 inch",
                "Cast Iron",
                "Threaded",
                "150 PSI",
            ),
            valve_match(
                "1\" B3 Series, Similar Control Valve",
                85,
                "Control Valve",
                "1 inch",
                "Cast Iron",
                "Threaded",
                "150 PSI",
            ),
            valve_match(
                "3/4\" Press Full Port Brass Ball Valve",
                70,
                "Ball Valve",
                "3/4 inch",
                "Brass",
                "Press-Fit",
                "200 PSI",
            ),
        ],
        analysis: AnalysisSummary {
            predicted_type: "Control Valve".to_string(),
            confidence_score: 0.95,
            detected_features: [
                "Threaded connections",
                "Cast iron body",
                "Manual operation",
                "Flow control capability",
            ]
            .iter()
            .map(|f| f.to_string())
            .collect(),
        },
    }
}

#[async_trait]
impl ValveAnalyzer for SimulatedAnalyzer {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn analyze(&self, image: &ImageData) -> Result<AnalysisOutcome> {
        tracing::debug!("Simulating analysis of {:?}", image);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(AnalysisOutcome::Simulated(canned_analysis()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::image::ImageMime;

    #[tokio::test]
    async fn test_returns_canned_matches() {
        let analyzer = SimulatedAnalyzer::new(Duration::ZERO);
        let image = ImageData::new(ImageMime::Jpeg, vec![1, 2, 3]).unwrap();

        let AnalysisOutcome::Simulated(result) = analyzer.analyze(&image).await.unwrap() else {
            panic!("expected simulated outcome");
        };

        let scores: Vec<u8> = result.matches.iter().map(|m| m.match_score).collect();
        assert_eq!(scores, vec![95, 85, 70]);
        assert_eq!(result.analysis.predicted_type, "Control Valve");
        assert_eq!(result.analysis.detected_features.len(), 4);
    }

    #[test]
    fn test_wire_shape() {
        let value = serde_json::to_value(canned_analysis()).unwrap();
        assert_eq!(value["matches"][0]["matchScore"], 95);
        assert_eq!(value["matches"][2]["details"]["type"], "Ball Valve");
        assert_eq!(value["matches"][2]["details"]["pressure_rating"], "200 PSI");
        assert_eq!(value["analysis"]["confidence_score"], 0.95);
    }

    #[tokio::test]
    async fn test_honours_delay() {
        let analyzer = SimulatedAnalyzer::new(Duration::from_millis(30));
        let image = ImageData::new(ImageMime::Png, vec![1]).unwrap();

        let started = std::time::Instant::now();
        analyzer.analyze(&image).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const UNKNOWN: &str = "Unknown";
pub const NO_TEXT_FOUND: &str = "No text found";
pub const ANNOTATION_SUCCESS_MESSAGE: &str = "Image analyzed successfully";

/// Colour bucket the scanner UI used for the match badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 90.0 {
            Self::High
        } else if confidence >= 70.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Valve attributes extracted by a multimodal model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValveIdentification {
    pub size: String,
    pub material: String,
    pub brand: String,
    pub part_number: String,
    pub specifications: Map<String, Value>,
    pub features: Vec<String>,
    /// 0 到 100
    pub confidence: f64,
    pub confidence_band: ConfidenceBand,
}

impl ValveIdentification {
    /// Shapes whatever JSON object the model produced into an identification.
    ///
    /// Models are not strict about types: sizes come back as numbers, features
    /// as a comma separated string, confidence as `"85%"`. All of those are
    /// accepted; anything missing falls back to `Unknown` / empty / `0`.
    pub fn from_model_output(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;

        let text = |keys: &[&str]| -> String {
            keys.iter()
                .find_map(|k| obj.get(*k).and_then(value_to_text))
                .unwrap_or_else(|| UNKNOWN.to_string())
        };

        let specifications = match obj.get("specifications") {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };

        let features = match obj.get("features") {
            Some(Value::Array(items)) => items.iter().filter_map(value_to_text).collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        let confidence = obj
            .get("confidence")
            .and_then(parse_confidence)
            .unwrap_or(0.0)
            .clamp(0.0, 100.0);

        Some(Self {
            size: text(&["size"]),
            material: text(&["material"]),
            brand: text(&["brand", "manufacturer"]),
            part_number: text(&["partNumber", "part_number"]),
            specifications,
            features,
            confidence,
            confidence_band: ConfidenceBand::from_confidence(confidence),
        })
    }
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_confidence(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDetails {
    #[serde(rename = "type")]
    pub valve_type: String,
    pub size: String,
    pub material: String,
    pub connections: String,
    pub pressure_rating: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedMatch {
    pub name: String,
    pub spec: String,
    pub image: String,
    pub match_score: u8,
    pub details: MatchDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub predicted_type: String,
    pub confidence_score: f64,
    pub detected_features: Vec<String>,
}

/// Canned catalogue matches served when no vision model is wired in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedAnalysis {
    pub matches: Vec<SimulatedMatch>,
    pub analysis: AnalysisSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Identified(ValveIdentification),
    Simulated(SimulatedAnalysis),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionAnnotations {
    pub labels: Vec<String>,
    pub text: String,
    pub logos: Vec<String>,
    pub message: String,
}

/// Free text query plus the optional catalogue filters of the search page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default, rename = "type")]
    pub valve_type: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn with_type(mut self, valve_type: impl Into<String>) -> Self {
        self.valve_type = Some(valve_type.into());
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn text(&self) -> &str {
        self.query.as_deref().map(str::trim).unwrap_or("")
    }

    /// 忽略空值與 "all"
    pub fn active_filters(&self) -> Vec<&str> {
        [&self.manufacturer, &self.valve_type, &self.size]
            .into_iter()
            .filter_map(|f| f.as_deref().map(str::trim))
            .filter(|f| !f.is_empty() && !f.eq_ignore_ascii_case("all"))
            .collect()
    }

    /// The string sent to the search provider.
    pub fn search_terms(&self) -> String {
        let mut terms = vec!["industrial valve", self.text()];
        terms.extend(self.active_filters());
        terms.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
    pub image: Option<String>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionStatus {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

//! Plain-text rendering of scan and search results for the terminal.

use crate::domain::model::{
    AnalysisOutcome, SearchResult, SimulatedAnalysis, ValveIdentification, VisionAnnotations,
};
use serde_json::Value;
use std::fmt::Write;

/// `pressureRating` -> `Pressure Rating`, `max_temp` -> `Max temp`.
pub fn humanize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if c == '_' {
            out.push(' ');
        } else if c.is_uppercase() && i > 0 {
            out.push(' ');
            out.push(c);
        } else if i == 0 {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn render_outcome(outcome: &AnalysisOutcome) -> String {
    match outcome {
        AnalysisOutcome::Identified(id) => render_identification(id),
        AnalysisOutcome::Simulated(sim) => render_simulated(sim),
    }
}

pub fn render_identification(id: &ValveIdentification) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Analysis Results  [{}% Match, {}]",
        id.confidence.round(),
        id.confidence_band.as_str()
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "  Size:         {}", id.size);
    let _ = writeln!(out, "  Material:     {}", id.material);
    let _ = writeln!(out, "  Brand:        {}", id.brand);
    let _ = writeln!(out, "  Part Number:  {}", id.part_number);

    if !id.specifications.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Technical Specifications");
        let width = id
            .specifications
            .keys()
            .map(|k| humanize_key(k).len())
            .max()
            .unwrap_or(0);
        for (key, value) in &id.specifications {
            let _ = writeln!(
                out,
                "  {:<width$}  {}",
                humanize_key(key),
                value_text(value),
                width = width
            );
        }
    }

    if !id.features.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Additional Features");
        for feature in &id.features {
            let _ = writeln!(out, "  - {}", feature);
        }
    }

    out
}

pub fn render_simulated(analysis: &SimulatedAnalysis) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Predicted type: {} ({:.0}% confidence)",
        analysis.analysis.predicted_type,
        analysis.analysis.confidence_score * 100.0
    );
    for feature in &analysis.analysis.detected_features {
        let _ = writeln!(out, "  - {}", feature);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Matches");
    for m in &analysis.matches {
        let _ = writeln!(out, "  {:>3}%  {}", m.match_score, m.name);
        let _ = writeln!(
            out,
            "        {} | {} | {} | {} | {}",
            m.details.valve_type,
            m.details.size,
            m.details.material,
            m.details.connections,
            m.details.pressure_rating
        );
    }
    out
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

pub fn render_annotations(annotations: &VisionAnnotations) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Labels: {}", join_or_none(&annotations.labels));
    let _ = writeln!(out, "Logos:  {}", join_or_none(&annotations.logos));
    let _ = writeln!(out, "Text:");
    for line in annotations.text.lines() {
        let _ = writeln!(out, "  {}", line);
    }
    out
}

pub fn render_search_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No results found\n".to_string();
    }

    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        let _ = writeln!(out, "{}. {}  ({})", i + 1, result.title, result.source);
        let _ = writeln!(out, "   {}", result.link);
        if !result.snippet.is_empty() {
            let _ = writeln!(out, "   {}", result.snippet.replace('\n', " "));
        }
        if let Some(image) = &result.image {
            let _ = writeln!(out, "   image: {}", image);
        }
    }
    out
}

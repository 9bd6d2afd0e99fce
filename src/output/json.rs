//! JSON output format writer.

use crate::detect::Detection;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// JSON result file structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonResultFile {
    /// Source image name or URL.
    pub source: String,
    /// Analysis timestamp.
    pub analysis_date: DateTime<Utc>,
    /// Model version used for analysis.
    pub model_version: String,
    /// Analysis settings.
    pub settings: JsonSettings,
    /// Detection results.
    pub detections: Vec<Detection>,
    /// Summary statistics.
    pub summary: JsonSummary,
}

/// Analysis settings for JSON output.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSettings {
    /// Minimum confidence threshold.
    pub min_confidence: f32,
    /// IoU threshold used for suppression.
    pub iou_threshold: f32,
    /// Whether image enhancement was applied.
    pub enhance: bool,
}

/// Summary statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSummary {
    /// Total number of detections.
    pub total_detections: usize,
    /// Number of unique species.
    pub unique_species: usize,
    /// Highest detection confidence.
    pub max_confidence: f32,
}

impl JsonResultFile {
    /// Assemble a result file for one analyzed image.
    pub fn new(source: &str, settings: JsonSettings, detections: Vec<Detection>) -> Self {
        let model_version = detections
            .first()
            .map_or_else(String::new, |d| d.metadata.model_version.clone());
        let unique_species: HashSet<&str> =
            detections.iter().map(|d| d.species.as_str()).collect();
        let max_confidence = detections
            .iter()
            .map(|d| d.confidence)
            .fold(0.0f32, f32::max);

        Self {
            source: source.to_string(),
            analysis_date: Utc::now(),
            model_version,
            settings,
            summary: JsonSummary {
                total_detections: detections.len(),
                unique_species: unique_species.len(),
                max_confidence,
            },
            detections,
        }
    }
}

/// Write a result file to disk.
pub fn write_results(results: &JsonResultFile, path: &Path, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(results)
    } else {
        serde_json::to_string(results)
    }
    .map_err(|source| Error::ResultWrite {
        path: path.to_path_buf(),
        source,
    })?;

    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn settings() -> JsonSettings {
        JsonSettings {
            min_confidence: 0.30,
            iou_threshold: 0.45,
            enhance: false,
        }
    }

    #[test]
    fn test_summary_counts_unique_species() {
        let mut a = Detection::unknown();
        a.species = "Ave".to_string();
        a.confidence = 0.8;
        let mut b = Detection::unknown();
        b.species = "Ave".to_string();
        b.confidence = 0.6;

        let file = JsonResultFile::new("photo.jpg", settings(), vec![a, b]);
        assert_eq!(file.summary.total_detections, 2);
        assert_eq!(file.summary.unique_species, 1);
        assert_eq!(file.summary.max_confidence, 0.8);
    }

    #[test]
    fn test_empty_detections_summary() {
        let file = JsonResultFile::new("photo.jpg", settings(), Vec::new());
        assert_eq!(file.summary.total_detections, 0);
        assert_eq!(file.summary.max_confidence, 0.0);
        assert!(file.model_version.is_empty());
    }

    #[test]
    fn test_write_and_parse_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.avistar.json");

        let file = JsonResultFile::new("photo.jpg", settings(), vec![Detection::unknown()]);
        write_results(&file, &path, true).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: JsonResultFile = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.source, "photo.jpg");
        assert_eq!(parsed.detections.len(), 1);
        assert!(text.contains("boundingBox"));
    }
}

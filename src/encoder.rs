//! Session report encoding
//!
//! This module wraps session summaries (and optionally every frame analysis) into a
//! self-describing JSON report with producer metadata.

use crate::error::AnalysisError;
use crate::types::{FrameAnalysis, SessionSummary};
use crate::{ENGINE_VERSION, PRODUCER_NAME};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current report format version
pub const REPORT_VERSION: &str = "1.0.0";

/// Who produced a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Encoded session report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub generated_at_utc: String,
    pub summary: SessionSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames: Option<Vec<FrameAnalysis>>,
}

/// Report encoder for producing JSON session reports
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Build a report; per-frame analyses are included only when given
    pub fn encode(
        &self,
        summary: &SessionSummary,
        frames: Option<&[FrameAnalysis]>,
    ) -> SessionReport {
        SessionReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            generated_at_utc: Utc::now().to_rfc3339(),
            summary: summary.clone(),
            frames: frames.map(|f| f.to_vec()),
        }
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(
        &self,
        summary: &SessionSummary,
        frames: Option<&[FrameAnalysis]>,
    ) -> Result<String, AnalysisError> {
        let report = self.encode(summary, frames);
        serde_json::to_string_pretty(&report).map_err(AnalysisError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExerciseKind, StatusTier};

    fn make_summary() -> SessionSummary {
        SessionSummary {
            session_id: "session-1".to_string(),
            exercise: ExerciseKind::Squat,
            started_at: Utc::now(),
            status: Some(StatusTier::Good),
            overall_form_score: Some(78.5),
            frames_with_person: 40,
            total_frames: 42,
            critical_count: 1,
            warning_count: 6,
            info_count: 3,
            rep_count: 5,
            recommendations: vec!["Try to go lower - aim for thighs parallel to the ground".into()],
        }
    }

    #[test]
    fn test_encode_report() {
        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let report = encoder.encode(&make_summary(), None);

        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.producer.version, ENGINE_VERSION);
        assert_eq!(report.producer.instance_id, "test-instance");
        assert_eq!(report.summary.rep_count, 5);
        assert!(report.frames.is_none());
    }

    #[test]
    fn test_encode_to_json() {
        let encoder = ReportEncoder::new();
        let json = encoder.encode_to_json(&make_summary(), Some(&[])).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed.get("report_version").is_some());
        assert!(parsed.get("producer").is_some());
        assert_eq!(parsed["summary"]["status"], "good");
        assert_eq!(parsed["summary"]["exercise"], "squat");
        assert!(parsed["frames"].as_array().unwrap().is_empty());
    }
}

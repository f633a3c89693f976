//! formcheck.frame.v1 schema definition
//!
//! One record per video frame, as produced by an upstream pose estimator:
//! - Frame numbering and capture time
//! - Optional session and exercise routing (used by the streaming CLI)
//! - The detected landmarks, or `null` when no person was found

use crate::types::{FrameInput, Landmark, LandmarkName, Pose};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Current schema version
pub const SCHEMA_VERSION: &str = "formcheck.frame.v1";

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// A landmark as written by the pose estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLandmark {
    /// Snake_case landmark name (e.g., "left_knee")
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    /// Detection confidence (0-1); MediaPipe writes this as `visibility`
    #[serde(alias = "visibility")]
    pub confidence: f64,
}

/// One frame record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Exercise kind name (e.g., "squat")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise: Option<String>,
    pub frame_number: u64,
    /// Capture time in seconds
    pub timestamp: f64,
    /// `None` when no person was detected
    #[serde(default)]
    pub landmarks: Option<Vec<RawLandmark>>,
}

impl FrameRecord {
    /// Create a record for the given frame
    pub fn new(frame_number: u64, timestamp: f64, landmarks: Option<Vec<RawLandmark>>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            session_id: None,
            exercise: None,
            frame_number,
            timestamp,
            landmarks,
        }
    }

    /// Check the record against the schema
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }

        if !self.timestamp.is_finite() {
            return Err(ValidationError::NonFiniteTimestamp {
                frame_number: self.frame_number,
            });
        }

        let Some(landmarks) = &self.landmarks else {
            return Ok(());
        };

        let mut seen = HashSet::new();
        for landmark in landmarks {
            if LandmarkName::from_name(&landmark.name).is_none() {
                return Err(ValidationError::UnknownLandmark(landmark.name.clone()));
            }
            if !seen.insert(landmark.name.as_str()) {
                return Err(ValidationError::DuplicateLandmark(landmark.name.clone()));
            }
            if !(0.0..=1.0).contains(&landmark.confidence) {
                return Err(ValidationError::ConfidenceOutOfRange {
                    name: landmark.name.clone(),
                    confidence: landmark.confidence,
                });
            }
            if !(landmark.x.is_finite() && landmark.y.is_finite() && landmark.z.is_finite()) {
                return Err(ValidationError::NonFiniteCoordinate(landmark.name.clone()));
            }
        }

        Ok(())
    }

    /// Convert to engine input; unknown landmark names are dropped and a repeated name
    /// keeps its last occurrence
    pub fn to_frame_input(&self) -> FrameInput {
        let pose = self.landmarks.as_ref().map(|landmarks| {
            Pose::from_landmarks(landmarks.iter().filter_map(|raw| {
                LandmarkName::from_name(&raw.name).map(|name| Landmark {
                    name,
                    x: raw.x,
                    y: raw.y,
                    z: raw.z,
                    confidence: raw.confidence,
                })
            }))
        });

        FrameInput::new(self.frame_number, self.timestamp, pose)
    }
}

/// Schema violations in a frame record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Unknown landmark name: {0}")]
    UnknownLandmark(String),

    #[error("Landmark {0} appears more than once")]
    DuplicateLandmark(String),

    #[error("Landmark {name} has confidence {confidence} outside [0, 1]")]
    ConfidenceOutOfRange { name: String, confidence: f64 },

    #[error("Landmark {0} has a non-finite coordinate")]
    NonFiniteCoordinate(String),

    #[error("Frame {frame_number} has a non-finite timestamp")]
    NonFiniteTimestamp { frame_number: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, confidence: f64) -> RawLandmark {
        RawLandmark {
            name: name.to_string(),
            x: 0.5,
            y: 0.5,
            z: 0.0,
            confidence,
        }
    }

    #[test]
    fn test_parse_minimal_record() {
        let json = r#"{
            "frame_number": 3,
            "timestamp": 0.1,
            "landmarks": [{"name": "left_knee", "x": 0.4, "y": 0.7, "visibility": 0.93}]
        }"#;
        let record: FrameRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.schema_version, SCHEMA_VERSION);
        assert_eq!(record.session_id, None);
        assert!(record.validate().is_ok());

        let frame = record.to_frame_input();
        let pose = frame.pose.unwrap();
        assert_eq!(pose.get(LandmarkName::LeftKnee).unwrap().confidence, 0.93);
    }

    #[test]
    fn test_null_landmarks_mean_no_person() {
        let json = r#"{"frame_number": 0, "timestamp": 0.0, "landmarks": null}"#;
        let record: FrameRecord = serde_json::from_str(json).unwrap();
        assert!(record.validate().is_ok());
        assert_eq!(record.to_frame_input().pose, None);
    }

    #[test]
    fn test_validation_errors() {
        let record = FrameRecord::new(0, 0.0, Some(vec![raw("tail", 0.9)]));
        assert_eq!(
            record.validate(),
            Err(ValidationError::UnknownLandmark("tail".into()))
        );

        let record = FrameRecord::new(0, 0.0, Some(vec![raw("nose", 0.9), raw("nose", 0.8)]));
        assert_eq!(
            record.validate(),
            Err(ValidationError::DuplicateLandmark("nose".into()))
        );

        let record = FrameRecord::new(0, 0.0, Some(vec![raw("nose", 1.5)]));
        assert!(matches!(
            record.validate(),
            Err(ValidationError::ConfidenceOutOfRange { .. })
        ));

        let record = FrameRecord::new(0, f64::INFINITY, None);
        assert_eq!(
            record.validate(),
            Err(ValidationError::NonFiniteTimestamp { frame_number: 0 })
        );
    }

    #[test]
    fn test_conversion_skips_unknown_names() {
        let record = FrameRecord::new(
            7,
            0.7,
            Some(vec![raw("nose", 0.9), raw("tail", 0.9), raw("left_hip", 0.8)]),
        );
        let frame = record.to_frame_input();
        assert_eq!(frame.frame_number, 7);
        assert_eq!(frame.pose.unwrap().len(), 2);
    }
}

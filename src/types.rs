//! Core types for the formcheck pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw poses, issues, per-frame analyses and session summaries.

use crate::error::AnalysisError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Named joint angles for one frame (degrees, only computable angles present)
pub type AngleMap = BTreeMap<String, f64>;

/// Anatomical landmark vocabulary (33-point body topology)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkName {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl LandmarkName {
    /// Every landmark, ordered by its index in the 33-point topology
    pub const ALL: [LandmarkName; 33] = [
        LandmarkName::Nose,
        LandmarkName::LeftEyeInner,
        LandmarkName::LeftEye,
        LandmarkName::LeftEyeOuter,
        LandmarkName::RightEyeInner,
        LandmarkName::RightEye,
        LandmarkName::RightEyeOuter,
        LandmarkName::LeftEar,
        LandmarkName::RightEar,
        LandmarkName::MouthLeft,
        LandmarkName::MouthRight,
        LandmarkName::LeftShoulder,
        LandmarkName::RightShoulder,
        LandmarkName::LeftElbow,
        LandmarkName::RightElbow,
        LandmarkName::LeftWrist,
        LandmarkName::RightWrist,
        LandmarkName::LeftPinky,
        LandmarkName::RightPinky,
        LandmarkName::LeftIndex,
        LandmarkName::RightIndex,
        LandmarkName::LeftThumb,
        LandmarkName::RightThumb,
        LandmarkName::LeftHip,
        LandmarkName::RightHip,
        LandmarkName::LeftKnee,
        LandmarkName::RightKnee,
        LandmarkName::LeftAnkle,
        LandmarkName::RightAnkle,
        LandmarkName::LeftHeel,
        LandmarkName::RightHeel,
        LandmarkName::LeftFootIndex,
        LandmarkName::RightFootIndex,
    ];

    /// Landmarks that establish torso orientation
    pub const TORSO: [LandmarkName; 4] = [
        LandmarkName::LeftShoulder,
        LandmarkName::RightShoulder,
        LandmarkName::LeftHip,
        LandmarkName::RightHip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LandmarkName::Nose => "nose",
            LandmarkName::LeftEyeInner => "left_eye_inner",
            LandmarkName::LeftEye => "left_eye",
            LandmarkName::LeftEyeOuter => "left_eye_outer",
            LandmarkName::RightEyeInner => "right_eye_inner",
            LandmarkName::RightEye => "right_eye",
            LandmarkName::RightEyeOuter => "right_eye_outer",
            LandmarkName::LeftEar => "left_ear",
            LandmarkName::RightEar => "right_ear",
            LandmarkName::MouthLeft => "mouth_left",
            LandmarkName::MouthRight => "mouth_right",
            LandmarkName::LeftShoulder => "left_shoulder",
            LandmarkName::RightShoulder => "right_shoulder",
            LandmarkName::LeftElbow => "left_elbow",
            LandmarkName::RightElbow => "right_elbow",
            LandmarkName::LeftWrist => "left_wrist",
            LandmarkName::RightWrist => "right_wrist",
            LandmarkName::LeftPinky => "left_pinky",
            LandmarkName::RightPinky => "right_pinky",
            LandmarkName::LeftIndex => "left_index",
            LandmarkName::RightIndex => "right_index",
            LandmarkName::LeftThumb => "left_thumb",
            LandmarkName::RightThumb => "right_thumb",
            LandmarkName::LeftHip => "left_hip",
            LandmarkName::RightHip => "right_hip",
            LandmarkName::LeftKnee => "left_knee",
            LandmarkName::RightKnee => "right_knee",
            LandmarkName::LeftAnkle => "left_ankle",
            LandmarkName::RightAnkle => "right_ankle",
            LandmarkName::LeftHeel => "left_heel",
            LandmarkName::RightHeel => "right_heel",
            LandmarkName::LeftFootIndex => "left_foot_index",
            LandmarkName::RightFootIndex => "right_foot_index",
        }
    }

    /// Look up a landmark by its snake_case name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.as_str() == name)
    }
}

impl fmt::Display for LandmarkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single named anatomical point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub name: LandmarkName,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    /// Detection confidence (0-1)
    #[serde(alias = "visibility")]
    pub confidence: f64,
}

impl Landmark {
    pub fn new(name: LandmarkName, x: f64, y: f64, confidence: f64) -> Self {
        Self {
            name,
            x,
            y,
            z: 0.0,
            confidence,
        }
    }
}

/// Per-frame landmark set keyed by unique name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pose {
    landmarks: BTreeMap<LandmarkName, Landmark>,
}

impl Pose {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pose from landmarks; a later landmark with the same name replaces an earlier one
    pub fn from_landmarks(landmarks: impl IntoIterator<Item = Landmark>) -> Self {
        let mut pose = Self::new();
        for landmark in landmarks {
            pose.insert(landmark);
        }
        pose
    }

    pub fn insert(&mut self, landmark: Landmark) {
        self.landmarks.insert(landmark.name, landmark);
    }

    pub fn get(&self, name: LandmarkName) -> Option<&Landmark> {
        self.landmarks.get(&name)
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.landmarks.values()
    }
}

/// One upstream frame: numbering, capture time and the pose (absent = no person)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    pub frame_number: u64,
    /// Capture time in seconds
    pub timestamp: f64,
    pub pose: Option<Pose>,
}

impl FrameInput {
    pub fn new(frame_number: u64, timestamp: f64, pose: Option<Pose>) -> Self {
        Self {
            frame_number,
            timestamp,
            pose,
        }
    }
}

/// Supported exercise kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Squat,
    Pushup,
    Lunge,
    JumpingJack,
    Plank,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 5] = [
        ExerciseKind::Squat,
        ExerciseKind::Pushup,
        ExerciseKind::Lunge,
        ExerciseKind::JumpingJack,
        ExerciseKind::Plank,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::Squat => "squat",
            ExerciseKind::Pushup => "pushup",
            ExerciseKind::Lunge => "lunge",
            ExerciseKind::JumpingJack => "jumping_jack",
            ExerciseKind::Plank => "plank",
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        ExerciseKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| AnalysisError::InvalidExerciseKind(s.to_string()))
    }
}

/// Issue severity, declared in reporting order (Critical first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// A flagged form deviation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    /// Stable identifier of the check that produced this issue
    pub code: String,
    pub message: String,
    pub suggestion: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_landmarks: Vec<LandmarkName>,
}

/// Repetition phase (generic labels shared by every exercise)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepPhase {
    #[default]
    Idle,
    /// Moving toward the target bound
    Active,
    /// At the target bound for at least the dwell duration
    Held,
    /// Moving back toward the start bound
    Returning,
}

/// Immutable result of analyzing one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    pub exercise: ExerciseKind,
    pub frame_number: u64,
    pub timestamp: f64,
    pub pose_present: bool,
    pub angles: AngleMap,
    /// Ordered Critical → Warning → Info, then by check registration order
    pub issues: Vec<Issue>,
    /// 0-100, absent when no pose was present
    pub form_score: Option<f64>,
    /// Repetition count after this frame
    pub rep_count: u32,
    pub phase: RepPhase,
    /// Whether this frame completed a repetition
    pub rep_completed: bool,
}

/// Session quality tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTier {
    Excellent,
    Good,
    NeedsImprovement,
    Poor,
}

impl StatusTier {
    /// Tier for a score: [85,100] Excellent, [70,85) Good, [50,70) NeedsImprovement, [0,50) Poor
    pub fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            StatusTier::Excellent
        } else if score >= 70.0 {
            StatusTier::Good
        } else if score >= 50.0 {
            StatusTier::NeedsImprovement
        } else {
            StatusTier::Poor
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            StatusTier::Excellent => "EXCELLENT",
            StatusTier::Good => "GOOD",
            StatusTier::NeedsImprovement => "NEEDS IMPROVEMENT",
            StatusTier::Poor => "POOR - MAJOR CORRECTIONS NEEDED",
        }
    }
}

/// Session-level quality summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub exercise: ExerciseKind,
    /// Session creation time, or the last reset
    pub started_at: DateTime<Utc>,
    /// Absent until at least one frame with a person was analyzed
    pub status: Option<StatusTier>,
    /// Mean form score over pose-present frames
    pub overall_form_score: Option<f64>,
    pub frames_with_person: u64,
    pub total_frames: u64,
    pub critical_count: u64,
    pub warning_count: u64,
    pub info_count: u64,
    pub rep_count: u32,
    /// Deduplicated suggestions, ranked and capped
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_vocabulary_round_trip() {
        for (idx, name) in LandmarkName::ALL.iter().enumerate() {
            assert_eq!(LandmarkName::from_name(name.as_str()), Some(*name), "index {idx}");
        }
        assert_eq!(LandmarkName::from_name("tail"), None);
    }

    #[test]
    fn test_exercise_kind_parse() {
        assert_eq!("squat".parse::<ExerciseKind>().unwrap(), ExerciseKind::Squat);
        assert_eq!(
            " Jumping_Jack ".parse::<ExerciseKind>().unwrap(),
            ExerciseKind::JumpingJack
        );
        let err = "cartwheel".parse::<ExerciseKind>().unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidExerciseKind(ref k) if k == "cartwheel"));
    }

    #[test]
    fn test_severity_order() {
        let mut severities = vec![Severity::Info, Severity::Critical, Severity::Warning];
        severities.sort();
        assert_eq!(
            severities,
            vec![Severity::Critical, Severity::Warning, Severity::Info]
        );
    }

    #[test]
    fn test_status_tier_bounds() {
        assert_eq!(StatusTier::from_score(100.0), StatusTier::Excellent);
        assert_eq!(StatusTier::from_score(85.0), StatusTier::Excellent);
        assert_eq!(StatusTier::from_score(84.999), StatusTier::Good);
        assert_eq!(StatusTier::from_score(70.0), StatusTier::Good);
        assert_eq!(StatusTier::from_score(69.9), StatusTier::NeedsImprovement);
        assert_eq!(StatusTier::from_score(50.0), StatusTier::NeedsImprovement);
        assert_eq!(StatusTier::from_score(49.9), StatusTier::Poor);
        assert_eq!(StatusTier::from_score(0.0), StatusTier::Poor);
    }

    #[test]
    fn test_pose_keeps_unique_names() {
        let pose = Pose::from_landmarks([
            Landmark::new(LandmarkName::Nose, 0.1, 0.1, 0.4),
            Landmark::new(LandmarkName::Nose, 0.2, 0.2, 0.9),
        ]);
        assert_eq!(pose.len(), 1);
        assert_eq!(pose.get(LandmarkName::Nose).unwrap().confidence, 0.9);
    }

    #[test]
    fn test_landmark_visibility_alias() {
        let json = r#"{"name": "left_knee", "x": 0.5, "y": 0.6, "visibility": 0.8}"#;
        let landmark: Landmark = serde_json::from_str(json).unwrap();
        assert_eq!(landmark.name, LandmarkName::LeftKnee);
        assert_eq!(landmark.confidence, 0.8);
        assert_eq!(landmark.z, 0.0);
    }
}

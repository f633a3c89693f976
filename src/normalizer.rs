//! Landmark normalization
//!
//! This module validates a raw per-frame landmark set against a confidence threshold.
//! - Landmarks at or above the threshold are kept, keyed by name
//! - Everything else in the vocabulary is reported missing
//! - A frame without both shoulders and both hips carries no usable person

use crate::types::{Landmark, LandmarkName, Pose};
use std::collections::BTreeMap;

/// Landmarks that passed validation for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedPose {
    landmarks: BTreeMap<LandmarkName, Landmark>,
    /// Vocabulary landmarks absent or below the threshold
    pub missing: Vec<LandmarkName>,
    /// Whether torso orientation could be established
    pub pose_present: bool,
}

impl NormalizedPose {
    /// Validated landmark by name
    pub fn get(&self, name: LandmarkName) -> Option<&Landmark> {
        self.landmarks.get(&name)
    }

    pub fn contains(&self, name: LandmarkName) -> bool {
        self.landmarks.contains_key(&name)
    }

    pub fn validated_count(&self) -> usize {
        self.landmarks.len()
    }
}

/// Normalizer for filtering raw poses by confidence
pub struct LandmarkNormalizer;

impl LandmarkNormalizer {
    /// Normalize an optional raw pose
    pub fn normalize(pose: Option<&Pose>, confidence_threshold: f64) -> NormalizedPose {
        let Some(pose) = pose else {
            return NormalizedPose {
                landmarks: BTreeMap::new(),
                missing: LandmarkName::ALL.to_vec(),
                pose_present: false,
            };
        };

        let landmarks: BTreeMap<LandmarkName, Landmark> = pose
            .iter()
            .filter(|lm| is_valid(lm, confidence_threshold))
            .map(|lm| (lm.name, *lm))
            .collect();

        let missing = LandmarkName::ALL
            .iter()
            .copied()
            .filter(|name| !landmarks.contains_key(name))
            .collect();

        let pose_present = LandmarkName::TORSO
            .iter()
            .all(|name| landmarks.contains_key(name));

        NormalizedPose {
            landmarks,
            missing,
            pose_present,
        }
    }
}

/// A landmark is usable when its confidence meets the threshold and its position is finite
fn is_valid(landmark: &Landmark, threshold: f64) -> bool {
    landmark.confidence >= threshold
        && landmark.x.is_finite()
        && landmark.y.is_finite()
        && landmark.z.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_pose(confidence: f64) -> Pose {
        Pose::from_landmarks(
            LandmarkName::ALL
                .iter()
                .enumerate()
                .map(|(i, name)| Landmark::new(*name, 0.01 * i as f64, 0.02 * i as f64, confidence)),
        )
    }

    #[test]
    fn test_absent_pose() {
        let normalized = LandmarkNormalizer::normalize(None, 0.5);
        assert!(!normalized.pose_present);
        assert_eq!(normalized.missing.len(), 33);
        assert_eq!(normalized.validated_count(), 0);
    }

    #[test]
    fn test_confident_pose_is_present() {
        let pose = full_pose(0.9);
        let normalized = LandmarkNormalizer::normalize(Some(&pose), 0.5);
        assert!(normalized.pose_present);
        assert!(normalized.missing.is_empty());
        assert_eq!(normalized.validated_count(), 33);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let pose = full_pose(0.5);
        let normalized = LandmarkNormalizer::normalize(Some(&pose), 0.5);
        assert!(normalized.pose_present);
    }

    #[test]
    fn test_low_confidence_hip_drops_pose() {
        let mut pose = full_pose(0.9);
        pose.insert(Landmark::new(LandmarkName::LeftHip, 0.4, 0.5, 0.1));
        let normalized = LandmarkNormalizer::normalize(Some(&pose), 0.5);

        assert!(!normalized.pose_present);
        assert_eq!(normalized.missing, vec![LandmarkName::LeftHip]);
        assert!(normalized.contains(LandmarkName::LeftKnee));
    }

    #[test]
    fn test_low_confidence_limb_keeps_pose() {
        let mut pose = full_pose(0.9);
        pose.insert(Landmark::new(LandmarkName::RightWrist, 0.4, 0.5, 0.2));
        let normalized = LandmarkNormalizer::normalize(Some(&pose), 0.5);

        assert!(normalized.pose_present);
        assert!(!normalized.contains(LandmarkName::RightWrist));
    }

    #[test]
    fn test_non_finite_position_is_missing() {
        let mut pose = full_pose(0.9);
        pose.insert(Landmark::new(LandmarkName::LeftKnee, f64::NAN, 0.5, 0.99));
        let normalized = LandmarkNormalizer::normalize(Some(&pose), 0.5);
        assert!(!normalized.contains(LandmarkName::LeftKnee));
        assert!(normalized.missing.contains(&LandmarkName::LeftKnee));
    }

    #[test]
    fn test_nan_confidence_is_missing() {
        let mut pose = full_pose(0.9);
        pose.insert(Landmark::new(LandmarkName::RightShoulder, 0.4, 0.2, f64::NAN));
        let normalized = LandmarkNormalizer::normalize(Some(&pose), 0.5);
        assert!(!normalized.pose_present);
    }
}

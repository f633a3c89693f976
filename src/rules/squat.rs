//! Squat rule set

use super::{Check, CheckContext, RuleSet};
use crate::angles::{AngleDefinition, Axis};
use crate::config::{RepConfig, SquatConfig};
use crate::types::LandmarkName::*;
use crate::types::{ExerciseKind, LandmarkName, Severity};

const ANGLES: [AngleDefinition; 12] = [
    AngleDefinition::joint("left_knee", LeftHip, LeftKnee, LeftAnkle),
    AngleDefinition::joint("right_knee", RightHip, RightKnee, RightAnkle),
    AngleDefinition::joint("left_hip", LeftShoulder, LeftHip, LeftKnee),
    AngleDefinition::joint("right_hip", RightShoulder, RightHip, RightKnee),
    AngleDefinition::mean("knee", "left_knee", "right_knee"),
    AngleDefinition::mean("hip", "left_hip", "right_hip"),
    AngleDefinition::segment("left_torso_lean", LeftHip, LeftShoulder, Axis::Vertical),
    AngleDefinition::segment("right_torso_lean", RightHip, RightShoulder, Axis::Vertical),
    AngleDefinition::mean("torso_lean", "left_torso_lean", "right_torso_lean"),
    // 90 when the shin hangs straight below the knee, larger when the ankle sits wide of it
    AngleDefinition::joint("left_knee_track", LeftAnkle, LeftKnee, RightKnee),
    AngleDefinition::joint("right_knee_track", RightAnkle, RightKnee, LeftKnee),
    AngleDefinition::mean("knee_track", "left_knee_track", "right_knee_track"),
];

const TORSO: &[LandmarkName] = &[LeftShoulder, RightShoulder, LeftHip, RightHip];
const LEGS: &[LandmarkName] = &[LeftKnee, RightKnee, LeftHip, RightHip];
const KNEES: &[LandmarkName] = &[LeftKnee, RightKnee];
const KNEES_AND_ANKLES: &[LandmarkName] = &[LeftKnee, RightKnee, LeftAnkle, RightAnkle];
const HIPS: &[LandmarkName] = &[LeftHip, RightHip];

/// Squat analysis rules
#[derive(Debug)]
pub struct SquatRules {
    checks: Vec<Check>,
    rep: RepConfig,
}

impl SquatRules {
    pub fn new(config: &SquatConfig) -> Self {
        let lean_warning = config.forward_lean_warning;
        let lean_critical = config.forward_lean_critical;
        let parallel = config.parallel_depth;
        let full = config.full_depth;
        let standing = config.rep.start_bound();
        let asymmetry = config.asymmetry_tolerance;
        let max_descent = config.max_descent_per_frame;
        let stall = config.stall_tolerance;
        let valgus = config.knee_valgus;

        let checks = vec![
            Check::new(
                "squat_knee_valgus",
                Severity::Critical,
                "Knees are caving inward (valgus)",
                "Push your knees out to track over your toes",
                KNEES_AND_ANKLES,
                move |ctx: &CheckContext<'_>| ctx.angle("knee_track").is_some_and(|a| a > valgus),
            ),
            Check::new(
                "squat_excessive_forward_lean",
                Severity::Critical,
                "Torso is collapsing forward",
                "Keep your chest up and brace your core before descending",
                TORSO,
                move |ctx: &CheckContext<'_>| ctx.angle("torso_lean").is_some_and(|a| a > lean_critical),
            ),
            Check::new(
                "squat_forward_lean",
                Severity::Warning,
                "Excessive forward lean",
                "Keep your chest up and maintain a more upright torso",
                TORSO,
                move |ctx: &CheckContext<'_>| {
                    ctx.angle("torso_lean")
                        .is_some_and(|a| a > lean_warning && a <= lean_critical)
                },
            ),
            Check::new(
                "squat_insufficient_depth",
                Severity::Warning,
                "Squat depth is insufficient",
                "Try to go lower - aim for thighs parallel to the ground",
                LEGS,
                move |ctx: &CheckContext<'_>| {
                    ctx.stalled("knee", stall)
                        .is_some_and(|k| k > parallel && k < standing)
                },
            ),
            Check::new(
                "squat_knee_asymmetry",
                Severity::Warning,
                "Knees are not tracking evenly",
                "Focus on keeping both knees moving at the same pace",
                KNEES,
                move |ctx: &CheckContext<'_>| {
                    ctx.difference("left_knee", "right_knee")
                        .is_some_and(|d| d > asymmetry)
                },
            ),
            Check::new(
                "squat_hip_asymmetry",
                Severity::Warning,
                "Hips are not level",
                "Keep your hips level throughout the movement",
                HIPS,
                move |ctx: &CheckContext<'_>| {
                    ctx.difference("left_hip", "right_hip")
                        .is_some_and(|d| d > asymmetry)
                },
            ),
            Check::new(
                "squat_depth_could_be_deeper",
                Severity::Info,
                "Squat reached parallel but not full depth",
                "Sink a little lower if your mobility allows",
                KNEES,
                move |ctx: &CheckContext<'_>| {
                    ctx.stalled("knee", stall)
                        .is_some_and(|k| k > full && k <= parallel)
                },
            ),
            Check::new(
                "squat_uncontrolled_descent",
                Severity::Info,
                "Descent is too fast",
                "Lower yourself under control instead of dropping into the squat",
                KNEES,
                move |ctx: &CheckContext<'_>| match (ctx.prior_angle("knee"), ctx.angle("knee")) {
                    (Some(prior), Some(current)) => prior - current > max_descent,
                    _ => false,
                },
            ),
        ];

        Self {
            checks,
            rep: config.rep.clone(),
        }
    }
}

impl RuleSet for SquatRules {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Squat
    }

    fn display_name(&self) -> &'static str {
        "Squat"
    }

    fn description(&self) -> &'static str {
        "Bodyweight or barbell squat; repetitions counted on the mean knee angle"
    }

    fn angle_definitions(&self) -> &[AngleDefinition] {
        &ANGLES
    }

    fn checks(&self) -> &[Check] {
        &self.checks
    }

    fn rep_config(&self) -> &RepConfig {
        &self.rep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleEngine;
    use crate::types::AngleMap;

    fn angles(entries: &[(&str, f64)]) -> AngleMap {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn codes(current: &AngleMap, prior: Option<&AngleMap>) -> Vec<String> {
        let rules = SquatRules::new(&SquatConfig::default());
        RuleEngine::evaluate(&rules, &CheckContext::new(current, prior))
            .into_iter()
            .map(|i| i.code)
            .collect()
    }

    #[test]
    fn test_clean_standing_frame() {
        let current = angles(&[
            ("left_knee", 172.0),
            ("right_knee", 170.0),
            ("knee", 171.0),
            ("left_hip", 170.0),
            ("right_hip", 171.0),
            ("torso_lean", 5.0),
        ]);
        let prior = current.clone();
        assert!(codes(&current, Some(&prior)).is_empty());
    }

    #[test]
    fn test_lean_tiers_are_exclusive() {
        assert_eq!(codes(&angles(&[("torso_lean", 50.0)]), None), vec!["squat_forward_lean"]);
        assert_eq!(
            codes(&angles(&[("torso_lean", 70.0)]), None),
            vec!["squat_excessive_forward_lean"]
        );
    }

    #[test]
    fn test_paused_above_parallel_is_shallow() {
        let prior = angles(&[("knee", 126.0)]);
        let current = angles(&[("knee", 125.0)]);
        assert_eq!(codes(&current, Some(&prior)), vec!["squat_insufficient_depth"]);
    }

    #[test]
    fn test_moving_through_shallow_zone_is_not_flagged() {
        let prior = angles(&[("knee", 140.0)]);
        let current = angles(&[("knee", 125.0)]);
        assert!(codes(&current, Some(&prior)).is_empty());
    }

    #[test]
    fn test_parallel_but_not_full_depth() {
        let prior = angles(&[("knee", 96.0)]);
        let current = angles(&[("knee", 95.0)]);
        assert_eq!(codes(&current, Some(&prior)), vec!["squat_depth_could_be_deeper"]);
    }

    #[test]
    fn test_fast_drop_and_asymmetry() {
        let prior = angles(&[("knee", 170.0)]);
        let current = angles(&[
            ("left_knee", 130.0),
            ("right_knee", 100.0),
            ("knee", 115.0),
        ]);
        assert_eq!(
            codes(&current, Some(&prior)),
            vec!["squat_knee_asymmetry", "squat_uncontrolled_descent"]
        );
    }

    #[test]
    fn test_caving_knees_are_critical() {
        assert_eq!(
            codes(&angles(&[("knee_track", 127.0)]), None),
            vec!["squat_knee_valgus"]
        );
        assert!(codes(&angles(&[("knee_track", 95.0)]), None).is_empty());
    }

    #[test]
    fn test_knee_track_reads_valgus_from_landmarks() {
        use crate::angles::AngleComputer;
        use crate::normalizer::LandmarkNormalizer;
        use crate::types::{Landmark, Pose};

        // front view: knees pulled toward each other, ankles wide
        let caved = Pose::from_landmarks([
            Landmark::new(LeftKnee, 0.45, 0.75, 0.9),
            Landmark::new(RightKnee, 0.55, 0.75, 0.9),
            Landmark::new(LeftAnkle, 0.30, 0.95, 0.9),
            Landmark::new(RightAnkle, 0.70, 0.95, 0.9),
        ]);
        let normalized = LandmarkNormalizer::normalize(Some(&caved), 0.5);
        let computed = AngleComputer::compute(&ANGLES, &normalized, 1e-6);
        let track = computed["knee_track"];
        assert!((track - 126.87).abs() < 0.01, "knee_track = {track}");

        let stacked = Pose::from_landmarks([
            Landmark::new(LeftKnee, 0.40, 0.75, 0.9),
            Landmark::new(RightKnee, 0.60, 0.75, 0.9),
            Landmark::new(LeftAnkle, 0.40, 0.95, 0.9),
            Landmark::new(RightAnkle, 0.60, 0.95, 0.9),
        ]);
        let normalized = LandmarkNormalizer::normalize(Some(&stacked), 0.5);
        let computed = AngleComputer::compute(&ANGLES, &normalized, 1e-6);
        assert!((computed["knee_track"] - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_issue_carries_landmarks() {
        let rules = SquatRules::new(&SquatConfig::default());
        let current = angles(&[("left_hip", 150.0), ("right_hip", 100.0)]);
        let issues = RuleEngine::evaluate(&rules, &CheckContext::new(&current, None));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].affected_landmarks, vec![LeftHip, RightHip]);
    }
}

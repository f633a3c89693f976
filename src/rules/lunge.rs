//! Lunge rule set
//!
//! The front leg is whichever knee is more bent in the current frame, so the rules work
//! for either lead leg without configuration.

use super::{Check, CheckContext, RuleSet};
use crate::angles::{AngleDefinition, Axis};
use crate::config::{LungeConfig, RepConfig};
use crate::types::LandmarkName::*;
use crate::types::{ExerciseKind, LandmarkName, Severity};

const ANGLES: [AngleDefinition; 7] = [
    AngleDefinition::joint("left_knee", LeftHip, LeftKnee, LeftAnkle),
    AngleDefinition::joint("right_knee", RightHip, RightKnee, RightAnkle),
    AngleDefinition::min("front_knee", "left_knee", "right_knee"),
    AngleDefinition::max("back_knee", "left_knee", "right_knee"),
    AngleDefinition::segment("left_torso_lean", LeftHip, LeftShoulder, Axis::Vertical),
    AngleDefinition::segment("right_torso_lean", RightHip, RightShoulder, Axis::Vertical),
    AngleDefinition::mean("torso_lean", "left_torso_lean", "right_torso_lean"),
];

const KNEES: &[LandmarkName] = &[LeftKnee, RightKnee];
const KNEES_AND_ANKLES: &[LandmarkName] = &[LeftKnee, RightKnee, LeftAnkle, RightAnkle];
const TORSO: &[LandmarkName] = &[LeftShoulder, RightShoulder, LeftHip, RightHip];

/// Lunge analysis rules
#[derive(Debug)]
pub struct LungeRules {
    checks: Vec<Check>,
    rep: RepConfig,
}

impl LungeRules {
    pub fn new(config: &LungeConfig) -> Self {
        let collapse = config.front_knee_collapse;
        let depth = config.depth;
        let standing = config.rep.start_bound();
        let back_straight = config.back_knee_straight;
        let engaged = config.lunge_engaged;
        let lean = config.torso_lean;
        let stall = config.stall_tolerance;

        let checks = vec![
            Check::new(
                "lunge_front_knee_collapse",
                Severity::Critical,
                "Front knee is bending too sharply",
                "Stop lowering once your front thigh is parallel to the floor",
                KNEES_AND_ANKLES,
                move |ctx: &CheckContext<'_>| ctx.angle("front_knee").is_some_and(|a| a < collapse),
            ),
            Check::new(
                "lunge_insufficient_depth",
                Severity::Warning,
                "Lunge depth is insufficient",
                "Step deeper into the lunge",
                KNEES,
                move |ctx: &CheckContext<'_>| {
                    ctx.stalled("front_knee", stall)
                        .is_some_and(|k| k > depth && k < standing)
                },
            ),
            Check::new(
                "lunge_back_knee_straight",
                Severity::Warning,
                "Back knee is not bending enough",
                "Bend your back knee more for better stretch",
                KNEES,
                move |ctx: &CheckContext<'_>| match (ctx.angle("front_knee"), ctx.angle("back_knee")) {
                    (Some(front), Some(back)) => front < engaged && back > back_straight,
                    _ => false,
                },
            ),
            Check::new(
                "lunge_torso_lean",
                Severity::Info,
                "Torso is leaning",
                "Keep your torso upright over your hips",
                TORSO,
                move |ctx: &CheckContext<'_>| ctx.angle("torso_lean").is_some_and(|a| a > lean),
            ),
        ];

        Self {
            checks,
            rep: config.rep.clone(),
        }
    }
}

impl RuleSet for LungeRules {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Lunge
    }

    fn display_name(&self) -> &'static str {
        "Lunge"
    }

    fn description(&self) -> &'static str {
        "Forward or reverse lunge; repetitions counted on the front knee angle"
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
        let rules = LungeRules::new(&LungeConfig::default());
        RuleEngine::evaluate(&rules, &CheckContext::new(current, prior))
            .into_iter()
            .map(|i| i.code)
            .collect()
    }

    #[test]
    fn test_good_lunge_bottom() {
        let current = angles(&[("front_knee", 92.0), ("back_knee", 95.0), ("torso_lean", 8.0)]);
        assert!(codes(&current, Some(&current)).is_empty());
    }

    #[test]
    fn test_straight_back_leg() {
        let current = angles(&[("front_knee", 95.0), ("back_knee", 170.0)]);
        assert_eq!(codes(&current, None), vec!["lunge_back_knee_straight"]);
    }

    #[test]
    fn test_back_leg_ignored_when_standing() {
        let current = angles(&[("front_knee", 170.0), ("back_knee", 175.0)]);
        assert!(codes(&current, None).is_empty());
    }

    #[test]
    fn test_collapse_and_lean() {
        let current = angles(&[("front_knee", 50.0), ("back_knee", 100.0), ("torso_lean", 30.0)]);
        assert_eq!(
            codes(&current, None),
            vec!["lunge_front_knee_collapse", "lunge_torso_lean"]
        );
    }

    #[test]
    fn test_collapse_issue_describes_the_bend() {
        let rules = LungeRules::new(&LungeConfig::default());
        let current = angles(&[("front_knee", 50.0)]);
        let issues = RuleEngine::evaluate(&rules, &CheckContext::new(&current, None));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "lunge_front_knee_collapse");
        assert_eq!(issues[0].message, "Front knee is bending too sharply");
        assert!(!issues[0].message.contains("toes"));
    }

    #[test]
    fn test_front_knee_is_the_more_bent_one() {
        let front = ANGLES.iter().find(|d| d.name == "front_knee").unwrap();
        assert!(matches!(
            front.source,
            crate::angles::AngleSource::Min("left_knee", "right_knee")
        ));
    }
}

//! Jumping jack rule set

use super::{Check, CheckContext, RuleSet};
use crate::angles::AngleDefinition;
use crate::config::{JumpingJackConfig, RepConfig};
use crate::types::LandmarkName::*;
use crate::types::{ExerciseKind, LandmarkName, Severity};

const ANGLES: [AngleDefinition; 6] = [
    AngleDefinition::joint("left_arm_raise", LeftHip, LeftShoulder, LeftElbow),
    AngleDefinition::joint("right_arm_raise", RightHip, RightShoulder, RightElbow),
    AngleDefinition::mean("arm_raise", "left_arm_raise", "right_arm_raise"),
    AngleDefinition::joint("left_elbow", LeftShoulder, LeftElbow, LeftWrist),
    AngleDefinition::joint("right_elbow", RightShoulder, RightElbow, RightWrist),
    AngleDefinition::min("elbow", "left_elbow", "right_elbow"),
];

const ARMS: &[LandmarkName] = &[LeftShoulder, RightShoulder, LeftElbow, RightElbow];
const ELBOWS: &[LandmarkName] = &[LeftElbow, RightElbow, LeftWrist, RightWrist];

/// Jumping jack analysis rules
#[derive(Debug)]
pub struct JumpingJackRules {
    checks: Vec<Check>,
    rep: RepConfig,
}

impl JumpingJackRules {
    pub fn new(config: &JumpingJackConfig) -> Self {
        let rest = config.rep.start_bound();
        let full_raise = config.full_raise;
        let asymmetry = config.asymmetry_tolerance;
        let bent = config.bent_elbow;
        let stall = config.stall_tolerance;

        let checks = vec![
            Check::new(
                "jumping_jack_incomplete_raise",
                Severity::Warning,
                "Arms are not reaching overhead",
                "Bring your hands all the way up above your head",
                ARMS,
                move |ctx: &CheckContext<'_>| {
                    ctx.stalled("arm_raise", stall)
                        .is_some_and(|a| a > rest && a < full_raise)
                },
            ),
            Check::new(
                "jumping_jack_arm_asymmetry",
                Severity::Warning,
                "Arms are not moving together",
                "Raise both arms at the same pace",
                ARMS,
                move |ctx: &CheckContext<'_>| {
                    ctx.difference("left_arm_raise", "right_arm_raise")
                        .is_some_and(|d| d > asymmetry)
                },
            ),
            Check::new(
                "jumping_jack_bent_elbows",
                Severity::Info,
                "Elbows are bent at the top",
                "Keep your arms long as they pass overhead",
                ELBOWS,
                move |ctx: &CheckContext<'_>| match (ctx.angle("arm_raise"), ctx.angle("elbow")) {
                    (Some(raise), Some(elbow)) => raise >= full_raise && elbow < bent,
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

impl RuleSet for JumpingJackRules {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::JumpingJack
    }

    fn display_name(&self) -> &'static str {
        "Jumping Jack"
    }

    fn description(&self) -> &'static str {
        "Jumping jack; repetitions counted on the mean arm raise angle"
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

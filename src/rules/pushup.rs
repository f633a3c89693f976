//! Push-up rule set

use super::{Check, CheckContext, RuleSet};
use crate::angles::{AngleDefinition, Axis};
use crate::config::{PushupConfig, RepConfig};
use crate::types::LandmarkName::*;
use crate::types::{ExerciseKind, LandmarkName, Severity};

const ANGLES: [AngleDefinition; 9] = [
    AngleDefinition::joint("left_elbow", LeftShoulder, LeftElbow, LeftWrist),
    AngleDefinition::joint("right_elbow", RightShoulder, RightElbow, RightWrist),
    AngleDefinition::mean("elbow", "left_elbow", "right_elbow"),
    AngleDefinition::joint("left_body_line", LeftShoulder, LeftHip, LeftAnkle),
    AngleDefinition::joint("right_body_line", RightShoulder, RightHip, RightAnkle),
    AngleDefinition::mean("body_line", "left_body_line", "right_body_line"),
    AngleDefinition::segment("left_upper_arm_tilt", LeftShoulder, LeftElbow, Axis::Vertical),
    AngleDefinition::segment("right_upper_arm_tilt", RightShoulder, RightElbow, Axis::Vertical),
    AngleDefinition::max("upper_arm_tilt", "left_upper_arm_tilt", "right_upper_arm_tilt"),
];

const BODY_LINE: &[LandmarkName] = &[
    LeftShoulder,
    RightShoulder,
    LeftHip,
    RightHip,
    LeftAnkle,
    RightAnkle,
];
const ELBOWS: &[LandmarkName] = &[LeftElbow, RightElbow];
const ARMS: &[LandmarkName] = &[LeftShoulder, RightShoulder, LeftElbow, RightElbow];

/// Push-up analysis rules
#[derive(Debug)]
pub struct PushupRules {
    checks: Vec<Check>,
    rep: RepConfig,
}

impl PushupRules {
    pub fn new(config: &PushupConfig) -> Self {
        let line_critical = config.body_line_critical;
        let line_info = config.body_line_info;
        let depth = config.depth;
        let top = config.rep.start_bound();
        let asymmetry = config.asymmetry_tolerance;
        let flare = config.elbow_flare;
        let stall = config.stall_tolerance;

        let checks = vec![
            Check::new(
                "pushup_body_line_broken",
                Severity::Critical,
                "Hips are sagging or piking",
                "Engage your core to keep your body in a straight line",
                BODY_LINE,
                move |ctx: &CheckContext<'_>| ctx.angle("body_line").is_some_and(|a| a < line_critical),
            ),
            Check::new(
                "pushup_insufficient_depth",
                Severity::Warning,
                "Push-up depth is insufficient",
                "Lower your chest closer to the ground",
                ELBOWS,
                move |ctx: &CheckContext<'_>| {
                    ctx.stalled("elbow", stall)
                        .is_some_and(|e| e > depth && e < top)
                },
            ),
            Check::new(
                "pushup_uneven_arms",
                Severity::Warning,
                "Arms are not moving evenly",
                "Focus on keeping both arms moving at the same pace",
                ELBOWS,
                move |ctx: &CheckContext<'_>| {
                    ctx.difference("left_elbow", "right_elbow")
                        .is_some_and(|d| d > asymmetry)
                },
            ),
            Check::new(
                "pushup_elbow_flare",
                Severity::Warning,
                "Elbows are flaring out",
                "Keep elbows at about 45 degrees from your body",
                ARMS,
                move |ctx: &CheckContext<'_>| ctx.angle("upper_arm_tilt").is_some_and(|a| a > flare),
            ),
            Check::new(
                "pushup_body_line_drift",
                Severity::Info,
                "Body line is drifting",
                "Squeeze your glutes to hold a straight plank",
                BODY_LINE,
                move |ctx: &CheckContext<'_>| {
                    ctx.angle("body_line")
                        .is_some_and(|a| a >= line_critical && a < line_info)
                },
            ),
        ];

        Self {
            checks,
            rep: config.rep.clone(),
        }
    }
}

impl RuleSet for PushupRules {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Pushup
    }

    fn display_name(&self) -> &'static str {
        "Push-up"
    }

    fn description(&self) -> &'static str {
        "Standard push-up; repetitions counted on the mean elbow angle"
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

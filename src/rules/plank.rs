//! Plank rule set
//!
//! The plank is held rather than repeated, so its repetition machine counts holds: the
//! body line has to stay aligned for the configured dwell before a release is credited.

use super::{Check, CheckContext, RuleSet};
use crate::angles::AngleDefinition;
use crate::config::{PlankConfig, RepConfig};
use crate::types::LandmarkName::*;
use crate::types::{ExerciseKind, LandmarkName, Severity};

const ANGLES: [AngleDefinition; 6] = [
    AngleDefinition::joint("left_body_line", LeftShoulder, LeftHip, LeftAnkle),
    AngleDefinition::joint("right_body_line", RightShoulder, RightHip, RightAnkle),
    AngleDefinition::mean("body_line", "left_body_line", "right_body_line"),
    AngleDefinition::joint("left_neck", LeftEar, LeftShoulder, LeftHip),
    AngleDefinition::joint("right_neck", RightEar, RightShoulder, RightHip),
    AngleDefinition::mean("neck", "left_neck", "right_neck"),
];

const BODY_LINE: &[LandmarkName] = &[
    LeftShoulder,
    RightShoulder,
    LeftHip,
    RightHip,
    LeftAnkle,
    RightAnkle,
];
const HEAD: &[LandmarkName] = &[Nose, LeftEar, RightEar, LeftShoulder, RightShoulder];

/// Plank analysis rules
#[derive(Debug)]
pub struct PlankRules {
    checks: Vec<Check>,
    rep: RepConfig,
}

impl PlankRules {
    pub fn new(config: &PlankConfig) -> Self {
        let alignment = config.hip_alignment;
        let head_neutral = config.head_neutral;

        let checks = vec![
            Check::new(
                "plank_hip_misalignment",
                Severity::Critical,
                "Hips are sagging or too high",
                "Keep hips in line with shoulders and heels for proper plank form",
                BODY_LINE,
                move |ctx: &CheckContext<'_>| ctx.angle("body_line").is_some_and(|a| a < alignment),
            ),
            Check::new(
                "plank_head_position",
                Severity::Info,
                "Head position could be better",
                "Keep your head neutral, looking slightly ahead",
                HEAD,
                move |ctx: &CheckContext<'_>| ctx.angle("neck").is_some_and(|a| a < head_neutral),
            ),
        ];

        Self {
            checks,
            rep: config.rep.clone(),
        }
    }
}

impl RuleSet for PlankRules {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Plank
    }

    fn display_name(&self) -> &'static str {
        "Plank"
    }

    fn description(&self) -> &'static str {
        "Forearm or high plank; each aligned hold is counted when it is released"
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

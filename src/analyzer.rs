//! Frame analysis
//!
//! Runs one frame through the per-frame stages (normalize → angles → checks → score)
//! and advances the repetition machine. Holds the only per-session state the stages
//! need: the previous pose-present frame's angles and the repetition state.

use crate::angles::AngleComputer;
use crate::config::EngineConfig;
use crate::normalizer::LandmarkNormalizer;
use crate::repetition::{RepState, RepStateMachine};
use crate::rules::{CheckContext, RuleEngine, RuleSet};
use crate::types::{AngleMap, ExerciseKind, FrameAnalysis, FrameInput};

/// Stateful per-session frame analyzer
#[derive(Debug, Clone)]
pub struct FrameAnalyzer {
    exercise: ExerciseKind,
    primary_angle: String,
    reps: RepStateMachine,
    prior_angles: Option<AngleMap>,
}

impl FrameAnalyzer {
    pub fn new(rules: &dyn RuleSet) -> Self {
        let rep_config = rules.rep_config().clone();
        Self {
            exercise: rules.kind(),
            primary_angle: rep_config.primary_angle.clone(),
            reps: RepStateMachine::new(rules.kind(), rep_config),
            prior_angles: None,
        }
    }

    pub fn exercise(&self) -> ExerciseKind {
        self.exercise
    }

    pub fn rep_state(&self) -> &RepState {
        self.reps.state()
    }

    /// Analyze one frame; `rules` must be the rule set this analyzer was built from
    pub fn analyze(
        &mut self,
        rules: &dyn RuleSet,
        config: &EngineConfig,
        frame: &FrameInput,
    ) -> FrameAnalysis {
        // Stage 1: Validate landmarks
        let normalized =
            LandmarkNormalizer::normalize(frame.pose.as_ref(), config.confidence_threshold);

        if !normalized.pose_present {
            let state = self.reps.state();
            return FrameAnalysis {
                exercise: self.exercise,
                frame_number: frame.frame_number,
                timestamp: frame.timestamp,
                pose_present: false,
                angles: AngleMap::new(),
                issues: Vec::new(),
                form_score: None,
                rep_count: state.rep_count,
                phase: state.phase,
                rep_completed: false,
            };
        }

        // Stage 2: Compute joint angles
        let angles = AngleComputer::compute(
            rules.angle_definitions(),
            &normalized,
            config.min_vector_norm,
        );

        // Stage 3: Evaluate checks and score
        let ctx = CheckContext::new(&angles, self.prior_angles.as_ref());
        let issues = RuleEngine::evaluate(rules, &ctx);
        let form_score = RuleEngine::score(&issues, &config.penalties);

        // Stage 4: Advance repetition phase
        let rep = self.reps.update(angles.get(&self.primary_angle).copied());

        self.prior_angles = Some(angles.clone());

        FrameAnalysis {
            exercise: self.exercise,
            frame_number: frame.frame_number,
            timestamp: frame.timestamp,
            pose_present: true,
            angles,
            issues,
            form_score: Some(form_score),
            rep_count: rep.rep_count,
            phase: rep.phase,
            rep_completed: rep.rep_completed,
        }
    }

    /// Forget the repetition state and the previous frame
    pub fn reset(&mut self) {
        self.reps.reset();
        self.prior_angles = None;
    }
}

//! Engine configuration
//!
//! Every threshold a check or the repetition machine reads lives here. A config is
//! validated once when the exercise registry is built and is never mutated
//! afterwards.

use crate::error::AnalysisError;
use crate::types::{ExerciseKind, Severity};
use serde::{Deserialize, Serialize};

/// Default landmark confidence threshold
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Default number of recommendations in a session summary
pub const DEFAULT_MAX_RECOMMENDATIONS: usize = 5;

/// Vectors shorter than this are treated as missing by the angle computer
pub const DEFAULT_MIN_VECTOR_NORM: f64 = 1e-6;

/// Score deducted per issue, by severity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityPenalties {
    pub critical: f64,
    pub warning: f64,
    pub info: f64,
}

impl Default for SeverityPenalties {
    fn default() -> Self {
        Self {
            critical: 30.0,
            warning: 15.0,
            info: 5.0,
        }
    }
}

impl SeverityPenalties {
    pub fn for_severity(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
        }
    }
}

/// Which bound the primary angle crosses first during the active phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepDirection {
    /// Starts above `upper_bound`, target is `lower_bound` (squat, push-up)
    Descending,
    /// Starts below `lower_bound`, target is `upper_bound` (jumping jack)
    Ascending,
}

/// Repetition machine parameters for one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepConfig {
    /// Angle-table entry driving the machine
    pub primary_angle: String,
    pub upper_bound: f64,
    pub lower_bound: f64,
    pub direction: RepDirection,
    /// Consecutive frames beyond the target bound before the hold is accepted
    pub min_dwell_frames: u32,
}

impl RepConfig {
    pub fn descending(primary_angle: &str, upper_bound: f64, lower_bound: f64) -> Self {
        Self {
            primary_angle: primary_angle.to_string(),
            upper_bound,
            lower_bound,
            direction: RepDirection::Descending,
            min_dwell_frames: 2,
        }
    }

    pub fn ascending(primary_angle: &str, lower_bound: f64, upper_bound: f64) -> Self {
        Self {
            primary_angle: primary_angle.to_string(),
            upper_bound,
            lower_bound,
            direction: RepDirection::Ascending,
            min_dwell_frames: 2,
        }
    }

    pub fn with_min_dwell(mut self, frames: u32) -> Self {
        self.min_dwell_frames = frames;
        self
    }

    /// Bound the movement starts from
    pub fn start_bound(&self) -> f64 {
        match self.direction {
            RepDirection::Descending => self.upper_bound,
            RepDirection::Ascending => self.lower_bound,
        }
    }

    /// Bound the movement travels to
    pub fn target_bound(&self) -> f64 {
        match self.direction {
            RepDirection::Descending => self.lower_bound,
            RepDirection::Ascending => self.upper_bound,
        }
    }

    fn validate(&self, exercise: &str) -> Result<(), AnalysisError> {
        if !(self.lower_bound.is_finite() && self.upper_bound.is_finite()) {
            return Err(AnalysisError::InvalidConfig(format!(
                "{exercise}: repetition bounds must be finite"
            )));
        }
        if self.lower_bound >= self.upper_bound {
            return Err(AnalysisError::InvalidConfig(format!(
                "{exercise}: lower_bound {} must be below upper_bound {}",
                self.lower_bound, self.upper_bound
            )));
        }
        if !(0.0..=180.0).contains(&self.lower_bound) || !(0.0..=180.0).contains(&self.upper_bound)
        {
            return Err(AnalysisError::InvalidConfig(format!(
                "{exercise}: repetition bounds must lie in [0, 180]"
            )));
        }
        if self.min_dwell_frames == 0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "{exercise}: min_dwell_frames must be at least 1"
            )));
        }
        if self.primary_angle.is_empty() {
            return Err(AnalysisError::InvalidConfig(format!(
                "{exercise}: primary_angle is empty"
            )));
        }
        Ok(())
    }
}

/// Squat thresholds (degrees)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquatConfig {
    pub rep: RepConfig,
    /// Knee angle at which thighs are parallel to the floor
    pub parallel_depth: f64,
    /// Knee angle counted as full depth
    pub full_depth: f64,
    pub forward_lean_warning: f64,
    pub forward_lean_critical: f64,
    pub asymmetry_tolerance: f64,
    /// Largest knee-angle drop between consecutive frames before the descent is uncontrolled
    pub max_descent_per_frame: f64,
    /// Angle change between frames below which the movement is considered paused
    pub stall_tolerance: f64,
    /// Mean knee-track angle above which the knees cave inward (90 means knees over ankles)
    pub knee_valgus: f64,
}

impl Default for SquatConfig {
    fn default() -> Self {
        Self {
            rep: RepConfig::descending("knee", 160.0, 100.0),
            parallel_depth: 100.0,
            full_depth: 90.0,
            forward_lean_warning: 45.0,
            forward_lean_critical: 60.0,
            asymmetry_tolerance: 20.0,
            max_descent_per_frame: 50.0,
            stall_tolerance: 3.0,
            knee_valgus: 105.0,
        }
    }
}

/// Push-up thresholds (degrees)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushupConfig {
    pub rep: RepConfig,
    /// Elbow angle the chest must reach
    pub depth: f64,
    /// Shoulder-hip-ankle angle below which the body line is broken
    pub body_line_critical: f64,
    /// Shoulder-hip-ankle angle below which the body line drifts
    pub body_line_info: f64,
    /// Upper-arm to torso angle above which the elbows flare
    pub elbow_flare: f64,
    pub asymmetry_tolerance: f64,
    pub stall_tolerance: f64,
}

impl Default for PushupConfig {
    fn default() -> Self {
        Self {
            rep: RepConfig::descending("elbow", 160.0, 100.0),
            depth: 100.0,
            body_line_critical: 150.0,
            body_line_info: 165.0,
            elbow_flare: 75.0,
            asymmetry_tolerance: 20.0,
            stall_tolerance: 3.0,
        }
    }
}

/// Lunge thresholds (degrees)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LungeConfig {
    pub rep: RepConfig,
    pub depth: f64,
    /// Front knee angle below which the knee is folded past a safe bend
    pub front_knee_collapse: f64,
    /// Back knee angle above which the back leg stays straight
    pub back_knee_straight: f64,
    /// Front knee angle below which the back knee is expected to bend
    pub lunge_engaged: f64,
    pub torso_lean: f64,
    pub stall_tolerance: f64,
}

impl Default for LungeConfig {
    fn default() -> Self {
        Self {
            rep: RepConfig::descending("front_knee", 160.0, 100.0),
            depth: 100.0,
            front_knee_collapse: 60.0,
            back_knee_straight: 160.0,
            lunge_engaged: 110.0,
            torso_lean: 20.0,
            stall_tolerance: 3.0,
        }
    }
}

/// Jumping jack thresholds (degrees)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JumpingJackConfig {
    pub rep: RepConfig,
    /// Arm raise the hands must reach overhead
    pub full_raise: f64,
    pub asymmetry_tolerance: f64,
    /// Elbow angle below which the arms are bent
    pub bent_elbow: f64,
    pub stall_tolerance: f64,
}

impl Default for JumpingJackConfig {
    fn default() -> Self {
        Self {
            rep: RepConfig::ascending("arm_raise", 50.0, 140.0).with_min_dwell(1),
            full_raise: 140.0,
            asymmetry_tolerance: 25.0,
            bent_elbow: 140.0,
            stall_tolerance: 3.0,
        }
    }
}

/// Plank thresholds (degrees)
///
/// A plank is a hold: one repetition is one stretch of aligned body line lasting at
/// least `rep.min_dwell_frames` frames, counted when the position is released.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlankConfig {
    pub rep: RepConfig,
    /// Shoulder-hip-ankle angle below which the hips sag or pike
    pub hip_alignment: f64,
    /// Ear-shoulder-hip angle below which the head is out of line with the torso
    pub head_neutral: f64,
}

impl Default for PlankConfig {
    fn default() -> Self {
        Self {
            rep: RepConfig::ascending("body_line", 150.0, 165.0).with_min_dwell(30),
            hip_alignment: 160.0,
            head_neutral: 150.0,
        }
    }
}

/// Per-exercise configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExerciseConfigs {
    pub squat: SquatConfig,
    pub pushup: PushupConfig,
    pub lunge: LungeConfig,
    pub jumping_jack: JumpingJackConfig,
    pub plank: PlankConfig,
}

impl ExerciseConfigs {
    /// Repetition parameters for an exercise
    pub fn rep_config(&self, kind: ExerciseKind) -> &RepConfig {
        match kind {
            ExerciseKind::Squat => &self.squat.rep,
            ExerciseKind::Pushup => &self.pushup.rep,
            ExerciseKind::Lunge => &self.lunge.rep,
            ExerciseKind::JumpingJack => &self.jumping_jack.rep,
            ExerciseKind::Plank => &self.plank.rep,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum landmark confidence (0-1)
    pub confidence_threshold: f64,
    pub penalties: SeverityPenalties,
    pub max_recommendations: usize,
    pub min_vector_norm: f64,
    pub exercises: ExerciseConfigs,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            penalties: SeverityPenalties::default(),
            max_recommendations: DEFAULT_MAX_RECOMMENDATIONS,
            min_vector_norm: DEFAULT_MIN_VECTOR_NORM,
            exercises: ExerciseConfigs::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check the configuration's own invariants
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(AnalysisError::InvalidConfig(format!(
                "confidence_threshold {} is outside [0, 1]",
                self.confidence_threshold
            )));
        }
        let p = &self.penalties;
        if [p.critical, p.warning, p.info]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(AnalysisError::InvalidConfig(
                "severity penalties must be finite and non-negative".to_string(),
            ));
        }
        if self.max_recommendations == 0 {
            return Err(AnalysisError::InvalidConfig(
                "max_recommendations must be at least 1".to_string(),
            ));
        }
        if !(self.min_vector_norm.is_finite() && self.min_vector_norm > 0.0) {
            return Err(AnalysisError::InvalidConfig(
                "min_vector_norm must be positive".to_string(),
            ));
        }
        for kind in ExerciseKind::ALL {
            self.exercises.rep_config(kind).validate(kind.as_str())?;
        }
        let squat = &self.exercises.squat;
        if squat.forward_lean_warning >= squat.forward_lean_critical {
            return Err(AnalysisError::InvalidConfig(
                "squat: forward_lean_warning must be below forward_lean_critical".to_string(),
            ));
        }
        if squat.full_depth > squat.parallel_depth {
            return Err(AnalysisError::InvalidConfig(
                "squat: full_depth must not exceed parallel_depth".to_string(),
            ));
        }
        if squat.knee_valgus <= 90.0 {
            return Err(AnalysisError::InvalidConfig(
                "squat: knee_valgus must be above 90 (knees over ankles)".to_string(),
            ));
        }
        let pushup = &self.exercises.pushup;
        if pushup.body_line_critical > pushup.body_line_info {
            return Err(AnalysisError::InvalidConfig(
                "pushup: body_line_critical must not exceed body_line_info".to_string(),
            ));
        }
        Ok(())
    }
}

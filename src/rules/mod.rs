//! Exercise rule sets
//!
//! Each supported exercise contributes an angle table, an ordered list of checks and a
//! repetition configuration. Checks are pure predicates over the current frame's angles
//! and the angles of the previous frame in which a person was present.

mod jumping_jack;
mod lunge;
mod plank;
mod pushup;
mod squat;

pub use jumping_jack::JumpingJackRules;
pub use lunge::LungeRules;
pub use plank::PlankRules;
pub use pushup::PushupRules;
pub use squat::SquatRules;

use crate::angles::AngleDefinition;
use crate::config::{ExerciseConfigs, RepConfig, SeverityPenalties};
use crate::types::{AngleMap, ExerciseKind, Issue, LandmarkName, Severity};
use std::fmt;

/// Trait implemented by every exercise's rule set
pub trait RuleSet: Send + Sync {
    fn kind(&self) -> ExerciseKind;

    /// Human-readable exercise name
    fn display_name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Angles computed for every frame of this exercise
    fn angle_definitions(&self) -> &[AngleDefinition];

    /// Checks in registration order
    fn checks(&self) -> &[Check];

    fn rep_config(&self) -> &RepConfig;
}

/// Inputs available to a check predicate
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub angles: &'a AngleMap,
    /// Angles of the previous pose-present frame, if any
    pub prior: Option<&'a AngleMap>,
}

impl<'a> CheckContext<'a> {
    pub fn new(angles: &'a AngleMap, prior: Option<&'a AngleMap>) -> Self {
        Self { angles, prior }
    }

    pub fn angle(&self, name: &str) -> Option<f64> {
        self.angles.get(name).copied()
    }

    pub fn prior_angle(&self, name: &str) -> Option<f64> {
        self.prior.and_then(|p| p.get(name).copied())
    }

    /// Absolute difference between two angles of the current frame
    pub fn difference(&self, left: &str, right: &str) -> Option<f64> {
        Some((self.angle(left)? - self.angle(right)?).abs())
    }

    /// Current value of `name` when it moved at most `tolerance` degrees since the
    /// previous frame
    pub fn stalled(&self, name: &str, tolerance: f64) -> Option<f64> {
        let current = self.angle(name)?;
        let prior = self.prior_angle(name)?;
        ((current - prior).abs() <= tolerance).then_some(current)
    }
}

type Predicate = Box<dyn Fn(&CheckContext<'_>) -> bool + Send + Sync>;

/// A named rule producing at most one issue per frame
pub struct Check {
    pub code: &'static str,
    pub severity: Severity,
    pub message: &'static str,
    pub suggestion: &'static str,
    pub landmarks: &'static [LandmarkName],
    predicate: Predicate,
}

impl Check {
    pub fn new(
        code: &'static str,
        severity: Severity,
        message: &'static str,
        suggestion: &'static str,
        landmarks: &'static [LandmarkName],
        predicate: impl Fn(&CheckContext<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            severity,
            message,
            suggestion,
            landmarks,
            predicate: Box::new(predicate),
        }
    }

    pub fn fires(&self, ctx: &CheckContext<'_>) -> bool {
        (self.predicate)(ctx)
    }

    pub fn to_issue(&self) -> Issue {
        Issue {
            severity: self.severity,
            code: self.code.to_string(),
            message: self.message.to_string(),
            suggestion: self.suggestion.to_string(),
            affected_landmarks: self.landmarks.to_vec(),
        }
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("code", &self.code)
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}

/// Rule engine evaluating a rule set against one frame
pub struct RuleEngine;

impl RuleEngine {
    /// Run every check; issues come back Critical → Warning → Info, ties in registration order
    pub fn evaluate(rules: &dyn RuleSet, ctx: &CheckContext<'_>) -> Vec<Issue> {
        let mut issues: Vec<Issue> = rules
            .checks()
            .iter()
            .filter(|check| check.fires(ctx))
            .map(Check::to_issue)
            .collect();
        // sort_by_key is stable
        issues.sort_by_key(|issue| issue.severity);
        issues
    }

    /// 100 minus the severity penalties, clamped to [0, 100]
    pub fn score(issues: &[Issue], penalties: &SeverityPenalties) -> f64 {
        let deducted: f64 = issues
            .iter()
            .map(|issue| penalties.for_severity(issue.severity))
            .sum();
        (100.0 - deducted).clamp(0.0, 100.0)
    }
}

/// Build the rule set for an exercise from its configuration
pub fn build_rule_set(kind: ExerciseKind, config: &ExerciseConfigs) -> Box<dyn RuleSet> {
    match kind {
        ExerciseKind::Squat => Box::new(SquatRules::new(&config.squat)),
        ExerciseKind::Pushup => Box::new(PushupRules::new(&config.pushup)),
        ExerciseKind::Lunge => Box::new(LungeRules::new(&config.lunge)),
        ExerciseKind::JumpingJack => Box::new(JumpingJackRules::new(&config.jumping_jack)),
        ExerciseKind::Plank => Box::new(PlankRules::new(&config.plank)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeRules {
        checks: Vec<Check>,
        rep: RepConfig,
    }

    impl RuleSet for FakeRules {
        fn kind(&self) -> ExerciseKind {
            ExerciseKind::Squat
        }
        fn display_name(&self) -> &'static str {
            "Fake"
        }
        fn description(&self) -> &'static str {
            "test rules"
        }
        fn angle_definitions(&self) -> &[AngleDefinition] {
            &[]
        }
        fn checks(&self) -> &[Check] {
            &self.checks
        }
        fn rep_config(&self) -> &RepConfig {
            &self.rep
        }
    }

    fn always(code: &'static str, severity: Severity) -> Check {
        Check::new(code, severity, "msg", "fix it", &[], |_| true)
    }

    fn fake(checks: Vec<Check>) -> FakeRules {
        FakeRules {
            checks,
            rep: RepConfig::descending("knee", 160.0, 100.0),
        }
    }

    #[test]
    fn test_issues_sorted_by_severity_then_registration() {
        let rules = fake(vec![
            always("info_a", Severity::Info),
            always("warn_a", Severity::Warning),
            always("crit_a", Severity::Critical),
            always("warn_b", Severity::Warning),
            always("info_b", Severity::Info),
        ]);
        let angles = AngleMap::new();
        let issues = RuleEngine::evaluate(&rules, &CheckContext::new(&angles, None));
        let codes: Vec<&str> = issues.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["crit_a", "warn_a", "warn_b", "info_a", "info_b"]);
    }

    #[test]
    fn test_non_firing_checks_are_skipped() {
        let rules = fake(vec![
            Check::new("knee_low", Severity::Warning, "m", "s", &[], |ctx| {
                ctx.angle("knee").is_some_and(|k| k < 90.0)
            }),
            always("always", Severity::Info),
        ]);
        let mut angles = AngleMap::new();
        angles.insert("knee".to_string(), 120.0);
        let issues = RuleEngine::evaluate(&rules, &CheckContext::new(&angles, None));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "always");
    }

    #[test]
    fn test_score_clamps_at_zero() {
        let penalties = SeverityPenalties::default();
        let issues: Vec<Issue> = (0..5)
            .map(|_| always("c", Severity::Critical).to_issue())
            .collect();
        assert_eq!(RuleEngine::score(&issues, &penalties), 0.0);
        assert_eq!(RuleEngine::score(&[], &penalties), 100.0);
    }

    #[test]
    fn test_score_sums_penalties() {
        let penalties = SeverityPenalties::default();
        let issues = vec![
            always("c", Severity::Critical).to_issue(),
            always("w", Severity::Warning).to_issue(),
            always("i", Severity::Info).to_issue(),
        ];
        assert_eq!(RuleEngine::score(&issues, &penalties), 50.0);
    }

    #[test]
    fn test_stall_needs_prior_frame() {
        let mut current = AngleMap::new();
        current.insert("knee".to_string(), 130.0);
        let mut prior = AngleMap::new();
        prior.insert("knee".to_string(), 131.5);

        assert_eq!(CheckContext::new(&current, None).stalled("knee", 3.0), None);
        assert_eq!(
            CheckContext::new(&current, Some(&prior)).stalled("knee", 3.0),
            Some(130.0)
        );

        prior.insert("knee".to_string(), 140.0);
        assert_eq!(CheckContext::new(&current, Some(&prior)).stalled("knee", 3.0), None);
    }
}

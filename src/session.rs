//! Per-session state
//!
//! A session owns everything that depends on frame order for one exercise attempt:
//! the frame analyzer (repetition state, previous angles), the running aggregate and
//! the ordering watermark.

use crate::aggregator::SessionAggregator;
use crate::analyzer::FrameAnalyzer;
use crate::config::EngineConfig;
use crate::error::{AnalysisError, AnalysisResult};
use crate::repetition::RepState;
use crate::rules::RuleSet;
use crate::types::{ExerciseKind, FrameAnalysis, FrameInput, SessionSummary};
use chrono::{DateTime, Duration, Utc};

/// Idle time after which a session is considered abandoned (seconds)
pub const DEFAULT_SESSION_TIMEOUT_SECS: i64 = 3600;

/// Last accepted frame of a session
#[derive(Debug, Clone, Copy, PartialEq)]
struct Watermark {
    frame_number: u64,
    timestamp: f64,
}

/// One exercise session
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    started_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    watermark: Option<Watermark>,
    analyzer: FrameAnalyzer,
    aggregator: SessionAggregator,
}

impl Session {
    pub fn new(id: impl Into<String>, rules: &dyn RuleSet) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            started_at: now,
            last_activity: now,
            watermark: None,
            analyzer: FrameAnalyzer::new(rules),
            aggregator: SessionAggregator::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn exercise(&self) -> ExerciseKind {
        self.analyzer.exercise()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn rep_state(&self) -> &RepState {
        self.analyzer.rep_state()
    }

    /// Analyze the next frame; rejected frames leave the session untouched
    pub fn submit(
        &mut self,
        rules: &dyn RuleSet,
        config: &EngineConfig,
        frame: &FrameInput,
    ) -> AnalysisResult<FrameAnalysis> {
        self.check_order(frame)?;

        let analysis = self.analyzer.analyze(rules, config, frame);
        self.aggregator.record(&analysis);
        self.watermark = Some(Watermark {
            frame_number: frame.frame_number,
            timestamp: frame.timestamp,
        });
        self.last_activity = Utc::now();

        Ok(analysis)
    }

    /// Frames must be strictly increasing in both number and timestamp
    pub fn check_order(&self, frame: &FrameInput) -> AnalysisResult<()> {
        let in_order = frame.timestamp.is_finite()
            && self.watermark.map_or(true, |last| {
                frame.frame_number > last.frame_number && frame.timestamp > last.timestamp
            });

        if in_order {
            return Ok(());
        }

        let (last_frame, last_timestamp) = self
            .watermark
            .map_or((0, f64::NEG_INFINITY), |w| (w.frame_number, w.timestamp));

        Err(AnalysisError::OutOfOrderFrame {
            session_id: self.id.clone(),
            last_frame,
            last_timestamp,
            frame_number: frame.frame_number,
            timestamp: frame.timestamp,
        })
    }

    /// Summary of the frames processed so far
    pub fn summary(&self, max_recommendations: usize) -> SessionSummary {
        self.aggregator.summarize(
            &self.id,
            self.exercise(),
            self.started_at,
            self.analyzer.rep_state().rep_count,
            max_recommendations,
        )
    }

    /// Start over: fresh repetition state, aggregate and ordering watermark
    pub fn reset(&mut self) {
        let now = Utc::now();
        self.analyzer.reset();
        self.aggregator = SessionAggregator::new();
        self.watermark = None;
        self.started_at = now;
        self.last_activity = now;
    }

    /// Whether no frame arrived within `max_idle` before `now`
    pub fn is_idle(&self, now: DateTime<Utc>, max_idle: Duration) -> bool {
        now - self.last_activity > max_idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ExerciseRegistry;

    fn session(registry: &ExerciseRegistry) -> Session {
        Session::new("s1", registry.get(ExerciseKind::Squat).unwrap())
    }

    #[test]
    fn test_rejects_repeated_frame_number() {
        let registry = ExerciseRegistry::default();
        let rules = registry.get(ExerciseKind::Squat).unwrap();
        let mut s = session(&registry);

        s.submit(rules, registry.config(), &FrameInput::new(1, 0.1, None))
            .unwrap();
        let err = s
            .submit(rules, registry.config(), &FrameInput::new(1, 0.2, None))
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::OutOfOrderFrame { last_frame: 1, frame_number: 1, .. }
        ));
        assert_eq!(s.summary(5).total_frames, 1);
    }

    #[test]
    fn test_rejects_stale_timestamp() {
        let registry = ExerciseRegistry::default();
        let rules = registry.get(ExerciseKind::Squat).unwrap();
        let mut s = session(&registry);

        s.submit(rules, registry.config(), &FrameInput::new(1, 1.0, None))
            .unwrap();
        assert!(s
            .submit(rules, registry.config(), &FrameInput::new(2, 1.0, None))
            .is_err());
        assert!(s
            .submit(rules, registry.config(), &FrameInput::new(3, f64::NAN, None))
            .is_err());
        assert!(s
            .submit(rules, registry.config(), &FrameInput::new(3, 1.5, None))
            .is_ok());
    }

    #[test]
    fn test_reset_clears_watermark_and_totals() {
        let registry = ExerciseRegistry::default();
        let rules = registry.get(ExerciseKind::Squat).unwrap();
        let mut s = session(&registry);

        s.submit(rules, registry.config(), &FrameInput::new(10, 1.0, None))
            .unwrap();
        s.reset();

        let summary = s.summary(5);
        assert_eq!(summary.total_frames, 0);
        assert_eq!(summary.rep_count, 0);
        assert!(s
            .submit(rules, registry.config(), &FrameInput::new(0, 0.0, None))
            .is_ok());
    }

    #[test]
    fn test_idle_detection() {
        let registry = ExerciseRegistry::default();
        let s = session(&registry);
        let later = s.last_activity() + Duration::seconds(DEFAULT_SESSION_TIMEOUT_SECS + 1);

        assert!(s.is_idle(later, Duration::seconds(DEFAULT_SESSION_TIMEOUT_SECS)));
        assert!(!s.is_idle(s.last_activity(), Duration::seconds(DEFAULT_SESSION_TIMEOUT_SECS)));
    }
}

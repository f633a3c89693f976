//! Engine orchestration
//!
//! This module provides the public API for formcheck.
//! `FormEngine` owns the exercise registry and every live session; the one-shot
//! `analyze_sequence` runs a fresh session over an ordered list of frames.

use crate::config::EngineConfig;
use crate::error::{AnalysisError, AnalysisResult};
use crate::registry::{ExerciseInfo, ExerciseRegistry};
use crate::rules::RuleSet;
use crate::session::Session;
use crate::types::{ExerciseKind, FrameAnalysis, FrameInput, Pose, SessionSummary};
use chrono::{Duration, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Every frame analysis of a sequence plus its final summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceAnalysis {
    pub frames: Vec<FrameAnalysis>,
    pub summary: SessionSummary,
}

/// Analyze an ordered frame sequence with the default configuration.
///
/// # Example
/// ```ignore
/// let result = analyze_sequence(ExerciseKind::Squat, &frames)?;
/// println!("{} reps", result.summary.rep_count);
/// ```
pub fn analyze_sequence(
    exercise: ExerciseKind,
    frames: &[FrameInput],
) -> AnalysisResult<SequenceAnalysis> {
    analyze_sequence_with(&ExerciseRegistry::default(), exercise, frames)
}

/// Analyze an ordered frame sequence against a specific registry
pub fn analyze_sequence_with(
    registry: &ExerciseRegistry,
    exercise: ExerciseKind,
    frames: &[FrameInput],
) -> AnalysisResult<SequenceAnalysis> {
    let rules = registry.get(exercise)?;
    let config = registry.config();
    let mut session = Session::new(Uuid::new_v4().to_string(), rules);

    let frames = frames
        .iter()
        .map(|frame| session.submit(rules, config, frame))
        .collect::<AnalysisResult<Vec<_>>>()?;

    Ok(SequenceAnalysis {
        frames,
        summary: session.summary(config.max_recommendations),
    })
}

type SessionHandle = Arc<Mutex<Session>>;

/// Multi-session analysis engine.
///
/// The engine is `Send + Sync`; frames of different sessions may be submitted from
/// different threads. Frames of one session are serialized on that session's lock.
pub struct FormEngine {
    registry: Arc<ExerciseRegistry>,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl Default for FormEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FormEngine {
    /// Create an engine with the default configuration
    pub fn new() -> Self {
        Self::with_registry(Arc::new(ExerciseRegistry::default()))
    }

    /// Create an engine from a configuration, validating it first
    pub fn with_config(config: EngineConfig) -> AnalysisResult<Self> {
        Ok(Self::with_registry(Arc::new(ExerciseRegistry::new(config)?)))
    }

    /// Create an engine sharing an existing registry
    pub fn with_registry(registry: Arc<ExerciseRegistry>) -> Self {
        Self {
            registry,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &ExerciseRegistry {
        &self.registry
    }

    /// Analyze one frame of a session, creating the session on its first frame
    pub fn submit_frame(
        &self,
        session_id: &str,
        exercise_kind: &str,
        frame_number: u64,
        timestamp: f64,
        pose: Option<Pose>,
    ) -> AnalysisResult<FrameAnalysis> {
        let frame = FrameInput::new(frame_number, timestamp, pose);
        self.submit(session_id, exercise_kind, &frame)
    }

    /// Same as [`FormEngine::submit_frame`] for an already assembled frame
    pub fn submit(
        &self,
        session_id: &str,
        exercise_kind: &str,
        frame: &FrameInput,
    ) -> AnalysisResult<FrameAnalysis> {
        let kind = self.registry.resolve(exercise_kind).map_err(|e| {
            warn!(session_id, exercise_kind, "Rejected frame for unknown exercise");
            e
        })?;
        let rules = self.registry.get(kind)?;

        let handle = self.session_handle(session_id, rules, frame).map_err(|e| {
            warn!(session_id, frame_number = frame.frame_number, error = %e, "Rejected first frame");
            e
        })?;
        let mut session = handle.lock();

        if session.exercise() != kind {
            warn!(
                session_id,
                expected = %session.exercise(),
                actual = %kind,
                "Rejected frame for a different exercise"
            );
            return Err(AnalysisError::ExerciseMismatch {
                session_id: session_id.to_string(),
                expected: session.exercise().to_string(),
                actual: kind.to_string(),
            });
        }

        let analysis = session
            .submit(rules, self.registry.config(), frame)
            .map_err(|e| {
                warn!(session_id, frame_number = frame.frame_number, error = %e, "Rejected frame");
                e
            })?;

        debug!(
            session_id,
            frame_number = analysis.frame_number,
            pose_present = analysis.pose_present,
            issues = analysis.issues.len(),
            score = ?analysis.form_score,
            "Analyzed frame"
        );
        if analysis.rep_completed {
            info!(session_id, rep_count = analysis.rep_count, "Repetition completed");
        }

        Ok(analysis)
    }

    /// Summary of a session's frames so far
    pub fn get_summary(&self, session_id: &str) -> AnalysisResult<SessionSummary> {
        let handle = self.existing_handle(session_id)?;
        let session = handle.lock();
        Ok(session.summary(self.registry.config().max_recommendations))
    }

    /// Reinitialize a session's repetition state and aggregate
    pub fn reset(&self, session_id: &str) -> AnalysisResult<()> {
        let handle = self.existing_handle(session_id)?;
        handle.lock().reset();
        info!(session_id, "Session reset");
        Ok(())
    }

    /// Registered exercises with their check codes
    pub fn list_supported_exercises(&self) -> Vec<ExerciseInfo> {
        self.registry.list_supported_exercises()
    }

    /// Drop a session and all of its state
    pub fn discard(&self, session_id: &str) -> AnalysisResult<()> {
        self.sessions
            .write()
            .remove(session_id)
            .ok_or_else(|| AnalysisError::SessionNotFound(session_id.to_string()))?;
        info!(session_id, "Session discarded");
        Ok(())
    }

    /// Ids of live sessions, sorted
    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Remove sessions without a frame for longer than `max_idle`; returns the removed ids
    pub fn evict_idle(&self, max_idle: Duration) -> Vec<String> {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let mut evicted: Vec<String> = sessions
            .iter()
            .filter(|(_, handle)| handle.lock().is_idle(now, max_idle))
            .map(|(id, _)| id.clone())
            .collect();
        evicted.sort();

        for id in &evicted {
            sessions.remove(id);
            info!(session_id = %id, "Evicted idle session");
        }
        evicted
    }

    /// Run a fresh, unregistered session over an ordered frame list
    pub fn analyze_sequence(
        &self,
        exercise_kind: &str,
        frames: &[FrameInput],
    ) -> AnalysisResult<SequenceAnalysis> {
        let kind = self.registry.resolve(exercise_kind)?;
        analyze_sequence_with(&self.registry, kind, frames)
    }

    fn existing_handle(&self, session_id: &str) -> AnalysisResult<SessionHandle> {
        self.sessions
            .read()
            .get(session_id)
            .cloned()
            .ok_or_else(|| AnalysisError::SessionNotFound(session_id.to_string()))
    }

    /// Existing session, or a new one once `frame` is known to be acceptable as its first
    fn session_handle(
        &self,
        session_id: &str,
        rules: &dyn RuleSet,
        frame: &FrameInput,
    ) -> AnalysisResult<SessionHandle> {
        if let Some(handle) = self.sessions.read().get(session_id) {
            return Ok(Arc::clone(handle));
        }

        let session = Session::new(session_id, rules);
        session.check_order(frame)?;

        let mut sessions = self.sessions.write();
        let handle = sessions.entry(session_id.to_string()).or_insert_with(move || {
            info!(session_id, exercise = %rules.kind(), "Session created");
            Arc::new(Mutex::new(session))
        });
        Ok(Arc::clone(handle))
    }
}

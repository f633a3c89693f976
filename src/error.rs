//! Error types for formcheck
//!
//! Only violations of the calling contract surface as errors. Numeric edge cases
//! (missing landmarks, degenerate vectors, absent poses) are absorbed by the
//! pipeline stages and never reach this type.

use thiserror::Error;

/// A specialized `Result` type for engine operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors returned by the analysis engine
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid exercise kind: {0}")]
    InvalidExerciseKind(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error(
        "Out-of-order frame for session {session_id}: frame {frame_number} at {timestamp}s \
         does not follow frame {last_frame} at {last_timestamp}s"
    )]
    OutOfOrderFrame {
        session_id: String,
        last_frame: u64,
        last_timestamp: f64,
        frame_number: u64,
        timestamp: f64,
    },

    #[error("Session {session_id} analyzes {expected}, got a frame for {actual}")]
    ExerciseMismatch {
        session_id: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse input: {0}")]
    ParseError(String),
}

impl AnalysisError {
    /// Stable machine-readable code for the hosting layer
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::InvalidExerciseKind(_) => "INVALID_EXERCISE_KIND",
            AnalysisError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            AnalysisError::OutOfOrderFrame { .. } => "OUT_OF_ORDER_FRAME",
            AnalysisError::ExerciseMismatch { .. } => "EXERCISE_MISMATCH",
            AnalysisError::InvalidConfig(_) => "INVALID_CONFIG",
            AnalysisError::JsonError(_) => "JSON_ERROR",
            AnalysisError::ParseError(_) => "PARSE_ERROR",
        }
    }
}

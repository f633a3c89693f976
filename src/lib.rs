//! formcheck - Exercise form and repetition analysis from body-pose landmarks
//!
//! formcheck turns per-frame pose landmarks into form feedback through a
//! deterministic pipeline: landmark validation → joint angles → exercise checks
//! → repetition counting → session aggregation.
//!
//! ## Modules
//!
//! - **Engine**: `FormEngine` keeps one session per caller-chosen id and exposes
//!   `submit_frame`, `get_summary`, `reset` and `list_supported_exercises`
//! - **Stages**: `normalizer`, `angles`, `rules`, `repetition`, `aggregator`
//! - **I/O**: the `formcheck.frame.v1` input schema and the JSON session report encoder

pub mod aggregator;
pub mod analyzer;
pub mod angles;
pub mod config;
pub mod encoder;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod registry;
pub mod repetition;
pub mod rules;
pub mod schema;
pub mod session;
pub mod types;

pub use config::EngineConfig;
pub use error::{AnalysisError, AnalysisResult};
pub use pipeline::{analyze_sequence, FormEngine, SequenceAnalysis};
pub use registry::{ExerciseInfo, ExerciseRegistry};
pub use types::{
    ExerciseKind, FrameAnalysis, FrameInput, Issue, Landmark, LandmarkName, Pose, RepPhase,
    SessionSummary, Severity, StatusTier,
};

// Schema exports
pub use schema::{FrameRecord, FrameRecordAdapter, SCHEMA_VERSION};

/// Engine version embedded in every report
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "formcheck";

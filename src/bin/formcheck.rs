//! formcheck CLI - Command-line interface for the form analysis engine
//!
//! Commands:
//! - analyze: Analyze a recorded frame file into a session report (batch mode)
//! - run: Analyze frame records streamed on stdin (streaming mode)
//! - validate: Validate frame records against the input schema
//! - exercises: List supported exercises and their checks
//! - doctor: Diagnose engine health and configuration

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use formcheck::encoder::ReportEncoder;
use formcheck::schema::{FrameRecordAdapter, ValidationError, SCHEMA_VERSION};
use formcheck::{
    AnalysisError, EngineConfig, ExerciseRegistry, FormEngine, FrameAnalysis, SessionSummary,
    ENGINE_VERSION, PRODUCER_NAME,
};

/// formcheck - Exercise form analysis and repetition counting from pose landmarks
#[derive(Parser)]
#[command(name = "formcheck")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Analyze exercise form from body-pose landmarks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a recorded frame file into a session report (batch mode)
    Analyze {
        /// Input file path, JSON array or NDJSON (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Exercise performed in the recording
        #[arg(short, long, default_value = "squat")]
        exercise: String,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Include every frame analysis in the report
        #[arg(long)]
        include_frames: bool,
    },

    /// Analyze frame records streamed on stdin (streaming mode)
    Run {
        /// Exercise for records that do not name one
        #[arg(short, long, default_value = "squat")]
        exercise: String,

        /// Session id for records that do not carry one
        #[arg(long, default_value = "default")]
        session_id: String,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Flush output after each record
        #[arg(long, default_value = "true")]
        flush: bool,
    },

    /// Validate frame records against the input schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List supported exercises and their checks
    Exercises {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose engine health and configuration
    Doctor {
        /// Check an engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), FormcheckCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            output,
            exercise,
            config,
            include_frames,
        } => cmd_analyze(&input, &output, &exercise, config.as_deref(), include_frames),

        Commands::Run {
            exercise,
            session_id,
            config,
            flush,
        } => cmd_run(&exercise, &session_id, config.as_deref(), flush),

        Commands::Validate { input, json } => cmd_validate(&input, json),

        Commands::Exercises { json } => cmd_exercises(json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn cmd_analyze(
    input: &Path,
    output: &Path,
    exercise: &str,
    config: Option<&Path>,
    include_frames: bool,
) -> Result<(), FormcheckCliError> {
    let engine = build_engine(config)?;

    let records = FrameRecordAdapter::parse_auto(&read_input(input)?)?;
    if records.is_empty() {
        return Err(FormcheckCliError::NoFrames);
    }
    let frames = FrameRecordAdapter::to_frame_inputs(&records)?;

    let result = engine.analyze_sequence(exercise, &frames)?;
    info!(
        exercise,
        frames = result.frames.len(),
        reps = result.summary.rep_count,
        "Analyzed recording"
    );

    let encoder = ReportEncoder::new();
    let report = encoder.encode_to_json(
        &result.summary,
        include_frames.then_some(result.frames.as_slice()),
    )?;

    if output.to_string_lossy() == "-" {
        println!("{}", report);
    } else {
        fs::write(output, report + "\n")?;
    }

    Ok(())
}

fn cmd_run(
    exercise: &str,
    session_id: &str,
    config: Option<&Path>,
    flush: bool,
) -> Result<(), FormcheckCliError> {
    let engine = build_engine(config)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for (line_num, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let record = FrameRecordAdapter::parse_line(trimmed, line_num + 1)?;
        record.validate()?;

        let session = record.session_id.as_deref().unwrap_or(session_id);
        let kind = record.exercise.as_deref().unwrap_or(exercise);
        let analysis = engine.submit(session, kind, &record.to_frame_input())?;

        let line = serde_json::to_string(&StreamRecord::Frame {
            session_id: session,
            analysis: &analysis,
        })?;
        writeln!(stdout, "{}", line)?;
        if flush {
            stdout.flush()?;
        }
    }

    // Close out every session seen on the stream
    for id in engine.session_ids() {
        let summary = engine.get_summary(&id)?;
        debug!(session_id = %id, reps = summary.rep_count, "Writing session summary");
        writeln!(
            stdout,
            "{}",
            serde_json::to_string(&StreamRecord::Summary { summary: &summary })?
        )?;
    }
    stdout.flush()?;

    Ok(())
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), FormcheckCliError> {
    let records = FrameRecordAdapter::parse_auto(&read_input(input)?)?;
    let results = FrameRecordAdapter::validate_records(&records);

    let report = ValidationReport {
        total_records: records.len(),
        valid_records: records.len() - results.len(),
        invalid_records: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                frame_number: r.frame_number,
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Frame {} (index {}): {}",
                    err.frame_number, err.index, err.error
                );
            }
        }
    }

    if report.invalid_records > 0 {
        Err(FormcheckCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_exercises(json: bool) -> Result<(), FormcheckCliError> {
    let exercises = ExerciseRegistry::default().list_supported_exercises();

    if json {
        println!("{}", serde_json::to_string_pretty(&exercises)?);
        return Ok(());
    }

    for info in &exercises {
        println!("{} ({})", info.display_name, info.kind);
        println!("  {}", info.description);
        println!("  Repetitions counted on: {}", info.primary_angle);
        println!("  Checks: {}", info.check_codes.join(", "));
        println!();
    }

    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), FormcheckCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("formcheck version {}", ENGINE_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", SCHEMA_VERSION),
    });

    let registry = match config {
        Some(path) if !path.exists() => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist, using defaults".to_string(),
            });
            Ok(ExerciseRegistry::default())
        }
        Some(path) => fs::read_to_string(path)
            .map_err(FormcheckCliError::from)
            .and_then(|content| {
                EngineConfig::from_json(&content).map_err(FormcheckCliError::from)
            })
            .and_then(|config| ExerciseRegistry::new(config).map_err(FormcheckCliError::from)),
        None => Ok(ExerciseRegistry::default()),
    };

    match registry {
        Ok(registry) => {
            if config.is_some_and(|path| path.exists()) {
                checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "Config valid (confidence threshold {})",
                        registry.config().confidence_threshold
                    ),
                });
            }
            checks.push(DoctorCheck {
                name: "exercises".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "{} exercises registered",
                    registry.list_supported_exercises().len()
                ),
            });
        }
        Err(e) => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Error,
            message: CliError::from(e).message,
        }),
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("formcheck Doctor Report");
        println!("=======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(FormcheckCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, FormcheckCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn build_engine(config: Option<&Path>) -> Result<FormEngine, FormcheckCliError> {
    match config {
        Some(path) => {
            let config = EngineConfig::from_json(&fs::read_to_string(path)?)?;
            Ok(FormEngine::with_config(config)?)
        }
        None => Ok(FormEngine::new()),
    }
}

/// One NDJSON line written by `run`
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamRecord<'a> {
    Frame {
        session_id: &'a str,
        analysis: &'a FrameAnalysis,
    },
    Summary {
        summary: &'a SessionSummary,
    },
}

// Error types

#[derive(Debug)]
enum FormcheckCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    Validation(ValidationError),
    NoFrames,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for FormcheckCliError {
    fn from(e: io::Error) -> Self {
        FormcheckCliError::Io(e)
    }
}

impl From<AnalysisError> for FormcheckCliError {
    fn from(e: AnalysisError) -> Self {
        FormcheckCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for FormcheckCliError {
    fn from(e: serde_json::Error) -> Self {
        FormcheckCliError::Json(e)
    }
}

impl From<ValidationError> for FormcheckCliError {
    fn from(e: ValidationError) -> Self {
        FormcheckCliError::Validation(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<FormcheckCliError> for CliError {
    fn from(e: FormcheckCliError) -> Self {
        match e {
            FormcheckCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            FormcheckCliError::Analysis(e) => {
                let hint = match &e {
                    AnalysisError::InvalidExerciseKind(_) => {
                        "Run 'formcheck exercises' for supported kinds"
                    }
                    AnalysisError::OutOfOrderFrame { .. } => {
                        "Frame numbers and timestamps must strictly increase per session"
                    }
                    AnalysisError::ExerciseMismatch { .. } => {
                        "Use a new session id for a different exercise"
                    }
                    AnalysisError::InvalidConfig(_) => "Run 'formcheck doctor --config <file>'",
                    AnalysisError::ParseError(_) | AnalysisError::JsonError(_) => {
                        "Ensure input matches the formcheck.frame.v1 schema"
                    }
                    AnalysisError::SessionNotFound(_) => "Check the session id",
                };
                CliError {
                    code: e.code().to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            FormcheckCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            FormcheckCliError::Validation(e) => CliError {
                code: "VALIDATION_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'formcheck validate' for details".to_string()),
            },
            FormcheckCliError::NoFrames => CliError {
                code: "NO_FRAMES".to_string(),
                message: "No frame records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            FormcheckCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            FormcheckCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(Serialize)]
struct ValidationErrorDetail {
    index: usize,
    frame_number: u64,
    error: String,
}

#[derive(Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

//! Parsing of formcheck.frame.v1 input
//!
//! Frame records arrive either as a JSON array (batch files) or as NDJSON (streams).

use crate::error::AnalysisError;
use crate::schema::frame_record::{FrameRecord, ValidationError};
use crate::types::FrameInput;

/// Adapter for reading frame records
pub struct FrameRecordAdapter;

impl FrameRecordAdapter {
    /// Parse a JSON string containing an array of FrameRecords
    pub fn parse_array(json: &str) -> Result<Vec<FrameRecord>, AnalysisError> {
        let records: Vec<FrameRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (newline-delimited JSON) containing FrameRecords
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<FrameRecord>, AnalysisError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            records.push(Self::parse_line(trimmed, line_num + 1)?);
        }
        Ok(records)
    }

    /// Parse a single NDJSON line (1-based `line_num` is used in the error)
    pub fn parse_line(line: &str, line_num: usize) -> Result<FrameRecord, AnalysisError> {
        serde_json::from_str::<FrameRecord>(line).map_err(|e| {
            AnalysisError::ParseError(format!("Failed to parse line {line_num}: {e}"))
        })
    }

    /// Parse either format, deciding on the first non-whitespace character
    pub fn parse_auto(input: &str) -> Result<Vec<FrameRecord>, AnalysisError> {
        if input.trim_start().starts_with('[') {
            Self::parse_array(input)
        } else {
            Self::parse_ndjson(input)
        }
    }

    /// Validate and convert every record to engine input
    pub fn to_frame_inputs(records: &[FrameRecord]) -> Result<Vec<FrameInput>, AnalysisError> {
        records
            .iter()
            .map(|record| {
                record.validate().map_err(|e| {
                    AnalysisError::ParseError(format!(
                        "Invalid record for frame {}: {e}",
                        record.frame_number
                    ))
                })?;
                Ok(record.to_frame_input())
            })
            .collect()
    }

    /// Validate a batch of records, returning only the failures
    pub fn validate_records(records: &[FrameRecord]) -> Vec<ValidationResult> {
        records
            .iter()
            .enumerate()
            .filter_map(|(idx, record)| {
                record.validate().err().map(|error| ValidationResult {
                    index: idx,
                    frame_number: record.frame_number,
                    error,
                })
            })
            .collect()
    }
}

/// A record that failed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub index: usize,
    pub frame_number: u64,
    pub error: ValidationError,
}

//! Session aggregation
//!
//! This module folds per-frame analyses into running session totals.
//! Totals are updated incrementally so a summary is available after any frame.

use crate::types::{ExerciseKind, FrameAnalysis, Severity, SessionSummary, StatusTier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;

/// Occurrence statistics of one suggestion string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct SuggestionStats {
    /// Highest severity the suggestion was attached to
    severity: Severity,
    count: u64,
    /// Global issue sequence index of the first occurrence
    first_seen: u64,
}

/// Running totals for one session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionAggregator {
    total_frames: u64,
    frames_with_person: u64,
    score_sum: f64,
    critical_count: u64,
    warning_count: u64,
    info_count: u64,
    suggestions: HashMap<String, SuggestionStats>,
    issues_seen: u64,
}

impl SessionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one frame's analysis into the totals
    pub fn record(&mut self, analysis: &FrameAnalysis) {
        self.total_frames += 1;

        if analysis.pose_present {
            self.frames_with_person += 1;
            self.score_sum += analysis.form_score.unwrap_or(0.0);
        }

        for issue in &analysis.issues {
            match issue.severity {
                Severity::Critical => self.critical_count += 1,
                Severity::Warning => self.warning_count += 1,
                Severity::Info => self.info_count += 1,
            }

            let sequence = self.issues_seen;
            self.issues_seen += 1;

            self.suggestions
                .entry(issue.suggestion.clone())
                .and_modify(|stats| {
                    stats.count += 1;
                    // Critical < Warning < Info in declaration order
                    stats.severity = stats.severity.min(issue.severity);
                })
                .or_insert(SuggestionStats {
                    severity: issue.severity,
                    count: 1,
                    first_seen: sequence,
                });
        }
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn frames_with_person(&self) -> u64 {
        self.frames_with_person
    }

    /// Mean form score over pose-present frames, `None` before the first one
    pub fn overall_form_score(&self) -> Option<f64> {
        if self.frames_with_person == 0 {
            return None;
        }
        Some(self.score_sum / self.frames_with_person as f64)
    }

    /// Distinct suggestions ranked by severity, then frequency, then first occurrence
    pub fn recommendations(&self, limit: usize) -> Vec<String> {
        let mut ranked: Vec<(&String, &SuggestionStats)> = self.suggestions.iter().collect();
        ranked.sort_by_key(|(_, stats)| (stats.severity, Reverse(stats.count), stats.first_seen));
        ranked
            .into_iter()
            .take(limit)
            .map(|(suggestion, _)| suggestion.clone())
            .collect()
    }

    /// Build the summary for the frames recorded so far
    pub fn summarize(
        &self,
        session_id: &str,
        exercise: ExerciseKind,
        started_at: DateTime<Utc>,
        rep_count: u32,
        max_recommendations: usize,
    ) -> SessionSummary {
        let overall_form_score = self.overall_form_score();

        SessionSummary {
            session_id: session_id.to_string(),
            exercise,
            started_at,
            status: overall_form_score.map(StatusTier::from_score),
            overall_form_score,
            frames_with_person: self.frames_with_person,
            total_frames: self.total_frames,
            critical_count: self.critical_count,
            warning_count: self.warning_count,
            info_count: self.info_count,
            rep_count,
            recommendations: self.recommendations(max_recommendations),
        }
    }
}

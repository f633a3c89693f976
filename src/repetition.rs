//! Repetition counting
//!
//! A generic phase machine driven by one primary angle:
//! Idle → Active → Held → Returning → Idle (+1 rep).
//! Several transitions may happen on the same frame, but always in that order, so no phase
//! is ever skipped. Entering Held requires the angle to stay beyond the target bound for
//! `min_dwell_frames` consecutive frames, which rejects single-frame noise spikes.

use crate::config::{RepConfig, RepDirection};
use crate::types::{ExerciseKind, RepPhase};
use serde::{Deserialize, Serialize};

/// Repetition state of one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepState {
    pub exercise: ExerciseKind,
    pub phase: RepPhase,
    pub rep_count: u32,
    /// Consecutive frames spent beyond the target bound while Active
    pub dwell_frames: u32,
}

impl RepState {
    pub fn new(exercise: ExerciseKind) -> Self {
        Self {
            exercise,
            phase: RepPhase::Idle,
            rep_count: 0,
            dwell_frames: 0,
        }
    }
}

/// Outcome of feeding one frame to the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepUpdate {
    pub phase: RepPhase,
    pub rep_count: u32,
    pub rep_completed: bool,
}

/// Phase machine for one exercise
#[derive(Debug, Clone)]
pub struct RepStateMachine {
    config: RepConfig,
    state: RepState,
}

impl RepStateMachine {
    pub fn new(exercise: ExerciseKind, config: RepConfig) -> Self {
        Self {
            config,
            state: RepState::new(exercise),
        }
    }

    pub fn state(&self) -> &RepState {
        &self.state
    }

    pub fn rep_count(&self) -> u32 {
        self.state.rep_count
    }

    pub fn phase(&self) -> RepPhase {
        self.state.phase
    }

    /// Advance with the frame's primary angle.
    ///
    /// `None` (no person, or the angle could not be computed) leaves the state untouched.
    pub fn update(&mut self, value: Option<f64>) -> RepUpdate {
        let Some(value) = value.filter(|v| v.is_finite()) else {
            return self.snapshot(false);
        };

        let past_start = self.past_start(value);
        let beyond_target = self.beyond_target(value);
        let min_dwell = self.config.min_dwell_frames;
        let mut completed = false;
        let state = &mut self.state;

        if state.phase == RepPhase::Idle && past_start {
            state.phase = RepPhase::Active;
            state.dwell_frames = 0;
        }

        if state.phase == RepPhase::Active {
            if !past_start {
                // abandoned before reaching the target
                state.phase = RepPhase::Idle;
                state.dwell_frames = 0;
            } else if beyond_target {
                state.dwell_frames += 1;
                if state.dwell_frames >= min_dwell {
                    state.phase = RepPhase::Held;
                    state.dwell_frames = 0;
                }
            } else {
                state.dwell_frames = 0;
            }
        }

        if state.phase == RepPhase::Held && !beyond_target {
            state.phase = RepPhase::Returning;
        }

        if state.phase == RepPhase::Returning && !past_start {
            state.phase = RepPhase::Idle;
            state.rep_count = state.rep_count.saturating_add(1);
            completed = true;
        }

        self.snapshot(completed)
    }

    /// Back to Idle with a zero count
    pub fn reset(&mut self) {
        self.state = RepState::new(self.state.exercise);
    }

    fn snapshot(&self, rep_completed: bool) -> RepUpdate {
        RepUpdate {
            phase: self.state.phase,
            rep_count: self.state.rep_count,
            rep_completed,
        }
    }

    /// The angle has left the start zone toward the target
    fn past_start(&self, value: f64) -> bool {
        match self.config.direction {
            RepDirection::Descending => value < self.config.upper_bound,
            RepDirection::Ascending => value > self.config.lower_bound,
        }
    }

    fn beyond_target(&self, value: f64) -> bool {
        match self.config.direction {
            RepDirection::Descending => value <= self.config.lower_bound,
            RepDirection::Ascending => value >= self.config.upper_bound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squat_machine() -> RepStateMachine {
        RepStateMachine::new(
            ExerciseKind::Squat,
            RepConfig::descending("knee", 160.0, 100.0),
        )
    }

    fn feed(machine: &mut RepStateMachine, values: &[f64]) -> Vec<RepUpdate> {
        values.iter().map(|v| machine.update(Some(*v))).collect()
    }

    #[test]
    fn test_full_cycle_counts_once() {
        let mut machine = squat_machine();
        let updates = feed(&mut machine, &[170.0, 80.0, 80.0, 80.0, 170.0]);

        let phases: Vec<RepPhase> = updates.iter().map(|u| u.phase).collect();
        assert_eq!(
            phases,
            vec![
                RepPhase::Idle,
                RepPhase::Active,
                RepPhase::Held,
                RepPhase::Held,
                RepPhase::Idle
            ]
        );
        assert_eq!(machine.rep_count(), 1);
        assert!(updates[4].rep_completed);
        assert!(updates[..4].iter().all(|u| !u.rep_completed));
    }

    #[test]
    fn test_single_frame_spike_is_rejected() {
        let mut machine = squat_machine();
        feed(&mut machine, &[170.0, 80.0, 120.0, 170.0]);
        assert_eq!(machine.rep_count(), 0);
        assert_eq!(machine.phase(), RepPhase::Idle);
    }

    #[test]
    fn test_partial_rep_is_not_credited() {
        let mut machine = squat_machine();
        feed(&mut machine, &[170.0, 140.0, 120.0, 140.0, 165.0]);
        assert_eq!(machine.rep_count(), 0);
        assert_eq!(machine.phase(), RepPhase::Idle);
    }

    #[test]
    fn test_noise_at_bottom_does_not_double_count() {
        let mut machine = squat_machine();
        feed(
            &mut machine,
            &[170.0, 95.0, 95.0, 102.0, 98.0, 101.0, 97.0, 130.0, 165.0],
        );
        assert_eq!(machine.rep_count(), 1);
    }

    #[test]
    fn test_missing_frames_are_skipped() {
        let mut machine = squat_machine();
        machine.update(Some(170.0));
        machine.update(Some(90.0));
        let before = machine.state().clone();

        let update = machine.update(None);
        assert_eq!(machine.state(), &before);
        assert!(!update.rep_completed);

        machine.update(Some(f64::NAN));
        assert_eq!(machine.state(), &before);

        feed(&mut machine, &[90.0, 170.0]);
        assert_eq!(machine.rep_count(), 1);
    }

    #[test]
    fn test_ascending_direction() {
        let mut machine = RepStateMachine::new(
            ExerciseKind::JumpingJack,
            RepConfig::ascending("arm_raise", 50.0, 140.0).with_min_dwell(1),
        );
        feed(&mut machine, &[20.0, 160.0, 20.0, 90.0, 155.0, 30.0]);
        assert_eq!(machine.rep_count(), 2);
    }

    #[test]
    fn test_reset_clears_progress() {
        let mut machine = squat_machine();
        feed(&mut machine, &[170.0, 80.0, 80.0, 170.0, 80.0]);
        assert_eq!(machine.rep_count(), 1);

        machine.reset();
        assert_eq!(machine.state(), &RepState::new(ExerciseKind::Squat));
    }

    #[test]
    fn test_count_never_decreases() {
        let mut machine = squat_machine();
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut last = 0;
        for _ in 0..2_000 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let value = (seed % 181) as f64;
            let update = machine.update(Some(value));
            assert!(update.rep_count >= last);
            assert!(update.rep_count - last <= 1);
            last = update.rep_count;
        }
    }
}

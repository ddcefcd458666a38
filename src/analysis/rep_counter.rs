// RepCounter - phase history, rep detection and inactivity reset
//
// The counter keeps a sliding window of the last HISTORY_CAPACITY distinct
// phases (the rest phase is the cycle delimiter and is never recorded).
// When the rest phase comes back around with a non-empty window, the
// profile's sequence predicate judges the cycle, exactly one counter is
// incremented, and the window is cleared so the same frames can never be
// counted twice.
//
// InactivityMonitor runs independently of the phase logic and decides when
// a session has gone quiet long enough to zero everything.

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::classifier::Phase;
use crate::profile::{InactivityPolicy, RepRule};

/// Maximum number of phases retained in history
pub const HISTORY_CAPACITY: usize = 3;

/// Result of a completed cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepOutcome {
    Correct,
    Incorrect,
}

/// Sliding window of recently visited phases
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseHistory {
    phases: VecDeque<String>,
}

impl PhaseHistory {
    pub fn new() -> Self {
        Self {
            phases: VecDeque::with_capacity(HISTORY_CAPACITY + 1),
        }
    }

    /// Record a phase unless it repeats the newest entry
    pub fn record(&mut self, phase: &str) {
        if self.phases.back().map(String::as_str) == Some(phase) {
            return;
        }
        self.phases.push_back(phase.to_string());
        if self.phases.len() > HISTORY_CAPACITY {
            self.phases.pop_front();
        }
        debug_assert!(
            self.phases.len() <= HISTORY_CAPACITY,
            "phase history exceeded capacity: {}",
            self.phases.len()
        );
    }

    pub fn clear(&mut self) {
        self.phases.clear();
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.phases.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.phases.iter().cloned().collect()
    }
}

/// Correct/incorrect rep counter over a phase history
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepCounter {
    history: PhaseHistory,
    correct: u32,
    incorrect: u32,
}

impl RepCounter {
    pub fn new() -> Self {
        Self {
            history: PhaseHistory::new(),
            correct: 0,
            incorrect: 0,
        }
    }

    /// Feed the phase in effect for this frame
    ///
    /// # Returns
    /// * `Some(RepOutcome)` - The rest phase closed a cycle on this frame
    /// * `None` - No decision; Unknown phases are ignored entirely
    pub fn observe(&mut self, phase: &Phase, rule: &RepRule) -> Option<RepOutcome> {
        let Phase::Named(name) = phase else {
            return None;
        };

        if *name != rule.rest_phase {
            self.history.record(name);
            return None;
        }

        if self.history.is_empty() {
            return None;
        }

        let outcome = if rule.valid_sequence.is_satisfied_by(self.history.iter()) {
            self.correct = self.correct.saturating_add(1);
            RepOutcome::Correct
        } else {
            self.incorrect = self.incorrect.saturating_add(1);
            RepOutcome::Incorrect
        };

        log::debug!(
            "[RepCounter] Cycle {:?} closed as {:?} (correct={}, incorrect={})",
            self.history.to_vec(),
            outcome,
            self.correct,
            self.incorrect
        );
        self.history.clear();
        Some(outcome)
    }

    /// Zero both counters and the history together
    pub fn reset(&mut self) {
        self.correct = 0;
        self.incorrect = 0;
        self.history.clear();
    }

    pub fn correct_count(&self) -> u32 {
        self.correct
    }

    pub fn incorrect_count(&self) -> u32 {
        self.incorrect
    }

    pub fn history(&self) -> &PhaseHistory {
        &self.history
    }
}

/// Tracks activity timestamps for the inactivity reset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InactivityMonitor {
    last_active: Option<Duration>,
    last_phase_change: Option<Duration>,
}

impl InactivityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check for inactivity at `now`, then record this frame as activity
    ///
    /// Timestamps that go backwards never count toward the timeout.
    ///
    /// # Returns
    /// `true` when the session should be reset on this frame
    pub fn check(
        &mut self,
        now: Duration,
        timeout: Duration,
        policy: InactivityPolicy,
        phase_changed: bool,
    ) -> bool {
        let inactive = match policy {
            InactivityPolicy::FrameGap => self
                .last_active
                .map(|last| now.saturating_sub(last) > timeout)
                .unwrap_or(false),
            InactivityPolicy::PhaseStall => {
                !phase_changed
                    && self
                        .last_phase_change
                        .map(|last| now.saturating_sub(last) > timeout)
                        .unwrap_or(false)
            }
        };

        self.last_active = Some(self.last_active.map_or(now, |last| last.max(now)));
        if phase_changed || inactive || self.last_phase_change.is_none() {
            self.last_phase_change = Some(now);
        }

        inactive
    }

    pub fn last_active(&self) -> Option<Duration> {
        self.last_active
    }
}

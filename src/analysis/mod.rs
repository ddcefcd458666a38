// Analysis module - per-frame pipeline for rep counting and form feedback
//
// This module owns the session object that turns a stream of angle frames
// into feedback records. Each frame is fully processed before the next one
// is accepted; nothing here blocks or performs I/O.
//
// Architecture:
// - Session: explicit per-user state, no process-wide counters
// - Pipeline: ingest → PhaseFilter → StateClassifier → RepCounter
//   → FeedbackGenerator → ThrottleGate → ProgressMapper
// - Output: FeedbackRecord returned to the caller (SessionManager also
//   broadcasts it to subscribers)

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::clock::{Clock, MonotonicClock};
use crate::error::{ConfigurationError, ValidationError};
use crate::profile::ExerciseProfile;

pub mod classifier;
pub mod feedback;
pub mod frame;
pub mod progress;
pub mod rep_counter;
pub mod throttle;

use classifier::{Phase, PhaseFilter, StateClassifier};
use feedback::FeedbackGenerator;
use frame::{AngleFrame, AngleRequirements, IngestMode, RawAngles};
use progress::{BarRange, ProgressMapper};
use rep_counter::{InactivityMonitor, RepCounter, RepOutcome};
use throttle::{AlertGate, FeedbackGate};

/// Feedback text emitted on the frame that triggers an inactivity reset
pub const INACTIVITY_MESSAGE: &str = "You have been inactive for too long, counters reset";

/// Output of one processed frame
///
/// Serialized once per frame for presentation layers and fixture replays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackRecord {
    /// Composed feedback text; empty while the global cooldown suppresses it
    pub feedback: String,
    /// Messages whose feature passed its per-feature alert cooldown
    pub alerts: Vec<String>,
    pub debug_summary: String,
    pub progress_percent: f64,
    pub progress_bar_extent: f64,
    pub correct_count: u32,
    pub incorrect_count: u32,
    /// Phase in effect after this frame
    pub phase: Phase,
    /// Set on the frame a rep decision is made
    pub rep_event: Option<RepOutcome>,
    /// Session clock reading for this frame
    pub timestamp_ms: u64,
}

/// Per-session knobs that are not part of the exercise profile
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionOptions {
    pub ingest_mode: IngestMode,
    pub bar: BarRange,
}

/// Point-in-time view of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub exercise: String,
    pub phase: Phase,
    pub previous_phase: Phase,
    pub history: Vec<String>,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub last_active_ms: Option<u64>,
    pub last_feedback_ms: Option<u64>,
}

/// Mutable state of one tracking session
///
/// Mutated only by `Session::process_frame*`; replaced wholesale when the
/// exercise changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    filter: PhaseFilter,
    /// Last named phase; Unknown frames leave it in place
    current_phase: Phase,
    /// Named phase before the most recent phase change
    previous_phase: Phase,
    counter: RepCounter,
    inactivity: InactivityMonitor,
    alert_gate: AlertGate,
    feedback_gate: FeedbackGate,
}

impl SessionState {
    pub fn current_phase(&self) -> &Phase {
        &self.current_phase
    }

    pub fn previous_phase(&self) -> &Phase {
        &self.previous_phase
    }

    pub fn counter(&self) -> &RepCounter {
        &self.counter
    }

    pub fn last_active(&self) -> Option<Duration> {
        self.inactivity.last_active()
    }

    pub fn last_feedback_emission(&self) -> Option<Duration> {
        self.feedback_gate.last_emission()
    }

    pub fn last_alert(&self, feature: &str) -> Option<Duration> {
        self.alert_gate.last_alert(feature)
    }
}

/// One exercise-tracking session
pub struct Session<C: Clock = MonotonicClock> {
    profile: Arc<ExerciseProfile>,
    requirements: AngleRequirements,
    options: SessionOptions,
    clock: C,
    state: SessionState,
}

impl Session<MonotonicClock> {
    /// Start a session on the process monotonic clock
    pub fn start(
        profile: impl Into<Arc<ExerciseProfile>>,
        options: SessionOptions,
    ) -> Result<Self, ConfigurationError> {
        Self::new(profile, MonotonicClock::new(), options)
    }
}

impl<C: Clock> Session<C> {
    /// Create a session after validating its profile
    ///
    /// # Returns
    /// * `Ok(Session)` - Ready to process frames
    /// * `Err(ConfigurationError)` - Profile is malformed; never retried
    pub fn new(
        profile: impl Into<Arc<ExerciseProfile>>,
        clock: C,
        options: SessionOptions,
    ) -> Result<Self, ConfigurationError> {
        let profile = profile.into();
        profile.validate()?;
        let requirements = profile.angle_requirements();

        log::info!(
            "[Session] Started {} session (ingest={:?}, phases={}, rules={})",
            profile.name,
            options.ingest_mode,
            profile.phases.len(),
            profile.rules.len()
        );

        Ok(Self {
            profile,
            requirements,
            options,
            clock,
            state: SessionState::default(),
        })
    }

    pub fn profile(&self) -> &ExerciseProfile {
        &self.profile
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Process a frame stamped with the session clock's current reading
    pub fn process_frame(&mut self, raw: &RawAngles) -> Result<FeedbackRecord, ValidationError> {
        let now = self.clock.now();
        self.process_frame_at(raw, now)
    }

    /// Process a frame with a caller-supplied capture timestamp
    ///
    /// Validation runs before any state is touched, so an `Err` leaves the
    /// session exactly as it was.
    pub fn process_frame_at(
        &mut self,
        raw: &RawAngles,
        now: Duration,
    ) -> Result<FeedbackRecord, ValidationError> {
        let frame = AngleFrame::ingest(raw, &self.requirements, self.options.ingest_mode)?;
        let primary =
            frame
                .get(self.profile.primary_angle)
                .ok_or_else(|| ValidationError::MissingAngle {
                    angle: self.profile.primary_angle.to_string(),
                })?;

        let profile = &self.profile;
        let state = &mut self.state;

        // Classification
        let smoothed = state.filter.smooth(primary, profile.smoothing);
        let candidate = StateClassifier::new(&profile.phases).classify(smoothed);
        let phase = state.filter.debounce(candidate, profile.debounce_frames);
        let phase_changed = !phase.is_unknown() && phase != state.current_phase;

        // Inactivity runs before rep detection so a stale cycle never completes
        let inactive = state.inactivity.check(
            now,
            profile.inactivity_timeout(),
            profile.inactivity_policy,
            phase_changed,
        );
        if inactive {
            state.counter.reset();
            log::info!(
                "[Session] {} inactive past {:.1}s, counters reset",
                profile.name,
                profile.inactivity_timeout_secs
            );
        }

        let rep_event = profile
            .rep_rule
            .as_ref()
            .and_then(|rule| state.counter.observe(&phase, rule));

        if phase_changed {
            state.previous_phase = std::mem::replace(&mut state.current_phase, phase.clone());
        }

        // Feedback
        let evaluation =
            FeedbackGenerator::new(&profile.rules).evaluate(&frame, &phase, &state.previous_phase);

        // The inactivity message replaces rule alerts on the reset frame
        let mut alerts = Vec::new();
        let alert_features = if inactive {
            Vec::new()
        } else {
            evaluation.incorrect_features()
        };
        for feature in alert_features {
            if state
                .alert_gate
                .should_alert(feature, now, profile.alert_cooldown())
            {
                alerts.extend(evaluation.messages_for(feature).into_iter().map(String::from));
            }
        }

        let feedback = if inactive {
            state.feedback_gate.mark_emitted(now);
            INACTIVITY_MESSAGE.to_string()
        } else if state
            .feedback_gate
            .should_emit(now, profile.feedback_cooldown())
        {
            evaluation.text()
        } else {
            String::new()
        };

        // Progress
        let progress = ProgressMapper::new(profile.progress, self.options.bar).map(smoothed);

        let correct_count = state.counter.correct_count();
        let incorrect_count = state.counter.incorrect_count();
        let history = state.counter.history().to_vec();

        if let Some(outcome) = rep_event {
            tracing::info!(
                exercise = %profile.name,
                ?outcome,
                correct = correct_count,
                incorrect = incorrect_count,
                "[Session] Rep completed"
            );
        }
        tracing::debug!(
            phase = %phase,
            primary = smoothed,
            correct = correct_count,
            incorrect = incorrect_count,
            alerts = alerts.len(),
            suppressed = feedback.is_empty(),
            "[Session] Frame processed"
        );

        let debug_summary = format!(
            "exercise={} phase={} primary={:.1} history=[{}] correct={} incorrect={} issues=[{}]",
            profile.name,
            phase,
            smoothed,
            history.join(","),
            correct_count,
            incorrect_count,
            evaluation.incorrect_features().join(",")
        );

        Ok(FeedbackRecord {
            feedback,
            alerts,
            debug_summary,
            progress_percent: progress.percent,
            progress_bar_extent: progress.bar_extent,
            correct_count,
            incorrect_count,
            phase,
            rep_event,
            timestamp_ms: duration_to_ms(now),
        })
    }

    /// Replace the profile and start over from an empty state
    ///
    /// The new profile is validated first; on error the current exercise
    /// keeps running untouched.
    pub fn switch_exercise(
        &mut self,
        profile: impl Into<Arc<ExerciseProfile>>,
    ) -> Result<(), ConfigurationError> {
        let profile = profile.into();
        profile.validate()?;

        log::info!(
            "[Session] Switching exercise {} -> {}",
            self.profile.name,
            profile.name
        );
        self.requirements = profile.angle_requirements();
        self.profile = profile;
        self.state = SessionState::default();
        Ok(())
    }

    /// Drop all counters, history and cooldowns
    pub fn reset(&mut self) {
        self.state = SessionState::default();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            exercise: self.profile.name.clone(),
            phase: self.state.current_phase.clone(),
            previous_phase: self.state.previous_phase.clone(),
            history: self.state.counter.history().to_vec(),
            correct_count: self.state.counter.correct_count(),
            incorrect_count: self.state.counter.incorrect_count(),
            last_active_ms: self.state.last_active().map(duration_to_ms),
            last_feedback_ms: self.state.last_feedback_emission().map(duration_to_ms),
        }
    }
}

fn duration_to_ms(at: Duration) -> u64 {
    u64::try_from(at.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests;

// Exercise profiles - immutable per-exercise configuration
//
// A profile is everything the engine needs to know about one exercise:
// - the phase table the StateClassifier walks (ordered, non-overlapping)
// - the rep rule (rest phase + valid-sequence predicate) the RepCounter uses
// - the declarative feedback rule table the FeedbackGenerator evaluates
// - cooldowns, inactivity timeout and the progress mapping range
//
// Profiles are plain serde data so new exercises can be supplied as JSON
// rather than code. Every profile must pass validate() before a session
// will run it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::analysis::frame::{AngleName, AngleRequirements};
use crate::error::ConfigurationError;

pub mod presets;
pub mod validation;

pub use presets::{SquatThresholds, ThresholdPreset};
pub use validation::ProfileValidator;

/// Exercise kind selecting which built-in profile shape applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Squat,
    PushUp,
    Plank,
    /// Supplied entirely through configuration
    Custom,
}

impl ExerciseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::Squat => "squat",
            ExerciseKind::PushUp => "push_up",
            ExerciseKind::Plank => "plank",
            ExerciseKind::Custom => "custom",
        }
    }
}

impl std::fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExerciseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "squat" | "squats" => Ok(ExerciseKind::Squat),
            "push_up" | "pushup" | "push-up" | "pushups" => Ok(ExerciseKind::PushUp),
            "plank" => Ok(ExerciseKind::Plank),
            "custom" => Ok(ExerciseKind::Custom),
            other => Err(format!("unsupported exercise type: {}", other)),
        }
    }
}

/// One row of the phase table
///
/// `min` is always inclusive. `max` is inclusive when `max_inclusive` is set,
/// which lets a table either leave dead bands between phases or tile the
/// axis contiguously with half-open ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRange {
    pub phase: String,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub max_inclusive: bool,
}

impl PhaseRange {
    pub fn closed(phase: &str, min: f64, max: f64) -> Self {
        Self {
            phase: phase.to_string(),
            min,
            max,
            max_inclusive: true,
        }
    }

    pub fn half_open(phase: &str, min: f64, max: f64) -> Self {
        Self {
            phase: phase.to_string(),
            min,
            max,
            max_inclusive: false,
        }
    }

    pub fn contains(&self, angle: f64) -> bool {
        angle >= self.min && (angle < self.max || (self.max_inclusive && angle == self.max))
    }

    /// True when some angle would match both ranges
    pub fn overlaps(&self, other: &PhaseRange) -> bool {
        let (low, high) = if self.min <= other.min {
            (self, other)
        } else {
            (other, self)
        };
        high.min < low.max || (high.min == low.max && low.max_inclusive)
    }
}

/// Predicate deciding whether a completed cycle counts as a correct rep
///
/// Exercises disagree on how strict this should be, so it is part of the
/// profile rather than the counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SequencePredicate {
    /// History must equal this ordered list exactly
    Exact { sequence: Vec<String> },
    /// History must contain this phase somewhere
    Contains { phase: String },
}

impl SequencePredicate {
    pub fn is_satisfied_by<'a, I>(&self, history: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        match self {
            SequencePredicate::Exact { sequence } => {
                let recorded: Vec<&str> = history.into_iter().collect();
                recorded.len() == sequence.len()
                    && recorded.iter().zip(sequence).all(|(a, b)| *a == b.as_str())
            }
            SequencePredicate::Contains { phase } => {
                history.into_iter().any(|p| p == phase.as_str())
            }
        }
    }

    pub fn referenced_phases(&self) -> Vec<&str> {
        match self {
            SequencePredicate::Exact { sequence } => sequence.iter().map(String::as_str).collect(),
            SequencePredicate::Contains { phase } => vec![phase.as_str()],
        }
    }
}

/// How a repetition is delimited and judged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepRule {
    /// Phase that opens and closes every cycle
    pub rest_phase: String,
    pub valid_sequence: SequencePredicate,
}

/// Numeric test applied to a single angle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Comparison {
    Below { value: f64 },
    Above { value: f64 },
    Between { min: f64, max: f64 },
    Outside { min: f64, max: f64 },
}

impl Comparison {
    pub fn holds(&self, degrees: f64) -> bool {
        match *self {
            Comparison::Below { value } => degrees < value,
            Comparison::Above { value } => degrees > value,
            Comparison::Between { min, max } => degrees >= min && degrees <= max,
            Comparison::Outside { min, max } => degrees < min || degrees > max,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleCondition {
    pub angle: AngleName,
    #[serde(flatten)]
    pub comparison: Comparison,
}

impl AngleCondition {
    pub fn below(angle: AngleName, value: f64) -> Self {
        Self {
            angle,
            comparison: Comparison::Below { value },
        }
    }

    pub fn above(angle: AngleName, value: f64) -> Self {
        Self {
            angle,
            comparison: Comparison::Above { value },
        }
    }

    pub fn between(angle: AngleName, min: f64, max: f64) -> Self {
        Self {
            angle,
            comparison: Comparison::Between { min, max },
        }
    }

    pub fn outside(angle: AngleName, min: f64, max: f64) -> Self {
        Self {
            angle,
            comparison: Comparison::Outside { min, max },
        }
    }
}

/// Declarative feedback rule: when every condition holds (and the phase
/// filters match), `feature` is in an incorrect state and `message` applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRule {
    pub feature: String,
    pub message: String,
    pub conditions: Vec<AngleCondition>,
    /// Current phase must be one of these; empty matches any phase
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<String>,
    /// Previous phase must be one of these; empty matches any phase
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previous_phases: Vec<String>,
}

impl FeedbackRule {
    pub fn new(feature: &str, message: &str, conditions: Vec<AngleCondition>) -> Self {
        Self {
            feature: feature.to_string(),
            message: message.to_string(),
            conditions,
            phases: Vec::new(),
            previous_phases: Vec::new(),
        }
    }

    pub fn in_phases(mut self, phases: &[&str]) -> Self {
        self.phases = phases.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn after_phases(mut self, phases: &[&str]) -> Self {
        self.previous_phases = phases.iter().map(|p| p.to_string()).collect();
        self
    }
}

/// When a session counts as inactive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InactivityPolicy {
    /// Gap between consecutive frames exceeds the timeout
    #[default]
    FrameGap,
    /// No phase change for longer than the timeout
    PhaseStall,
}

/// Primary-angle span mapped onto 0-100% progress
///
/// `from` maps to 0% and `to` maps to 100%; `to < from` is allowed for
/// exercises where the angle shrinks as the rep deepens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressRange {
    pub from: f64,
    pub to: f64,
}

fn default_smoothing() -> f64 {
    1.0
}

fn default_debounce_frames() -> u32 {
    1
}

/// Immutable per-exercise configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseProfile {
    pub name: String,
    pub kind: ExerciseKind,
    /// Angle the classifier and progress mapper read
    pub primary_angle: AngleName,
    /// Angles every frame must carry
    pub required_angles: Vec<AngleName>,
    /// Ordered phase table; earlier rows win
    pub phases: Vec<PhaseRange>,
    /// Absent for hold-style exercises that count no reps
    #[serde(default)]
    pub rep_rule: Option<RepRule>,
    #[serde(default)]
    pub rules: Vec<FeedbackRule>,
    pub progress: ProgressRange,
    pub inactivity_timeout_secs: f64,
    #[serde(default)]
    pub inactivity_policy: InactivityPolicy,
    pub feedback_cooldown_secs: f64,
    pub alert_cooldown_secs: f64,
    /// EMA factor for the primary angle; 1.0 uses raw readings
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
    /// Consecutive frames a new phase must hold before it is accepted
    #[serde(default = "default_debounce_frames")]
    pub debounce_frames: u32,
}

impl ExerciseProfile {
    /// Resolve a built-in profile
    ///
    /// # Returns
    /// * `Some(ExerciseProfile)` - Squat, push-up or plank profile
    /// * `None` - Custom profiles only come from configuration
    pub fn builtin(kind: ExerciseKind, preset: ThresholdPreset) -> Option<Self> {
        match kind {
            ExerciseKind::Squat => Some(presets::squat(&SquatThresholds::for_preset(preset))),
            ExerciseKind::PushUp => Some(presets::push_up()),
            ExerciseKind::Plank => Some(presets::plank()),
            ExerciseKind::Custom => None,
        }
    }

    /// Check the profile for structural problems
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        ProfileValidator::validate(self)
    }

    /// Angles ingestion must enforce for this profile
    pub fn angle_requirements(&self) -> AngleRequirements {
        let mut required = Vec::new();
        for angle in std::iter::once(self.primary_angle).chain(self.required_angles.iter().copied())
        {
            if !required.contains(&angle) {
                required.push(angle);
            }
        }

        let mut optional = Vec::new();
        for condition in self.rules.iter().flat_map(|rule| rule.conditions.iter()) {
            if !required.contains(&condition.angle) && !optional.contains(&condition.angle) {
                optional.push(condition.angle);
            }
        }

        AngleRequirements { required, optional }
    }

    pub fn declares_phase(&self, phase: &str) -> bool {
        self.phases.iter().any(|range| range.phase == phase)
    }

    pub fn inactivity_timeout(&self) -> Duration {
        secs_to_duration(self.inactivity_timeout_secs)
    }

    pub fn feedback_cooldown(&self) -> Duration {
        secs_to_duration(self.feedback_cooldown_secs)
    }

    pub fn alert_cooldown(&self) -> Duration {
        secs_to_duration(self.alert_cooldown_secs)
    }
}

fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}

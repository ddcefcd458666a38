// StateClassifier - maps the primary angle onto a discrete exercise phase
//
// The profile's phase table is walked in declaration order and the first
// matching range wins, so shared boundary values always resolve the same
// way. Angles that fall in no range (dead bands between phases, or values
// beyond the table) classify as Unknown, which downstream stages treat as
// noise.
//
// PhaseFilter sits in front of the table: it smooths the raw primary angle
// with an exponential moving average and holds back a new phase until it
// has been seen on `debounce_frames` consecutive frames.

use serde::{Serialize, Serializer};

use crate::profile::PhaseRange;

/// Discrete position in an exercise's motion
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    Named(String),
    /// No range matched; never recorded in rep history
    #[default]
    Unknown,
}

impl Phase {
    pub fn named(name: &str) -> Self {
        Phase::Named(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Phase::Named(name) => name,
            Phase::Unknown => "unknown",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Phase::Unknown)
    }

    pub fn is(&self, name: &str) -> bool {
        matches!(self, Phase::Named(n) if n == name)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Phase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Ordered range-table lookup
pub struct StateClassifier<'a> {
    phases: &'a [PhaseRange],
}

impl<'a> StateClassifier<'a> {
    pub fn new(phases: &'a [PhaseRange]) -> Self {
        Self { phases }
    }

    /// Classify a primary angle
    ///
    /// # Returns
    /// The first phase whose range contains `angle`, or `Phase::Unknown`
    pub fn classify(&self, angle: f64) -> Phase {
        self.phases
            .iter()
            .find(|range| range.contains(angle))
            .map(|range| Phase::Named(range.phase.clone()))
            .unwrap_or(Phase::Unknown)
    }
}

/// Smoothing and debounce state carried between frames
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseFilter {
    smoothed: Option<f64>,
    accepted: Phase,
    pending: Option<(Phase, u32)>,
}

impl PhaseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a raw reading into the moving average
    ///
    /// `alpha` is the weight of the new reading; 1.0 disables smoothing.
    pub fn smooth(&mut self, raw: f64, alpha: f64) -> f64 {
        let next = match self.smoothed {
            Some(previous) => alpha * raw + (1.0 - alpha) * previous,
            None => raw,
        };
        self.smoothed = Some(next);
        next
    }

    /// Accept `candidate` once it has held for `debounce_frames` frames
    ///
    /// # Returns
    /// The phase in effect after this frame
    pub fn debounce(&mut self, candidate: Phase, debounce_frames: u32) -> Phase {
        if candidate == self.accepted {
            self.pending = None;
            return self.accepted.clone();
        }

        let seen = match &self.pending {
            Some((pending, count)) if *pending == candidate => count + 1,
            _ => 1,
        };

        if seen >= debounce_frames {
            self.pending = None;
            self.accepted = candidate;
        } else {
            self.pending = Some((candidate, seen));
        }
        self.accepted.clone()
    }

    pub fn smoothed(&self) -> Option<f64> {
        self.smoothed
    }
}

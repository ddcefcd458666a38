// AngleFrame ingestion - normalizes per-frame angle mappings
//
// The pose/geometry collaborator hands us a loose string-keyed mapping of
// joint angles in degrees. Ingestion turns that into an AngleFrame keyed by
// the fixed AngleName vocabulary, checking it against what the active
// profile needs before any session state is touched.
//
// Strict mode: every tracked angle must be present, unknown keys rejected.
// Lenient mode: only required angles must be present, other tracked angles
// default to 0.0, unknown keys ignored.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Raw per-frame input as delivered by the pose collaborator
pub type RawAngles = HashMap<String, f64>;

/// Fixed vocabulary of joint angles the engine understands
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AngleName {
    /// Interior knee angle (hip-knee-ankle)
    KneeAngle,
    /// Hip angle; for squats the hip-knee segment's inclination from vertical
    HipAngle,
    /// Torso inclination from vertical
    BackAngle,
    /// Shin inclination from vertical
    AnkleAngle,
    /// Interior elbow angle (shoulder-elbow-wrist)
    ElbowAngle,
    /// Shoulder angle (elbow-shoulder-hip)
    ShoulderAngle,
    /// Hand placement relative to the shoulder line
    HandToShoulderAngle,
    /// Shoulder line relative to horizontal
    ShoulderAlignment,
}

impl AngleName {
    pub const ALL: [AngleName; 8] = [
        AngleName::KneeAngle,
        AngleName::HipAngle,
        AngleName::BackAngle,
        AngleName::AnkleAngle,
        AngleName::ElbowAngle,
        AngleName::ShoulderAngle,
        AngleName::HandToShoulderAngle,
        AngleName::ShoulderAlignment,
    ];

    /// Wire name used in input mappings
    pub fn as_str(&self) -> &'static str {
        match self {
            AngleName::KneeAngle => "knee_angle",
            AngleName::HipAngle => "hip_angle",
            AngleName::BackAngle => "back_angle",
            AngleName::AnkleAngle => "ankle_angle",
            AngleName::ElbowAngle => "elbow_angle",
            AngleName::ShoulderAngle => "shoulder_angle",
            AngleName::HandToShoulderAngle => "hand_to_shoulder_angle",
            AngleName::ShoulderAlignment => "shoulder_alignment",
        }
    }
}

impl fmt::Display for AngleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AngleName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AngleName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownAngle {
                name: s.to_string(),
            })
    }
}

/// How strictly ingestion treats absent or unexpected keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestMode {
    Strict,
    #[default]
    Lenient,
}

/// Angles a profile needs from every frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AngleRequirements {
    /// Must always be present, in any mode
    pub required: Vec<AngleName>,
    /// Read by rules; must be present only in strict mode
    pub optional: Vec<AngleName>,
}

impl AngleRequirements {
    fn is_tracked(&self, name: AngleName) -> bool {
        self.required.contains(&name) || self.optional.contains(&name)
    }
}

/// One sample of named joint-angle measurements
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AngleFrame {
    angles: BTreeMap<AngleName, f64>,
}

impl AngleFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and fixtures
    pub fn with(mut self, name: AngleName, degrees: f64) -> Self {
        self.angles.insert(name, degrees);
        self
    }

    pub fn get(&self, name: AngleName) -> Option<f64> {
        self.angles.get(&name).copied()
    }

    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AngleName, f64)> + '_ {
        self.angles.iter().map(|(name, value)| (*name, *value))
    }

    /// Validate and normalize a raw mapping against a profile's requirements
    ///
    /// # Returns
    /// * `Ok(AngleFrame)` - Frame containing every tracked angle
    /// * `Err(ValidationError)` - First problem found; keys are inspected in
    ///   sorted order so the reported error is deterministic
    pub fn ingest(
        raw: &RawAngles,
        requirements: &AngleRequirements,
        mode: IngestMode,
    ) -> Result<Self, ValidationError> {
        let mut keys: Vec<&String> = raw.keys().collect();
        keys.sort();

        let mut angles = BTreeMap::new();
        for key in keys {
            let value = raw[key];
            let name = match key.parse::<AngleName>() {
                Ok(name) => name,
                Err(err) => {
                    if mode == IngestMode::Strict {
                        return Err(err);
                    }
                    log::debug!("[Ingest] Ignoring unknown angle key {}", key);
                    continue;
                }
            };

            if !value.is_finite() {
                if requirements.is_tracked(name) {
                    return Err(ValidationError::NonFiniteAngle {
                        angle: name.to_string(),
                    });
                }
                log::debug!("[Ingest] Dropping non-finite untracked angle {}", name);
                continue;
            }
            angles.insert(name, value);
        }

        for name in &requirements.required {
            if !angles.contains_key(name) {
                return Err(ValidationError::MissingAngle {
                    angle: name.to_string(),
                });
            }
        }

        for name in &requirements.optional {
            if angles.contains_key(name) {
                continue;
            }
            match mode {
                IngestMode::Strict => {
                    return Err(ValidationError::MissingAngle {
                        angle: name.to_string(),
                    })
                }
                IngestMode::Lenient => {
                    angles.insert(*name, 0.0);
                }
            }
        }

        Ok(Self { angles })
    }
}

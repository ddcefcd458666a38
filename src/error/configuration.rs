// Profile configuration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Configuration error code constants
///
/// Error code range: 4001-4008
pub struct ConfigurationErrorCodes {}

impl ConfigurationErrorCodes {
    /// Profile declares no phases
    pub const EMPTY_PHASE_TABLE: i32 = 4001;

    /// A phase range has non-finite or inverted bounds
    pub const MALFORMED_RANGE: i32 = 4002;

    /// Two phase ranges share values
    pub const OVERLAPPING_RANGES: i32 = 4003;

    /// A rule or sequence names a phase the table does not declare
    pub const UNDECLARED_PHASE: i32 = 4004;

    /// The rep sequence predicate cannot be satisfied
    pub const INVALID_SEQUENCE: i32 = 4005;

    /// A feedback rule is malformed
    pub const INVALID_RULE: i32 = 4006;

    /// A timing or mapping parameter is out of range
    pub const INVALID_TIMING: i32 = 4007;

    /// No built-in or configured profile has this name
    pub const UNKNOWN_PROFILE: i32 = 4008;
}

/// Log a configuration error with structured context
pub fn log_configuration_error(err: &ConfigurationError, context: &str) {
    error!(
        "Configuration error in {}: code={}, component=ExerciseProfile, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Profile configuration errors
///
/// Detected when a profile is validated, before any session may use it.
/// These are fatal to session start and are never retried.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// The phase table has no entries
    EmptyPhaseTable { profile: String },

    /// A range is inverted, empty or has non-finite bounds
    MalformedRange { phase: String, min: f64, max: f64 },

    /// Two ranges in the table overlap
    OverlappingRanges { first: String, second: String },

    /// A phase name is referenced but never declared
    UndeclaredPhase { phase: String },

    /// The rep sequence predicate is unusable
    InvalidSequence { reason: String },

    /// A feedback rule is unusable
    InvalidRule { feature: String, reason: String },

    /// A cooldown, timeout or mapping parameter is out of range
    InvalidTiming { parameter: String, reason: String },

    /// The requested exercise resolves to no profile
    UnknownProfile { name: String },
}

impl ErrorCode for ConfigurationError {
    fn code(&self) -> i32 {
        match self {
            ConfigurationError::EmptyPhaseTable { .. } => {
                ConfigurationErrorCodes::EMPTY_PHASE_TABLE
            }
            ConfigurationError::MalformedRange { .. } => ConfigurationErrorCodes::MALFORMED_RANGE,
            ConfigurationError::OverlappingRanges { .. } => {
                ConfigurationErrorCodes::OVERLAPPING_RANGES
            }
            ConfigurationError::UndeclaredPhase { .. } => {
                ConfigurationErrorCodes::UNDECLARED_PHASE
            }
            ConfigurationError::InvalidSequence { .. } => {
                ConfigurationErrorCodes::INVALID_SEQUENCE
            }
            ConfigurationError::InvalidRule { .. } => ConfigurationErrorCodes::INVALID_RULE,
            ConfigurationError::InvalidTiming { .. } => ConfigurationErrorCodes::INVALID_TIMING,
            ConfigurationError::UnknownProfile { .. } => ConfigurationErrorCodes::UNKNOWN_PROFILE,
        }
    }

    fn message(&self) -> String {
        match self {
            ConfigurationError::EmptyPhaseTable { profile } => {
                format!("Profile {} declares no phases", profile)
            }
            ConfigurationError::MalformedRange { phase, min, max } => {
                format!("Phase {} has malformed range [{}, {}]", phase, min, max)
            }
            ConfigurationError::OverlappingRanges { first, second } => {
                format!("Phase ranges {} and {} overlap", first, second)
            }
            ConfigurationError::UndeclaredPhase { phase } => {
                format!("Phase {} is referenced but not declared", phase)
            }
            ConfigurationError::InvalidSequence { reason } => {
                format!("Invalid rep sequence: {}", reason)
            }
            ConfigurationError::InvalidRule { feature, reason } => {
                format!("Invalid feedback rule {}: {}", feature, reason)
            }
            ConfigurationError::InvalidTiming { parameter, reason } => {
                format!("Invalid {}: {}", parameter, reason)
            }
            ConfigurationError::UnknownProfile { name } => {
                format!("No exercise profile named {}", name)
            }
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigurationError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ConfigurationError {}

// Frame validation error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Validation error code constants
///
/// Error code range: 3001-3004
pub struct ValidationErrorCodes {}

impl ValidationErrorCodes {
    /// A required angle is absent from the frame
    pub const MISSING_ANGLE: i32 = 3001;

    /// A tracked angle is NaN or infinite
    pub const NON_FINITE_ANGLE: i32 = 3002;

    /// The frame names an angle outside the vocabulary (strict mode)
    pub const UNKNOWN_ANGLE: i32 = 3003;

    /// The frame was addressed to a session that does not exist
    pub const SESSION_NOT_FOUND: i32 = 3004;
}

/// Log a validation error with structured context
///
/// Called once where a rejected frame leaves the engine, so a noisy pose
/// estimator shows up in logs without every layer repeating it.
pub fn log_validation_error(err: &ValidationError, context: &str) {
    error!(
        "Validation error in {}: code={}, component=FrameIngest, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Frame-level validation errors
///
/// A frame that fails validation is rejected as a whole: the session state
/// is left exactly as it was before the frame arrived.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required angle missing from the input mapping
    MissingAngle { angle: String },

    /// Angle value is NaN or infinite
    NonFiniteAngle { angle: String },

    /// Angle name outside the fixed vocabulary (strict ingest only)
    UnknownAngle { name: String },

    /// No session registered under this id
    SessionNotFound { session_id: String },
}

impl ErrorCode for ValidationError {
    fn code(&self) -> i32 {
        match self {
            ValidationError::MissingAngle { .. } => ValidationErrorCodes::MISSING_ANGLE,
            ValidationError::NonFiniteAngle { .. } => ValidationErrorCodes::NON_FINITE_ANGLE,
            ValidationError::UnknownAngle { .. } => ValidationErrorCodes::UNKNOWN_ANGLE,
            ValidationError::SessionNotFound { .. } => ValidationErrorCodes::SESSION_NOT_FOUND,
        }
    }

    fn message(&self) -> String {
        match self {
            ValidationError::MissingAngle { angle } => {
                format!("Required angle missing from frame: {}", angle)
            }
            ValidationError::NonFiniteAngle { angle } => {
                format!("Angle {} is not a finite number", angle)
            }
            ValidationError::UnknownAngle { name } => {
                format!("Unknown angle name: {}", name)
            }
            ValidationError::SessionNotFound { session_id } => {
                format!("No active session with id {}", session_id)
            }
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ValidationError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_codes() {
        assert_eq!(
            ValidationError::MissingAngle {
                angle: "knee_angle".to_string()
            }
            .code(),
            3001
        );
        assert_eq!(
            ValidationError::NonFiniteAngle {
                angle: "knee_angle".to_string()
            }
            .code(),
            3002
        );
        assert_eq!(
            ValidationError::UnknownAngle {
                name: "wrist".to_string()
            }
            .code(),
            3003
        );
        assert_eq!(
            ValidationError::SessionNotFound {
                session_id: "a".to_string()
            }
            .code(),
            3004
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::MissingAngle {
            angle: "back_angle".to_string(),
        };
        assert_eq!(err.message(), "Required angle missing from frame: back_angle");

        let err = ValidationError::UnknownAngle {
            name: "wrist_angle".to_string(),
        };
        assert!(err.message().contains("wrist_angle"));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::NonFiniteAngle {
            angle: "hip_angle".to_string(),
        };
        let display = format!("{}", err);
        assert!(display.contains("ValidationError"));
        assert!(display.contains("3002"));
    }
}

// Session manager error types and constants

use crate::error::{
    log_configuration_error, log_validation_error, ConfigurationError, ErrorCode, ValidationError,
};
use log::error;
use std::fmt;

/// Session manager error code constants
///
/// Error code range: 5001-5002. Wrapped validation and configuration
/// errors keep their own codes.
pub struct SessionErrorCodes {}

impl SessionErrorCodes {
    /// A session mutex was poisoned by a panicking thread
    pub const STATE_POISONED: i32 = 5001;

    /// A session id is already registered
    pub const ALREADY_ACTIVE: i32 = 5002;
}

/// Log a session error with structured context
///
/// Wrapped errors are logged under their own component.
pub fn log_session_error(err: &SessionError, context: &str) {
    match err {
        SessionError::Validation(inner) => return log_validation_error(inner, context),
        SessionError::Configuration(inner) => return log_configuration_error(inner, context),
        _ => {}
    }
    error!(
        "Session error in {}: code={}, component=SessionManager, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors surfaced by the session manager
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Frame rejected, or session id unknown
    Validation(ValidationError),

    /// Profile could not be resolved or failed validation
    Configuration(ConfigurationError),

    /// Session state lock was poisoned
    StatePoisoned { session_id: String },

    /// Session id already in use
    AlreadyActive { session_id: String },
}

impl ErrorCode for SessionError {
    fn code(&self) -> i32 {
        match self {
            SessionError::Validation(err) => err.code(),
            SessionError::Configuration(err) => err.code(),
            SessionError::StatePoisoned { .. } => SessionErrorCodes::STATE_POISONED,
            SessionError::AlreadyActive { .. } => SessionErrorCodes::ALREADY_ACTIVE,
        }
    }

    fn message(&self) -> String {
        match self {
            SessionError::Validation(err) => err.message(),
            SessionError::Configuration(err) => err.message(),
            SessionError::StatePoisoned { session_id } => {
                format!("Session {} state lock poisoned", session_id)
            }
            SessionError::AlreadyActive { session_id } => {
                format!("Session {} is already active", session_id)
            }
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SessionError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Validation(err) => Some(err),
            SessionError::Configuration(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        SessionError::Validation(err)
    }
}

impl From<ConfigurationError> for SessionError {
    fn from(err: ConfigurationError) -> Self {
        SessionError::Configuration(err)
    }
}

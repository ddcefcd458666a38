// Error types for the rep coach engine
//
// This module defines the error taxonomy for frame processing and profile
// loading. Each error carries a stable numeric code so callers on the far
// side of an HTTP or FFI boundary can branch without parsing messages.
//
// Soft conditions (an unknown phase, feedback suppressed by a cooldown) are
// normal outputs of the engine and are not represented here.

mod configuration;
mod session;
mod validation;

pub use configuration::{log_configuration_error, ConfigurationError, ConfigurationErrorCodes};
pub use session::{log_session_error, SessionError, SessionErrorCodes};
pub use validation::{log_validation_error, ValidationError, ValidationErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the presentation boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

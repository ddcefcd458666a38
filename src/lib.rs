// Rep Coach Core - repetition counting and form feedback engine
// Per-frame joint angles in, throttled feedback records out

// Module declarations
pub mod analysis;
pub mod clock;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod managers;
pub mod profile;

// Re-exports for convenience
pub use analysis::frame::{AngleFrame, AngleName, IngestMode, RawAngles};
pub use analysis::{FeedbackRecord, Session, SessionOptions, SessionSnapshot, INACTIVITY_MESSAGE};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::AppConfig;
pub use error::{ConfigurationError, ErrorCode, SessionError, ValidationError};
pub use managers::{SessionEvent, SessionManager};
pub use profile::{ExerciseKind, ExerciseProfile, ThresholdPreset};

/// Install a stderr tracing subscriber for hosts that have none
///
/// `log` records are bridged into the same subscriber. Returns false when a
/// subscriber was already installed.
pub fn init_logging(level: tracing::Level) -> bool {
    let installed = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();
    if installed {
        log::debug!("[RepCoach] Logging initialised at {}", level);
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_structure() {
        let profile = ExerciseProfile::builtin(ExerciseKind::Squat, ThresholdPreset::Beginner);
        assert!(profile.is_some());
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging(tracing::Level::INFO);
        assert!(!init_logging(tracing::Level::DEBUG));
    }
}

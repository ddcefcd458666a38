//! Configuration management for session setup
//!
//! This module loads runtime configuration from JSON files so exercise
//! selection, threshold presets, cooldowns and the progress bar can be
//! tuned without recompilation. Extra exercises can be defined entirely in
//! the config file as `custom_profiles`.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::frame::IngestMode;
use crate::analysis::progress::BarRange;
use crate::analysis::SessionOptions;
use crate::error::ConfigurationError;
use crate::profile::{ExerciseKind, ExerciseProfile, ThresholdPreset};

/// Default config location for desktop runs
pub const DEFAULT_CONFIG_PATH: &str = "config/rep_coach.json";

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub throttle: ThrottleConfig,
    pub progress_bar: BarRange,
    /// Full profile definitions, looked up by `name` before the built-ins
    pub custom_profiles: Vec<ExerciseProfile>,
}

/// Which exercise a new session tracks and how frames are ingested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Built-in kind (`squat`, `push_up`, `plank`) or a custom profile name
    pub exercise: String,
    /// Squat threshold table
    pub preset: ThresholdPreset,
    pub ingest_mode: IngestMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            exercise: ExerciseKind::Squat.as_str().to_string(),
            preset: ThresholdPreset::Beginner,
            ingest_mode: IngestMode::Lenient,
        }
    }
}

/// Cooldown overrides applied on top of the resolved profile
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_cooldown_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_cooldown_secs: Option<f64>,
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or defaults if the file is missing or invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration, failing on a missing or malformed file
    pub fn try_load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        log::info!("[Config] Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load from the default location
    pub fn load() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }

    /// Resolve the profile named in the `session` section
    pub fn active_profile(&self) -> Result<ExerciseProfile, ConfigurationError> {
        self.resolve_profile(&self.session.exercise, self.session.preset)
    }

    /// Resolve a profile by name, apply throttle overrides and validate it
    ///
    /// Custom profiles shadow built-ins of the same name.
    pub fn resolve_profile(
        &self,
        exercise: &str,
        preset: ThresholdPreset,
    ) -> Result<ExerciseProfile, ConfigurationError> {
        let mut profile = match self.custom_profiles.iter().find(|p| p.name == exercise) {
            Some(custom) => custom.clone(),
            None => exercise
                .parse::<ExerciseKind>()
                .ok()
                .and_then(|kind| ExerciseProfile::builtin(kind, preset))
                .ok_or_else(|| ConfigurationError::UnknownProfile {
                    name: exercise.to_string(),
                })?,
        };

        if let Some(secs) = self.throttle.feedback_cooldown_secs {
            profile.feedback_cooldown_secs = secs;
        }
        if let Some(secs) = self.throttle.alert_cooldown_secs {
            profile.alert_cooldown_secs = secs;
        }

        profile.validate()?;
        log::debug!(
            "[Config] Resolved profile {} (preset={:?})",
            profile.name,
            preset
        );
        Ok(profile)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            ingest_mode: self.session.ingest_mode,
            bar: self.progress_bar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::presets;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.session.exercise, "squat");
        assert_eq!(config.session.preset, ThresholdPreset::Beginner);
        assert_eq!(config.session.ingest_mode, IngestMode::Lenient);
        assert_eq!(config.progress_bar.start, 650.0);
        assert_eq!(config.progress_bar.end, 100.0);
        assert!(config.custom_profiles.is_empty());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "session": { "exercise": "push_up" }, "throttle": { "alert_cooldown_secs": 1.5 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.session.exercise, "push_up");
        assert_eq!(config.session.preset, ThresholdPreset::Beginner);
        assert_eq!(config.throttle.alert_cooldown_secs, Some(1.5));
        assert_eq!(config.throttle.feedback_cooldown_secs, None);

        let profile = config.active_profile().unwrap();
        assert_eq!(profile.name, "push_up");
        assert_eq!(profile.alert_cooldown_secs, 1.5);
        assert_eq!(profile.feedback_cooldown_secs, 3.0);
    }

    #[test]
    fn test_pro_preset_resolves_stricter_squat() {
        let mut config = AppConfig::default();
        config.session.preset = ThresholdPreset::Pro;
        let profile = config.active_profile().unwrap();
        assert_eq!(profile.phases[2].min, 80.0);
    }

    #[test]
    fn test_custom_profile_shadows_builtin() {
        let mut custom = presets::plank();
        custom.name = "wall_sit".to_string();
        custom.kind = ExerciseKind::Custom;
        custom.inactivity_timeout_secs = 30.0;

        let config = AppConfig {
            custom_profiles: vec![custom],
            ..AppConfig::default()
        };
        let profile = config
            .resolve_profile("wall_sit", ThresholdPreset::Beginner)
            .unwrap();
        assert_eq!(profile.kind, ExerciseKind::Custom);
        assert_eq!(profile.inactivity_timeout_secs, 30.0);
    }

    #[test]
    fn test_unknown_exercise_is_configuration_error() {
        let config = AppConfig::default();
        assert_eq!(
            config.resolve_profile("lunge", ThresholdPreset::Beginner),
            Err(ConfigurationError::UnknownProfile {
                name: "lunge".to_string()
            })
        );
        assert!(config
            .resolve_profile("custom", ThresholdPreset::Beginner)
            .is_err());
    }

    #[test]
    fn test_invalid_override_rejected() {
        let mut config = AppConfig::default();
        config.throttle.feedback_cooldown_secs = Some(-1.0);
        assert!(matches!(
            config.active_profile(),
            Err(ConfigurationError::InvalidTiming { .. })
        ));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("does/not/exist.json");
        assert_eq!(config, AppConfig::default());
        assert!(AppConfig::try_load_from_file("does/not/exist.json").is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = AppConfig::default();
        config.custom_profiles.push(presets::push_up());
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}

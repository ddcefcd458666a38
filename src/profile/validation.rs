// Profile validation logic
//
// Runs once when a profile is loaded, before any session uses it. A profile
// that fails here never reaches the frame pipeline, so the pipeline itself
// can assume a well-formed phase table and rule set.

use super::{Comparison, ExerciseProfile, SequencePredicate};
use crate::analysis::rep_counter::HISTORY_CAPACITY;
use crate::error::ConfigurationError;

/// Upper bound for any timing parameter, in seconds
const MAX_TIMING_SECS: f64 = 86_400.0;

/// Validator for exercise profiles
pub struct ProfileValidator;

impl ProfileValidator {
    /// Validate a whole profile
    ///
    /// # Validation Rules
    /// * Phase table is non-empty, every range finite with min < max
    /// * No two ranges overlap
    /// * Rep rule phases are declared; exact sequences fit the history window
    /// * Every feedback rule has a feature, a message and finite conditions
    /// * Cooldowns are non-negative, the inactivity timeout is positive
    /// * Smoothing is in (0, 1], debounce is at least one frame
    /// * Progress range spans a non-zero interval
    pub fn validate(profile: &ExerciseProfile) -> Result<(), ConfigurationError> {
        Self::validate_phases(profile)?;
        Self::validate_rep_rule(profile)?;
        Self::validate_rules(profile)?;
        Self::validate_timing(profile)?;
        Ok(())
    }

    fn validate_phases(profile: &ExerciseProfile) -> Result<(), ConfigurationError> {
        if profile.phases.is_empty() {
            return Err(ConfigurationError::EmptyPhaseTable {
                profile: profile.name.clone(),
            });
        }

        for range in &profile.phases {
            if range.phase.is_empty()
                || !range.min.is_finite()
                || !range.max.is_finite()
                || range.min >= range.max
            {
                return Err(ConfigurationError::MalformedRange {
                    phase: range.phase.clone(),
                    min: range.min,
                    max: range.max,
                });
            }
        }

        for (i, first) in profile.phases.iter().enumerate() {
            for second in profile.phases.iter().skip(i + 1) {
                if first.overlaps(second) {
                    return Err(ConfigurationError::OverlappingRanges {
                        first: first.phase.clone(),
                        second: second.phase.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    fn validate_rep_rule(profile: &ExerciseProfile) -> Result<(), ConfigurationError> {
        let Some(rule) = &profile.rep_rule else {
            return Ok(());
        };

        Self::require_declared(profile, &rule.rest_phase)?;
        for phase in rule.valid_sequence.referenced_phases() {
            Self::require_declared(profile, phase)?;
            if phase == rule.rest_phase {
                return Err(ConfigurationError::InvalidSequence {
                    reason: format!(
                        "rest phase {} is never recorded in history",
                        rule.rest_phase
                    ),
                });
            }
        }

        if let SequencePredicate::Exact { sequence } = &rule.valid_sequence {
            if sequence.is_empty() || sequence.len() > HISTORY_CAPACITY {
                return Err(ConfigurationError::InvalidSequence {
                    reason: format!(
                        "exact sequence must hold 1..={} phases, got {}",
                        HISTORY_CAPACITY,
                        sequence.len()
                    ),
                });
            }
            if sequence.windows(2).any(|pair| pair[0] == pair[1]) {
                return Err(ConfigurationError::InvalidSequence {
                    reason: "history never records the same phase twice in a row".to_string(),
                });
            }
        }

        Ok(())
    }

    fn validate_rules(profile: &ExerciseProfile) -> Result<(), ConfigurationError> {
        for rule in &profile.rules {
            let invalid = |reason: &str| ConfigurationError::InvalidRule {
                feature: rule.feature.clone(),
                reason: reason.to_string(),
            };

            if rule.feature.is_empty() {
                return Err(invalid("feature name is empty"));
            }
            if rule.message.trim().is_empty() {
                return Err(invalid("message is empty"));
            }
            if rule.conditions.is_empty() {
                return Err(invalid("rule has no conditions"));
            }

            for condition in &rule.conditions {
                let well_formed = match condition.comparison {
                    Comparison::Below { value } | Comparison::Above { value } => value.is_finite(),
                    Comparison::Between { min, max } | Comparison::Outside { min, max } => {
                        min.is_finite() && max.is_finite() && min <= max
                    }
                };
                if !well_formed {
                    return Err(invalid(&format!(
                        "condition on {} has non-finite or inverted bounds",
                        condition.angle
                    )));
                }
            }

            for phase in rule.phases.iter().chain(rule.previous_phases.iter()) {
                Self::require_declared(profile, phase)?;
            }
        }
        Ok(())
    }

    fn validate_timing(profile: &ExerciseProfile) -> Result<(), ConfigurationError> {
        let invalid = |parameter: &str, reason: String| ConfigurationError::InvalidTiming {
            parameter: parameter.to_string(),
            reason,
        };

        let timeout = profile.inactivity_timeout_secs;
        if !timeout.is_finite() || timeout <= 0.0 || timeout > MAX_TIMING_SECS {
            return Err(invalid(
                "inactivity_timeout_secs",
                format!("{} is not in (0, {}]", timeout, MAX_TIMING_SECS),
            ));
        }

        for (parameter, secs) in [
            ("feedback_cooldown_secs", profile.feedback_cooldown_secs),
            ("alert_cooldown_secs", profile.alert_cooldown_secs),
        ] {
            if !secs.is_finite() || !(0.0..=MAX_TIMING_SECS).contains(&secs) {
                return Err(invalid(
                    parameter,
                    format!("{} is not in [0, {}]", secs, MAX_TIMING_SECS),
                ));
            }
        }

        if !profile.smoothing.is_finite() || profile.smoothing <= 0.0 || profile.smoothing > 1.0 {
            return Err(invalid(
                "smoothing",
                format!("{} is not in (0, 1]", profile.smoothing),
            ));
        }

        if profile.debounce_frames == 0 {
            return Err(invalid(
                "debounce_frames",
                "must be at least 1".to_string(),
            ));
        }

        let progress = profile.progress;
        if !progress.from.is_finite() || !progress.to.is_finite() || progress.from == progress.to
        {
            return Err(invalid(
                "progress",
                format!("[{}, {}] spans no interval", progress.from, progress.to),
            ));
        }

        Ok(())
    }

    fn require_declared(profile: &ExerciseProfile, phase: &str) -> Result<(), ConfigurationError> {
        if profile.declares_phase(phase) {
            Ok(())
        } else {
            Err(ConfigurationError::UndeclaredPhase {
                phase: phase.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::frame::AngleName;
    use crate::profile::{presets, AngleCondition, FeedbackRule, PhaseRange, SquatThresholds};

    fn squat() -> ExerciseProfile {
        presets::squat(&SquatThresholds::beginner())
    }

    #[test]
    fn test_valid_profile_passes() {
        assert!(ProfileValidator::validate(&squat()).is_ok());
    }

    #[test]
    fn test_empty_phase_table_rejected() {
        let mut profile = squat();
        profile.phases.clear();
        profile.rep_rule = None;
        profile.rules.clear();
        assert!(matches!(
            ProfileValidator::validate(&profile),
            Err(ConfigurationError::EmptyPhaseTable { .. })
        ));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut profile = squat();
        profile.phases[1] = PhaseRange::closed("transition", 65.0, 35.0);
        match ProfileValidator::validate(&profile) {
            Err(ConfigurationError::MalformedRange { phase, .. }) => assert_eq!(phase, "transition"),
            other => panic!("Expected MalformedRange, got {:?}", other),
        }
    }

    #[test]
    fn test_overlapping_ranges_rejected() {
        let mut profile = squat();
        profile.phases[1] = PhaseRange::closed("transition", 30.0, 65.0);
        match ProfileValidator::validate(&profile) {
            Err(ConfigurationError::OverlappingRanges { first, second }) => {
                assert_eq!(first, "standing");
                assert_eq!(second, "transition");
            }
            other => panic!("Expected OverlappingRanges, got {:?}", other),
        }
    }

    #[test]
    fn test_touching_closed_ranges_overlap() {
        let mut profile = squat();
        profile.phases[1] = PhaseRange::closed("transition", 32.0, 65.0);
        assert!(matches!(
            ProfileValidator::validate(&profile),
            Err(ConfigurationError::OverlappingRanges { .. })
        ));
    }

    #[test]
    fn test_undeclared_rest_phase_rejected() {
        let mut profile = squat();
        if let Some(rule) = profile.rep_rule.as_mut() {
            rule.rest_phase = "lying".to_string();
        }
        assert_eq!(
            ProfileValidator::validate(&profile),
            Err(ConfigurationError::UndeclaredPhase {
                phase: "lying".to_string()
            })
        );
    }

    #[test]
    fn test_exact_sequence_longer_than_history_rejected() {
        let mut profile = squat();
        if let Some(rule) = profile.rep_rule.as_mut() {
            rule.valid_sequence = SequencePredicate::Exact {
                sequence: vec![
                    "transition".to_string(),
                    "squat".to_string(),
                    "transition".to_string(),
                    "squat".to_string(),
                ],
            };
        }
        assert!(matches!(
            ProfileValidator::validate(&profile),
            Err(ConfigurationError::InvalidSequence { .. })
        ));
    }

    #[test]
    fn test_sequence_containing_rest_phase_rejected() {
        let mut profile = squat();
        if let Some(rule) = profile.rep_rule.as_mut() {
            rule.valid_sequence = SequencePredicate::Contains {
                phase: "standing".to_string(),
            };
        }
        assert!(matches!(
            ProfileValidator::validate(&profile),
            Err(ConfigurationError::InvalidSequence { .. })
        ));
    }

    #[test]
    fn test_rule_without_message_rejected() {
        let mut profile = squat();
        profile.rules.push(FeedbackRule::new(
            "hips",
            "  ",
            vec![AngleCondition::above(AngleName::HipAngle, 10.0)],
        ));
        assert!(matches!(
            ProfileValidator::validate(&profile),
            Err(ConfigurationError::InvalidRule { .. })
        ));
    }

    #[test]
    fn test_rule_with_undeclared_phase_rejected() {
        let mut profile = squat();
        profile.rules.push(
            FeedbackRule::new(
                "hips",
                "Hips",
                vec![AngleCondition::above(AngleName::HipAngle, 10.0)],
            )
            .in_phases(&["bottom"]),
        );
        assert!(matches!(
            ProfileValidator::validate(&profile),
            Err(ConfigurationError::UndeclaredPhase { .. })
        ));
    }

    #[test]
    fn test_timing_parameters_checked() {
        let mut profile = squat();
        profile.inactivity_timeout_secs = 0.0;
        assert!(matches!(
            ProfileValidator::validate(&profile),
            Err(ConfigurationError::InvalidTiming { .. })
        ));

        let mut profile = squat();
        profile.feedback_cooldown_secs = f64::NAN;
        assert!(ProfileValidator::validate(&profile).is_err());

        let mut profile = squat();
        profile.smoothing = 0.0;
        assert!(ProfileValidator::validate(&profile).is_err());

        let mut profile = squat();
        profile.debounce_frames = 0;
        assert!(ProfileValidator::validate(&profile).is_err());

        let mut profile = squat();
        profile.progress.to = profile.progress.from;
        assert!(ProfileValidator::validate(&profile).is_err());
    }
}

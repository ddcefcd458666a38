// Built-in exercise profiles
//
// The squat profile is parameterised by SquatThresholds, of which there are
// two calibrated presets: Beginner (looser) and Pro (stricter). Both are
// instances of the same schema; nothing downstream branches on which one
// is in use.
//
// Squat angles follow the pose collaborator's conventions:
// - hip_angle: hip-knee segment inclination from vertical (0 standing, ~90 deep)
// - back_angle: torso inclination from vertical
// - ankle_angle: shin inclination from vertical
// - knee_angle: interior hip-knee-ankle angle

use serde::{Deserialize, Serialize};

use super::{
    AngleCondition, ExerciseKind, ExerciseProfile, FeedbackRule, InactivityPolicy, PhaseRange,
    ProgressRange, RepRule, SequencePredicate,
};
use crate::analysis::frame::AngleName;

pub const SQUAT_STANDING: &str = "standing";
pub const SQUAT_TRANSITION: &str = "transition";
pub const SQUAT_BOTTOM: &str = "squat";

pub const PUSH_UP_UP: &str = "up";
pub const PUSH_UP_TRANSITION: &str = "transition";
pub const PUSH_UP_DOWN: &str = "down";

pub const PLANK_HOLD: &str = "hold";

/// Calibration preset selecting a squat threshold table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPreset {
    #[default]
    Beginner,
    Pro,
}

impl std::str::FromStr for ThresholdPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beginner" => Ok(ThresholdPreset::Beginner),
            "pro" => Ok(ThresholdPreset::Pro),
            other => Err(format!("unknown threshold preset: {}", other)),
        }
    }
}

/// Squat threshold table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SquatThresholds {
    /// Hip inclination range for the standing phase
    pub standing: (f64, f64),
    /// Hip inclination range while moving between standing and depth
    pub transition: (f64, f64),
    /// Hip inclination range that counts as reaching depth
    pub pass: (f64, f64),
    /// Torso lean window [too upright, too far forward]
    pub hip_lean: [f64; 2],
    /// Shin inclination beyond which the knee travels past the toes
    pub ankle_limit: f64,
    /// Depth cues [shallow low, shallow high, too deep]
    pub knee_depth: [f64; 3],
    /// Interior knee angle above which the bottom position is too shallow
    pub shallow_knee: f64,
    /// Shoulder line tilt beyond which the camera is not side-on
    pub offset_limit: f64,
    pub inactive_secs: f64,
}

impl SquatThresholds {
    pub fn beginner() -> Self {
        Self {
            standing: (0.0, 32.0),
            transition: (35.0, 65.0),
            pass: (70.0, 95.0),
            hip_lean: [10.0, 50.0],
            ankle_limit: 45.0,
            knee_depth: [50.0, 70.0, 95.0],
            shallow_knee: 120.0,
            offset_limit: 35.0,
            inactive_secs: 15.0,
        }
    }

    pub fn pro() -> Self {
        Self {
            standing: (0.0, 32.0),
            transition: (35.0, 65.0),
            pass: (80.0, 95.0),
            hip_lean: [15.0, 50.0],
            ankle_limit: 30.0,
            knee_depth: [50.0, 80.0, 95.0],
            shallow_knee: 120.0,
            offset_limit: 35.0,
            inactive_secs: 15.0,
        }
    }

    pub fn for_preset(preset: ThresholdPreset) -> Self {
        match preset {
            ThresholdPreset::Beginner => Self::beginner(),
            ThresholdPreset::Pro => Self::pro(),
        }
    }
}

pub fn squat(thresholds: &SquatThresholds) -> ExerciseProfile {
    let t = thresholds;
    ExerciseProfile {
        name: "squat".to_string(),
        kind: ExerciseKind::Squat,
        primary_angle: AngleName::HipAngle,
        required_angles: vec![
            AngleName::KneeAngle,
            AngleName::HipAngle,
            AngleName::BackAngle,
        ],
        phases: vec![
            PhaseRange::closed(SQUAT_STANDING, t.standing.0, t.standing.1),
            PhaseRange::closed(SQUAT_TRANSITION, t.transition.0, t.transition.1),
            PhaseRange::closed(SQUAT_BOTTOM, t.pass.0, t.pass.1),
        ],
        rep_rule: Some(RepRule {
            rest_phase: SQUAT_STANDING.to_string(),
            valid_sequence: SequencePredicate::Exact {
                sequence: vec![
                    SQUAT_TRANSITION.to_string(),
                    SQUAT_BOTTOM.to_string(),
                    SQUAT_TRANSITION.to_string(),
                ],
            },
        }),
        rules: vec![
            FeedbackRule::new(
                "back_position",
                "Bend backwards",
                vec![AngleCondition::above(AngleName::BackAngle, t.hip_lean[1])],
            ),
            FeedbackRule::new(
                "back_position",
                "Bend forward",
                vec![AngleCondition::below(AngleName::BackAngle, t.hip_lean[0])],
            )
            .in_phases(&[SQUAT_TRANSITION, SQUAT_BOTTOM]),
            FeedbackRule::new(
                "squat_depth",
                "Lower your hips",
                vec![AngleCondition::between(
                    AngleName::HipAngle,
                    t.knee_depth[0],
                    t.knee_depth[1],
                )],
            )
            .in_phases(&[SQUAT_TRANSITION]),
            FeedbackRule::new(
                "squat_depth",
                "Squat too deep",
                vec![AngleCondition::above(AngleName::HipAngle, t.knee_depth[2])],
            ),
            FeedbackRule::new(
                "knee_depth",
                "Depth is not deep enough",
                vec![AngleCondition::above(AngleName::KneeAngle, t.shallow_knee)],
            )
            .in_phases(&[SQUAT_BOTTOM]),
            FeedbackRule::new(
                "knee_over_toe",
                "Knee falling over toe",
                vec![AngleCondition::above(AngleName::AnkleAngle, t.ankle_limit)],
            ),
            FeedbackRule::new(
                "camera_alignment",
                "Camera not aligned, turn side-on",
                vec![AngleCondition::above(
                    AngleName::ShoulderAlignment,
                    t.offset_limit,
                )],
            ),
        ],
        progress: ProgressRange {
            from: t.standing.0,
            to: t.pass.1,
        },
        inactivity_timeout_secs: t.inactive_secs,
        inactivity_policy: InactivityPolicy::FrameGap,
        feedback_cooldown_secs: 3.0,
        alert_cooldown_secs: 2.0,
        smoothing: 1.0,
        debounce_frames: 1,
    }
}

pub fn push_up() -> ExerciseProfile {
    ExerciseProfile {
        name: "push_up".to_string(),
        kind: ExerciseKind::PushUp,
        primary_angle: AngleName::ElbowAngle,
        required_angles: vec![AngleName::ElbowAngle, AngleName::HipAngle],
        phases: vec![
            PhaseRange::closed(PUSH_UP_UP, 150.0, 180.0),
            PhaseRange::half_open(PUSH_UP_TRANSITION, 100.0, 150.0),
            PhaseRange::half_open(PUSH_UP_DOWN, 0.0, 100.0),
        ],
        rep_rule: Some(RepRule {
            rest_phase: PUSH_UP_UP.to_string(),
            valid_sequence: SequencePredicate::Contains {
                phase: PUSH_UP_DOWN.to_string(),
            },
        }),
        rules: vec![
            FeedbackRule::new(
                "elbow_depth",
                "Lower chest more",
                vec![AngleCondition::above(AngleName::ElbowAngle, 160.0)],
            ),
            FeedbackRule::new(
                "elbow_depth",
                "Push up slightly",
                vec![AngleCondition::below(AngleName::ElbowAngle, 90.0)],
            ),
            FeedbackRule::new(
                "hip_line",
                "Raise hips",
                vec![AngleCondition::below(AngleName::HipAngle, 160.0)],
            ),
            FeedbackRule::new(
                "hip_line",
                "Lower hips slightly",
                vec![AngleCondition::above(AngleName::HipAngle, 170.0)],
            ),
            FeedbackRule::new(
                "hand_placement",
                "Widen hand placement",
                vec![AngleCondition::below(AngleName::HandToShoulderAngle, 80.0)],
            ),
            FeedbackRule::new(
                "hand_placement",
                "Narrow hand placement",
                vec![AngleCondition::above(AngleName::HandToShoulderAngle, 100.0)],
            ),
        ],
        progress: ProgressRange {
            from: 160.0,
            to: 90.0,
        },
        inactivity_timeout_secs: 15.0,
        inactivity_policy: InactivityPolicy::FrameGap,
        feedback_cooldown_secs: 3.0,
        alert_cooldown_secs: 3.0,
        smoothing: 1.0,
        debounce_frames: 1,
    }
}

pub fn plank() -> ExerciseProfile {
    ExerciseProfile {
        name: "plank".to_string(),
        kind: ExerciseKind::Plank,
        primary_angle: AngleName::HipAngle,
        required_angles: vec![AngleName::HipAngle, AngleName::ShoulderAngle],
        phases: vec![PhaseRange::closed(PLANK_HOLD, 140.0, 190.0)],
        rep_rule: None,
        rules: vec![
            FeedbackRule::new(
                "hip_line",
                "Raise hips slightly",
                vec![AngleCondition::below(AngleName::HipAngle, 160.0)],
            ),
            FeedbackRule::new(
                "hip_line",
                "Lower hips slightly",
                vec![AngleCondition::above(AngleName::HipAngle, 170.0)],
            ),
            FeedbackRule::new(
                "shoulder_position",
                "Move shoulders forward",
                vec![AngleCondition::below(AngleName::ShoulderAngle, 70.0)],
            ),
            FeedbackRule::new(
                "shoulder_position",
                "Move shoulders back",
                vec![AngleCondition::above(AngleName::ShoulderAngle, 110.0)],
            ),
        ],
        progress: ProgressRange {
            from: 120.0,
            to: 165.0,
        },
        inactivity_timeout_secs: 15.0,
        inactivity_policy: InactivityPolicy::FrameGap,
        feedback_cooldown_secs: 3.0,
        alert_cooldown_secs: 3.0,
        smoothing: 1.0,
        debounce_frames: 1,
    }
}

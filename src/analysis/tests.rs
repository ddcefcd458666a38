use super::*;
use crate::clock::ManualClock;
use crate::profile::{presets, InactivityPolicy, SquatThresholds};

fn squat_angles(hip: f64) -> RawAngles {
    angles(&[
        ("hip_angle", hip),
        ("knee_angle", 90.0),
        ("back_angle", 30.0),
        ("ankle_angle", 20.0),
    ])
}

fn angles(pairs: &[(&str, f64)]) -> RawAngles {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn squat_session(clock: &ManualClock) -> Session<ManualClock> {
    Session::new(
        presets::squat(&SquatThresholds::beginner()),
        clock.clone(),
        SessionOptions::default(),
    )
    .unwrap()
}

/// Feed hip angles 100ms apart and collect the records
fn feed_hips(
    session: &mut Session<ManualClock>,
    clock: &ManualClock,
    hips: &[f64],
) -> Vec<FeedbackRecord> {
    hips.iter()
        .map(|hip| {
            let record = session.process_frame(&squat_angles(*hip)).unwrap();
            clock.advance(Duration::from_millis(100));
            record
        })
        .collect()
}

#[test]
fn test_full_squat_counts_one_correct_rep() {
    let clock = ManualClock::new();
    let mut session = squat_session(&clock);

    let records = feed_hips(&mut session, &clock, &[10.0, 50.0, 80.0, 50.0, 10.0]);
    let last = records.last().unwrap();

    assert_eq!(last.correct_count, 1);
    assert_eq!(last.incorrect_count, 0);
    assert_eq!(last.rep_event, Some(RepOutcome::Correct));
    assert_eq!(last.phase, Phase::named("standing"));
    assert!(session.snapshot().history.is_empty());
    assert!(records[..4].iter().all(|r| r.rep_event.is_none()));
}

#[test]
fn test_shallow_squat_counts_incorrect() {
    let clock = ManualClock::new();
    let mut session = squat_session(&clock);

    let records = feed_hips(&mut session, &clock, &[10.0, 50.0, 10.0]);
    let last = records.last().unwrap();

    assert_eq!(last.correct_count, 0);
    assert_eq!(last.incorrect_count, 1);
    assert_eq!(last.rep_event, Some(RepOutcome::Incorrect));
}

#[test]
fn test_dead_band_frames_do_not_break_a_rep() {
    let clock = ManualClock::new();
    let mut session = squat_session(&clock);

    let records = feed_hips(
        &mut session,
        &clock,
        &[10.0, 50.0, 67.0, 80.0, 67.0, 50.0, 33.0, 10.0],
    );
    assert_eq!(records[2].phase, Phase::Unknown);
    assert_eq!(records.last().unwrap().correct_count, 1);
}

#[test]
fn test_counts_never_decrease_without_reset() {
    let clock = ManualClock::new();
    let mut session = squat_session(&clock);

    let cycle = [10.0, 50.0, 80.0, 50.0, 10.0, 50.0, 10.0];
    let mut last_total = 0;
    for _ in 0..5 {
        for record in feed_hips(&mut session, &clock, &cycle) {
            let total = record.correct_count + record.incorrect_count;
            assert!(total >= last_total);
            last_total = total;
        }
    }
    let snapshot = session.snapshot();
    assert_eq!(snapshot.correct_count, 5);
    assert_eq!(snapshot.incorrect_count, 5);
}

#[test]
fn test_history_stays_within_capacity() {
    let clock = ManualClock::new();
    let mut session = squat_session(&clock);

    for hip in [50.0, 80.0, 50.0, 80.0, 50.0, 80.0, 120.0, 50.0] {
        session.process_frame(&squat_angles(hip)).unwrap();
        clock.advance(Duration::from_millis(50));
        assert!(session.snapshot().history.len() <= rep_counter::HISTORY_CAPACITY);
    }
}

#[test]
fn test_inactivity_resets_counts_and_overrides_feedback() {
    let clock = ManualClock::new();
    let mut session = squat_session(&clock);

    feed_hips(&mut session, &clock, &[10.0, 50.0, 80.0, 50.0, 10.0, 50.0]);
    assert_eq!(session.snapshot().correct_count, 1);

    clock.advance(Duration::from_secs(16));
    // Leaning back would normally produce rule text
    let mut raw = squat_angles(10.0);
    raw.insert("back_angle".to_string(), 55.0);
    let record = session.process_frame(&raw).unwrap();

    assert_eq!(record.feedback, INACTIVITY_MESSAGE);
    assert_eq!(record.correct_count, 0);
    assert_eq!(record.incorrect_count, 0);
    assert_eq!(record.rep_event, None);
    assert!(record.alerts.is_empty());
    assert_eq!(session.state().last_alert("back_position"), None);
    assert!(session.snapshot().history.is_empty());

    // The inactivity message starts the global cooldown
    clock.advance(Duration::from_secs(1));
    let next = session.process_frame(&squat_angles(10.0)).unwrap();
    assert!(next.feedback.is_empty());
}

#[test]
fn test_gap_at_timeout_is_still_active() {
    let clock = ManualClock::new();
    let mut session = squat_session(&clock);

    feed_hips(&mut session, &clock, &[10.0, 50.0, 10.0]);
    clock.advance(Duration::from_millis(14_900));
    let record = session.process_frame(&squat_angles(10.0)).unwrap();
    assert_eq!(record.incorrect_count, 1);
    assert_ne!(record.feedback, INACTIVITY_MESSAGE);
}

#[test]
fn test_phase_stall_policy_resets_when_phase_never_changes() {
    let clock = ManualClock::new();
    let mut profile = presets::squat(&SquatThresholds::beginner());
    profile.inactivity_policy = InactivityPolicy::PhaseStall;
    profile.inactivity_timeout_secs = 5.0;
    let mut session = Session::new(profile, clock.clone(), SessionOptions::default()).unwrap();

    let mut feedback = Vec::new();
    for _ in 0..=6 {
        feedback.push(session.process_frame(&squat_angles(10.0)).unwrap().feedback);
        clock.advance(Duration::from_secs(1));
    }
    assert_eq!(feedback[6], INACTIVITY_MESSAGE);
    assert!(feedback[..6].iter().all(|f| f != INACTIVITY_MESSAGE));
}

#[test]
fn test_alert_gate_fires_once_within_cooldown() {
    let clock = ManualClock::new();
    let mut session = squat_session(&clock);

    let mut raw = squat_angles(10.0);
    raw.insert("back_angle".to_string(), 55.0);

    let first = session.process_frame(&raw).unwrap();
    clock.advance(Duration::from_millis(500));
    let second = session.process_frame(&raw).unwrap();
    clock.advance(Duration::from_millis(2_100));
    let third = session.process_frame(&raw).unwrap();

    assert_eq!(first.alerts, vec!["Bend backwards".to_string()]);
    assert!(second.alerts.is_empty());
    assert_eq!(third.alerts, vec!["Bend backwards".to_string()]);
}

#[test]
fn test_correct_features_do_not_touch_alert_clock() {
    let clock = ManualClock::new();
    let mut session = squat_session(&clock);

    session.process_frame(&squat_angles(10.0)).unwrap();
    assert_eq!(session.state().last_alert("back_position"), None);

    clock.advance(Duration::from_secs(1));
    let mut raw = squat_angles(10.0);
    raw.insert("back_angle".to_string(), 55.0);
    let record = session.process_frame(&raw).unwrap();
    assert_eq!(record.alerts.len(), 1);
    assert_eq!(
        session.state().last_alert("back_position"),
        Some(Duration::from_secs(1))
    );
}

#[test]
fn test_global_gate_suppresses_text_but_not_progress() {
    let clock = ManualClock::new();
    let mut session = squat_session(&clock);

    let records = feed_hips(&mut session, &clock, &[10.0, 50.0, 80.0]);
    assert_eq!(records[0].feedback, feedback::MAINTAIN_FORM);
    assert!(records[1].feedback.is_empty());
    assert!(records[2].feedback.is_empty());
    assert!(records[2].progress_percent > records[1].progress_percent);
    assert!(!records[2].debug_summary.is_empty());

    clock.set(Duration::from_secs(3));
    let later = session.process_frame(&squat_angles(80.0)).unwrap();
    assert_eq!(later.feedback, feedback::MAINTAIN_FORM);
}

#[test]
fn test_progress_clamps_outside_operating_range() {
    let clock = ManualClock::new();
    let mut session = squat_session(&clock);

    let low = session.process_frame(&squat_angles(-15.0)).unwrap();
    let high = session.process_frame(&squat_angles(130.0)).unwrap();

    assert_eq!(low.progress_percent, 0.0);
    assert_eq!(low.progress_bar_extent, 650.0);
    assert_eq!(high.progress_percent, 100.0);
    assert_eq!(high.progress_bar_extent, 100.0);
}

#[test]
fn test_invalid_frame_leaves_state_untouched() {
    let clock = ManualClock::new();
    let mut session = squat_session(&clock);
    feed_hips(&mut session, &clock, &[10.0, 50.0, 80.0]);

    let before = session.state().clone();
    let missing_knee = angles(&[("hip_angle", 50.0), ("back_angle", 30.0)]);
    let err = session.process_frame(&missing_knee).unwrap_err();

    assert_eq!(
        err,
        ValidationError::MissingAngle {
            angle: "knee_angle".to_string()
        }
    );
    assert_eq!(session.state(), &before);

    let mut nan_hip = squat_angles(50.0);
    nan_hip.insert("hip_angle".to_string(), f64::NAN);
    assert!(session.process_frame(&nan_hip).is_err());
    assert_eq!(session.state(), &before);
}

#[test]
fn test_replay_is_deterministic() {
    let frames: Vec<(u64, f64, f64)> = vec![
        (0, 10.0, 30.0),
        (100, 50.0, 55.0),
        (200, 80.0, 5.0),
        (300, 50.0, 30.0),
        (400, 10.0, 30.0),
        (3_500, 50.0, 55.0),
        (3_600, 10.0, 30.0),
    ];

    let run = || {
        let mut session = squat_session(&ManualClock::new());
        frames
            .iter()
            .map(|(ms, hip, back)| {
                let mut raw = squat_angles(*hip);
                raw.insert("back_angle".to_string(), *back);
                let record = session
                    .process_frame_at(&raw, Duration::from_millis(*ms))
                    .unwrap();
                serde_json::to_string(&record).unwrap()
            })
            .collect::<Vec<_>>()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_sessions_are_isolated() {
    let clock = ManualClock::new();
    let mut first = squat_session(&clock);
    let mut second = squat_session(&clock);

    feed_hips(&mut first, &clock, &[10.0, 50.0, 80.0, 50.0, 10.0]);
    let record = second.process_frame(&squat_angles(10.0)).unwrap();

    assert_eq!(first.snapshot().correct_count, 1);
    assert_eq!(record.correct_count, 0);
    assert_eq!(record.feedback, feedback::MAINTAIN_FORM);
}

#[test]
fn test_push_up_rep_with_contains_predicate() {
    let clock = ManualClock::new();
    let mut session =
        Session::new(presets::push_up(), clock.clone(), SessionOptions::default()).unwrap();

    let mut last = None;
    for elbow in [170.0, 120.0, 80.0, 120.0, 170.0] {
        let raw = angles(&[("elbow_angle", elbow), ("hip_angle", 165.0)]);
        last = Some(session.process_frame(&raw).unwrap());
        clock.advance(Duration::from_millis(100));
    }
    let last = last.unwrap();
    assert_eq!(last.correct_count, 1);
    assert_eq!(last.phase, Phase::named("up"));
}

#[test]
fn test_plank_never_counts_reps() {
    let clock = ManualClock::new();
    let mut session =
        Session::new(presets::plank(), clock.clone(), SessionOptions::default()).unwrap();

    for hip in [165.0, 150.0, 175.0, 165.0] {
        let raw = angles(&[("hip_angle", hip), ("shoulder_angle", 90.0)]);
        let record = session.process_frame(&raw).unwrap();
        assert_eq!(record.correct_count + record.incorrect_count, 0);
        assert_eq!(record.rep_event, None);
        clock.advance(Duration::from_millis(100));
    }
}

#[test]
fn test_strict_mode_requires_rule_angles() {
    let clock = ManualClock::new();
    let options = SessionOptions {
        ingest_mode: IngestMode::Strict,
        ..SessionOptions::default()
    };
    let mut session = Session::new(
        presets::squat(&SquatThresholds::beginner()),
        clock.clone(),
        options,
    )
    .unwrap();

    let no_ankle = angles(&[
        ("hip_angle", 10.0),
        ("knee_angle", 90.0),
        ("back_angle", 30.0),
    ]);
    assert_eq!(
        session.process_frame(&no_ankle),
        Err(ValidationError::MissingAngle {
            angle: "ankle_angle".to_string()
        })
    );
    let mut complete = squat_angles(10.0);
    complete.insert("shoulder_alignment".to_string(), 5.0);
    assert!(session.process_frame(&complete).is_ok());
}

#[test]
fn test_tilted_shoulder_line_raises_camera_alert() {
    let clock = ManualClock::new();
    let mut session = squat_session(&clock);

    let mut tilted = squat_angles(10.0);
    tilted.insert("shoulder_alignment".to_string(), 50.0);
    let record = session.process_frame(&tilted).unwrap();
    assert_eq!(
        record.alerts,
        vec!["Camera not aligned, turn side-on".to_string()]
    );
    assert_eq!(record.feedback, "Camera not aligned, turn side-on");

    clock.advance(Duration::from_secs(5));
    let mut level = squat_angles(10.0);
    level.insert("shoulder_alignment".to_string(), 35.0);
    let record = session.process_frame(&level).unwrap();
    assert!(record.alerts.is_empty());
    assert_eq!(record.feedback, feedback::MAINTAIN_FORM);
}

#[test]
fn test_debounce_holds_back_single_noisy_frame() {
    let clock = ManualClock::new();
    let mut profile = presets::squat(&SquatThresholds::beginner());
    profile.debounce_frames = 2;
    let mut session = Session::new(profile, clock.clone(), SessionOptions::default()).unwrap();

    let records = feed_hips(&mut session, &clock, &[10.0, 10.0, 50.0, 10.0, 10.0]);
    assert!(records.iter().skip(1).all(|r| r.phase.is("standing")));
    assert!(records.iter().all(|r| r.rep_event.is_none()));
}

#[test]
fn test_switch_exercise_resets_state() {
    let clock = ManualClock::new();
    let mut session = squat_session(&clock);
    feed_hips(&mut session, &clock, &[10.0, 50.0, 80.0, 50.0, 10.0]);

    session.switch_exercise(presets::push_up()).unwrap();
    let snapshot = session.snapshot();
    assert_eq!(snapshot.exercise, "push_up");
    assert_eq!(snapshot.correct_count, 0);
    assert_eq!(snapshot.phase, Phase::Unknown);

    // Squat frames no longer satisfy the push-up requirements
    assert!(session.process_frame(&squat_angles(10.0)).is_err());
}

#[test]
fn test_switch_to_invalid_profile_keeps_current_exercise() {
    let clock = ManualClock::new();
    let mut session = squat_session(&clock);
    feed_hips(&mut session, &clock, &[10.0, 50.0, 80.0, 50.0, 10.0]);

    let mut broken = presets::plank();
    broken.phases.clear();
    assert!(session.switch_exercise(broken).is_err());
    assert_eq!(session.snapshot().exercise, "squat");
    assert_eq!(session.snapshot().correct_count, 1);
}

#[test]
fn test_invalid_profile_rejected_at_session_start() {
    let mut profile = presets::squat(&SquatThresholds::beginner());
    profile.phases[2].min = 60.0;
    assert!(matches!(
        Session::new(profile, ManualClock::new(), SessionOptions::default()),
        Err(ConfigurationError::OverlappingRanges { .. })
    ));
}

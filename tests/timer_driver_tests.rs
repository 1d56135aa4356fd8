use chrono::NaiveDate;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;

use intervalrs::config::SessionSettings;
use intervalrs::ticker::{drive, DriveOutcome, ManualTicks, TimerCommand};
use intervalrs::error::{IntervalError, ValidationError};
use intervalrs::{
    DayType, IntervalPlanner, MemoryStore, MetricsSettings, Modality, ResultEntry, ScoreUnits,
    TimerEvent, TrainingSession, WorkoutDefinition,
};

const TOWERS_JSON: &str = r#"{
    "id": "towers-12",
    "day_number": 12,
    "day_type": "towers",
    "blocks": [
        { "workDuration": 20, "restDuration": 10, "paceRange": ["0.9", "1.0"] },
        null,
        null,
        null
    ],
    "description": "Towers"
}"#;

fn towers_session() -> TrainingSession<MemoryStore> {
    let workout: WorkoutDefinition = serde_json::from_str(TOWERS_JSON).unwrap();
    let mut store = MemoryStore::new(MetricsSettings::default());
    store.insert_workout(workout);

    let mut s = TrainingSession::new(store, IntervalPlanner::default(), SessionSettings::default(), true);
    s.load_workout(12).unwrap();
    s.select_modality(Modality::from("echo_bike")).unwrap();
    s.record_time_trial(
        &Modality::from("echo_bike"),
        "250",
        ScoreUnits::Cal,
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
    )
    .unwrap();
    s
}

#[test]
fn test_workout_json_plans_towers() {
    let s = towers_session();
    let durations: Vec<u32> = s.intervals().iter().map(|i| i.duration).collect();
    assert_eq!(durations, vec![10, 20, 30, 40, 50]);
    assert!(s.intervals().iter().all(|i| i.rest_duration == 10));
    assert_eq!(s.intervals()[4].description, "Towers - Tower 5");

    // 25 per minute at a 0.95 midpoint
    let target = s.intervals()[0].target_pace.as_ref().unwrap();
    assert_eq!(target.pace, dec!(23.75));
    assert_eq!(target.intensity_percent, 95);
    assert_eq!(DayType::from_tag("towers"), DayType::Towers);
}

#[test]
fn test_inverted_range_is_rejected_before_planning() {
    let json = TOWERS_JSON
        .replace(r#""towers""#, r#""infinity""#)
        .replace(r#"["0.9", "1.0"]"#, r#"["1.0", "0.8"]"#);
    let workout: WorkoutDefinition = serde_json::from_str(&json).unwrap();
    assert_eq!(workout.day_type, DayType::Infinity);
    assert!(matches!(
        workout.validate(),
        Err(ValidationError::InvalidDefinition { .. })
    ));

    let mut store = MemoryStore::new(MetricsSettings::default());
    store.insert_workout(workout);
    let mut s = TrainingSession::new(store, IntervalPlanner::default(), SessionSettings::default(), true);
    let err = s.load_workout(12).unwrap_err();
    assert!(matches!(
        err,
        IntervalError::Validation(ValidationError::InvalidDefinition { .. })
    ));
    assert!(s.intervals().is_empty());
    assert!(s.workout().is_none());
}

#[tokio::test]
async fn test_driver_runs_session_with_queued_controls() {
    let mut s = towers_session();
    s.start().unwrap();

    let (cmd_tx, mut cmd_rx) = mpsc::channel(8);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    cmd_tx.send(TimerCommand::Pause).await.unwrap();
    cmd_tx.send(TimerCommand::Resume).await.unwrap();
    cmd_tx
        .send(TimerCommand::RecordOutput {
            index: 0,
            amount: dec!(4),
        })
        .await
        .unwrap();

    let outcome = {
        let timer = s.timer_mut().unwrap();
        drive(timer, &mut ManualTicks::new(u64::MAX), &mut cmd_rx, &event_tx).await
    };
    assert_eq!(outcome, DriveOutcome::Completed);
    drop(event_tx);

    let mut events = Vec::new();
    while let Some(event) = event_rx.recv().await {
        events.push(event);
    }
    assert!(matches!(events[0], TimerEvent::Paused { remaining: 10 }));
    assert!(matches!(events[1], TimerEvent::Resumed { remaining: 10 }));
    assert!(matches!(
        events.last(),
        Some(TimerEvent::SessionCompleted {
            intervals_completed: 5,
            skipped: false
        })
    ));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, TimerEvent::IntervalCompleted { .. }))
            .count(),
        4
    );
    assert_eq!(s.intervals()[0].actual_output, dec!(4));

    let outcome = s.submit(&ResultEntry::new("60")).unwrap();
    assert!(outcome.persisted);
    assert_eq!(outcome.result.intervals_completed, 5);
    drop(cmd_tx);
}

#[tokio::test]
async fn test_driver_reports_rejected_commands() {
    let mut s = towers_session();
    s.start().unwrap();

    let (cmd_tx, mut cmd_rx) = mpsc::channel(8);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    cmd_tx.send(TimerCommand::Resume).await.unwrap();
    cmd_tx.send(TimerCommand::SkipToEnd).await.unwrap();

    let outcome = drive(
        s.timer_mut().unwrap(),
        &mut ManualTicks::new(0),
        &mut cmd_rx,
        &event_tx,
    )
    .await;
    assert_eq!(outcome, DriveOutcome::Completed);

    let first = event_rx.recv().await.unwrap();
    assert!(matches!(first, TimerEvent::CommandRejected { ref command, .. } if command == "resume"));
    let second = event_rx.recv().await.unwrap();
    assert!(matches!(second, TimerEvent::SessionCompleted { skipped: true, .. }));
}

#[tokio::test]
async fn test_driver_stops_when_commands_close() {
    let mut s = towers_session();
    s.start().unwrap();

    let (cmd_tx, mut cmd_rx) = mpsc::channel::<TimerCommand>(1);
    let (event_tx, _event_rx) = mpsc::unbounded_channel();
    drop(cmd_tx);

    let outcome = drive(
        s.timer_mut().unwrap(),
        &mut ManualTicks::new(3),
        &mut cmd_rx,
        &event_tx,
    )
    .await;
    assert_eq!(outcome, DriveOutcome::CommandsClosed);
    assert!(s.timer().unwrap().state().is_running());
}

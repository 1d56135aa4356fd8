//! Session timer: the work/rest countdown state machine.
//!
//! The timer has no clock of its own. The caller (see [`crate::ticker`])
//! calls [`SessionTimer::tick`] once per second while running; every other
//! transition goes through the command methods.
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |          |
//!            v          v
//!          Completed <--+      (reset() returns any state to Idle)
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{IntervalError, Result, ValidationError};
use crate::models::{Baseline, DayType, Interval, Modality, Phase, PerformanceMetrics};
use crate::pacing;

/// Position within the interval list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub phase: Phase,
    pub index: usize,
    /// Seconds left in the current phase
    pub remaining: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TimerState {
    Idle,
    Running(Cursor),
    /// Frozen copy of the running cursor
    Paused(Cursor),
    Completed,
}

impl TimerState {
    pub fn name(&self) -> &'static str {
        match self {
            TimerState::Idle => "idle",
            TimerState::Running(_) => "running",
            TimerState::Paused(_) => "paused",
            TimerState::Completed => "completed",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, TimerState::Running(_))
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TimerState::Completed)
    }
}

/// Notifications produced by timer transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEvent {
    Started {
        interval_id: u32,
        duration: u32,
    },
    Tick {
        phase: Phase,
        index: usize,
        remaining: u32,
    },
    /// Work phase done, rest phase begins
    WorkCompleted {
        interval_id: u32,
        rest_duration: u32,
    },
    IntervalCompleted {
        interval_id: u32,
        next_index: Option<usize>,
    },
    Paused {
        remaining: u32,
    },
    Resumed {
        remaining: u32,
    },
    /// All intervals done, by countdown or by skipping to the end
    SessionCompleted {
        intervals_completed: u32,
        skipped: bool,
    },
    Reset,
    /// A queued command the timer refused
    CommandRejected {
        command: String,
        message: String,
    },
}

/// Point-in-time view for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub state: String,
    pub phase: Phase,
    pub index: usize,
    pub remaining: u32,
    pub intervals_completed: u32,
    pub total_intervals: u32,
}

/// Countdown over a planned interval list.
///
/// Owns the intervals for the life of the session; completion flags and
/// recorded output only change through this type.
#[derive(Debug, Clone)]
pub struct SessionTimer {
    intervals: Vec<Interval>,
    day_type: DayType,
    state: TimerState,
}

impl SessionTimer {
    pub fn new(intervals: Vec<Interval>, day_type: DayType) -> Self {
        Self {
            intervals,
            day_type,
            state: TimerState::Idle,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn day_type(&self) -> &DayType {
        &self.day_type
    }

    /// Cursor for the current state; Idle sits at the start of the first
    /// interval and Completed one past the last.
    pub fn cursor(&self) -> Cursor {
        match self.state {
            TimerState::Running(cursor) | TimerState::Paused(cursor) => cursor,
            TimerState::Idle => self.initial_cursor(),
            TimerState::Completed => Cursor {
                phase: Phase::Work,
                index: self.intervals.len(),
                remaining: 0,
            },
        }
    }

    pub fn current_interval(&self) -> Option<&Interval> {
        self.intervals.get(self.cursor().index)
    }

    pub fn intervals_completed(&self) -> u32 {
        self.intervals.iter().filter(|i| i.completed).count() as u32
    }

    pub fn total_intervals(&self) -> u32 {
        self.intervals.len() as u32
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let cursor = self.cursor();
        TimerSnapshot {
            state: self.state.name().to_string(),
            phase: cursor.phase,
            index: cursor.index,
            remaining: cursor.remaining,
            intervals_completed: self.intervals_completed(),
            total_intervals: self.total_intervals(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin the countdown. Needs a selected modality with a baseline on
    /// record for it.
    pub fn start(
        &mut self,
        modality: Option<&Modality>,
        baseline: Option<&Baseline>,
    ) -> Result<TimerEvent> {
        if self.state != TimerState::Idle {
            return Err(self.invalid("start"));
        }

        let modality = modality.ok_or_else(|| {
            warn!("Start refused: no modality selected");
            IntervalError::precondition("start", "Please select a modality before starting")
        })?;

        if !baseline.is_some_and(|b| &b.modality == modality) {
            warn!(modality = %modality, "Start refused: no baseline");
            return Err(IntervalError::precondition(
                "start",
                format!(
                    "No baseline found for {}. Please complete a time trial first.",
                    modality
                ),
            ));
        }

        let first = self.intervals.first().ok_or_else(|| {
            IntervalError::precondition("start", "The workout has no intervals to run")
        })?;
        let event = TimerEvent::Started {
            interval_id: first.id,
            duration: first.duration,
        };

        self.state = TimerState::Running(self.initial_cursor());
        info!(
            modality = %modality,
            intervals = self.intervals.len(),
            "Session timer started"
        );
        Ok(event)
    }

    /// Advance one second. Only a running timer reacts; otherwise `None`.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        let TimerState::Running(cursor) = self.state else {
            return None;
        };

        if cursor.remaining > 1 {
            let next = Cursor {
                remaining: cursor.remaining - 1,
                ..cursor
            };
            self.state = TimerState::Running(next);
            return Some(TimerEvent::Tick {
                phase: next.phase,
                index: next.index,
                remaining: next.remaining,
            });
        }

        Some(self.complete_phase(cursor))
    }

    pub fn pause(&mut self) -> Result<TimerEvent> {
        match self.state {
            TimerState::Running(cursor) => {
                self.state = TimerState::Paused(cursor);
                info!(index = cursor.index, remaining = cursor.remaining, "Session timer paused");
                Ok(TimerEvent::Paused {
                    remaining: cursor.remaining,
                })
            }
            _ => Err(self.invalid("pause")),
        }
    }

    pub fn resume(&mut self) -> Result<TimerEvent> {
        match self.state {
            TimerState::Paused(cursor) => {
                self.state = TimerState::Running(cursor);
                info!(index = cursor.index, remaining = cursor.remaining, "Session timer resumed");
                Ok(TimerEvent::Resumed {
                    remaining: cursor.remaining,
                })
            }
            _ => Err(self.invalid("resume")),
        }
    }

    /// Mark every interval done and finish, from running or paused
    pub fn skip_to_end(&mut self) -> Result<TimerEvent> {
        match self.state {
            TimerState::Running(_) | TimerState::Paused(_) => {
                for interval in &mut self.intervals {
                    interval.work_completed = true;
                    interval.completed = true;
                }
                self.state = TimerState::Completed;
                info!(intervals = self.intervals.len(), "Session skipped to end");
                Ok(TimerEvent::SessionCompleted {
                    intervals_completed: self.intervals_completed(),
                    skipped: true,
                })
            }
            _ => Err(self.invalid("skip to end")),
        }
    }

    /// Alias of [`SessionTimer::skip_to_end`]
    pub fn complete(&mut self) -> Result<TimerEvent> {
        self.skip_to_end()
    }

    /// Back to Idle from any state, clearing progress and recorded output
    pub fn reset(&mut self) -> TimerEvent {
        for interval in &mut self.intervals {
            interval.work_completed = false;
            interval.completed = false;
            interval.actual_output = Decimal::ZERO;
        }
        self.state = TimerState::Idle;
        info!("Session timer reset");
        TimerEvent::Reset
    }

    /// Record output against one interval while the session is live
    pub fn record_output(&mut self, index: usize, amount: Decimal) -> Result<()> {
        if !matches!(self.state, TimerState::Running(_) | TimerState::Paused(_)) {
            return Err(self.invalid("record output"));
        }
        if amount < Decimal::ZERO {
            return Err(ValidationError::Negative {
                field: "actual_output".to_string(),
                value: amount.to_string(),
            }
            .into());
        }

        let interval = self
            .intervals
            .get_mut(index)
            .ok_or_else(|| IntervalError::not_found("interval", index))?;
        interval.actual_output = interval.actual_output.checked_add(amount).ok_or_else(|| {
            ValidationError::OutOfRange {
                field: "actual_output".to_string(),
                value: amount.to_string(),
                min: "0".to_string(),
                max: Decimal::MAX.to_string(),
            }
        })?;
        Ok(())
    }

    /// Recompute targets after the baseline or metrics changed
    pub fn retarget(&mut self, baseline: Option<&Baseline>, metrics: Option<&PerformanceMetrics>) {
        pacing::apply_targets(&mut self.intervals, baseline, metrics, &self.day_type);
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn initial_cursor(&self) -> Cursor {
        Cursor {
            phase: Phase::Work,
            index: 0,
            remaining: self.intervals.first().map_or(0, |i| i.duration),
        }
    }

    fn complete_phase(&mut self, cursor: Cursor) -> TimerEvent {
        let index = cursor.index;
        let Some(interval) = self.intervals.get_mut(index) else {
            self.state = TimerState::Completed;
            return TimerEvent::SessionCompleted {
                intervals_completed: self.intervals_completed(),
                skipped: false,
            };
        };

        if cursor.phase == Phase::Work && interval.rest_duration > 0 {
            interval.work_completed = true;
            self.state = TimerState::Running(Cursor {
                phase: Phase::Rest,
                index,
                remaining: interval.rest_duration,
            });
            debug!(interval_id = interval.id, rest = interval.rest_duration, "Work phase completed");
            return TimerEvent::WorkCompleted {
                interval_id: interval.id,
                rest_duration: interval.rest_duration,
            };
        }

        interval.work_completed = true;
        interval.completed = true;
        let interval_id = interval.id;

        match self.intervals.get(index + 1) {
            Some(next) => {
                self.state = TimerState::Running(Cursor {
                    phase: Phase::Work,
                    index: index + 1,
                    remaining: next.duration,
                });
                debug!(interval_id, next = next.id, "Interval completed");
                TimerEvent::IntervalCompleted {
                    interval_id,
                    next_index: Some(index + 1),
                }
            }
            None => {
                self.state = TimerState::Completed;
                info!(intervals = self.intervals.len(), "Session completed");
                TimerEvent::SessionCompleted {
                    intervals_completed: self.intervals_completed(),
                    skipped: false,
                }
            }
        }
    }

    fn invalid(&self, action: &str) -> IntervalError {
        IntervalError::InvalidTransition {
            action: action.to_string(),
            state: self.state.name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoreUnits;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn interval(id: u32, duration: u32, rest: u32) -> Interval {
        Interval {
            id,
            day_type: DayType::Interval,
            description: format!("Interval - Round {}", id),
            duration,
            rest_duration: rest,
            block_number: Some(1),
            round_number: Some(id),
            pace_range: None,
            pace_progression: None,
            is_max_effort: false,
            target_pace: None,
            actual_output: Decimal::ZERO,
            work_completed: false,
            completed: false,
        }
    }

    fn row() -> Modality {
        Modality::from("c2_row_erg")
    }

    fn baseline() -> Baseline {
        Baseline {
            user_id: "u1".to_string(),
            modality: row(),
            rate: dec!(40),
            units: ScoreUnits::Cal,
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        }
    }

    fn started(intervals: Vec<Interval>) -> SessionTimer {
        let mut timer = SessionTimer::new(intervals, DayType::Interval);
        timer.start(Some(&row()), Some(&baseline())).unwrap();
        timer
    }

    fn run_to_end(timer: &mut SessionTimer) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        while timer.state().is_running() {
            events.extend(timer.tick());
        }
        events
    }

    #[test]
    fn test_idle_cursor_points_at_first_interval() {
        let timer = SessionTimer::new(vec![interval(1, 45, 15)], DayType::Interval);
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(
            timer.cursor(),
            Cursor { phase: Phase::Work, index: 0, remaining: 45 }
        );
    }

    #[test]
    fn test_start_preconditions_leave_state_unchanged() {
        let mut timer = SessionTimer::new(vec![interval(1, 10, 0)], DayType::Interval);

        let err = timer.start(None, Some(&baseline())).unwrap_err();
        assert!(matches!(err, IntervalError::Precondition { .. }));
        assert_eq!(timer.state(), TimerState::Idle);

        let err = timer.start(Some(&row()), None).unwrap_err();
        assert!(err.user_message().contains("time trial"));

        let bike = Modality::from("echo_bike");
        assert!(timer.start(Some(&bike), Some(&baseline())).is_err());
        assert_eq!(timer.state(), TimerState::Idle);

        let mut empty = SessionTimer::new(Vec::new(), DayType::Interval);
        assert!(empty.start(Some(&row()), Some(&baseline())).is_err());
    }

    #[test]
    fn test_phases_run_in_order() {
        let mut timer = started(vec![interval(1, 2, 1), interval(2, 1, 0)]);

        assert_eq!(
            timer.tick(),
            Some(TimerEvent::Tick { phase: Phase::Work, index: 0, remaining: 1 })
        );
        assert_eq!(
            timer.tick(),
            Some(TimerEvent::WorkCompleted { interval_id: 1, rest_duration: 1 })
        );
        assert!(timer.intervals()[0].work_completed);
        assert!(!timer.intervals()[0].completed);

        assert_eq!(
            timer.tick(),
            Some(TimerEvent::IntervalCompleted { interval_id: 1, next_index: Some(1) })
        );
        assert_eq!(timer.cursor().remaining, 1);

        assert_eq!(
            timer.tick(),
            Some(TimerEvent::SessionCompleted { intervals_completed: 2, skipped: false })
        );
        assert!(timer.state().is_completed());
        assert_eq!(timer.tick(), None);
    }

    #[test]
    fn test_total_ticks_equal_total_seconds() {
        let intervals = vec![interval(1, 5, 3), interval(2, 4, 0), interval(3, 2, 2)];
        let total: u32 = intervals.iter().map(|i| i.total_seconds()).sum();
        let mut timer = started(intervals);
        assert_eq!(run_to_end(&mut timer).len() as u32, total);
        assert_eq!(timer.intervals_completed(), 3);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut timer = started(vec![interval(1, 10, 0)]);
        timer.tick();
        timer.tick();

        assert_eq!(timer.pause().unwrap(), TimerEvent::Paused { remaining: 8 });
        assert_eq!(timer.tick(), None);
        assert!(timer.pause().is_err());
        assert_eq!(timer.resume().unwrap(), TimerEvent::Resumed { remaining: 8 });
        assert!(timer.resume().is_err());
    }

    #[test]
    fn test_completed_only_accepts_reset() {
        let mut timer = started(vec![interval(1, 1, 0)]);
        timer.tick();
        assert!(timer.state().is_completed());

        assert!(matches!(
            timer.start(Some(&row()), Some(&baseline())),
            Err(IntervalError::InvalidTransition { .. })
        ));
        assert!(timer.pause().is_err());
        assert!(timer.resume().is_err());
        assert!(timer.skip_to_end().is_err());

        assert_eq!(timer.reset(), TimerEvent::Reset);
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.intervals_completed(), 0);
    }

    #[test]
    fn test_skip_to_end_from_paused() {
        let mut timer = started(vec![interval(1, 30, 10), interval(2, 30, 10)]);
        timer.tick();
        timer.pause().unwrap();
        let event = timer.complete().unwrap();

        assert_eq!(event, TimerEvent::SessionCompleted { intervals_completed: 2, skipped: true });
        assert!(timer.intervals().iter().all(|i| i.work_completed && i.completed));
    }

    #[test]
    fn test_record_output_and_reset_clears_it() {
        let mut timer = SessionTimer::new(vec![interval(1, 30, 0)], DayType::Interval);
        assert!(timer.record_output(0, dec!(5)).is_err());

        timer.start(Some(&row()), Some(&baseline())).unwrap();
        timer.record_output(0, dec!(5)).unwrap();
        timer.record_output(0, dec!(2.5)).unwrap();
        assert_eq!(timer.intervals()[0].actual_output, dec!(7.5));
        assert!(timer.record_output(0, dec!(-1)).is_err());
        assert!(timer.record_output(4, dec!(1)).unwrap_err().is_not_found());

        timer.record_output(0, Decimal::MAX).unwrap_err();
        assert_eq!(timer.intervals()[0].actual_output, dec!(7.5));

        timer.reset();
        assert_eq!(timer.intervals()[0].actual_output, Decimal::ZERO);
        assert_eq!(timer.cursor().remaining, 30);
    }

    fn arb_intervals() -> impl Strategy<Value = Vec<Interval>> {
        prop::collection::vec((1u32..20, 0u32..10), 1..6).prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (work, rest))| interval(i as u32 + 1, work, rest))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn test_pause_resume_continues_exactly(intervals in arb_intervals(), at in 0usize..200) {
            let mut reference = started(intervals.clone());
            let expected = run_to_end(&mut reference);

            let mut timer = started(intervals);
            let mut events = Vec::new();
            for _ in 0..at {
                if !timer.state().is_running() {
                    break;
                }
                events.extend(timer.tick());
            }
            if timer.state().is_running() {
                let before = timer.cursor();
                timer.pause().unwrap();
                prop_assert_eq!(timer.tick(), None);
                timer.resume().unwrap();
                prop_assert_eq!(timer.cursor(), before);
            }
            events.extend(run_to_end(&mut timer));

            prop_assert_eq!(events, expected);
            prop_assert_eq!(timer.intervals(), reference.intervals());
        }

        #[test]
        fn test_skip_to_end_is_phase_independent(intervals in arb_intervals(), at in 0usize..100) {
            let mut immediate = started(intervals.clone());
            immediate.skip_to_end().unwrap();

            let mut timer = started(intervals);
            for _ in 0..at {
                timer.tick();
            }
            if !timer.state().is_completed() {
                timer.skip_to_end().unwrap();
            }

            prop_assert!(timer.state().is_completed());
            prop_assert_eq!(timer.intervals(), immediate.intervals());
        }
    }
}

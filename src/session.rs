//! Training session orchestration.
//!
//! [`TrainingSession`] wires the planner, pace calculator, timer and
//! aggregator to a [`DataStore`]: load a day, pick a modality, run the timer,
//! submit the result.

use chrono::{NaiveDate, Utc};
use tracing::{error, info, warn};

use crate::aggregator::{self, ResultEntry, SessionContext};
use crate::config::{AppConfig, SessionSettings};
use crate::demo;
use crate::error::{IntervalError, Result, StorageError};
use crate::models::{
    Baseline, Interval, Modality, PerformanceMetrics, ProgramVersion, ScoreUnits, SessionResult,
    WorkoutDefinition,
};
use crate::planner::IntervalPlanner;
use crate::store::DataStore;
use crate::time_trial;
use crate::timer::{SessionTimer, TimerEvent, TimerState};

/// What [`TrainingSession::submit`] produced
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub result: SessionResult,
    /// Statistics after the update, when one was stored
    pub metrics: Option<PerformanceMetrics>,
    /// False when the store was offline and nothing was written
    pub persisted: bool,
}

/// One user's session against a store
pub struct TrainingSession<S: DataStore> {
    store: S,
    planner: IntervalPlanner,
    settings: SessionSettings,
    demo_when_offline: bool,
    workout: Option<WorkoutDefinition>,
    timer: Option<SessionTimer>,
    modality: Option<Modality>,
    baseline: Option<Baseline>,
    metrics: Option<PerformanceMetrics>,
    demo: bool,
}

impl<S: DataStore> TrainingSession<S> {
    pub fn new(
        store: S,
        planner: IntervalPlanner,
        settings: SessionSettings,
        demo_when_offline: bool,
    ) -> Self {
        Self {
            store,
            planner,
            settings,
            demo_when_offline,
            workout: None,
            timer: None,
            modality: None,
            baseline: None,
            metrics: None,
            demo: false,
        }
    }

    pub fn from_config(store: S, config: &AppConfig) -> Self {
        Self::new(
            store,
            IntervalPlanner::new(config.planner.clone()),
            config.session.clone(),
            config.storage.demo_when_offline,
        )
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn workout(&self) -> Option<&WorkoutDefinition> {
        self.workout.as_ref()
    }

    pub fn modality(&self) -> Option<&Modality> {
        self.modality.as_ref()
    }

    pub fn baseline(&self) -> Option<&Baseline> {
        self.baseline.as_ref()
    }

    pub fn metrics(&self) -> Option<&PerformanceMetrics> {
        self.metrics.as_ref()
    }

    /// True when the loaded workout and baselines are demo stand-ins
    pub fn is_demo(&self) -> bool {
        self.demo
    }

    pub fn intervals(&self) -> &[Interval] {
        match &self.timer {
            Some(timer) => timer.intervals(),
            None => &[],
        }
    }

    pub fn timer(&self) -> Option<&SessionTimer> {
        self.timer.as_ref()
    }

    /// For handing the timer to [`crate::ticker::drive`]
    pub fn timer_mut(&mut self) -> Option<&mut SessionTimer> {
        self.timer.as_mut()
    }

    /// Fetch and plan a program day.
    ///
    /// A missing workout is an error while connected; the demo workout is
    /// only used when the store is unreachable and demo mode is enabled.
    /// Definitions failing [`WorkoutDefinition::validate`] are rejected
    /// before planning and leave the current session untouched.
    pub fn load_workout(&mut self, day_number: u32) -> Result<&[Interval]> {
        let workout = if self.store.is_connected() {
            self.demo = false;
            self.store.fetch_workout_definition(day_number)?
        } else if self.demo_when_offline {
            warn!(day = day_number, "Store offline, using demo workout");
            self.demo = true;
            demo::demo_workout(day_number)
        } else {
            return Err(StorageError::Unavailable.into());
        };

        if let Err(e) = workout.validate() {
            warn!(day = day_number, error = %e, "Rejecting workout definition");
            return Err(e.into());
        }

        let intervals = self.planner.plan(&workout);
        info!(
            day = day_number,
            day_type = %workout.day_type,
            intervals = intervals.len(),
            "Workout loaded"
        );

        self.timer = Some(SessionTimer::new(intervals, workout.day_type.clone()));
        self.workout = Some(workout);
        self.metrics = None;

        if self.modality.is_some() {
            self.load_pacing_inputs()?;
        }
        Ok(self.intervals())
    }

    /// Choose the modality, loading its baseline and metrics and recomputing
    /// every target. Not allowed mid-session.
    pub fn select_modality(&mut self, modality: Modality) -> Result<Option<&Baseline>> {
        if let Some(timer) = &self.timer {
            if matches!(
                timer.state(),
                TimerState::Running(_) | TimerState::Paused(_)
            ) {
                return Err(IntervalError::precondition(
                    "change modality",
                    "Reset the session before switching modality",
                ));
            }
        }

        self.modality = Some(modality);
        self.load_pacing_inputs()?;
        Ok(self.baseline.as_ref())
    }

    fn load_pacing_inputs(&mut self) -> Result<()> {
        let Some(modality) = self.modality.clone() else {
            return Ok(());
        };
        let user_id = self.settings.user_id.clone();

        if self.store.is_connected() {
            self.baseline = match self.store.fetch_baseline(&user_id, &modality) {
                Ok(baseline) => Some(baseline),
                Err(e) if e.is_not_found() => {
                    warn!(modality = %modality, "No baseline on record");
                    None
                }
                Err(e) => return Err(e),
            };
            self.metrics = match &self.workout {
                Some(workout) => {
                    self.store
                        .fetch_performance_metrics(&user_id, &workout.day_type, &modality)?
                }
                None => None,
            };
        } else if self.demo_when_offline {
            self.baseline = Some(demo::demo_baseline(&user_id, &modality, Utc::now().date_naive()));
            self.metrics = None;
        } else {
            self.baseline = None;
            self.metrics = None;
        }

        self.retarget();
        Ok(())
    }

    fn retarget(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            timer.retarget(self.baseline.as_ref(), self.metrics.as_ref());
        }
    }

    // ── Timer controls ───────────────────────────────────────────────

    fn timer_for(&mut self, action: &str) -> Result<&mut SessionTimer> {
        self.timer
            .as_mut()
            .ok_or_else(|| IntervalError::precondition(action, "No workout loaded"))
    }

    pub fn start(&mut self) -> Result<TimerEvent> {
        let modality = self.modality.clone();
        let baseline = self.baseline.clone();
        self.timer_for("start")?
            .start(modality.as_ref(), baseline.as_ref())
    }

    pub fn tick(&mut self) -> Option<TimerEvent> {
        self.timer.as_mut().and_then(SessionTimer::tick)
    }

    pub fn pause(&mut self) -> Result<TimerEvent> {
        self.timer_for("pause")?.pause()
    }

    pub fn resume(&mut self) -> Result<TimerEvent> {
        self.timer_for("resume")?.resume()
    }

    pub fn skip_to_end(&mut self) -> Result<TimerEvent> {
        self.timer_for("skip to end")?.skip_to_end()
    }

    pub fn reset(&mut self) -> Result<TimerEvent> {
        Ok(self.timer_for("reset")?.reset())
    }

    // ── Results ──────────────────────────────────────────────────────

    /// Finalize and persist today's result
    pub fn submit(&mut self, entry: &ResultEntry) -> Result<SubmitOutcome> {
        self.submit_on(entry, Utc::now().date_naive())
    }

    /// Finalize the completed session and write the result and metrics
    /// sample. Storage failures are returned as-is, never retried.
    pub fn submit_on(&mut self, entry: &ResultEntry, date: NaiveDate) -> Result<SubmitOutcome> {
        let timer = self
            .timer
            .as_ref()
            .ok_or_else(|| IntervalError::precondition("save results", "No workout loaded"))?;
        if !timer.state().is_completed() {
            return Err(IntervalError::precondition(
                "save results",
                "Finish the session before saving results",
            ));
        }
        let (Some(workout), Some(modality)) = (self.workout.as_ref(), self.modality.as_ref()) else {
            return Err(IntervalError::precondition(
                "save results",
                "Please select a modality before saving",
            ));
        };

        let (program_version, program_day_number) = self.program_day(workout.day_number)?;
        let context = SessionContext {
            user_id: self.settings.user_id.clone(),
            workout_id: workout.id.clone(),
            program_day: workout.day_number,
            program_version,
            program_day_number,
            day_type: workout.day_type.clone(),
            modality: modality.clone(),
            date,
        };

        let finalized = aggregator::finalize(context, timer.intervals(), entry)?;

        if !self.store.is_connected() {
            warn!("Store offline, session result not saved");
            return Ok(SubmitOutcome {
                result: finalized.result,
                metrics: None,
                persisted: false,
            });
        }

        self.store
            .persist_session_result(&finalized.result)
            .map_err(|e| log_storage_failure("session result", e))?;
        let metrics = match &finalized.metrics_update {
            Some(update) => Some(
                self.store
                    .persist_performance_metrics_update(update)
                    .map_err(|e| log_storage_failure("performance metrics", e))?,
            ),
            None => None,
        };

        info!(
            workout = %finalized.result.workout_id,
            ratio = ?finalized.result.performance_ratio,
            "Session result saved"
        );

        if metrics.is_some() {
            self.metrics = metrics.clone();
            self.retarget();
        }

        Ok(SubmitOutcome {
            result: finalized.result,
            metrics,
            persisted: true,
        })
    }

    /// Program version and the day number within it. 3-day programs map
    /// source days through the store, falling back to the source day.
    fn program_day(&self, day_number: u32) -> Result<(ProgramVersion, u32)> {
        if !self.store.is_connected() {
            return Ok((self.settings.program_version, day_number));
        }

        let version = self
            .store
            .fetch_program_version(&self.settings.user_id)?
            .unwrap_or(self.settings.program_version);

        let program_day_number = match version {
            ProgramVersion::FiveDay => day_number,
            ProgramVersion::ThreeDay => self
                .store
                .fetch_program_day_number(day_number, version)?
                .unwrap_or(day_number),
        };
        Ok((version, program_day_number))
    }

    /// Past results for the loaded day type and selected modality, newest first
    pub fn history(&self) -> Result<Vec<SessionResult>> {
        let (Some(workout), Some(modality)) = (self.workout.as_ref(), self.modality.as_ref()) else {
            return Ok(Vec::new());
        };
        if !self.store.is_connected() {
            return Ok(Vec::new());
        }

        let mut sessions: Vec<SessionResult> = self
            .store
            .fetch_completed_sessions(&self.settings.user_id)?
            .into_iter()
            .filter(|s| s.matches(modality, &workout.day_type))
            .collect();
        sessions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(sessions)
    }

    /// Record a time trial and, when it is for the selected modality, pace
    /// against the new baseline straight away.
    pub fn record_time_trial(
        &mut self,
        modality: &Modality,
        score: &str,
        units: ScoreUnits,
        date: NaiveDate,
    ) -> Result<Baseline> {
        let record = time_trial::record_time_trial(
            &self.settings.user_id,
            Some(modality),
            Some(score),
            Some(units),
            date,
        )?;
        self.store
            .persist_time_trial(&record)
            .map_err(|e| log_storage_failure("time trial", e))?;

        let baseline = record.baseline();
        if self.modality.as_ref() == Some(modality) {
            self.baseline = Some(baseline.clone());
            self.retarget();
        }
        Ok(baseline)
    }
}

fn log_storage_failure(what: &str, e: IntervalError) -> IntervalError {
    error!(record = what, error = %e, retryable = e.is_retryable(), "Failed to save");
    e
}

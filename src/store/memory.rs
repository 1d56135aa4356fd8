use chrono::Utc;
use std::collections::{BTreeMap, HashMap};

use super::{blend_metrics, DataStore, MetricsSettings};
use crate::error::{IntervalError, Result, StorageError};
use crate::models::{
    Baseline, DayType, MetricsUpdate, Modality, PerformanceMetrics, ProgramVersion,
    SessionResult, WorkoutDefinition,
};
use crate::time_trial::TimeTrialRecord;

type MetricsKey = (String, DayType, Modality);

/// In-process store with switchable connectivity, for tests and demos
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    connected: bool,
    settings: MetricsSettings,
    workouts: BTreeMap<u32, WorkoutDefinition>,
    time_trials: Vec<TimeTrialRecord>,
    metrics: HashMap<MetricsKey, PerformanceMetrics>,
    sessions: Vec<SessionResult>,
    program_versions: HashMap<String, ProgramVersion>,
    program_days: HashMap<(u32, ProgramVersion), u32>,
}

impl MemoryStore {
    pub fn new(settings: MetricsSettings) -> Self {
        Self {
            connected: true,
            settings,
            ..Default::default()
        }
    }

    /// A store that refuses every call
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn insert_workout(&mut self, workout: WorkoutDefinition) {
        self.workouts.insert(workout.day_number, workout);
    }

    pub fn insert_metrics(&mut self, metrics: PerformanceMetrics) {
        let key = (
            metrics.user_id.clone(),
            metrics.day_type.clone(),
            metrics.modality.clone(),
        );
        self.metrics.insert(key, metrics);
    }

    pub fn set_program_version(&mut self, user_id: &str, version: ProgramVersion) {
        self.program_versions.insert(user_id.to_string(), version);
    }

    pub fn set_program_day_number(&mut self, day_number: u32, version: ProgramVersion, program_day: u32) {
        self.program_days.insert((day_number, version), program_day);
    }

    pub fn sessions(&self) -> &[SessionResult] {
        &self.sessions
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(StorageError::Unavailable.into())
        }
    }
}

impl DataStore for MemoryStore {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn fetch_workout_definition(&self, day_number: u32) -> Result<WorkoutDefinition> {
        self.ensure_connected()?;
        self.workouts
            .get(&day_number)
            .cloned()
            .ok_or_else(|| IntervalError::not_found("workout", format!("day {}", day_number)))
    }

    fn fetch_baseline(&self, user_id: &str, modality: &Modality) -> Result<Baseline> {
        self.ensure_connected()?;
        self.time_trials
            .iter()
            .filter(|t| t.user_id == user_id && &t.modality == modality)
            .max_by_key(|t| t.date)
            .map(TimeTrialRecord::baseline)
            .ok_or_else(|| IntervalError::not_found("baseline", modality))
    }

    fn fetch_performance_metrics(
        &self,
        user_id: &str,
        day_type: &DayType,
        modality: &Modality,
    ) -> Result<Option<PerformanceMetrics>> {
        self.ensure_connected()?;
        let key = (user_id.to_string(), day_type.clone(), modality.clone());
        Ok(self.metrics.get(&key).cloned())
    }

    fn fetch_completed_sessions(&self, user_id: &str) -> Result<Vec<SessionResult>> {
        self.ensure_connected()?;
        Ok(self
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    fn fetch_program_version(&self, user_id: &str) -> Result<Option<ProgramVersion>> {
        self.ensure_connected()?;
        Ok(self.program_versions.get(user_id).copied())
    }

    fn fetch_program_day_number(
        &self,
        day_number: u32,
        version: ProgramVersion,
    ) -> Result<Option<u32>> {
        self.ensure_connected()?;
        Ok(self.program_days.get(&(day_number, version)).copied())
    }

    fn persist_session_result(&mut self, result: &SessionResult) -> Result<()> {
        self.ensure_connected()?;
        self.sessions.push(result.clone());
        Ok(())
    }

    fn persist_performance_metrics_update(
        &mut self,
        update: &MetricsUpdate,
    ) -> Result<PerformanceMetrics> {
        self.ensure_connected()?;
        let key = (
            update.user_id.clone(),
            update.day_type.clone(),
            update.modality.clone(),
        );
        let blended = blend_metrics(self.metrics.remove(&key), update, &self.settings, Utc::now());
        self.metrics.insert(key, blended.clone());
        Ok(blended)
    }

    fn persist_time_trial(&mut self, record: &TimeTrialRecord) -> Result<()> {
        self.ensure_connected()?;
        self.time_trials.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoreUnits;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn trial(date: NaiveDate, rate: rust_decimal::Decimal) -> TimeTrialRecord {
        TimeTrialRecord {
            user_id: "u1".to_string(),
            modality: Modality::from("c2_ski_erg"),
            date,
            score: rate * dec!(10),
            units: ScoreUnits::Cal,
            calculated_rate: rate,
        }
    }

    #[test]
    fn test_offline_store_refuses_calls() {
        let mut store = MemoryStore::offline();
        assert!(!store.is_connected());
        let err = store.fetch_workout_definition(1).unwrap_err();
        assert!(matches!(err, IntervalError::Storage(StorageError::Unavailable)));
        assert!(store.fetch_completed_sessions("u1").is_err());

        store.set_connected(true);
        assert!(store.fetch_workout_definition(1).unwrap_err().is_not_found());
    }

    #[test]
    fn test_latest_baseline_wins() {
        let mut store = MemoryStore::new(MetricsSettings::default());
        store
            .persist_time_trial(&trial(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), dec!(25)))
            .unwrap();
        store
            .persist_time_trial(&trial(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), dec!(28.5)))
            .unwrap();

        let baseline = store
            .fetch_baseline("u1", &Modality::from("c2_ski_erg"))
            .unwrap();
        assert_eq!(baseline.rate, dec!(28.5));

        let err = store.fetch_baseline("u2", &Modality::from("c2_ski_erg")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_metrics_update_blends() {
        let mut store = MemoryStore::new(MetricsSettings::default());
        let update = MetricsUpdate {
            user_id: "u1".to_string(),
            day_type: DayType::Threshold,
            modality: Modality::from("echo_bike"),
            new_ratio: Some(dec!(0.9)),
            new_pace: Some(dec!(30)),
            is_max_effort: false,
        };

        store.persist_performance_metrics_update(&update).unwrap();
        let stored = store
            .fetch_performance_metrics("u1", &DayType::Threshold, &Modality::from("echo_bike"))
            .unwrap()
            .unwrap();
        assert_eq!(stored.rolling_avg_ratio, Some(dec!(0.9)));
        assert_eq!(stored.learned_max_pace, None);
    }
}

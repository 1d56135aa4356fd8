//! Storage collaborator for the training engine.
//!
//! The engine reads workouts, baselines and metrics through [`DataStore`] and
//! writes session results and metric samples back. Implementations decide
//! how a metric sample is folded into the stored statistics; both bundled
//! stores use [`blend_metrics`].

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{
    Baseline, DayType, MetricsUpdate, Modality, PerformanceMetrics, ProgramVersion,
    SessionResult, WorkoutDefinition,
};
use crate::time_trial::TimeTrialRecord;

/// How new ratio samples are blended into the rolling average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSettings {
    /// Weight of the newest sample, in (0, 1] (default: 0.3)
    pub smoothing_factor: Decimal,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            smoothing_factor: dec!(0.3),
        }
    }
}

/// Narrow read/write contract the engine needs from persistent storage.
///
/// Every call fails with `StorageError::Unavailable` while disconnected.
/// Lookups that find nothing return `IntervalError::NotFound` unless the
/// absence is an ordinary answer (`Option`).
pub trait DataStore {
    fn is_connected(&self) -> bool;

    fn fetch_workout_definition(&self, day_number: u32) -> Result<WorkoutDefinition>;

    /// Most recent time-trial baseline for the modality
    fn fetch_baseline(&self, user_id: &str, modality: &Modality) -> Result<Baseline>;

    fn fetch_performance_metrics(
        &self,
        user_id: &str,
        day_type: &DayType,
        modality: &Modality,
    ) -> Result<Option<PerformanceMetrics>>;

    /// Every stored session for the user, unordered
    fn fetch_completed_sessions(&self, user_id: &str) -> Result<Vec<SessionResult>>;

    fn fetch_program_version(&self, user_id: &str) -> Result<Option<ProgramVersion>>;

    /// Day number within `version` for a source day, if mapped
    fn fetch_program_day_number(
        &self,
        day_number: u32,
        version: ProgramVersion,
    ) -> Result<Option<u32>>;

    fn persist_session_result(&mut self, result: &SessionResult) -> Result<()>;

    /// Fold a sample into the stored statistics and return the new values
    fn persist_performance_metrics_update(
        &mut self,
        update: &MetricsUpdate,
    ) -> Result<PerformanceMetrics>;

    fn persist_time_trial(&mut self, record: &TimeTrialRecord) -> Result<()>;
}

impl<T: DataStore + ?Sized> DataStore for Box<T> {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn fetch_workout_definition(&self, day_number: u32) -> Result<WorkoutDefinition> {
        (**self).fetch_workout_definition(day_number)
    }

    fn fetch_baseline(&self, user_id: &str, modality: &Modality) -> Result<Baseline> {
        (**self).fetch_baseline(user_id, modality)
    }

    fn fetch_performance_metrics(
        &self,
        user_id: &str,
        day_type: &DayType,
        modality: &Modality,
    ) -> Result<Option<PerformanceMetrics>> {
        (**self).fetch_performance_metrics(user_id, day_type, modality)
    }

    fn fetch_completed_sessions(&self, user_id: &str) -> Result<Vec<SessionResult>> {
        (**self).fetch_completed_sessions(user_id)
    }

    fn fetch_program_version(&self, user_id: &str) -> Result<Option<ProgramVersion>> {
        (**self).fetch_program_version(user_id)
    }

    fn fetch_program_day_number(
        &self,
        day_number: u32,
        version: ProgramVersion,
    ) -> Result<Option<u32>> {
        (**self).fetch_program_day_number(day_number, version)
    }

    fn persist_session_result(&mut self, result: &SessionResult) -> Result<()> {
        (**self).persist_session_result(result)
    }

    fn persist_performance_metrics_update(
        &mut self,
        update: &MetricsUpdate,
    ) -> Result<PerformanceMetrics> {
        (**self).persist_performance_metrics_update(update)
    }

    fn persist_time_trial(&mut self, record: &TimeTrialRecord) -> Result<()> {
        (**self).persist_time_trial(record)
    }
}

/// Blend a sample into existing statistics.
///
/// The ratio is an exponential moving average seeded by the first sample.
/// The learned max only moves on max-effort samples and only upwards.
pub fn blend_metrics(
    existing: Option<PerformanceMetrics>,
    update: &MetricsUpdate,
    settings: &MetricsSettings,
    now: DateTime<Utc>,
) -> PerformanceMetrics {
    let mut metrics = existing.unwrap_or_else(|| PerformanceMetrics {
        user_id: update.user_id.clone(),
        day_type: update.day_type.clone(),
        modality: update.modality.clone(),
        rolling_avg_ratio: None,
        learned_max_pace: None,
        sample_count: 0,
        updated_at: None,
    });

    if let Some(sample) = update.new_ratio {
        let alpha = settings.smoothing_factor;
        metrics.rolling_avg_ratio = Some(match metrics.rolling_avg_ratio {
            Some(previous) => ema(previous, sample, alpha).unwrap_or(sample),
            None => sample,
        });
    }

    if update.is_max_effort {
        if let Some(pace) = update.new_pace {
            metrics.learned_max_pace = Some(match metrics.learned_max_pace {
                Some(best) => best.max(pace),
                None => pace,
            });
        }
    }

    metrics.sample_count = metrics.sample_count.saturating_add(1);
    metrics.updated_at = Some(now);
    metrics
}

/// `None` when the blend overflows; the caller keeps the latest sample
fn ema(previous: Decimal, sample: Decimal, alpha: Decimal) -> Option<Decimal> {
    let kept = previous.checked_mul(Decimal::ONE.checked_sub(alpha)?)?;
    let added = sample.checked_mul(alpha)?;
    kept.checked_add(added).map(|ratio| ratio.normalize())
}

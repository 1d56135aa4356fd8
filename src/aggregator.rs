//! Session aggregation: turns a finished interval list plus the values the
//! user typed in into a [`SessionResult`] and an optional metrics update.

use chrono::NaiveDate;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use crate::error::{Result, ValidationError};
use crate::models::{
    DayType, Interval, MetricsUpdate, Modality, ProgramVersion, SessionResult,
};
use crate::planner;

/// Highest heart rate accepted from manual entry
pub const MAX_HEART_RATE: u16 = 220;

/// Largest total output accepted for one session
pub const MAX_TOTAL_OUTPUT: Decimal = dec!(1000000000);

/// Raw form values as typed by the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub total_output: Option<String>,
    pub average_heart_rate: Option<String>,
    pub peak_heart_rate: Option<String>,
    pub perceived_exertion: Option<String>,
}

impl ResultEntry {
    pub fn new(total_output: impl Into<String>) -> Self {
        Self {
            total_output: Some(total_output.into()),
            ..Default::default()
        }
    }

    pub fn with_heart_rate(mut self, average: impl Into<String>, peak: impl Into<String>) -> Self {
        self.average_heart_rate = Some(average.into());
        self.peak_heart_rate = Some(peak.into());
        self
    }

    pub fn with_perceived_exertion(mut self, rpe: impl Into<String>) -> Self {
        self.perceived_exertion = Some(rpe.into());
        self
    }
}

/// Identity of the session being finalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: String,
    pub workout_id: String,
    pub program_day: u32,
    pub program_version: ProgramVersion,
    pub program_day_number: u32,
    pub day_type: DayType,
    pub modality: Modality,
    pub date: NaiveDate,
}

/// Aggregation output: the record to persist and the metrics sample, if any
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedSession {
    pub result: SessionResult,
    pub metrics_update: Option<MetricsUpdate>,
}

/// Build the session result.
///
/// Fails only on a total output that is missing, not a number, negative or
/// above [`MAX_TOTAL_OUTPUT`]. Heart rates and RPE are checked on their own
/// and dropped when invalid.
pub fn finalize(
    context: SessionContext,
    intervals: &[Interval],
    entry: &ResultEntry,
) -> Result<FinalizedSession> {
    let total_output = parse_total_output(entry.total_output.as_deref())?;

    let work_seconds = planner::total_work_seconds(intervals);
    let actual_pace = average_pace(total_output, work_seconds)
        .ok_or_else(|| total_output_out_of_range(&total_output.to_string()))?;
    let target_pace = average_target_pace(intervals);
    let performance_ratio = performance_ratio(actual_pace, target_pace);

    let average_heart_rate = parse_heart_rate("average_heart_rate", entry.average_heart_rate.as_deref());
    let peak_heart_rate = parse_heart_rate("peak_heart_rate", entry.peak_heart_rate.as_deref());
    let perceived_exertion = parse_rpe(entry.perceived_exertion.as_deref());

    let is_max_effort =
        context.day_type.is_max_effort() || intervals.iter().any(|i| i.is_max_effort);

    let metrics_update = (is_max_effort || performance_ratio.is_some()).then(|| MetricsUpdate {
        user_id: context.user_id.clone(),
        day_type: context.day_type.clone(),
        modality: context.modality.clone(),
        new_ratio: performance_ratio,
        new_pace: (actual_pace > Decimal::ZERO).then_some(actual_pace),
        is_max_effort,
    });

    debug!(
        total_output = %total_output,
        actual_pace = %actual_pace,
        target_pace = ?target_pace,
        performance_ratio = ?performance_ratio,
        metrics_update = metrics_update.is_some(),
        "Session finalized"
    );

    let result = SessionResult {
        user_id: context.user_id,
        program_day: context.program_day,
        program_version: context.program_version,
        program_day_number: context.program_day_number,
        workout_id: context.workout_id,
        day_type: context.day_type,
        date: context.date,
        modality: context.modality,
        total_output,
        actual_pace,
        target_pace,
        performance_ratio,
        average_heart_rate,
        peak_heart_rate,
        perceived_exertion,
        intervals_completed: intervals.iter().filter(|i| i.completed).count() as u32,
        total_intervals: intervals.len() as u32,
    };

    Ok(FinalizedSession {
        result,
        metrics_update,
    })
}

/// Output per minute of work; rest time is excluded. Zero without work time,
/// `None` when the pace cannot be represented.
pub fn average_pace(total_output: Decimal, work_seconds: u32) -> Option<Decimal> {
    if work_seconds == 0 {
        return Some(Decimal::ZERO);
    }
    total_output
        .checked_mul(Decimal::from(60))?
        .checked_div(Decimal::from(work_seconds))
        .map(|pace| pace.normalize())
}

/// Mean target pace over the intervals that have one
pub fn average_target_pace(intervals: &[Interval]) -> Option<Decimal> {
    let paces: Vec<Decimal> = intervals
        .iter()
        .filter_map(|i| i.target_pace.as_ref().map(|t| t.pace))
        .collect();

    if paces.is_empty() {
        return None;
    }
    let sum = paces
        .iter()
        .try_fold(Decimal::ZERO, |sum, pace| sum.checked_add(*pace));
    let Some(sum) = sum else {
        warn!(intervals = paces.len(), "Target paces too large to average");
        return None;
    };
    sum.checked_div(Decimal::from(paces.len()))
        .map(|mean| mean.normalize())
}

/// `actual / target`, defined only when both are positive
pub fn performance_ratio(actual_pace: Decimal, target_pace: Option<Decimal>) -> Option<Decimal> {
    match target_pace {
        Some(target) if target > Decimal::ZERO && actual_pace > Decimal::ZERO => {
            actual_pace.checked_div(target).map(|ratio| ratio.normalize())
        }
        _ => None,
    }
}

fn parse_total_output(raw: Option<&str>) -> std::result::Result<Decimal, ValidationError> {
    let field = "total_output";
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
        ValidationError::MissingField {
            field: field.to_string(),
        }
    })?;

    let value = Decimal::from_str(raw).map_err(|_| ValidationError::NotNumeric {
        field: field.to_string(),
        value: raw.to_string(),
    })?;

    if value < Decimal::ZERO {
        return Err(ValidationError::Negative {
            field: field.to_string(),
            value: raw.to_string(),
        });
    }
    if value > MAX_TOTAL_OUTPUT {
        return Err(total_output_out_of_range(raw));
    }
    Ok(value)
}

fn total_output_out_of_range(raw: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: "total_output".to_string(),
        value: raw.to_string(),
        min: "0".to_string(),
        max: MAX_TOTAL_OUTPUT.to_string(),
    }
}

fn parse_heart_rate(field: &str, raw: Option<&str>) -> Option<u16> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    let accepted = Decimal::from_str(raw)
        .ok()
        .filter(|bpm| *bpm > Decimal::ZERO && *bpm <= Decimal::from(MAX_HEART_RATE))
        .and_then(|bpm| {
            bpm.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_u16()
        });

    if accepted.is_none() {
        warn!(field, value = raw, "Dropping invalid heart rate");
    }
    accepted
}

fn parse_rpe(raw: Option<&str>) -> Option<u8> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    let accepted = raw.parse::<u8>().ok().filter(|rpe| (1..=10).contains(rpe));

    if accepted.is_none() {
        warn!(value = raw, "Dropping invalid perceived exertion");
    }
    accepted
}

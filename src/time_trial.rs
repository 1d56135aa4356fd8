//! Ten-minute time trial: the maximal test a baseline is derived from.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use rust_decimal_macros::dec;
use std::str::FromStr;
use tracing::info;

use crate::error::{Result, ValidationError};
use crate::models::{Baseline, Modality, ScoreUnits};

/// Time trial length in seconds
pub const TIME_TRIAL_SECONDS: u32 = 600;

/// Largest trial score accepted
pub const MAX_SCORE: Decimal = dec!(1000000000);

/// Persisted time-trial score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeTrialRecord {
    pub user_id: String,
    pub modality: Modality,
    pub date: NaiveDate,
    /// Total output over the trial
    pub score: Decimal,
    pub units: ScoreUnits,
    /// Score per minute
    pub calculated_rate: Decimal,
}

impl TimeTrialRecord {
    pub fn baseline(&self) -> Baseline {
        Baseline {
            user_id: self.user_id.clone(),
            modality: self.modality.clone(),
            rate: self.calculated_rate,
            units: self.units,
            date: self.date,
        }
    }
}

/// Score per minute over the trial
pub fn baseline_rate(score: Decimal) -> Decimal {
    (score / Decimal::from(TIME_TRIAL_SECONDS / 60)).normalize()
}

/// Validate a typed-in score and build the record.
///
/// The modality and units must be chosen and the score must be a positive
/// number no larger than [`MAX_SCORE`].
pub fn record_time_trial(
    user_id: &str,
    modality: Option<&Modality>,
    score: Option<&str>,
    units: Option<ScoreUnits>,
    date: NaiveDate,
) -> Result<TimeTrialRecord> {
    let modality = modality.ok_or_else(|| ValidationError::MissingField {
        field: "modality".to_string(),
    })?;
    let units = units.ok_or_else(|| ValidationError::MissingField {
        field: "units".to_string(),
    })?;

    let raw = score
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ValidationError::MissingField {
            field: "score".to_string(),
        })?;
    let score = Decimal::from_str(raw).map_err(|_| ValidationError::NotNumeric {
        field: "score".to_string(),
        value: raw.to_string(),
    })?;
    if score <= Decimal::ZERO {
        return Err(ValidationError::NotPositive {
            field: "score".to_string(),
            value: raw.to_string(),
        }
        .into());
    }
    if score > MAX_SCORE {
        return Err(ValidationError::OutOfRange {
            field: "score".to_string(),
            value: raw.to_string(),
            min: "0".to_string(),
            max: MAX_SCORE.to_string(),
        }
        .into());
    }

    let record = TimeTrialRecord {
        user_id: user_id.to_string(),
        modality: modality.clone(),
        date,
        score,
        units,
        calculated_rate: baseline_rate(score),
    };

    info!(
        modality = %record.modality,
        score = %record.score,
        units = %record.units,
        rate = %record.calculated_rate,
        "Time trial recorded"
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntervalError;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    #[test]
    fn test_rate_is_score_per_minute() {
        let modality = Modality::from("c2_row_erg");
        let record =
            record_time_trial("u1", Some(&modality), Some("455"), Some(ScoreUnits::Cal), date())
                .unwrap();

        assert_eq!(record.calculated_rate, dec!(45.5));
        let baseline = record.baseline();
        assert_eq!(baseline.rate, dec!(45.5));
        assert_eq!(baseline.modality, modality);
        assert_eq!(baseline.date, date());
    }

    #[test]
    fn test_score_validation() {
        let modality = Modality::from("echo_bike");
        let units = Some(ScoreUnits::Watts);

        assert!(matches!(
            record_time_trial("u1", None, Some("100"), units, date()),
            Err(IntervalError::Validation(ValidationError::MissingField { .. }))
        ));
        assert!(record_time_trial("u1", Some(&modality), Some("100"), None, date()).is_err());
        assert!(matches!(
            record_time_trial("u1", Some(&modality), Some("ten"), units, date()),
            Err(IntervalError::Validation(ValidationError::NotNumeric { .. }))
        ));
        assert!(matches!(
            record_time_trial("u1", Some(&modality), Some("0"), units, date()),
            Err(IntervalError::Validation(ValidationError::NotPositive { .. }))
        ));
        assert!(matches!(
            record_time_trial("u1", Some(&modality), Some("79228162514264337593543950335"), units, date()),
            Err(IntervalError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }
}

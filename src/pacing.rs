//! Target pace calculation.
//!
//! Targets come from the baseline rate scaled by the interval's intensity,
//! nudged by how the user has performed against past targets. Max-effort work
//! is paced against the best pace seen so far once one exists.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::models::{Baseline, DayType, Interval, PaceSource, PerformanceMetrics, TargetPace};

/// Target for one interval, or `None` without a baseline.
///
/// Intervals carrying neither a pace range nor a learned-max override also
/// get no target; the fallback interval is one of these. So do intervals
/// with an inverted or negative range, and targets too large to represent.
pub fn target_pace(
    interval: &Interval,
    baseline: Option<&Baseline>,
    metrics: Option<&PerformanceMetrics>,
    day_type: &DayType,
) -> Option<TargetPace> {
    let baseline = baseline?;

    let max_effort = day_type.is_max_effort() || interval.is_max_effort;
    if max_effort {
        if let Some(learned_max) = metrics.and_then(|m| m.learned_max_pace) {
            return Some(TargetPace {
                pace: learned_max,
                units: baseline.units,
                intensity_percent: 100,
                baseline: baseline.rate,
                source: PaceSource::LearnedMax,
            });
        }
    }

    let range = interval.pace_range?;
    if !range.is_valid() {
        warn!(interval_id = interval.id, min = %range.min, max = %range.max, "Skipping invalid pace range");
        return None;
    }

    let ratio = metrics.and_then(|m| m.rolling_avg_ratio).filter(|ratio| {
        let usable = *ratio > Decimal::ZERO;
        if !usable {
            warn!(ratio = %ratio, "Ignoring non-positive performance ratio");
        }
        usable
    });
    let (multiplier, source) = match ratio {
        Some(ratio) => (range.midpoint().checked_mul(ratio)?, PaceSource::MetricsAdjusted),
        None => (range.midpoint(), PaceSource::BaselineOnly),
    };
    let Some(pace) = baseline.rate.checked_mul(multiplier) else {
        warn!(baseline = %baseline.rate, multiplier = %multiplier, "Target pace out of range");
        return None;
    };

    Some(TargetPace {
        pace: pace.normalize(),
        units: baseline.units,
        intensity_percent: intensity_percent(multiplier),
        baseline: baseline.rate,
        source,
    })
}

/// Recompute every interval's target against the current baseline and metrics
pub fn apply_targets(
    intervals: &mut [Interval],
    baseline: Option<&Baseline>,
    metrics: Option<&PerformanceMetrics>,
    day_type: &DayType,
) {
    for interval in intervals.iter_mut() {
        interval.target_pace = target_pace(interval, baseline, metrics, day_type);
    }

    debug!(
        day_type = %day_type,
        intervals = intervals.len(),
        targeted = intervals.iter().filter(|i| i.target_pace.is_some()).count(),
        has_metrics = metrics.is_some(),
        "Recomputed target paces"
    );
}

/// Multipliers reaching here are non-negative: ranges are validated and
/// ratios filtered above. Very large ones saturate.
fn intensity_percent(multiplier: Decimal) -> u32 {
    multiplier
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|percent| percent.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|percent| percent.to_u32())
        .unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Modality, PaceRange, ScoreUnits};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn baseline(rate: Decimal) -> Baseline {
        Baseline {
            user_id: "u1".to_string(),
            modality: Modality::from("c2_row_erg"),
            rate,
            units: ScoreUnits::Cal,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        }
    }

    fn metrics(ratio: Option<Decimal>, learned_max: Option<Decimal>) -> PerformanceMetrics {
        PerformanceMetrics {
            user_id: "u1".to_string(),
            day_type: DayType::Interval,
            modality: Modality::from("c2_row_erg"),
            rolling_avg_ratio: ratio,
            learned_max_pace: learned_max,
            sample_count: 3,
            updated_at: None,
        }
    }

    fn interval(range: Option<PaceRange>, max_effort: bool) -> Interval {
        Interval {
            id: 1,
            day_type: DayType::Interval,
            description: "Interval - Round 1".to_string(),
            duration: 60,
            rest_duration: 30,
            block_number: Some(1),
            round_number: Some(1),
            pace_range: range,
            pace_progression: None,
            is_max_effort: max_effort,
            target_pace: None,
            actual_output: Decimal::ZERO,
            work_completed: false,
            completed: false,
        }
    }

    #[test]
    fn test_metrics_adjusted_target() {
        let i = interval(Some(PaceRange::new(dec!(0.8), dec!(0.9))), false);
        let target = target_pace(
            &i,
            Some(&baseline(dec!(40))),
            Some(&metrics(Some(dec!(1.1)), None)),
            &DayType::Interval,
        )
        .unwrap();

        assert_eq!(target.pace, dec!(37.4));
        assert_eq!(target.intensity_percent, 94);
        assert_eq!(target.source, PaceSource::MetricsAdjusted);
        assert_eq!(target.source.as_str(), "metrics_adjusted");
        assert_eq!(target.units, ScoreUnits::Cal);
    }

    #[test]
    fn test_baseline_only_target() {
        let i = interval(Some(PaceRange::new(dec!(0.8), dec!(0.9))), false);
        let target = target_pace(&i, Some(&baseline(dec!(40))), None, &DayType::Interval).unwrap();

        assert_eq!(target.pace, dec!(34));
        assert_eq!(target.intensity_percent, 85);
        assert_eq!(target.source, PaceSource::BaselineOnly);
    }

    #[test]
    fn test_learned_max_overrides_range() {
        let m = metrics(Some(dec!(0.9)), Some(dec!(52.5)));
        let b = baseline(dec!(40));

        let on_max_day = interval(Some(PaceRange::new(dec!(0.5), dec!(0.6))), false);
        let target = target_pace(&on_max_day, Some(&b), Some(&m), &DayType::RocketRacesB).unwrap();
        assert_eq!(target.pace, dec!(52.5));
        assert_eq!(target.intensity_percent, 100);
        assert_eq!(target.source, PaceSource::LearnedMax);

        let flagged = interval(None, true);
        let target = target_pace(&flagged, Some(&b), Some(&m), &DayType::Interval).unwrap();
        assert_eq!(target.source, PaceSource::LearnedMax);
    }

    #[test]
    fn test_max_effort_without_learned_max_uses_range() {
        let i = interval(Some(PaceRange::fixed(dec!(1.0))), false);
        let target = target_pace(
            &i,
            Some(&baseline(dec!(40))),
            Some(&metrics(None, None)),
            &DayType::TimeTrial,
        )
        .unwrap();
        assert_eq!(target.pace, dec!(40));
        assert_eq!(target.source, PaceSource::BaselineOnly);
    }

    #[test]
    fn test_no_target_without_baseline_or_range() {
        let i = interval(Some(PaceRange::fixed(dec!(0.9))), false);
        assert!(target_pace(&i, None, None, &DayType::Interval).is_none());

        let bare = interval(None, false);
        assert!(target_pace(&bare, Some(&baseline(dec!(40))), None, &DayType::Interval).is_none());
    }

    #[test]
    fn test_apply_targets_recomputes_all() {
        let mut intervals = vec![
            interval(Some(PaceRange::fixed(dec!(0.8))), false),
            interval(Some(PaceRange::fixed(dec!(1.0))), false),
        ];
        let b = baseline(dec!(50));

        apply_targets(&mut intervals, Some(&b), None, &DayType::Interval);
        assert_eq!(intervals[0].target_pace.as_ref().unwrap().pace, dec!(40));

        let m = metrics(Some(dec!(1.2)), None);
        apply_targets(&mut intervals, Some(&b), Some(&m), &DayType::Interval);
        assert_eq!(intervals[0].target_pace.as_ref().unwrap().pace, dec!(48));
        assert_eq!(intervals[1].target_pace.as_ref().unwrap().intensity_percent, 120);

        apply_targets(&mut intervals, None, Some(&m), &DayType::Interval);
        assert!(intervals.iter().all(|i| i.target_pace.is_none()));
    }

    #[test]
    fn test_unusable_ranges_and_ratios() {
        let b = baseline(dec!(40));

        let inverted = interval(Some(PaceRange::new(dec!(1.0), dec!(0.8))), false);
        assert!(target_pace(&inverted, Some(&b), None, &DayType::Infinity).is_none());

        let negative = interval(Some(PaceRange::new(dec!(-0.5), dec!(0.5))), false);
        assert!(target_pace(&negative, Some(&b), None, &DayType::Interval).is_none());

        let i = interval(Some(PaceRange::new(dec!(0.8), dec!(0.9))), false);
        let target = target_pace(&i, Some(&b), Some(&metrics(Some(dec!(-1.2)), None)), &DayType::Interval).unwrap();
        assert_eq!(target.source, PaceSource::BaselineOnly);
        assert_eq!(target.pace, dec!(34));
        assert_eq!(target.intensity_percent, 85);
    }

    #[test]
    fn test_huge_baseline_gets_no_target() {
        let i = interval(Some(PaceRange::new(dec!(1.5), dec!(2.5))), false);
        let huge = baseline(Decimal::MAX);
        assert!(target_pace(&i, Some(&huge), None, &DayType::Interval).is_none());

        let ratio = metrics(Some(Decimal::MAX), None);
        assert!(target_pace(&i, Some(&baseline(dec!(40))), Some(&ratio), &DayType::Interval).is_none());
    }

    #[test]
    fn test_intensity_percent_saturates() {
        assert_eq!(intensity_percent(dec!(0.945)), 95);
        assert_eq!(intensity_percent(Decimal::MAX), u32::MAX);
        assert_eq!(intensity_percent(dec!(50000000)), u32::MAX);
    }
}

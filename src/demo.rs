//! Offline stand-ins used when the data store cannot be reached.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{Baseline, DayType, Modality, ScoreUnits, WorkoutDefinition};

const WORKOUT_TYPES: [&str; 3] = ["EMOM", "AMRAP", "Conditioning"];

/// Demo workout for a program day: no blocks, so it plans to one interval
/// of 15 to 24 minutes.
pub fn demo_workout(day_number: u32) -> WorkoutDefinition {
    let workout_type = WORKOUT_TYPES[(day_number % 3) as usize];

    let mut workout = WorkoutDefinition::new(
        format!("demo-{}", day_number),
        day_number,
        DayType::Other(workout_type.to_lowercase()),
    );
    workout.total_work_time = Some((15 + day_number % 10) * 60);
    workout.description = Some(format!("{} workout for Day {}", workout_type, day_number));
    workout
}

/// Representative baseline rate per modality
pub fn demo_baseline_rate(modality: &Modality) -> (Decimal, ScoreUnits) {
    match modality.as_str() {
        "c2_row_erg" => (dec!(45.5), ScoreUnits::Cal),
        "echo_bike" => (dec!(38.2), ScoreUnits::Cal),
        "assault_bike" => (dec!(42.1), ScoreUnits::Cal),
        "c2_bike_erg" => (dec!(35.8), ScoreUnits::Watts),
        "c2_ski_erg" => (dec!(28.5), ScoreUnits::Cal),
        "outdoor_run" => (dec!(6.2), ScoreUnits::Mph),
        "motorized_treadmill" => (dec!(6.5), ScoreUnits::Mph),
        _ => (dec!(40.0), ScoreUnits::Cal),
    }
}

pub fn demo_baseline(user_id: &str, modality: &Modality, date: NaiveDate) -> Baseline {
    let (rate, units) = demo_baseline_rate(modality);
    Baseline {
        user_id: user_id.to_string(),
        modality: modality.clone(),
        rate,
        units,
        date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::IntervalPlanner;

    #[test]
    fn test_demo_workout_cycles_types() {
        let day_three = demo_workout(3);
        assert_eq!(day_three.day_type, DayType::Other("emom".to_string()));
        assert_eq!(day_three.total_work_time, Some(18 * 60));
        assert_eq!(day_three.description.as_deref(), Some("EMOM workout for Day 3"));

        assert_eq!(demo_workout(4).day_type.as_str(), "amrap");
        assert_eq!(demo_workout(17).total_work_time, Some(22 * 60));
    }

    #[test]
    fn test_demo_workout_plans_single_fallback() {
        let intervals = IntervalPlanner::default().plan(&demo_workout(5));
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].duration, 20 * 60);
        assert_eq!(intervals[0].description, "Conditioning workout for Day 5");
        assert!(intervals[0].target_pace.is_none());
    }

    #[test]
    fn test_demo_baselines() {
        assert_eq!(
            demo_baseline_rate(&Modality::from("c2_bike_erg")),
            (dec!(35.8), ScoreUnits::Watts)
        );
        assert_eq!(
            demo_baseline_rate(&Modality::from("rogue_row_erg")),
            (dec!(40.0), ScoreUnits::Cal)
        );
    }
}

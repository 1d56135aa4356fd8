use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Longest work or rest phase a workout definition may ask for (24 hours)
pub const MAX_PHASE_SECONDS: u32 = 86_400;

/// Most rounds one block may ask for
pub const MAX_ROUNDS: u32 = 1_000;

/// Workout shape tag controlling interval generation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DayType {
    TimeTrial,
    Endurance,
    Anaerobic,
    MaxAerobicPower,
    Interval,
    Polarized,
    Threshold,
    Tempo,
    Recovery,
    Flux,
    FluxStages,
    Devour,
    Towers,
    TowersBlock1,
    Afterburner,
    Synthesis,
    HybridAnaerobic,
    HybridAerobic,
    Ascending,
    Descending,
    AscendingDevour,
    DescendingDevour,
    Infinity,
    InfinityBlock1,
    InfinityBlock2,
    Atomic,
    AtomicBlock2,
    RocketRacesA,
    RocketRacesB,
    /// Unrecognized tag, planned with the standard interval rule
    Other(String),
}

impl DayType {
    pub fn as_str(&self) -> &str {
        match self {
            DayType::TimeTrial => "time_trial",
            DayType::Endurance => "endurance",
            DayType::Anaerobic => "anaerobic",
            DayType::MaxAerobicPower => "max_aerobic_power",
            DayType::Interval => "interval",
            DayType::Polarized => "polarized",
            DayType::Threshold => "threshold",
            DayType::Tempo => "tempo",
            DayType::Recovery => "recovery",
            DayType::Flux => "flux",
            DayType::FluxStages => "flux_stages",
            DayType::Devour => "devour",
            DayType::Towers => "towers",
            DayType::TowersBlock1 => "towers_block_1",
            DayType::Afterburner => "afterburner",
            DayType::Synthesis => "synthesis",
            DayType::HybridAnaerobic => "hybrid_anaerobic",
            DayType::HybridAerobic => "hybrid_aerobic",
            DayType::Ascending => "ascending",
            DayType::Descending => "descending",
            DayType::AscendingDevour => "ascending_devour",
            DayType::DescendingDevour => "descending_devour",
            DayType::Infinity => "infinity",
            DayType::InfinityBlock1 => "infinity_block_1",
            DayType::InfinityBlock2 => "infinity_block_2",
            DayType::Atomic => "atomic",
            DayType::AtomicBlock2 => "atomic_block_2",
            DayType::RocketRacesA => "rocket_races_a",
            DayType::RocketRacesB => "rocket_races_b",
            DayType::Other(tag) => tag,
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "time_trial" => DayType::TimeTrial,
            "endurance" => DayType::Endurance,
            "anaerobic" => DayType::Anaerobic,
            "max_aerobic_power" => DayType::MaxAerobicPower,
            "interval" => DayType::Interval,
            "polarized" => DayType::Polarized,
            "threshold" => DayType::Threshold,
            "tempo" => DayType::Tempo,
            "recovery" => DayType::Recovery,
            "flux" => DayType::Flux,
            "flux_stages" => DayType::FluxStages,
            "devour" => DayType::Devour,
            "towers" => DayType::Towers,
            "towers_block_1" => DayType::TowersBlock1,
            "afterburner" => DayType::Afterburner,
            "synthesis" => DayType::Synthesis,
            "hybrid_anaerobic" => DayType::HybridAnaerobic,
            "hybrid_aerobic" => DayType::HybridAerobic,
            "ascending" => DayType::Ascending,
            "descending" => DayType::Descending,
            "ascending_devour" => DayType::AscendingDevour,
            "descending_devour" => DayType::DescendingDevour,
            "infinity" => DayType::Infinity,
            "infinity_block_1" => DayType::InfinityBlock1,
            "infinity_block_2" => DayType::InfinityBlock2,
            "atomic" => DayType::Atomic,
            "atomic_block_2" => DayType::AtomicBlock2,
            "rocket_races_a" => DayType::RocketRacesA,
            "rocket_races_b" => DayType::RocketRacesB,
            other => DayType::Other(other.to_string()),
        }
    }

    /// Day type whose generation rule this one reuses, if any
    pub fn inherits_from(&self) -> Option<DayType> {
        match self {
            DayType::TowersBlock1 => Some(DayType::Towers),
            DayType::AtomicBlock2 => Some(DayType::Atomic),
            DayType::InfinityBlock1 | DayType::InfinityBlock2 => Some(DayType::Infinity),
            DayType::RocketRacesB => Some(DayType::RocketRacesA),
            _ => None,
        }
    }

    /// Days paced against the learned max pace rather than a pace range
    pub fn is_max_effort(&self) -> bool {
        matches!(
            self,
            DayType::TimeTrial | DayType::Anaerobic | DayType::RocketRacesA | DayType::RocketRacesB
        )
    }
}

impl From<String> for DayType {
    fn from(tag: String) -> Self {
        DayType::from_tag(&tag)
    }
}

impl From<DayType> for String {
    fn from(day_type: DayType) -> Self {
        day_type.as_str().to_string()
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exercise equipment or activity, e.g. `c2_row_erg`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Modality(pub String);

impl Modality {
    pub fn new(tag: impl Into<String>) -> Self {
        Modality(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Modality {
    fn from(tag: &str) -> Self {
        Modality(tag.to_string())
    }
}

/// Units a time-trial score is recorded in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreUnits {
    Cal,
    Watts,
    Mph,
    Kph,
    Miles,
    Meters,
}

impl ScoreUnits {
    pub const ALL: [ScoreUnits; 6] = [
        ScoreUnits::Cal,
        ScoreUnits::Watts,
        ScoreUnits::Mph,
        ScoreUnits::Kph,
        ScoreUnits::Miles,
        ScoreUnits::Meters,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreUnits::Cal => "cal",
            ScoreUnits::Watts => "watts",
            ScoreUnits::Mph => "mph",
            ScoreUnits::Kph => "kph",
            ScoreUnits::Miles => "miles",
            ScoreUnits::Meters => "meters",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreUnits::Cal => "Calories",
            ScoreUnits::Watts => "Watts (Average)",
            ScoreUnits::Mph => "MPH",
            ScoreUnits::Kph => "KPH",
            ScoreUnits::Miles => "Miles",
            ScoreUnits::Meters => "Meters",
        }
    }
}

impl std::str::FromStr for ScoreUnits {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScoreUnits::ALL
            .iter()
            .copied()
            .find(|units| units.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("Unknown score units: {}", s))
    }
}

impl fmt::Display for ScoreUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pace multiplier range, serialized as `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[Decimal; 2]", into = "[Decimal; 2]")]
pub struct PaceRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl PaceRange {
    pub fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    /// Both ends at the same multiplier
    pub fn fixed(multiplier: Decimal) -> Self {
        Self {
            min: multiplier,
            max: multiplier,
        }
    }

    pub fn midpoint(&self) -> Decimal {
        self.min + (self.max - self.min) / Decimal::TWO
    }

    /// Non-negative and not inverted
    pub fn is_valid(&self) -> bool {
        self.min >= Decimal::ZERO && self.min <= self.max
    }
}

impl From<[Decimal; 2]> for PaceRange {
    fn from(pair: [Decimal; 2]) -> Self {
        PaceRange::new(pair[0], pair[1])
    }
}

impl From<PaceRange> for [Decimal; 2] {
    fn from(range: PaceRange) -> Self {
        [range.min, range.max]
    }
}

/// Parameter record for one block of a workout day.
///
/// Every field is optional: a block where nothing is set is skipped by the
/// planner, and unset durations fall back to planner defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Work phase length in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_duration: Option<u32>,

    /// Rest phase length in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_duration: Option<u32>,

    /// Number of rounds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounds: Option<u32>,

    /// Pace multiplier range relative to baseline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace_range: Option<PaceRange>,

    /// Free-form progression tag, e.g. "increasing"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace_progression: Option<String>,

    /// Per-round work increase in seconds (ascending)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_duration_increment: Option<u32>,

    /// Per-round rest decrease in seconds (descending devour); sign ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_duration_increment: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_max_effort: Option<bool>,
}

impl Block {
    pub fn is_empty(&self) -> bool {
        self == &Block::default()
    }
}

/// A training day as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDefinition {
    /// Storage identifier
    pub id: String,

    /// Program day this workout belongs to
    pub day_number: u32,

    pub day_type: DayType,

    /// Up to four blocks; `None` slots keep later block numbers stable
    #[serde(default)]
    pub blocks: [Option<Block>; 4],

    /// Total work time override in seconds, used by the fallback interval
    #[serde(default)]
    pub total_work_time: Option<u32>,

    #[serde(default)]
    pub description: Option<String>,
}

impl WorkoutDefinition {
    pub fn new(id: impl Into<String>, day_number: u32, day_type: DayType) -> Self {
        Self {
            id: id.into(),
            day_number,
            day_type,
            blocks: Default::default(),
            total_work_time: None,
            description: None,
        }
    }

    /// Builder-style block assignment; `number` is 1-based
    pub fn with_block(mut self, number: usize, block: Block) -> Self {
        if (1..=4).contains(&number) {
            self.blocks[number - 1] = Some(block);
        }
        self
    }

    /// Reject definitions the planner cannot expand sensibly: inverted or
    /// negative pace ranges, and durations or round counts past
    /// [`MAX_PHASE_SECONDS`] and [`MAX_ROUNDS`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(total) = self.total_work_time {
            check_phase("total_work_time", total)?;
        }

        for (number, block) in self.active_blocks() {
            let invalid = |reason: String| ValidationError::InvalidDefinition {
                reason: format!("block {}: {}", number, reason),
            };

            if let Some(range) = block.pace_range {
                if range.min < Decimal::ZERO {
                    return Err(invalid(format!("negative pace multiplier {}", range.min)));
                }
                if range.min > range.max {
                    return Err(invalid(format!(
                        "pace range is inverted: [{}, {}]",
                        range.min, range.max
                    )));
                }
            }

            for (field, seconds) in [
                ("workDuration", block.work_duration),
                ("restDuration", block.rest_duration),
            ] {
                if let Some(seconds) = seconds {
                    check_phase(field, seconds).map_err(|_| {
                        invalid(format!("{} {}s exceeds {}s", field, seconds, MAX_PHASE_SECONDS))
                    })?;
                }
            }

            let rounds = block.rounds.unwrap_or(1);
            if rounds > MAX_ROUNDS {
                return Err(invalid(format!("{} rounds exceeds {}", rounds, MAX_ROUNDS)));
            }

            if let Some(increment) = block.work_duration_increment {
                let longest = u64::from(block.work_duration.unwrap_or(0))
                    + u64::from(increment) * u64::from(rounds.saturating_sub(1));
                if longest > u64::from(MAX_PHASE_SECONDS) {
                    return Err(invalid(format!(
                        "last round would last {}s, over {}s",
                        longest, MAX_PHASE_SECONDS
                    )));
                }
            }

            if let Some(decrement) = block.rest_duration_increment {
                if decrement.unsigned_abs() > MAX_PHASE_SECONDS {
                    return Err(invalid(format!(
                        "restDurationIncrement {} exceeds {}s",
                        decrement, MAX_PHASE_SECONDS
                    )));
                }
            }
        }
        Ok(())
    }

    /// Non-empty blocks with their 1-based numbers, in block order
    pub fn active_blocks(&self) -> impl Iterator<Item = (u8, &Block)> {
        self.blocks
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Some(block) if !block.is_empty() => Some((i as u8 + 1, block)),
                _ => None,
            })
    }
}

fn check_phase(field: &str, seconds: u32) -> Result<(), ValidationError> {
    if seconds > MAX_PHASE_SECONDS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value: seconds.to_string(),
            min: "0".to_string(),
            max: MAX_PHASE_SECONDS.to_string(),
        });
    }
    Ok(())
}

/// Work or rest half of an interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Rest,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Work => f.write_str("work"),
            Phase::Rest => f.write_str("rest"),
        }
    }
}

/// Where a target pace came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaceSource {
    LearnedMax,
    MetricsAdjusted,
    BaselineOnly,
}

impl PaceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaceSource::LearnedMax => "learned_max",
            PaceSource::MetricsAdjusted => "metrics_adjusted",
            PaceSource::BaselineOnly => "baseline_only",
        }
    }
}

/// Computed pacing goal for one interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetPace {
    /// Target output per minute
    pub pace: Decimal,

    pub units: ScoreUnits,

    /// Intensity as a rounded percentage of baseline
    pub intensity_percent: u32,

    /// Baseline rate the target was derived from
    pub baseline: Decimal,

    pub source: PaceSource,
}

/// One timed work/rest segment of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    /// Sequential id across all blocks, starting at 1
    pub id: u32,

    pub day_type: DayType,

    /// Human-readable label, e.g. "Towers - Tower 3"
    pub description: String,

    /// Work phase length in seconds
    pub duration: u32,

    /// Rest phase length in seconds, 0 if none
    pub rest_duration: u32,

    /// None for the fallback interval
    pub block_number: Option<u8>,
    pub round_number: Option<u32>,

    pub pace_range: Option<PaceRange>,
    pub pace_progression: Option<String>,
    pub is_max_effort: bool,

    /// Filled by the pace calculator
    pub target_pace: Option<TargetPace>,

    /// Output recorded against this interval while running
    pub actual_output: Decimal,

    pub work_completed: bool,
    pub completed: bool,
}

impl Interval {
    /// Work plus rest seconds
    pub fn total_seconds(&self) -> u32 {
        self.duration.saturating_add(self.rest_duration)
    }
}

/// Measured output rate for one user and modality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub user_id: String,
    pub modality: Modality,

    /// Units per minute from the time trial
    pub rate: Decimal,

    pub units: ScoreUnits,

    /// Date of the time trial
    pub date: NaiveDate,
}

/// Feedback statistics per user, day type and modality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub user_id: String,
    pub day_type: DayType,
    pub modality: Modality,

    /// Smoothed ratio of actual to target pace
    pub rolling_avg_ratio: Option<Decimal>,

    /// Best observed max-effort pace
    pub learned_max_pace: Option<Decimal>,

    /// Number of sessions folded into the statistics
    #[serde(default)]
    pub sample_count: u32,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Training program layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProgramVersion {
    #[default]
    #[serde(rename = "5-day")]
    FiveDay,
    #[serde(rename = "3-day")]
    ThreeDay,
}

impl ProgramVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramVersion::FiveDay => "5-day",
            ProgramVersion::ThreeDay => "3-day",
        }
    }
}

impl fmt::Display for ProgramVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProgramVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "5-day" => Ok(ProgramVersion::FiveDay),
            "3-day" => Ok(ProgramVersion::ThreeDay),
            _ => Err(format!("Unknown program version: {}", s)),
        }
    }
}

/// Persisted record of a completed session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub user_id: String,

    /// Source day number
    pub program_day: u32,
    pub program_version: ProgramVersion,

    /// Day number within the user's program version
    pub program_day_number: u32,

    pub workout_id: String,
    pub day_type: DayType,
    pub date: NaiveDate,
    pub modality: Modality,

    /// Total output entered by the user
    pub total_output: Decimal,

    /// Output per minute of work time
    pub actual_pace: Decimal,

    /// Mean target pace over intervals that had one
    pub target_pace: Option<Decimal>,

    pub performance_ratio: Option<Decimal>,

    pub average_heart_rate: Option<u16>,
    pub peak_heart_rate: Option<u16>,
    pub perceived_exertion: Option<u8>,

    pub intervals_completed: u32,
    pub total_intervals: u32,
}

impl SessionResult {
    /// History predicate: same modality and day type
    pub fn matches(&self, modality: &Modality, day_type: &DayType) -> bool {
        &self.modality == modality && &self.day_type == day_type
    }
}

/// New performance sample for the store to blend into its statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsUpdate {
    pub user_id: String,
    pub day_type: DayType,
    pub modality: Modality,
    pub new_ratio: Option<Decimal>,
    pub new_pace: Option<Decimal>,
    pub is_max_effort: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_day_type_tags_round_trip_through_serde() {
        let json = serde_json::to_string(&DayType::DescendingDevour).unwrap();
        assert_eq!(json, "\"descending_devour\"");

        let parsed: DayType = serde_json::from_str("\"rocket_races_b\"").unwrap();
        assert_eq!(parsed, DayType::RocketRacesB);

        let unknown: DayType = serde_json::from_str("\"ladder\"").unwrap();
        assert_eq!(unknown, DayType::Other("ladder".to_string()));
        assert_eq!(unknown.as_str(), "ladder");
    }

    #[test]
    fn test_inheritance_and_max_effort() {
        assert_eq!(DayType::RocketRacesB.inherits_from(), Some(DayType::RocketRacesA));
        assert_eq!(DayType::InfinityBlock2.inherits_from(), Some(DayType::Infinity));
        assert_eq!(DayType::Towers.inherits_from(), None);

        assert!(DayType::Anaerobic.is_max_effort());
        assert!(DayType::RocketRacesB.is_max_effort());
        assert!(!DayType::Endurance.is_max_effort());
    }

    #[test]
    fn test_block_params_from_stored_json() {
        let block: Block = serde_json::from_str(
            r#"{"workDuration": 120, "restDuration": 60, "rounds": 4, "paceRange": [0.8, 0.9]}"#,
        )
        .unwrap();

        assert_eq!(block.work_duration, Some(120));
        assert_eq!(block.pace_range, Some(PaceRange::new(dec!(0.8), dec!(0.9))));
        assert!(!block.is_empty());

        let empty: Block = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_active_blocks_keep_slot_numbers() {
        let workout = WorkoutDefinition::new("w1", 3, DayType::Interval)
            .with_block(2, Block { rounds: Some(3), ..Default::default() })
            .with_block(4, Block::default());

        let numbers: Vec<u8> = workout.active_blocks().map(|(n, _)| n).collect();
        assert_eq!(numbers, vec![2]);
    }

    #[test]
    fn test_units_and_program_version_parsing() {
        assert_eq!("Watts".parse::<ScoreUnits>().unwrap(), ScoreUnits::Watts);
        assert!("furlongs".parse::<ScoreUnits>().is_err());
        assert_eq!("3-day".parse::<ProgramVersion>().unwrap(), ProgramVersion::ThreeDay);
        assert_eq!(ProgramVersion::default(), ProgramVersion::FiveDay);
    }

    fn single_block(day_type: DayType, block: Block) -> WorkoutDefinition {
        WorkoutDefinition::new("w", 1, day_type).with_block(1, block)
    }

    #[test]
    fn test_validate_accepts_ordinary_definitions() {
        let workout = single_block(
            DayType::Infinity,
            Block {
                work_duration: Some(60),
                rounds: Some(4),
                pace_range: Some(PaceRange::new(dec!(0.8), dec!(1.0))),
                ..Default::default()
            },
        );
        assert!(workout.validate().is_ok());
        assert!(WorkoutDefinition::new("empty", 2, DayType::Other("emom".into())).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_pace_ranges() {
        let inverted = single_block(
            DayType::Infinity,
            Block {
                rounds: Some(3),
                pace_range: Some(PaceRange::new(dec!(1.0), dec!(0.8))),
                ..Default::default()
            },
        );
        match inverted.validate() {
            Err(ValidationError::InvalidDefinition { reason }) => {
                assert!(reason.contains("block 1"));
                assert!(reason.contains("inverted"));
            }
            other => panic!("expected InvalidDefinition, got {:?}", other),
        }

        let negative = single_block(
            DayType::Interval,
            Block {
                pace_range: Some(PaceRange::new(dec!(-0.5), dec!(0.8))),
                ..Default::default()
            },
        );
        assert!(matches!(negative.validate(), Err(ValidationError::InvalidDefinition { .. })));
        assert!(!PaceRange::new(dec!(-0.5), dec!(0.8)).is_valid());
        assert!(PaceRange::fixed(dec!(0)).is_valid());
    }

    #[test]
    fn test_validate_rejects_oversized_durations() {
        let runaway_ascending = single_block(
            DayType::Ascending,
            Block {
                work_duration: Some(60),
                rounds: Some(3),
                work_duration_increment: Some(3_000_000_000),
                ..Default::default()
            },
        );
        assert!(matches!(
            runaway_ascending.validate(),
            Err(ValidationError::InvalidDefinition { .. })
        ));

        let long_work = single_block(
            DayType::Towers,
            Block {
                work_duration: Some(u32::MAX),
                ..Default::default()
            },
        );
        assert!(long_work.validate().is_err());

        let many_rounds = single_block(
            DayType::Interval,
            Block {
                rounds: Some(MAX_ROUNDS + 1),
                ..Default::default()
            },
        );
        assert!(many_rounds.validate().is_err());

        let mut fallback = WorkoutDefinition::new("w", 1, DayType::Endurance);
        fallback.total_work_time = Some(MAX_PHASE_SECONDS + 1);
        assert!(matches!(
            fallback.validate(),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_midpoint_and_total_seconds() {
        assert_eq!(PaceRange::new(dec!(0.8), dec!(0.9)).midpoint(), dec!(0.85));

        let interval = Interval {
            id: 1,
            day_type: DayType::Interval,
            description: "Interval - Round 1".to_string(),
            duration: u32::MAX,
            rest_duration: 30,
            block_number: Some(1),
            round_number: Some(1),
            pace_range: None,
            pace_progression: None,
            is_max_effort: false,
            target_pace: None,
            actual_output: Decimal::ZERO,
            work_completed: false,
            completed: false,
        };
        assert_eq!(interval.total_seconds(), u32::MAX);
    }
}

//! Interval planning: expands a workout definition into ordered work/rest
//! segments.
//!
//! Planning is a pure function of the definition and the planner settings,
//! so the same workout always yields the same interval sequence.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog;
use crate::models::{Block, DayType, Interval, PaceRange, WorkoutDefinition};

/// Tower lengths as multiples of the block's work duration
pub const TOWER_FACTORS: [Decimal; 5] = [dec!(0.5), dec!(1), dec!(1.5), dec!(2), dec!(2.5)];

/// Planner defaults applied to unset block parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerSettings {
    /// Work seconds when a block leaves it unset or zero (default: 60)
    pub default_work_duration: u32,

    /// Rest seconds when a block leaves it unset (default: 0)
    pub default_rest_duration: u32,

    /// Rounds when a block leaves it unset or zero (default: 1)
    pub default_rounds: u32,

    /// Rest after each tower when the block has none (default: 60)
    pub tower_default_rest: u32,

    /// Atomic work phase scale (default: 0.3)
    pub atomic_work_scale: Decimal,

    /// Atomic rest phase scale (default: 0.2)
    pub atomic_rest_scale: Decimal,

    /// Rest seconds scaled by atomic days when the block has none (default: 60)
    pub atomic_default_rest: u32,

    /// Multiplier range for infinity days without a pace range
    pub infinity_default_range: PaceRange,

    /// Ascending work increase per round in seconds (default: 30)
    pub ascending_default_increment: u32,

    /// Descending devour rest decrease per round in seconds (default: 10)
    pub descending_default_increment: u32,

    /// Fallback interval length when nothing else is planned (default: 20 min)
    pub fallback_duration: u32,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        PlannerSettings {
            default_work_duration: 60,
            default_rest_duration: 0,
            default_rounds: 1,
            tower_default_rest: 60,
            atomic_work_scale: dec!(0.3),
            atomic_rest_scale: dec!(0.2),
            atomic_default_rest: 60,
            infinity_default_range: PaceRange::new(dec!(0.85), dec!(1.0)),
            ascending_default_increment: 30,
            descending_default_increment: 10,
            fallback_duration: 20 * 60,
        }
    }
}

/// Interval generation rule a day type maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationRule {
    /// One unbroken interval per block
    Continuous,
    /// Five-step pyramid per block
    Towers,
    /// Short scaled bursts
    Atomic,
    /// Constant durations, pace climbing across rounds
    Infinity,
    /// Work grows each round
    Ascending,
    /// Rest shrinks each round
    DescendingDevour,
    /// Constant work/rest rounds
    Standard,
}

impl GenerationRule {
    pub fn for_day_type(day_type: &DayType) -> Self {
        match day_type {
            DayType::Endurance | DayType::TimeTrial => GenerationRule::Continuous,
            DayType::Towers => GenerationRule::Towers,
            DayType::Atomic => GenerationRule::Atomic,
            DayType::Infinity => GenerationRule::Infinity,
            DayType::Ascending => GenerationRule::Ascending,
            DayType::DescendingDevour => GenerationRule::DescendingDevour,
            DayType::TowersBlock1
            | DayType::AtomicBlock2
            | DayType::InfinityBlock1
            | DayType::InfinityBlock2
            | DayType::RocketRacesB => day_type
                .inherits_from()
                .map_or(GenerationRule::Standard, |parent| Self::for_day_type(&parent)),
            DayType::Anaerobic
            | DayType::MaxAerobicPower
            | DayType::Interval
            | DayType::Polarized
            | DayType::Threshold
            | DayType::Tempo
            | DayType::Recovery
            | DayType::Flux
            | DayType::FluxStages
            | DayType::Devour
            | DayType::Afterburner
            | DayType::Synthesis
            | DayType::HybridAnaerobic
            | DayType::HybridAerobic
            | DayType::Descending
            | DayType::AscendingDevour
            | DayType::RocketRacesA
            | DayType::Other(_) => GenerationRule::Standard,
        }
    }
}

/// Block parameters with planner defaults applied
#[derive(Debug, Clone)]
struct BlockParams {
    number: u8,
    work: u32,
    rest: u32,
    rounds: u32,
    pace_range: Option<PaceRange>,
    pace_progression: Option<String>,
    is_max_effort: bool,
    work_increment: Option<u32>,
    rest_increment: Option<i32>,
}

/// Interval before id assignment
#[derive(Debug, Clone)]
struct Draft {
    description: String,
    duration: u32,
    rest_duration: u32,
    block_number: u8,
    round_number: u32,
    pace_range: Option<PaceRange>,
    pace_progression: Option<String>,
    is_max_effort: bool,
}

/// Expands workout definitions into interval sequences
#[derive(Debug, Clone, Default)]
pub struct IntervalPlanner {
    settings: PlannerSettings,
}

impl IntervalPlanner {
    pub fn new(settings: PlannerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    /// Plan every active block in block order, then round order.
    ///
    /// Ids run from 1 across all blocks. When no block yields anything a
    /// single fallback interval covering the total work time is returned.
    pub fn plan(&self, workout: &WorkoutDefinition) -> Vec<Interval> {
        let rule = GenerationRule::for_day_type(&workout.day_type);
        let label = catalog::display_name(&workout.day_type);

        let mut drafts = Vec::new();
        for (number, block) in workout.active_blocks() {
            let params = self.resolve(number, block);
            debug!(
                day_type = %workout.day_type,
                block = number,
                rule = ?rule,
                work = params.work,
                rest = params.rest,
                rounds = params.rounds,
                "Planning block"
            );

            match rule {
                GenerationRule::Continuous => {
                    drafts.push(self.continuous(&params, &workout.day_type, &label))
                }
                GenerationRule::Towers => drafts.extend(self.towers(&params, &label)),
                GenerationRule::Atomic => drafts.extend(self.atomic(&params, &label)),
                GenerationRule::Infinity => drafts.extend(self.infinity(&params, &label)),
                GenerationRule::Ascending => drafts.extend(self.ascending(&params, &label)),
                GenerationRule::DescendingDevour => {
                    drafts.extend(self.descending_devour(&params, &label))
                }
                GenerationRule::Standard => drafts.extend(self.standard(&params, &label)),
            }
        }

        if drafts.is_empty() {
            debug!(day_type = %workout.day_type, "No block produced intervals, using fallback");
            return vec![self.fallback(workout, label)];
        }

        drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| Interval {
                id: index as u32 + 1,
                day_type: workout.day_type.clone(),
                description: draft.description,
                duration: draft.duration,
                rest_duration: draft.rest_duration,
                block_number: Some(draft.block_number),
                round_number: Some(draft.round_number),
                pace_range: draft.pace_range,
                pace_progression: draft.pace_progression,
                is_max_effort: draft.is_max_effort,
                target_pace: None,
                actual_output: Decimal::ZERO,
                work_completed: false,
                completed: false,
            })
            .collect()
    }

    fn resolve(&self, number: u8, block: &Block) -> BlockParams {
        let defaults = &self.settings;
        BlockParams {
            number,
            work: block
                .work_duration
                .filter(|&w| w > 0)
                .unwrap_or(defaults.default_work_duration),
            rest: block.rest_duration.unwrap_or(defaults.default_rest_duration),
            rounds: block
                .rounds
                .filter(|&r| r > 0)
                .unwrap_or(defaults.default_rounds),
            pace_range: block.pace_range,
            pace_progression: block.pace_progression.clone(),
            is_max_effort: block.is_max_effort.unwrap_or(false),
            work_increment: block.work_duration_increment,
            rest_increment: block.rest_duration_increment,
        }
    }

    fn draft(&self, params: &BlockParams, round: u32, description: String) -> Draft {
        Draft {
            description,
            duration: params.work,
            rest_duration: params.rest,
            block_number: params.number,
            round_number: round,
            pace_range: params.pace_range,
            pace_progression: None,
            is_max_effort: false,
        }
    }

    fn continuous(&self, params: &BlockParams, day_type: &DayType, label: &str) -> Draft {
        Draft {
            rest_duration: 0,
            is_max_effort: matches!(day_type, DayType::TimeTrial | DayType::Anaerobic)
                || params.is_max_effort,
            ..self.draft(params, 1, label.to_string())
        }
    }

    fn towers(&self, params: &BlockParams, label: &str) -> Vec<Draft> {
        let rest = if params.rest > 0 {
            params.rest
        } else {
            self.settings.tower_default_rest
        };

        TOWER_FACTORS
            .iter()
            .enumerate()
            .map(|(i, factor)| Draft {
                duration: round_seconds(Decimal::from(params.work) * factor),
                rest_duration: rest,
                ..self.draft(params, i as u32 + 1, format!("{} - Tower {}", label, i + 1))
            })
            .collect()
    }

    fn atomic(&self, params: &BlockParams, label: &str) -> Vec<Draft> {
        let base_rest = if params.rest > 0 {
            params.rest
        } else {
            self.settings.atomic_default_rest
        };
        let work = round_seconds(Decimal::from(params.work) * self.settings.atomic_work_scale);
        let rest = round_seconds(Decimal::from(base_rest) * self.settings.atomic_rest_scale);

        (1..=params.rounds)
            .map(|round| Draft {
                duration: work,
                rest_duration: rest,
                ..self.draft(params, round, format!("{} - Burst {}", label, round))
            })
            .collect()
    }

    fn infinity(&self, params: &BlockParams, label: &str) -> Vec<Draft> {
        let range = params
            .pace_range
            .unwrap_or(self.settings.infinity_default_range);

        (0..params.rounds)
            .map(|i| {
                let multiplier = interpolate(range, i, params.rounds);
                Draft {
                    pace_range: Some(PaceRange::fixed(multiplier)),
                    pace_progression: Some("increasing".to_string()),
                    ..self.draft(params, i + 1, format!("{} - Round {}", label, i + 1))
                }
            })
            .collect()
    }

    fn ascending(&self, params: &BlockParams, label: &str) -> Vec<Draft> {
        let increment = params
            .work_increment
            .filter(|&inc| inc > 0)
            .unwrap_or(self.settings.ascending_default_increment);

        (0..params.rounds)
            .map(|i| Draft {
                duration: params.work.saturating_add(increment.saturating_mul(i)),
                ..self.draft(params, i + 1, format!("{} - Round {}", label, i + 1))
            })
            .collect()
    }

    fn descending_devour(&self, params: &BlockParams, label: &str) -> Vec<Draft> {
        let decrement = params
            .rest_increment
            .filter(|&inc| inc != 0)
            .map(|inc| inc.unsigned_abs())
            .unwrap_or(self.settings.descending_default_increment);

        (0..params.rounds)
            .map(|i| Draft {
                rest_duration: params.rest.saturating_sub(decrement.saturating_mul(i)),
                ..self.draft(params, i + 1, format!("{} - Round {}", label, i + 1))
            })
            .collect()
    }

    fn standard(&self, params: &BlockParams, label: &str) -> Vec<Draft> {
        (1..=params.rounds)
            .map(|round| Draft {
                pace_progression: params.pace_progression.clone(),
                is_max_effort: params.is_max_effort,
                ..self.draft(params, round, format!("{} - Round {}", label, round))
            })
            .collect()
    }

    fn fallback(&self, workout: &WorkoutDefinition, label: String) -> Interval {
        let duration = workout
            .total_work_time
            .filter(|&t| t > 0)
            .unwrap_or(self.settings.fallback_duration);

        Interval {
            id: 1,
            day_type: workout.day_type.clone(),
            description: workout.description.clone().unwrap_or(label),
            duration,
            rest_duration: 0,
            block_number: None,
            round_number: None,
            pace_range: None,
            pace_progression: None,
            is_max_effort: false,
            target_pace: None,
            actual_output: Decimal::ZERO,
            work_completed: false,
            completed: false,
        }
    }
}

/// Linear position of round `index` between the range ends; a single round sits at min
fn interpolate(range: PaceRange, index: u32, rounds: u32) -> Decimal {
    if rounds <= 1 {
        return range.min;
    }
    let progress = Decimal::from(index) / Decimal::from(rounds - 1);
    range
        .max
        .checked_sub(range.min)
        .and_then(|span| span.checked_mul(progress))
        .and_then(|offset| range.min.checked_add(offset))
        .unwrap_or(range.min)
}

/// Round to the nearest whole second, halves away from zero. Inputs are
/// non-negative; anything past `u32::MAX` saturates.
fn round_seconds(value: Decimal) -> u32 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(u32::MAX)
}

/// Sum of work phases, saturating
pub fn total_work_seconds(intervals: &[Interval]) -> u32 {
    intervals
        .iter()
        .fold(0u32, |total, i| total.saturating_add(i.duration))
}

/// Sum of rest phases, saturating
pub fn total_rest_seconds(intervals: &[Interval]) -> u32 {
    intervals
        .iter()
        .fold(0u32, |total, i| total.saturating_add(i.rest_duration))
}

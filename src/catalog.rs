//! Static lookup data: day-type labels and colors, modality catalogue.

use crate::models::{DayType, Modality};

/// Display data for one day-type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayTypeInfo {
    pub tag: &'static str,
    pub display_name: &'static str,
    /// Hex color for badges
    pub color: &'static str,
}

/// Color for tags missing from the table
pub const DEFAULT_COLOR: &str = "#6b7280";

pub const DAY_TYPES: &[DayTypeInfo] = &[
    DayTypeInfo { tag: "time_trial", display_name: "Time Trial", color: "#ef4444" },
    DayTypeInfo { tag: "endurance", display_name: "Endurance", color: "#10b981" },
    DayTypeInfo { tag: "anaerobic", display_name: "Anaerobic", color: "#f59e0b" },
    DayTypeInfo { tag: "max_aerobic_power", display_name: "Max Aerobic Power", color: "#8b5cf6" },
    DayTypeInfo { tag: "interval", display_name: "Interval", color: "#3b82f6" },
    DayTypeInfo { tag: "polarized", display_name: "Polarized", color: "#ec4899" },
    DayTypeInfo { tag: "threshold", display_name: "Threshold", color: "#06b6d4" },
    DayTypeInfo { tag: "tempo", display_name: "Tempo", color: "#84cc16" },
    DayTypeInfo { tag: "recovery", display_name: "Recovery", color: "#6b7280" },
    DayTypeInfo { tag: "flux", display_name: "Flux", color: "#14b8a6" },
    DayTypeInfo { tag: "flux_stages", display_name: "Flux Stages", color: "#14b8a6" },
    DayTypeInfo { tag: "devour", display_name: "Devour", color: "#a855f7" },
    DayTypeInfo { tag: "towers", display_name: "Towers", color: "#f97316" },
    DayTypeInfo { tag: "towers_block_1", display_name: "Towers", color: "#f97316" },
    DayTypeInfo { tag: "afterburner", display_name: "Afterburner", color: "#dc2626" },
    DayTypeInfo { tag: "synthesis", display_name: "Synthesis", color: "#6366f1" },
    DayTypeInfo { tag: "hybrid_anaerobic", display_name: "Hybrid Anaerobic", color: "#f43f5e" },
    DayTypeInfo { tag: "hybrid_aerobic", display_name: "Hybrid Aerobic", color: "#22c55e" },
    DayTypeInfo { tag: "ascending", display_name: "Ascending", color: "#eab308" },
    DayTypeInfo { tag: "descending", display_name: "Descending", color: "#a16207" },
    DayTypeInfo { tag: "ascending_devour", display_name: "Ascending Devour", color: "#eab308" },
    DayTypeInfo { tag: "descending_devour", display_name: "Descending Devour", color: "#a16207" },
    DayTypeInfo { tag: "infinity", display_name: "Infinity", color: "#7c3aed" },
    DayTypeInfo { tag: "infinity_block_1", display_name: "Infinity", color: "#7c3aed" },
    DayTypeInfo { tag: "infinity_block_2", display_name: "Infinity", color: "#7c3aed" },
    DayTypeInfo { tag: "atomic", display_name: "Atomic", color: "#06b6d4" },
    DayTypeInfo { tag: "atomic_block_2", display_name: "Atomic", color: "#06b6d4" },
    DayTypeInfo { tag: "rocket_races_a", display_name: "Rocket Race A", color: "#ef4444" },
    DayTypeInfo { tag: "rocket_races_b", display_name: "Rocket Race B", color: "#ef4444" },
];

pub fn day_type_info(day_type: &DayType) -> Option<&'static DayTypeInfo> {
    DAY_TYPES.iter().find(|info| info.tag == day_type.as_str())
}

/// Label for a day type; unknown tags are title-cased ("max_hr_ladder" -> "Max Hr Ladder")
pub fn display_name(day_type: &DayType) -> String {
    match day_type_info(day_type) {
        Some(info) => info.display_name.to_string(),
        None => title_case(day_type.as_str()),
    }
}

pub fn color(day_type: &DayType) -> &'static str {
    day_type_info(day_type).map_or(DEFAULT_COLOR, |info| info.color)
}

fn title_case(tag: &str) -> String {
    let words: Vec<String> = tag
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();

    if words.is_empty() {
        "Workout".to_string()
    } else {
        words.join(" ")
    }
}

/// Equipment family a modality belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalityCategory {
    Rowing,
    Cycling,
    Ski,
    Treadmill,
    Running,
}

impl ModalityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModalityCategory::Rowing => "Rowing",
            ModalityCategory::Cycling => "Cycling",
            ModalityCategory::Ski => "Ski",
            ModalityCategory::Treadmill => "Treadmill",
            ModalityCategory::Running => "Running",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalityInfo {
    pub tag: &'static str,
    pub label: &'static str,
    pub category: ModalityCategory,
}

pub const MODALITIES: &[ModalityInfo] = &[
    ModalityInfo { tag: "c2_row_erg", label: "C2 Rowing Erg", category: ModalityCategory::Rowing },
    ModalityInfo { tag: "rogue_row_erg", label: "Rogue Rowing Erg", category: ModalityCategory::Rowing },
    ModalityInfo { tag: "c2_bike_erg", label: "C2 Bike Erg", category: ModalityCategory::Cycling },
    ModalityInfo { tag: "echo_bike", label: "Echo Bike", category: ModalityCategory::Cycling },
    ModalityInfo { tag: "assault_bike", label: "Assault Bike", category: ModalityCategory::Cycling },
    ModalityInfo { tag: "airdyne_bike", label: "AirDyne Bike", category: ModalityCategory::Cycling },
    ModalityInfo { tag: "other_bike", label: "Other Bike", category: ModalityCategory::Cycling },
    ModalityInfo { tag: "c2_ski_erg", label: "C2 Ski Erg", category: ModalityCategory::Ski },
    ModalityInfo { tag: "assault_runner", label: "Assault Runner Treadmill", category: ModalityCategory::Treadmill },
    ModalityInfo { tag: "trueform_treadmill", label: "TrueForm Treadmill", category: ModalityCategory::Treadmill },
    ModalityInfo { tag: "motorized_treadmill", label: "Motorized Treadmill", category: ModalityCategory::Treadmill },
    ModalityInfo { tag: "outdoor_run", label: "Outdoor Run", category: ModalityCategory::Running },
];

pub fn modality_info(modality: &Modality) -> Option<&'static ModalityInfo> {
    MODALITIES.iter().find(|info| info.tag == modality.as_str())
}

pub fn is_known_modality(modality: &Modality) -> bool {
    modality_info(modality).is_some()
}

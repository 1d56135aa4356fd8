//! Text formatting for timers, progress and result tables.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::catalog;
use crate::models::{Interval, SessionResult};

/// `mm:ss`, minutes uncapped
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// `N min` under an hour, otherwise `Hh` or `Hh Mmin`
pub fn format_duration(total_seconds: u32) -> String {
    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{} min", minutes);
    }
    let hours = minutes / 60;
    match minutes % 60 {
        0 => format!("{}h", hours),
        rest => format!("{}h {}min", hours, rest),
    }
}

/// Completed intervals as a rounded percentage
pub fn progress_percentage(intervals: &[Interval]) -> u32 {
    if intervals.is_empty() {
        return 0;
    }
    let completed = intervals.iter().filter(|i| i.completed).count() as u64;
    let total = intervals.len() as u64;
    ((completed * 200 + total) / (total * 2)) as u32
}

/// Hex color band for a progress percentage
pub fn progress_color(percentage: u32) -> &'static str {
    match percentage {
        100.. => "#3b82f6",
        75..=99 => "#22c55e",
        50..=74 => "#eab308",
        25..=49 => "#f59e0b",
        _ => "#ef4444",
    }
}

#[derive(Tabled)]
struct IntervalRow {
    #[tabled(rename = "#")]
    id: u32,
    #[tabled(rename = "Interval")]
    description: String,
    #[tabled(rename = "Work")]
    work: String,
    #[tabled(rename = "Rest")]
    rest: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Intensity")]
    intensity: String,
    #[tabled(rename = "Source")]
    source: String,
}

pub fn interval_table(intervals: &[Interval]) -> String {
    let rows = intervals.iter().map(|i| {
        let target = i.target_pace.as_ref();
        IntervalRow {
            id: i.id,
            description: i.description.clone(),
            work: format_time(i.duration),
            rest: if i.rest_duration > 0 {
                format_time(i.rest_duration)
            } else {
                "-".to_string()
            },
            target: target.map_or("-".to_string(), |t| {
                format!("{} {}/min", t.pace.round_dp(1), t.units)
            }),
            intensity: target.map_or("-".to_string(), |t| format!("{}%", t.intensity_percent)),
            source: target.map_or("-".to_string(), |t| t.source.as_str().to_string()),
        }
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Day")]
    day: String,
    #[tabled(rename = "Output")]
    output: String,
    #[tabled(rename = "Pace")]
    pace: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Ratio")]
    ratio: String,
    #[tabled(rename = "RPE")]
    rpe: String,
    #[tabled(rename = "Done")]
    done: String,
}

pub fn history_table(sessions: &[SessionResult]) -> String {
    let rows = sessions.iter().map(|s| HistoryRow {
        date: s.date.to_string(),
        day: format!("{} ({})", s.program_day_number, s.program_version),
        output: s.total_output.to_string(),
        pace: s.actual_pace.round_dp(1).to_string(),
        target: s.target_pace.map_or("-".to_string(), |p| p.round_dp(1).to_string()),
        ratio: s.performance_ratio.map_or("-".to_string(), |r| r.round_dp(2).to_string()),
        rpe: s.perceived_exertion.map_or("-".to_string(), |r| r.to_string()),
        done: format!("{}/{}", s.intervals_completed, s.total_intervals),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct DayTypeRow {
    #[tabled(rename = "Tag")]
    tag: &'static str,
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Color")]
    color: &'static str,
}

#[derive(Tabled)]
struct ModalityRow {
    #[tabled(rename = "Tag")]
    tag: &'static str,
    #[tabled(rename = "Label")]
    label: &'static str,
    #[tabled(rename = "Category")]
    category: &'static str,
}

pub fn day_type_table() -> String {
    let rows = catalog::DAY_TYPES.iter().map(|info| DayTypeRow {
        tag: info.tag,
        name: info.display_name,
        color: info.color,
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn modality_table() -> String {
    let rows = catalog::MODALITIES.iter().map(|info| ModalityRow {
        tag: info.tag,
        label: info.label,
        category: info.category.as_str(),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayType, Interval};
    use rust_decimal::Decimal;

    fn intervals(completed: usize, total: usize) -> Vec<Interval> {
        (0..total)
            .map(|i| Interval {
                id: i as u32 + 1,
                day_type: DayType::Interval,
                description: format!("Interval - Round {}", i + 1),
                duration: 60,
                rest_duration: 0,
                block_number: Some(1),
                round_number: Some(i as u32 + 1),
                pace_range: None,
                pace_progression: None,
                is_max_effort: false,
                target_pace: None,
                actual_output: Decimal::ZERO,
                work_completed: i < completed,
                completed: i < completed,
            })
            .collect()
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(95), "01:35");
        assert_eq!(format_time(3725), "62:05");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0 min");
        assert_eq!(format_duration(1500), "25 min");
        assert_eq!(format_duration(3600), "1h");
        assert_eq!(format_duration(5400), "1h 30min");
    }

    #[test]
    fn test_progress() {
        assert_eq!(progress_percentage(&[]), 0);
        assert_eq!(progress_percentage(&intervals(1, 3)), 33);
        assert_eq!(progress_percentage(&intervals(1, 8)), 13);
        assert_eq!(progress_percentage(&intervals(3, 3)), 100);

        assert_eq!(progress_color(100), "#3b82f6");
        assert_eq!(progress_color(75), "#22c55e");
        assert_eq!(progress_color(50), "#eab308");
        assert_eq!(progress_color(25), "#f59e0b");
        assert_eq!(progress_color(24), "#ef4444");
    }

    #[test]
    fn test_interval_table_lists_every_interval() {
        let table = interval_table(&intervals(0, 2));
        assert!(table.contains("Interval - Round 2"));
        assert!(table.contains("01:00"));
    }
}

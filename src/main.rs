use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use rust_decimal::Decimal;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tokio::sync::mpsc;

use intervalrs::display;
use intervalrs::planner;
use intervalrs::ticker::{self, DriveOutcome, ManualTicks, TimerCommand};
use intervalrs::{
    catalog, pacing, AppConfig, Baseline, DataStore, DayType, Interval, MemoryStore, Modality,
    PaceRange, PerformanceMetrics, ResultEntry, ScoreUnits, SqliteStore, TimerEvent,
    TrainingSession, WorkoutDefinition,
};

/// intervalrs - Interval Training Engine
///
/// Plans interval workouts, paces them against your time-trial baselines and
/// runs the work/rest countdown.
#[derive(Parser)]
#[command(name = "intervalrs")]
#[command(version)]
#[command(about = "Interval training planner, pacer and timer", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the planned intervals for a program day
    Plan {
        /// Program day number
        #[arg(short, long)]
        day: u32,

        /// Modality to compute target paces for
        #[arg(short, long)]
        modality: Option<String>,
    },

    /// Compute a single target pace
    Pace {
        /// Baseline rate (units per minute)
        #[arg(short, long)]
        baseline: Decimal,

        /// Pace range as MIN,MAX multipliers
        #[arg(short, long, value_parser = parse_range)]
        range: Option<PaceRange>,

        /// Rolling average performance ratio
        #[arg(long)]
        ratio: Option<Decimal>,

        /// Learned max pace
        #[arg(long)]
        learned_max: Option<Decimal>,

        /// Day type tag
        #[arg(short, long, default_value = "interval")]
        day_type: String,

        /// Treat the interval as max effort
        #[arg(long)]
        max_effort: bool,
    },

    /// Run a session: p = pause, r = resume, s = skip to end
    Run {
        #[arg(short, long)]
        day: u32,

        #[arg(short, long)]
        modality: Option<String>,

        /// Total output, saves the result when the session completes
        #[arg(short = 'o', long)]
        total_output: Option<String>,

        #[arg(long)]
        avg_hr: Option<String>,

        #[arg(long)]
        peak_hr: Option<String>,

        #[arg(long)]
        rpe: Option<String>,

        /// Tick as fast as possible instead of once per second
        #[arg(long)]
        fast: bool,
    },

    /// Record a 10-minute time trial score as the new baseline
    TimeTrial {
        #[arg(short, long)]
        modality: String,

        /// Total output over the trial
        #[arg(short, long)]
        score: String,

        /// Units (cal, watts, mph, kph, miles, meters)
        #[arg(short, long)]
        units: ScoreUnits,

        /// Trial date (YYYY-MM-DD), today if omitted
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Past results for a day's type and a modality
    History {
        #[arg(short, long)]
        day: u32,

        #[arg(short, long)]
        modality: Option<String>,

        /// Maximum rows to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Store a workout definition from a JSON file
    LoadWorkout {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List day types and modalities
    Catalog {
        /// Show modalities instead of day types
        #[arg(long)]
        modalities: bool,
    },
}

fn parse_range(raw: &str) -> std::result::Result<PaceRange, String> {
    let (min, max) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected MIN,MAX, got {:?}", raw))?;
    let min: Decimal = min.trim().parse().map_err(|e| format!("bad min: {}", e))?;
    let max: Decimal = max.trim().parse().map_err(|e| format!("bad max: {}", e))?;
    let range = PaceRange::new(min, max);
    if !range.is_valid() {
        return Err(format!("range must be non-negative with MIN <= MAX, got {}", raw));
    }
    Ok(range)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default(),
    };
    let _log_guard = intervalrs::logging::init_logging(&config.logging.with_verbosity(cli.verbose))?;

    match cli.command {
        Commands::Plan { day, modality } => {
            let mut session = open_session(&config);
            session.load_workout(day).map_err(user_error)?;
            if let Some(modality) = resolve_modality(&config, modality) {
                session.select_modality(modality).map_err(user_error)?;
            }
            print_plan(&session);
        }

        Commands::Pace {
            baseline,
            range,
            ratio,
            learned_max,
            day_type,
            max_effort,
        } => {
            let day_type = DayType::from_tag(&day_type);
            let interval = Interval {
                id: 1,
                day_type: day_type.clone(),
                description: catalog::display_name(&day_type),
                duration: 60,
                rest_duration: 0,
                block_number: None,
                round_number: None,
                pace_range: range,
                pace_progression: None,
                is_max_effort: max_effort,
                target_pace: None,
                actual_output: Decimal::ZERO,
                work_completed: false,
                completed: false,
            };
            let baseline = Baseline {
                user_id: config.session.user_id.clone(),
                modality: Modality::from("manual"),
                rate: baseline,
                units: ScoreUnits::Cal,
                date: Utc::now().date_naive(),
            };
            let metrics = (ratio.is_some() || learned_max.is_some()).then(|| PerformanceMetrics {
                user_id: config.session.user_id.clone(),
                day_type: day_type.clone(),
                modality: baseline.modality.clone(),
                rolling_avg_ratio: ratio,
                learned_max_pace: learned_max,
                sample_count: 0,
                updated_at: None,
            });

            match pacing::target_pace(&interval, Some(&baseline), metrics.as_ref(), &day_type) {
                Some(target) => {
                    println!("{} {}", "Target pace:".bold(), target.pace.round_dp(2).to_string().green());
                    println!("{} {}%", "Intensity:  ".bold(), target.intensity_percent);
                    println!("{} {}", "Source:     ".bold(), target.source.as_str());
                }
                None => println!("{}", "No target: give a pace range or a learned max".yellow()),
            }
        }

        Commands::Run {
            day,
            modality,
            total_output,
            avg_hr,
            peak_hr,
            rpe,
            fast,
        } => {
            let mut session = open_session(&config);
            session.load_workout(day).map_err(user_error)?;
            let modality = resolve_modality(&config, modality)
                .context("Please select a modality before starting (--modality)")?;
            session.select_modality(modality).map_err(user_error)?;
            print_plan(&session);

            let started = session.start().map_err(user_error)?;
            print_event(&started, session.intervals());
            let outcome = run_timer(&mut session, fast).await?;
            println!();

            if outcome != DriveOutcome::Completed {
                if let Some(timer) = session.timer() {
                    let snapshot = timer.snapshot();
                    println!(
                        "{} ({}, {}% of intervals done)",
                        "Session stopped before completion".yellow(),
                        snapshot.state,
                        display::progress_percentage(timer.intervals())
                    );
                }
                return Ok(());
            }
            println!("{}", "✓ Session complete".green().bold());

            let Some(total_output) = total_output else {
                println!("Pass --total-output to save the result.");
                return Ok(());
            };
            let mut entry = ResultEntry::new(total_output);
            entry.average_heart_rate = avg_hr;
            entry.peak_heart_rate = peak_hr;
            entry.perceived_exertion = rpe;

            let outcome = session.submit(&entry).map_err(user_error)?;
            let result = &outcome.result;
            println!("  Pace:   {} /min", result.actual_pace.round_dp(2));
            if let Some(target) = result.target_pace {
                println!("  Target: {} /min", target.round_dp(2));
            }
            if let Some(ratio) = result.performance_ratio {
                println!("  Ratio:  {}", ratio.round_dp(3));
            }
            if outcome.persisted {
                println!("{}", "✓ Result saved".green());
            } else {
                println!("{}", "Demo mode: result not saved".yellow());
            }
        }

        Commands::TimeTrial {
            modality,
            score,
            units,
            date,
        } => {
            let mut session = open_session(&config);
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let baseline = session
                .record_time_trial(&Modality::new(modality), &score, units, date)
                .map_err(user_error)?;
            println!(
                "{} {} {}/min ({})",
                "✓ New baseline:".green().bold(),
                baseline.rate,
                baseline.units,
                baseline.modality
            );
        }

        Commands::History {
            day,
            modality,
            limit,
        } => {
            let mut session = open_session(&config);
            session.load_workout(day).map_err(user_error)?;
            let modality = resolve_modality(&config, modality).context("--modality is required")?;
            session.select_modality(modality).map_err(user_error)?;

            let history = session.history().map_err(user_error)?;
            if history.is_empty() {
                println!("{}", "No previous sessions".dimmed());
            } else {
                let shown = &history[..history.len().min(limit)];
                println!("{}", display::history_table(shown));
            }
        }

        Commands::LoadWorkout { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read workout file: {}", file.display()))?;
            let workout: WorkoutDefinition =
                serde_json::from_str(&content).context("Failed to parse workout definition")?;
            workout
                .validate()
                .map_err(|e| user_error(e.into()))?;
            let mut store = SqliteStore::open(&config.storage.database_path, config.metrics.clone())
                .map_err(user_error)?;
            store.save_workout_definition(&workout).map_err(user_error)?;
            println!(
                "{} day {} ({})",
                "✓ Stored workout for".green(),
                workout.day_number,
                catalog::display_name(&workout.day_type)
            );
        }

        Commands::Catalog { modalities } => {
            if modalities {
                println!("{}", display::modality_table());
            } else {
                println!("{}", display::day_type_table());
            }
        }
    }

    Ok(())
}

fn user_error(err: intervalrs::IntervalError) -> anyhow::Error {
    let level = err.severity().to_tracing_level();
    if level == tracing::Level::ERROR {
        tracing::error!(error = %err, "Command failed");
    } else if level == tracing::Level::WARN {
        tracing::warn!(error = %err, "Command refused");
    } else {
        tracing::info!(error = %err, "Command stopped");
    }
    anyhow::anyhow!(err.user_message())
}

fn resolve_modality(config: &AppConfig, flag: Option<String>) -> Option<Modality> {
    let modality = flag
        .map(Modality::new)
        .or_else(|| config.session.default_modality.clone())?;
    if !catalog::is_known_modality(&modality) {
        println!("{} {}", "Unknown modality, using as given:".yellow(), modality);
    }
    Some(modality)
}

/// SQLite store from config, or an offline store when it cannot be opened
fn open_session(config: &AppConfig) -> TrainingSession<Box<dyn DataStore>> {
    let store: Box<dyn DataStore> =
        match SqliteStore::open(&config.storage.database_path, config.metrics.clone()) {
            Ok(store) => Box::new(store),
            Err(e) => {
                tracing::warn!(error = %e, "Could not open database, working offline");
                Box::new(MemoryStore::offline())
            }
        };
    TrainingSession::from_config(store, config)
}

fn print_plan(session: &TrainingSession<Box<dyn DataStore>>) {
    let Some(workout) = session.workout() else {
        return;
    };
    let title = workout
        .description
        .clone()
        .unwrap_or_else(|| catalog::display_name(&workout.day_type));
    println!("{} {}", format!("Day {}:", workout.day_number).bold(), title.cyan());
    if session.is_demo() {
        println!("{}", "Demo Mode - connect for real data".yellow());
    }
    if let Some(baseline) = session.baseline() {
        println!(
            "Baseline: {} {}/min ({})",
            baseline.rate, baseline.units, baseline.date
        );
    }

    let intervals = session.intervals();
    println!("{}", display::interval_table(intervals));
    println!(
        "Work {}  Rest {}",
        display::format_duration(planner::total_work_seconds(intervals)),
        display::format_duration(planner::total_rest_seconds(intervals))
    );
}

/// Drive the started timer, reading controls from stdin on a plain thread
async fn run_timer(
    session: &mut TrainingSession<Box<dyn DataStore>>,
    fast: bool,
) -> Result<DriveOutcome> {
    let intervals = session.intervals().to_vec();
    let timer = session.timer_mut().context("No workout loaded")?;

    let (cmd_tx, mut cmd_rx) = mpsc::channel(16);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let stdin_tx = cmd_tx.clone();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines().map_while(|l| l.ok()) {
            let command = match line.trim() {
                "p" => TimerCommand::Pause,
                "r" => TimerCommand::Resume,
                "s" => TimerCommand::SkipToEnd,
                _ => continue,
            };
            if stdin_tx.blocking_send(command).is_err() {
                break;
            }
        }
    });

    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            print_event(&event, &intervals);
        }
    });

    let outcome = if fast {
        ticker::drive(timer, &mut ManualTicks::new(u64::MAX), &mut cmd_rx, &event_tx).await
    } else {
        ticker::drive(timer, &mut ticker::every_second(), &mut cmd_rx, &event_tx).await
    };

    drop(event_tx);
    drop(cmd_tx);
    printer.await.context("Event printer failed")?;
    Ok(outcome)
}

fn print_event(event: &TimerEvent, intervals: &[Interval]) {
    let label = |id: u32| {
        intervals
            .iter()
            .find(|i| i.id == id)
            .map_or_else(String::new, |i| i.description.clone())
    };

    match event {
        TimerEvent::Tick {
            phase,
            index,
            remaining,
        } => {
            print!(
                "\r  [{}/{}] {:<5} {}   ",
                index + 1,
                intervals.len(),
                phase.to_string(),
                display::format_time(*remaining)
            );
            let _ = std::io::stdout().flush();
        }
        TimerEvent::Started { interval_id, .. } => {
            println!("{} {}", "▶".green(), label(*interval_id));
        }
        TimerEvent::WorkCompleted { rest_duration, .. } => {
            println!("\r  {} rest {}", "✓ work done,".green(), display::format_time(*rest_duration));
        }
        TimerEvent::IntervalCompleted { next_index, .. } => {
            let next = next_index
                .and_then(|i| intervals.get(i))
                .map_or_else(String::new, |i| i.description.clone());
            println!("\r{} {}", "▶".green(), next);
        }
        TimerEvent::Paused { remaining } => {
            println!("\r{} at {}", "⏸ Paused".yellow(), display::format_time(*remaining));
        }
        TimerEvent::Resumed { .. } => println!("{}", "▶ Resumed".green()),
        TimerEvent::SessionCompleted {
            intervals_completed,
            skipped,
        } => {
            let how = if *skipped { " (skipped)" } else { "" };
            println!(
                "\r{} {}/{} intervals{}",
                "■".blue(),
                intervals_completed,
                intervals.len(),
                how
            );
        }
        TimerEvent::Reset => println!("{}", "↺ Reset".yellow()),
        TimerEvent::CommandRejected { message, .. } => println!("\r{}", message.red()),
    }
}

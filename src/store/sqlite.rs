use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

use super::{blend_metrics, DataStore, MetricsSettings};
use crate::error::{IntervalError, Result, StorageError, ValidationError};
use crate::models::{
    Baseline, Block, DayType, MetricsUpdate, Modality, PerformanceMetrics, ProgramVersion,
    ScoreUnits, SessionResult, WorkoutDefinition,
};
use crate::time_trial::TimeTrialRecord;

/// SQLite-backed store. Decimals are kept as TEXT so no precision is lost.
pub struct SqliteStore {
    conn: Connection,
    settings: MetricsSettings,
}

impl SqliteStore {
    /// Create or open a database at the specified path
    pub fn open<P: AsRef<Path>>(db_path: P, settings: MetricsSettings) -> Result<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&db_path).map_err(StorageError::from)?;
        info!(path = %db_path.as_ref().display(), "Opened SQLite store");
        Self::with_connection(conn, settings)
    }

    pub fn open_in_memory(settings: MetricsSettings) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        Self::with_connection(conn, settings)
    }

    fn with_connection(conn: Connection, settings: MetricsSettings) -> Result<Self> {
        let store = Self { conn, settings };
        store.init_schema().map_err(StorageError::from)?;
        Ok(store)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS workouts (
                day_number INTEGER PRIMARY KEY,
                id TEXT NOT NULL,
                day_type TEXT NOT NULL,
                blocks TEXT NOT NULL,
                total_work_time INTEGER,
                description TEXT
            );

            CREATE TABLE IF NOT EXISTS time_trials (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                modality TEXT NOT NULL,
                date DATE NOT NULL,
                score TEXT NOT NULL,
                units TEXT NOT NULL,
                calculated_rate TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS performance_metrics (
                user_id TEXT NOT NULL,
                day_type TEXT NOT NULL,
                modality TEXT NOT NULL,
                rolling_avg_ratio TEXT,
                learned_max_pace TEXT,
                sample_count INTEGER NOT NULL DEFAULT 0,
                updated_at DATETIME,
                PRIMARY KEY (user_id, day_type, modality)
            );

            CREATE TABLE IF NOT EXISTS session_results (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                program_day INTEGER NOT NULL,
                program_version TEXT NOT NULL,
                program_day_number INTEGER NOT NULL,
                workout_id TEXT NOT NULL,
                day_type TEXT NOT NULL,
                date DATE NOT NULL,
                modality TEXT NOT NULL,
                total_output TEXT NOT NULL,
                actual_pace TEXT NOT NULL,
                target_pace TEXT,
                performance_ratio TEXT,
                average_heart_rate INTEGER,
                peak_heart_rate INTEGER,
                perceived_exertion INTEGER,
                intervals_completed INTEGER NOT NULL,
                total_intervals INTEGER NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS user_programs (
                user_id TEXT PRIMARY KEY,
                program_version TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS program_days (
                day_number INTEGER NOT NULL,
                program_version TEXT NOT NULL,
                program_day_number INTEGER NOT NULL,
                PRIMARY KEY (day_number, program_version)
            );

            CREATE INDEX IF NOT EXISTS idx_time_trials_user_modality
                ON time_trials (user_id, modality, date);
            CREATE INDEX IF NOT EXISTS idx_session_results_user_date
                ON session_results (user_id, date);
            "#,
        )
    }

    /// Insert or replace the workout for its day number
    pub fn save_workout_definition(&mut self, workout: &WorkoutDefinition) -> Result<()> {
        let blocks = serde_json::to_string(&workout.blocks).map_err(StorageError::from)?;
        self.conn
            .execute(
                r#"
                INSERT OR REPLACE INTO workouts
                    (day_number, id, day_type, blocks, total_work_time, description)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    workout.day_number,
                    workout.id,
                    workout.day_type.as_str(),
                    blocks,
                    workout.total_work_time,
                    workout.description,
                ],
            )
            .map_err(StorageError::from)?;
        debug!(day = workout.day_number, id = %workout.id, "Saved workout definition");
        Ok(())
    }

    pub fn set_program_version(&mut self, user_id: &str, version: ProgramVersion) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO user_programs (user_id, program_version) VALUES (?1, ?2)",
                params![user_id, version.as_str()],
            )
            .map_err(StorageError::from)?;
        Ok(())
    }

    pub fn set_program_day_number(
        &mut self,
        day_number: u32,
        version: ProgramVersion,
        program_day: u32,
    ) -> Result<()> {
        self.conn
            .execute(
                r#"
                INSERT OR REPLACE INTO program_days (day_number, program_version, program_day_number)
                VALUES (?1, ?2, ?3)
                "#,
                params![day_number, version.as_str(), program_day],
            )
            .map_err(StorageError::from)?;
        Ok(())
    }
}

impl DataStore for SqliteStore {
    fn is_connected(&self) -> bool {
        true
    }

    fn fetch_workout_definition(&self, day_number: u32) -> Result<WorkoutDefinition> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, day_type, blocks, total_work_time, description
                FROM workouts WHERE day_number = ?1
                "#,
                params![day_number],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<u32>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                },
            )
            .optional()
            .map_err(StorageError::from)?;

        let (id, day_type, blocks, total_work_time, description) = row
            .ok_or_else(|| IntervalError::not_found("workout", format!("day {}", day_number)))?;

        let blocks: [Option<Block>; 4] = serde_json::from_str(&blocks).map_err(|e| {
            ValidationError::InvalidDefinition {
                reason: format!("workout {} has unreadable blocks: {}", id, e),
            }
        })?;

        Ok(WorkoutDefinition {
            id,
            day_number,
            day_type: DayType::from_tag(&day_type),
            blocks,
            total_work_time,
            description,
        })
    }

    fn fetch_baseline(&self, user_id: &str, modality: &Modality) -> Result<Baseline> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT calculated_rate, units, date FROM time_trials
                WHERE user_id = ?1 AND modality = ?2
                ORDER BY date DESC, created_at DESC
                LIMIT 1
                "#,
                params![user_id, modality.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, NaiveDate>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(StorageError::from)?;

        let (rate, units, date) = row.ok_or_else(|| IntervalError::not_found("baseline", modality))?;
        Ok(Baseline {
            user_id: user_id.to_string(),
            modality: modality.clone(),
            rate: decimal(&rate)?,
            units: ScoreUnits::from_str(&units).map_err(StorageError::Serialization)?,
            date,
        })
    }

    fn fetch_performance_metrics(
        &self,
        user_id: &str,
        day_type: &DayType,
        modality: &Modality,
    ) -> Result<Option<PerformanceMetrics>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT rolling_avg_ratio, learned_max_pace, sample_count, updated_at
                FROM performance_metrics
                WHERE user_id = ?1 AND day_type = ?2 AND modality = ?3
                "#,
                params![user_id, day_type.as_str(), modality.as_str()],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, u32>(2)?,
                        row.get::<_, Option<DateTime<Utc>>>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(StorageError::from)?;

        let Some((ratio, learned_max, sample_count, updated_at)) = row else {
            return Ok(None);
        };
        Ok(Some(PerformanceMetrics {
            user_id: user_id.to_string(),
            day_type: day_type.clone(),
            modality: modality.clone(),
            rolling_avg_ratio: optional_decimal(ratio)?,
            learned_max_pace: optional_decimal(learned_max)?,
            sample_count,
            updated_at,
        }))
    }

    fn fetch_completed_sessions(&self, user_id: &str) -> Result<Vec<SessionResult>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT program_day, program_version, program_day_number, workout_id, day_type,
                       date, modality, total_output, actual_pace, target_pace, performance_ratio,
                       average_heart_rate, peak_heart_rate, perceived_exertion,
                       intervals_completed, total_intervals
                FROM session_results WHERE user_id = ?1
                "#,
            )
            .map_err(StorageError::from)?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(SessionRow {
                    program_day: row.get(0)?,
                    program_version: row.get(1)?,
                    program_day_number: row.get(2)?,
                    workout_id: row.get(3)?,
                    day_type: row.get(4)?,
                    date: row.get(5)?,
                    modality: row.get(6)?,
                    total_output: row.get(7)?,
                    actual_pace: row.get(8)?,
                    target_pace: row.get(9)?,
                    performance_ratio: row.get(10)?,
                    average_heart_rate: row.get(11)?,
                    peak_heart_rate: row.get(12)?,
                    perceived_exertion: row.get(13)?,
                    intervals_completed: row.get(14)?,
                    total_intervals: row.get(15)?,
                })
            })
            .map_err(StorageError::from)?;

        let mut sessions = Vec::new();
        for row in rows {
            let row = row.map_err(StorageError::from)?;
            sessions.push(row.into_result(user_id)?);
        }
        Ok(sessions)
    }

    fn fetch_program_version(&self, user_id: &str) -> Result<Option<ProgramVersion>> {
        let version: Option<String> = self
            .conn
            .query_row(
                "SELECT program_version FROM user_programs WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(StorageError::from)?;

        match version {
            Some(v) => Ok(Some(
                ProgramVersion::from_str(&v).map_err(StorageError::Serialization)?,
            )),
            None => Ok(None),
        }
    }

    fn fetch_program_day_number(
        &self,
        day_number: u32,
        version: ProgramVersion,
    ) -> Result<Option<u32>> {
        let day = self
            .conn
            .query_row(
                r#"
                SELECT program_day_number FROM program_days
                WHERE day_number = ?1 AND program_version = ?2
                "#,
                params![day_number, version.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(StorageError::from)?;
        Ok(day)
    }

    fn persist_session_result(&mut self, result: &SessionResult) -> Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO session_results (
                    id, user_id, program_day, program_version, program_day_number, workout_id,
                    day_type, date, modality, total_output, actual_pace, target_pace,
                    performance_ratio, average_heart_rate, peak_heart_rate, perceived_exertion,
                    intervals_completed, total_intervals
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
                "#,
                params![
                    Uuid::new_v4().to_string(),
                    result.user_id,
                    result.program_day,
                    result.program_version.as_str(),
                    result.program_day_number,
                    result.workout_id,
                    result.day_type.as_str(),
                    result.date,
                    result.modality.as_str(),
                    result.total_output.to_string(),
                    result.actual_pace.to_string(),
                    result.target_pace.map(|d| d.to_string()),
                    result.performance_ratio.map(|d| d.to_string()),
                    result.average_heart_rate,
                    result.peak_heart_rate,
                    result.perceived_exertion,
                    result.intervals_completed,
                    result.total_intervals,
                ],
            )
            .map_err(StorageError::from)?;
        debug!(workout = %result.workout_id, date = %result.date, "Stored session result");
        Ok(())
    }

    fn persist_performance_metrics_update(
        &mut self,
        update: &MetricsUpdate,
    ) -> Result<PerformanceMetrics> {
        let existing =
            self.fetch_performance_metrics(&update.user_id, &update.day_type, &update.modality)?;
        let blended = blend_metrics(existing, update, &self.settings, Utc::now());

        self.conn
            .execute(
                r#"
                INSERT OR REPLACE INTO performance_metrics
                    (user_id, day_type, modality, rolling_avg_ratio, learned_max_pace,
                     sample_count, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    blended.user_id,
                    blended.day_type.as_str(),
                    blended.modality.as_str(),
                    blended.rolling_avg_ratio.map(|d| d.to_string()),
                    blended.learned_max_pace.map(|d| d.to_string()),
                    blended.sample_count,
                    blended.updated_at,
                ],
            )
            .map_err(StorageError::from)?;
        Ok(blended)
    }

    fn persist_time_trial(&mut self, record: &TimeTrialRecord) -> Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO time_trials
                    (id, user_id, modality, date, score, units, calculated_rate)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    Uuid::new_v4().to_string(),
                    record.user_id,
                    record.modality.as_str(),
                    record.date,
                    record.score.to_string(),
                    record.units.as_str(),
                    record.calculated_rate.to_string(),
                ],
            )
            .map_err(StorageError::from)?;
        Ok(())
    }
}

/// Raw `session_results` row before decimal parsing
struct SessionRow {
    program_day: u32,
    program_version: String,
    program_day_number: u32,
    workout_id: String,
    day_type: String,
    date: NaiveDate,
    modality: String,
    total_output: String,
    actual_pace: String,
    target_pace: Option<String>,
    performance_ratio: Option<String>,
    average_heart_rate: Option<u16>,
    peak_heart_rate: Option<u16>,
    perceived_exertion: Option<u8>,
    intervals_completed: u32,
    total_intervals: u32,
}

impl SessionRow {
    fn into_result(self, user_id: &str) -> Result<SessionResult> {
        Ok(SessionResult {
            user_id: user_id.to_string(),
            program_day: self.program_day,
            program_version: ProgramVersion::from_str(&self.program_version)
                .map_err(StorageError::Serialization)?,
            program_day_number: self.program_day_number,
            workout_id: self.workout_id,
            day_type: DayType::from_tag(&self.day_type),
            date: self.date,
            modality: Modality::new(self.modality),
            total_output: decimal(&self.total_output)?,
            actual_pace: decimal(&self.actual_pace)?,
            target_pace: optional_decimal(self.target_pace)?,
            performance_ratio: optional_decimal(self.performance_ratio)?,
            average_heart_rate: self.average_heart_rate,
            peak_heart_rate: self.peak_heart_rate,
            perceived_exertion: self.perceived_exertion,
            intervals_completed: self.intervals_completed,
            total_intervals: self.total_intervals,
        })
    }
}

fn decimal(raw: &str) -> std::result::Result<Decimal, StorageError> {
    Decimal::from_str(raw)
        .map_err(|e| StorageError::Serialization(format!("bad decimal {:?}: {}", raw, e)))
}

fn optional_decimal(raw: Option<String>) -> std::result::Result<Option<Decimal>, StorageError> {
    raw.as_deref().map(decimal).transpose()
}

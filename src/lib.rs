// Library interface for intervalrs
// Integration tests and the CLI go through these modules

pub mod aggregator;
pub mod catalog;
pub mod config;
pub mod demo;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod pacing;
pub mod planner;
pub mod session;
pub mod store;
pub mod ticker;
pub mod time_trial;
pub mod timer;

// Re-export commonly used types for convenience
pub use models::*;
pub use aggregator::{finalize, FinalizedSession, ResultEntry, SessionContext};
pub use config::AppConfig;
pub use error::{ErrorSeverity, IntervalError, Result, StorageError, ValidationError};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use pacing::{apply_targets, target_pace};
pub use planner::{GenerationRule, IntervalPlanner, PlannerSettings};
pub use session::{SubmitOutcome, TrainingSession};
pub use store::{DataStore, MemoryStore, MetricsSettings, SqliteStore};
pub use ticker::{drive, ManualTicks, TickSource, TimerCommand};
pub use timer::{SessionTimer, TimerEvent, TimerState};

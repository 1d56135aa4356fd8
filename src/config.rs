use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::IntervalError;
use crate::logging::LogConfig;
use crate::models::{Modality, ProgramVersion, MAX_PHASE_SECONDS, MAX_ROUNDS};
use crate::planner::PlannerSettings;
use crate::store::MetricsSettings;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Interval planning defaults
    #[serde(default)]
    pub planner: PlannerSettings,

    /// Performance metric blending
    #[serde(default)]
    pub metrics: MetricsSettings,

    /// Data store location and offline behavior
    #[serde(default)]
    pub storage: StorageSettings,

    /// Active user and session defaults
    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for ConfigMetadata {
    fn default() -> Self {
        let now = Utc::now();
        ConfigMetadata {
            version: "1.0".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Data store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Serve the demo workout and baselines when the store cannot be reached
    pub demo_when_offline: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            database_path: AppConfig::config_dir().join("intervalrs.db"),
            demo_when_offline: true,
        }
    }
}

/// Session defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// User the sessions are recorded for
    pub user_id: String,

    /// Modality preselected when none is given
    pub default_modality: Option<Modality>,

    /// Program layout used when the store has none on record
    pub program_version: ProgramVersion,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            user_id: "local".to_string(),
            default_modality: None,
            program_version: ProgramVersion::default(),
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// `~/.intervalrs`
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".intervalrs")
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!(
                    path = %config_path.display(),
                    error = %e,
                    "Using default configuration"
                );
                Self::default()
            }
        }
    }

    /// Save configuration to default location
    pub fn save_default(&mut self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to_file(config_path)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> std::result::Result<(), IntervalError> {
        let alpha = self.metrics.smoothing_factor;
        if alpha <= Decimal::ZERO || alpha > Decimal::ONE {
            return Err(IntervalError::Configuration(format!(
                "metrics.smoothing_factor must be in (0, 1], got {}",
                alpha
            )));
        }

        let planner = &self.planner;
        let max_scale = Decimal::TEN;
        if planner.atomic_work_scale <= Decimal::ZERO
            || planner.atomic_rest_scale < Decimal::ZERO
            || planner.atomic_work_scale > max_scale
            || planner.atomic_rest_scale > max_scale
        {
            return Err(IntervalError::Configuration(format!(
                "planner atomic scales must be positive and at most {}",
                max_scale
            )));
        }

        let durations = [
            ("planner.default_work_duration", planner.default_work_duration),
            ("planner.default_rest_duration", planner.default_rest_duration),
            ("planner.tower_default_rest", planner.tower_default_rest),
            ("planner.atomic_default_rest", planner.atomic_default_rest),
            ("planner.ascending_default_increment", planner.ascending_default_increment),
            ("planner.descending_default_increment", planner.descending_default_increment),
            ("planner.fallback_duration", planner.fallback_duration),
        ];
        if let Some((name, seconds)) = durations.iter().find(|(_, s)| *s > MAX_PHASE_SECONDS) {
            return Err(IntervalError::Configuration(format!(
                "{} must be at most {} seconds, got {}",
                name, MAX_PHASE_SECONDS, seconds
            )));
        }
        if planner.default_rounds > MAX_ROUNDS {
            return Err(IntervalError::Configuration(format!(
                "planner.default_rounds must be at most {}, got {}",
                MAX_ROUNDS, planner.default_rounds
            )));
        }

        let range = planner.infinity_default_range;
        if !range.is_valid() {
            return Err(IntervalError::Configuration(format!(
                "planner.infinity_default_range must be non-negative and ordered: [{}, {}]",
                range.min, range.max
            )));
        }

        if self.session.user_id.trim().is_empty() {
            return Err(IntervalError::Configuration(
                "session.user_id must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

//! Unified error hierarchy for intervalrs
//!
//! Every failure carries enough context (which field, which entity, which
//! transition) for a UI layer to render feedback. Nothing here is fatal to the
//! process; callers decide how to recover.

use thiserror::Error;

/// Top-level error type for all intervalrs operations
#[derive(Debug, Error)]
pub enum IntervalError {
    /// An action was attempted before its requirements were met
    #[error("Cannot {action}: {reason}")]
    Precondition { action: String, reason: String },

    /// Malformed user-entered or stored data
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A lookup against a connected store returned nothing
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Backend failure on read or write
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A timer control that the current state does not accept
    #[error("Cannot {action} while timer is {state}")]
    InvalidTransition { action: String, state: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validation failures for user-entered results and workout definitions
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Required field was left empty
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Field could not be parsed as a number
    #[error("Field {field} is not a number: {value:?}")]
    NotNumeric { field: String, value: String },

    /// Field must not be negative
    #[error("Field {field} must not be negative: {value}")]
    Negative { field: String, value: String },

    /// Field must be greater than zero
    #[error("Field {field} must be greater than zero: {value}")]
    NotPositive { field: String, value: String },

    /// Field is outside its accepted range
    #[error("Field {field}={value} outside {min}..={max}")]
    OutOfRange {
        field: String,
        value: String,
        min: String,
        max: String,
    },

    /// Workout definition cannot be planned
    #[error("Invalid workout definition: {reason}")]
    InvalidDefinition { reason: String },
}

/// Data store failures
#[derive(Debug, Error)]
pub enum StorageError {
    /// No connection to the data store
    #[error("Data store unavailable")]
    Unavailable,

    /// SQLite backend error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Stored payload could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Any other backend failure
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type alias for intervalrs operations
pub type Result<T> = std::result::Result<T, IntervalError>;

impl IntervalError {
    pub fn precondition(action: impl Into<String>, reason: impl Into<String>) -> Self {
        IntervalError::Precondition {
            action: action.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl std::fmt::Display) -> Self {
        IntervalError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// True for lookups that simply returned nothing
    pub fn is_not_found(&self) -> bool {
        matches!(self, IntervalError::NotFound { .. })
    }

    /// Check if error is retryable. The engine itself never retries writes;
    /// this only tells the caller whether trying again could help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IntervalError::Storage(StorageError::Unavailable)
                | IntervalError::Storage(StorageError::Backend(_))
                | IntervalError::Io(_)
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            IntervalError::Precondition { .. } => ErrorSeverity::Warning,
            IntervalError::Validation(_) => ErrorSeverity::Warning,
            IntervalError::NotFound { .. } => ErrorSeverity::Warning,
            IntervalError::InvalidTransition { .. } => ErrorSeverity::Info,
            IntervalError::Storage(_) => ErrorSeverity::Error,
            IntervalError::Configuration(_) => ErrorSeverity::Error,
            IntervalError::Io(_) => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            IntervalError::Precondition { reason, .. } => reason.clone(),
            IntervalError::Validation(ValidationError::MissingField { field }) => {
                format!("Please enter a value for {}", field.replace('_', " "))
            }
            IntervalError::Validation(ValidationError::NotNumeric { field, .. })
            | IntervalError::Validation(ValidationError::Negative { field, .. })
            | IntervalError::Validation(ValidationError::NotPositive { field, .. }) => {
                format!(
                    "Please enter a valid positive number for {}",
                    field.replace('_', " ")
                )
            }
            IntervalError::Validation(ValidationError::OutOfRange { field, min, max, .. }) => {
                format!(
                    "Please enter a value for {} between {} and {}",
                    field.replace('_', " "),
                    min,
                    max
                )
            }
            IntervalError::NotFound { entity, id } => {
                format!("No {} found for {}", entity, id)
            }
            IntervalError::Storage(StorageError::Unavailable) => {
                "Not connected to the data store. Please check your connection.".to_string()
            }
            IntervalError::Storage(_) => {
                "Could not reach the data store. Please try again.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}

//! Application configuration
//!
//! Central location for the fixed constants of the nutrient model and the
//! runtime configuration loaded from an optional JSON file.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

// ===== Nutrient model =====

/// Catalogue foods express their nutrients per this many base units
pub const AMOUNT_BASE: f64 = 100.0;

/// Scaled values are rounded to 1 / ROUNDING_SCALE (two decimal places)
pub const ROUNDING_SCALE: f64 = 100.0;

/// `food_id` carried by recipe lines that are not yet attached to a catalogue food
pub const SENTINEL_FOOD_ID: i64 = 0;

// ===== Timestamp encoding =====

/// Offset of the intended local-time convention from UTC, in minutes (UTC+10:00)
pub const REFERENCE_UTC_OFFSET_MINUTES: i64 = 600;

/// Origin of `eaten_ts`: local midnight of 2020-01-01 under the offset above.
/// 1_577_836_800 is 2020-01-01T00:00:00Z.
pub const REFERENCE_EPOCH_SECONDS: i64 = 1_577_836_800 - REFERENCE_UTC_OFFSET_MINUTES * 60;

// ===== Defaults =====

pub const DEFAULT_DATABASE_FILE: &str = "nutritrack.db";

/// chrono format string for `date_eaten`
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// chrono format string for `time_eaten`
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M";

pub const DEFAULT_LOG_FILTER: &str = "nutritrack=info,warn";

/// Environment variable naming the JSON config file
pub const CONFIG_PATH_ENV: &str = "NUTRITRACK_CONFIG";

/// Environment variable overriding the database path
pub const DATABASE_PATH_ENV: &str = "NUTRITRACK_DB";

/// Runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

fn default_database_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATABASE_FILE)
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            log_filter: default_log_filter(),
            date_format: default_date_format(),
            time_format: default_time_format(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file.
    ///
    /// A missing file yields the defaults; a file that exists but does not
    /// parse is an error.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).await?;
        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse {:?}: {}", path, e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from `NUTRITRACK_CONFIG` (if set) and apply `NUTRITRACK_DB`
    pub async fn from_env() -> Result<Self> {
        let config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load(Path::new(&path)).await?,
            None => Self::default(),
        };

        Ok(config.with_database_override(std::env::var_os(DATABASE_PATH_ENV).map(PathBuf::from)))
    }

    pub fn with_database_override(mut self, database_path: Option<PathBuf>) -> Self {
        if let Some(path) = database_path {
            self.database_path = path;
        }
        self
    }

    fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(AppError::Config("database_path must not be empty".into()));
        }
        if self.date_format.trim().is_empty() || self.time_format.trim().is_empty() {
            return Err(AppError::Config("date/time formats must not be empty".into()));
        }
        Ok(())
    }
}

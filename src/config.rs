use std::fs;
use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_DB_PATH: &str = "callreport.sqlite";
pub const DEFAULT_REPORTS_COLLECTION: &str = "candidate_call_reports";
pub const DEFAULT_LOGS_COLLECTION: &str = "call-logs";
pub const DEFAULT_FORMS_COLLECTION: &str = "forms";
pub const DEFAULT_LEADING_COLUMN: &str = "call-answered";
/// IST, +05:30.
pub const DEFAULT_DISPLAY_OFFSET_MINUTES: i32 = 330;
pub const DEFAULT_CHARTS_PER_PAGE: usize = 3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("display offset of {minutes} minutes is not within a day of UTC")]
    DisplayOffset { minutes: i32 },
}

/// Where the documents live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub reports_collection: String,
    pub logs_collection: String,
    pub forms_collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            reports_collection: DEFAULT_REPORTS_COLLECTION.to_string(),
            logs_collection: DEFAULT_LOGS_COLLECTION.to_string(),
            forms_collection: DEFAULT_FORMS_COLLECTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub store: StoreConfig,
    pub display_offset_minutes: i32,
    pub leading_column: String,
    /// Free-text and numeric questions that never get a distribution chart.
    pub skip_columns: Vec<String>,
    pub charts_per_page: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            display_offset_minutes: DEFAULT_DISPLAY_OFFSET_MINUTES,
            leading_column: DEFAULT_LEADING_COLUMN.to_string(),
            skip_columns: vec![
                "monthly_income_value".to_string(),
                "Amount of Finance Availed".to_string(),
                "What additional Help needed from RSETI?".to_string(),
            ],
            charts_per_page: DEFAULT_CHARTS_PER_PAGE,
        }
    }
}

impl ReportConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_slice(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.display_offset()?;
        Ok(config)
    }

    pub fn display_offset(&self) -> Result<FixedOffset, ConfigError> {
        self.display_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::DisplayOffset {
                minutes: self.display_offset_minutes,
            })
    }

    /// Loads the optional config file, then applies the command-line database
    /// path on top.
    pub fn resolve(config_path: Option<&Path>, db_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(db_path) = db_path {
            config.store.db_path = db_path.to_path_buf();
        }
        Ok(config)
    }
}

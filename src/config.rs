//! Runtime configuration
//!
//! Read from the environment (a `.env` file is loaded first by the binary):
//! - `RP_COACH_DB_PATH`        SQLite file, defaults to the platform data dir
//! - `RP_COACH_LOG`            tracing filter directive, defaults to `info`
//! - `RP_COACH_HISTORY_LIMIT`  sessions fetched per recommendation, defaults to 10

use directories::ProjectDirs;
use std::env;
use std::path::PathBuf;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

pub const DB_PATH_VAR: &str = "RP_COACH_DB_PATH";
pub const LOG_FILTER_VAR: &str = "RP_COACH_LOG";
pub const HISTORY_LIMIT_VAR: &str = "RP_COACH_HISTORY_LIMIT";

const DB_FILE_NAME: &str = "rp-coach.db";
const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_HISTORY_LIMIT: u32 = 10;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Could not determine a data directory for this platform")]
  NoDataDir,

  #[error("Invalid value for {var}: {value}")]
  Invalid { var: &'static str, value: String },
}

/// ---------------------------------------------------------------------------
/// App Config
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
  pub database_path: PathBuf,
  pub log_filter: String,
  pub history_limit: u32,
}

impl AppConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    let database_path = match env::var(DB_PATH_VAR) {
      Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
      _ => default_database_path()?,
    };

    let log_filter = env::var(LOG_FILTER_VAR)
      .ok()
      .filter(|f| !f.trim().is_empty())
      .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let history_limit = match env::var(HISTORY_LIMIT_VAR) {
      Ok(raw) => parse_history_limit(&raw)?,
      Err(_) => DEFAULT_HISTORY_LIMIT,
    };

    Ok(Self {
      database_path,
      log_filter,
      history_limit,
    })
  }

  /// Override the database location (e.g. from a CLI flag)
  pub fn with_database_path(mut self, path: Option<PathBuf>) -> Self {
    if let Some(path) = path {
      self.database_path = path;
    }
    self
  }
}

fn parse_history_limit(raw: &str) -> Result<u32, ConfigError> {
  match raw.trim().parse::<u32>() {
    Ok(limit) if limit >= 1 => Ok(limit),
    _ => Err(ConfigError::Invalid {
      var: HISTORY_LIMIT_VAR,
      value: raw.to_string(),
    }),
  }
}

/// `<data dir>/rp-coach.db`
fn default_database_path() -> Result<PathBuf, ConfigError> {
  ProjectDirs::from("com", "rpcoach", "rp-coach")
    .map(|dirs| dirs.data_dir().join(DB_FILE_NAME))
    .ok_or(ConfigError::NoDataDir)
}

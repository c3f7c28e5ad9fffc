use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::config::AppConfig;
use crate::store::StoreError;

pub type DbPool = SqlitePool;

/// Application state shared by every command
pub struct AppState {
  pub db: DbPool,
  pub history_limit: u32,
}

impl AppState {
  pub fn new(db: DbPool, config: &AppConfig) -> Self {
    Self {
      db,
      history_limit: config.history_limit,
    }
  }
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(db_path: &Path) -> Result<DbPool, StoreError> {
  if let Some(parent) = db_path.parent() {
    if !parent.as_os_str().is_empty() {
      fs::create_dir_all(parent)?;
    }
  }

  let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
  info!(path = %db_path.display(), "initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("database ready");

  Ok(pool)
}

/// Open the configured database and wrap it in shared state
pub async fn open(config: &AppConfig) -> Result<AppState, StoreError> {
  let pool = initialize_db(&config.database_path).await?;
  Ok(AppState::new(pool, config))
}

//! Test utilities and helpers for integration and unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Mock data factories
//! - Helper assertions

use crate::models::exercise::{Exercise, ExerciseCategory};
use crate::models::progression::{MesocycleSettings, ProgressionState};
use crate::models::workout::{SessionRatings, SetEntry, WorkoutLog};
use crate::store;
use chrono::{Duration, NaiveDate};
use sqlx::SqlitePool;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Seed the standard trio of exercises (bench / squat / plank)
pub async fn seed_test_exercises(pool: &SqlitePool) -> Vec<Exercise> {
  let exercises = vec![
    Exercise::new("bench", "Bench Press", ExerciseCategory::Push),
    Exercise::new("squat", "Back Squat", ExerciseCategory::Legs),
    Exercise::new("plank", "Weighted Plank", ExerciseCategory::Core),
  ];

  for exercise in &exercises {
    store::upsert_exercise(pool, exercise)
      .await
      .expect("Failed to seed exercise");
  }

  exercises
}

/// Seed `count` consecutive weekly logs for an exercise, oldest first
pub async fn seed_test_logs(pool: &SqlitePool, exercise_id: &str, count: usize) -> Vec<WorkoutLog> {
  let mut logs = Vec::new();

  for i in 0..count {
    let weeks_ago = (count - 1 - i) as i64;
    let mut log = mock_workout_log(exercise_id, weeks_ago * 7);
    log.weight = 50.0 + 2.5 * i as f64;
    store::insert_workout_log(pool, &log)
      .await
      .expect("Failed to seed workout log");
    logs.push(log);
  }

  logs
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Fixed reference date so date-dependent assertions stay deterministic
pub fn reference_date() -> NaiveDate {
  NaiveDate::from_ymd_opt(2025, 3, 3).expect("valid date")
}

/// Date N days before the reference date
pub fn date_days_ago(days: i64) -> NaiveDate {
  reference_date() - Duration::days(days)
}

/// A middle-of-the-road session: 3x8 @ 50, RIR 2, everything rated average
pub fn mock_workout_log(exercise_id: &str, days_ago: i64) -> WorkoutLog {
  WorkoutLog {
    exercise_id: exercise_id.to_string(),
    date: date_days_ago(days_ago),
    sets: 3,
    avg_reps: 8,
    weight: 50.0,
    avg_rir: 2.0,
    fatigue: 2,
    soreness: 2,
    pump: 3,
    performance: 3,
  }
}

/// Fresh tracking state for the bench press
pub fn mock_state() -> ProgressionState {
  ProgressionState::new("bench")
}

/// Push category defaults: MEV 3 / MAV 6 / MRV 10, deload every 4 weeks, +2.5
pub fn mock_push_settings() -> MesocycleSettings {
  MesocycleSettings {
    exercise_id: "bench".to_string(),
    mev_sets: 3,
    mav_sets: 6,
    mrv_sets: 10,
    deload_frequency_weeks: 4,
    target_rir_range: (1, 3),
    weight_increment: 2.5,
  }
}

/// Three straight sets at one weight and RIR
pub fn mock_sets(weight: f64, reps: u32, rir: f64) -> Vec<SetEntry> {
  (0..3)
    .map(|_| SetEntry {
      reps,
      weight,
      rir: Some(rir),
    })
    .collect()
}

pub fn mock_ratings(fatigue: u8, soreness: u8, performance: u8) -> SessionRatings {
  SessionRatings {
    fatigue: Some(fatigue),
    soreness: Some(soreness),
    pump: Some(3),
    performance: Some(performance),
  }
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('exercises', 'workout_logs', 'progression_state', 'mesocycle_settings')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 4, "Expected 4 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_logs_returns_correct_count() {
    let pool = setup_test_db().await;
    seed_test_exercises(&pool).await;

    let logs = seed_test_logs(&pool, "bench", 4).await;
    assert_eq!(logs.len(), 4);
    assert!(logs[0].date < logs[3].date);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workout_logs")
      .fetch_one(&pool)
      .await
      .expect("Failed to count logs");
    assert_eq!(count, 4);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let log = mock_workout_log("bench", 7);
    assert_eq!(log.date, NaiveDate::from_ymd_opt(2025, 2, 24).unwrap());
    assert_eq!(log.sets, 3);

    assert!(mock_push_settings().validate().is_ok());
    assert_eq!(mock_sets(60.0, 8, 2.0).len(), 3);
    assert_eq!(mock_ratings(4, 3, 2).fatigue, Some(4));
  }
}

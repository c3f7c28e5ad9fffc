//! SQLite persistence for exercises, session logs, progression state and
//! mesocycle settings. The engine never touches this module; the command
//! layer reads snapshots from here and writes the results back.

use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool};

use crate::models::exercise::{Exercise, ExerciseCategory};
use crate::models::progression::{MesocycleSettings, ProgressionState, VolumeLandmark};
use crate::models::workout::WorkoutLog;

// ---------------------------------------------------------------------------
/// Error Handling
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Failed to prepare database location: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored {field} is invalid: {value}")]
    Corrupt { field: &'static str, value: String },
}

fn get_u32(row: &SqliteRow, field: &'static str) -> Result<u32, StoreError> {
    let raw: i64 = row.try_get(field)?;
    u32::try_from(raw).map_err(|_| StoreError::Corrupt {
        field,
        value: raw.to_string(),
    })
}

fn get_u8(row: &SqliteRow, field: &'static str) -> Result<u8, StoreError> {
    let raw: i64 = row.try_get(field)?;
    u8::try_from(raw).map_err(|_| StoreError::Corrupt {
        field,
        value: raw.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Exercises
// ---------------------------------------------------------------------------
//
// Writers take any executor so a command can group them in one transaction.

pub async fn upsert_exercise<'e, E>(executor: E, exercise: &Exercise) -> Result<(), StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let muscle_groups_json =
        serde_json::to_string(&exercise.muscle_groups).unwrap_or_else(|_| "[]".to_string());

    sqlx::query(
        r#"
        INSERT INTO exercises (id, name, category, muscle_groups_json)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            category = excluded.category,
            muscle_groups_json = excluded.muscle_groups_json
        "#,
    )
    .bind(&exercise.id)
    .bind(&exercise.name)
    .bind(exercise.category.as_str())
    .bind(&muscle_groups_json)
    .execute(executor)
    .await?;

    Ok(())
}

fn exercise_from_row(row: &SqliteRow) -> Result<Exercise, StoreError> {
    let category: String = row.try_get("category")?;
    let muscle_groups_json: String = row.try_get("muscle_groups_json")?;

    Ok(Exercise {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        category: ExerciseCategory::from_label(&category),
        muscle_groups: serde_json::from_str(&muscle_groups_json).unwrap_or_default(),
    })
}

pub async fn load_exercise(pool: &SqlitePool, exercise_id: &str) -> Result<Option<Exercise>, StoreError> {
    let row = sqlx::query("SELECT id, name, category, muscle_groups_json FROM exercises WHERE id = ?")
        .bind(exercise_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(exercise_from_row).transpose()
}

pub async fn load_all_exercises(pool: &SqlitePool) -> Result<Vec<Exercise>, StoreError> {
    let rows = sqlx::query("SELECT id, name, category, muscle_groups_json FROM exercises ORDER BY name")
        .fetch_all(pool)
        .await?;

    rows.iter().map(exercise_from_row).collect()
}

// ---------------------------------------------------------------------------
// Workout Logs
// ---------------------------------------------------------------------------

/// Append a session log, returning its row id
pub async fn insert_workout_log<'e, E>(executor: E, log: &WorkoutLog) -> Result<i64, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO workout_logs
            (exercise_id, date, sets, avg_reps, weight, avg_rir,
             fatigue, soreness, pump, performance)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&log.exercise_id)
    .bind(log.date)
    .bind(i64::from(log.sets))
    .bind(i64::from(log.avg_reps))
    .bind(log.weight)
    .bind(log.avg_rir)
    .bind(i64::from(log.fatigue))
    .bind(i64::from(log.soreness))
    .bind(i64::from(log.pump))
    .bind(i64::from(log.performance))
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Most recent `limit` sessions for an exercise, returned oldest -> newest
pub async fn load_exercise_logs(
    pool: &SqlitePool,
    exercise_id: &str,
    limit: u32,
) -> Result<Vec<WorkoutLog>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT exercise_id, date, sets, avg_reps, weight, avg_rir,
               fatigue, soreness, pump, performance
        FROM workout_logs
        WHERE exercise_id = ?1
        ORDER BY date DESC, id DESC
        LIMIT ?2
        "#,
    )
    .bind(exercise_id)
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    let mut logs = rows
        .iter()
        .map(|row| -> Result<WorkoutLog, StoreError> {
            Ok(WorkoutLog {
                exercise_id: row.try_get("exercise_id")?,
                date: row.try_get("date")?,
                sets: get_u32(row, "sets")?,
                avg_reps: get_u32(row, "avg_reps")?,
                weight: row.try_get("weight")?,
                avg_rir: row.try_get("avg_rir")?,
                fatigue: get_u8(row, "fatigue")?,
                soreness: get_u8(row, "soreness")?,
                pump: get_u8(row, "pump")?,
                performance: get_u8(row, "performance")?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    logs.reverse();
    Ok(logs)
}

// ---------------------------------------------------------------------------
// Progression State
// ---------------------------------------------------------------------------

const STATE_COLUMNS: &str = r#"
    exercise_id, current_mesocycle_week, previous_sets, previous_weight,
    previous_rir_avg, rolling_fatigue_score, consecutive_weeks_progressing,
    last_deload_date, volume_landmark, created_at, updated_at
"#;

fn state_from_row(row: &SqliteRow) -> Result<ProgressionState, StoreError> {
    let landmark: String = row.try_get("volume_landmark")?;
    let volume_landmark: VolumeLandmark = landmark.parse().map_err(|_| StoreError::Corrupt {
        field: "volume_landmark",
        value: landmark.clone(),
    })?;

    Ok(ProgressionState {
        exercise_id: row.try_get("exercise_id")?,
        current_mesocycle_week: get_u32(row, "current_mesocycle_week")?,
        previous_sets: get_u32(row, "previous_sets")?,
        previous_weight: row.try_get("previous_weight")?,
        previous_rir_avg: row.try_get("previous_rir_avg")?,
        rolling_fatigue_score: row.try_get("rolling_fatigue_score")?,
        consecutive_weeks_progressing: get_u32(row, "consecutive_weeks_progressing")?,
        last_deload_date: row.try_get("last_deload_date")?,
        volume_landmark,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn load_state(pool: &SqlitePool, exercise_id: &str) -> Result<Option<ProgressionState>, StoreError> {
    let query = format!("SELECT {} FROM progression_state WHERE exercise_id = ?", STATE_COLUMNS);
    let row = sqlx::query(&query)
        .bind(exercise_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(state_from_row).transpose()
}

pub async fn load_all_states(pool: &SqlitePool) -> Result<Vec<ProgressionState>, StoreError> {
    let query = format!("SELECT {} FROM progression_state ORDER BY exercise_id", STATE_COLUMNS);
    let rows = sqlx::query(&query).fetch_all(pool).await?;

    rows.iter().map(state_from_row).collect()
}

/// Insert or replace the state record for its exercise
pub async fn save_state<'e, E>(executor: E, state: &ProgressionState) -> Result<(), StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO progression_state
            (exercise_id, current_mesocycle_week, previous_sets, previous_weight,
             previous_rir_avg, rolling_fatigue_score, consecutive_weeks_progressing,
             last_deload_date, volume_landmark, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&state.exercise_id)
    .bind(i64::from(state.current_mesocycle_week))
    .bind(i64::from(state.previous_sets))
    .bind(state.previous_weight)
    .bind(state.previous_rir_avg)
    .bind(state.rolling_fatigue_score)
    .bind(i64::from(state.consecutive_weeks_progressing))
    .bind(state.last_deload_date)
    .bind(state.volume_landmark.to_string())
    .bind(state.created_at)
    .bind(state.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Mesocycle Settings
// ---------------------------------------------------------------------------

pub async fn load_settings(pool: &SqlitePool, exercise_id: &str) -> Result<Option<MesocycleSettings>, StoreError> {
    let row = sqlx::query(
        r#"
        SELECT exercise_id, mev_sets, mav_sets, mrv_sets, deload_frequency_weeks,
               target_rir_min, target_rir_max, weight_increment
        FROM mesocycle_settings
        WHERE exercise_id = ?
        "#,
    )
    .bind(exercise_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(MesocycleSettings {
        exercise_id: row.try_get("exercise_id")?,
        mev_sets: get_u32(&row, "mev_sets")?,
        mav_sets: get_u32(&row, "mav_sets")?,
        mrv_sets: get_u32(&row, "mrv_sets")?,
        deload_frequency_weeks: get_u32(&row, "deload_frequency_weeks")?,
        target_rir_range: (get_u8(&row, "target_rir_min")?, get_u8(&row, "target_rir_max")?),
        weight_increment: row.try_get("weight_increment")?,
    }))
}

/// Insert or replace the settings record for its exercise
pub async fn save_settings<'e, E>(executor: E, settings: &MesocycleSettings) -> Result<(), StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO mesocycle_settings
            (exercise_id, mev_sets, mav_sets, mrv_sets, deload_frequency_weeks,
             target_rir_min, target_rir_max, weight_increment)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&settings.exercise_id)
    .bind(i64::from(settings.mev_sets))
    .bind(i64::from(settings.mav_sets))
    .bind(i64::from(settings.mrv_sets))
    .bind(i64::from(settings.deload_frequency_weeks))
    .bind(i64::from(settings.target_rir_range.0))
    .bind(i64::from(settings.target_rir_range.1))
    .bind(settings.weight_increment)
    .execute(executor)
    .await?;

    Ok(())
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------

pub mod progression;

use crate::db::AppState;
use crate::models::exercise::Exercise;
use crate::store::{self, StoreError};
use crate::suggestions::{sets_from_log, suggest_next_session, Suggestion};
use serde::Serialize;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CoachError {
  #[error(transparent)]
  Store(#[from] StoreError),

  #[error("Exercise not found: {0}")]
  UnknownExercise(String),

  #[error("Progression tracking is not initialized for exercise {0}")]
  NotInitialized(String),

  #[error("Invalid mesocycle settings: {0}")]
  InvalidSettings(String),

  #[error("No sets logged for exercise {0}")]
  EmptyWorkout(String),
}

impl Serialize for CoachError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Exercise Catalog
/// ---------------------------------------------------------------------------

pub async fn list_exercises(state: &AppState) -> Result<Vec<Exercise>, CoachError> {
  Ok(store::load_all_exercises(&state.db).await?)
}

pub async fn get_exercise(state: &AppState, exercise_id: &str) -> Result<Exercise, CoachError> {
  store::load_exercise(&state.db, exercise_id)
    .await?
    .ok_or_else(|| CoachError::UnknownExercise(exercise_id.to_string()))
}

/// ---------------------------------------------------------------------------
/// Set-History Suggestions
/// ---------------------------------------------------------------------------

/// Suggestion from recent sessions alone; works without progression tracking
pub async fn get_workout_suggestion(state: &AppState, exercise_id: &str) -> Result<Suggestion, CoachError> {
  let exercise = get_exercise(state, exercise_id).await?;
  let logs = store::load_exercise_logs(&state.db, exercise_id, state.history_limit).await?;
  let sessions: Vec<_> = logs.iter().map(sets_from_log).collect();

  Ok(suggest_next_session(&exercise, &sessions))
}

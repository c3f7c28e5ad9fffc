//! Commands driving the read -> recommend -> log -> update -> persist cycle
//!
//! Each call works on one snapshot of an exercise's state and settings. Callers
//! must not run two cycles for the same exercise concurrently.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::{get_exercise, CoachError};
use crate::db::AppState;
use crate::models::exercise::Exercise;
use crate::models::progression::{
    MesocycleSettings, ProgressionOverview, ProgressionState, Recommendation, SettingsPatch,
};
use crate::models::workout::{SessionRatings, SetEntry, WorkoutLog};
use crate::progression::{
    generate_recommendation, get_default_mesocycle_settings, update_progression_state, TREND_WINDOW,
};
use crate::store::{self, StoreError};

/// Result of logging a session
#[derive(Debug, Clone, Serialize)]
pub struct LoggedWorkout {
    pub log: WorkoutLog,
    /// The prescription the session was performed against
    pub applied_recommendation: Recommendation,
    pub state: ProgressionState,
}

/// Sessions handed to the engine: the configured limit, but never fewer than
/// the trend window the deload triggers read.
fn engine_history_limit(state: &AppState) -> u32 {
    state.history_limit.max(TREND_WINDOW as u32)
}

async fn require_state(state: &AppState, exercise_id: &str) -> Result<ProgressionState, CoachError> {
    store::load_state(&state.db, exercise_id).await?.ok_or_else(|| {
        warn!(exercise_id, "no progression state found");
        CoachError::NotInitialized(exercise_id.to_string())
    })
}

async fn require_settings(state: &AppState, exercise_id: &str) -> Result<MesocycleSettings, CoachError> {
    store::load_settings(&state.db, exercise_id).await?.ok_or_else(|| {
        warn!(exercise_id, "no mesocycle settings found");
        CoachError::NotInitialized(exercise_id.to_string())
    })
}

/// Start tracking an exercise with default state and category settings.
/// Re-initialising an exercise resets both records.
pub async fn initialize_exercise_progression(
    state: &AppState,
    exercise: &Exercise,
) -> Result<(ProgressionState, MesocycleSettings), CoachError> {
    let initial_state = ProgressionState::new(exercise.id.clone());
    let settings = get_default_mesocycle_settings(exercise);

    let mut tx = state.db.begin().await.map_err(StoreError::from)?;
    store::upsert_exercise(&mut *tx, exercise).await?;
    store::save_state(&mut *tx, &initial_state).await?;
    store::save_settings(&mut *tx, &settings).await?;
    tx.commit().await.map_err(StoreError::from)?;

    info!(
        exercise_id = %exercise.id,
        category = %exercise.category,
        mev = settings.mev_sets,
        mav = settings.mav_sets,
        mrv = settings.mrv_sets,
        "initialized progression tracking"
    );

    Ok((initial_state, settings))
}

/// Recommendation for the next session of an exercise
pub async fn get_progression_recommendation(
    state: &AppState,
    exercise_id: &str,
) -> Result<Recommendation, CoachError> {
    let exercise = get_exercise(state, exercise_id).await?;
    let progression_state = require_state(state, exercise_id).await?;
    let settings = require_settings(state, exercise_id).await?;
    let logs = store::load_exercise_logs(&state.db, exercise_id, engine_history_limit(state)).await?;

    Ok(generate_recommendation(
        &exercise.id,
        &exercise.name,
        &logs,
        &progression_state,
        &settings,
    ))
}

/// Record a finished session and advance the mesocycle state
pub async fn log_workout(
    state: &AppState,
    exercise_id: &str,
    date: NaiveDate,
    sets: &[SetEntry],
    ratings: &SessionRatings,
) -> Result<LoggedWorkout, CoachError> {
    let exercise = get_exercise(state, exercise_id).await?;
    let log = WorkoutLog::from_sets(exercise_id, date, sets, ratings)
        .ok_or_else(|| CoachError::EmptyWorkout(exercise_id.to_string()))?;
    let current = require_state(state, exercise_id).await?;
    let settings = require_settings(state, exercise_id).await?;

    // What was prescribed for this session, from history before it
    let prior_logs = store::load_exercise_logs(&state.db, exercise_id, engine_history_limit(state)).await?;
    let applied = generate_recommendation(&exercise.id, &exercise.name, &prior_logs, &current, &settings);
    let updated = update_progression_state(&current, &log, &applied);

    // Log and state land together or not at all
    let mut tx = state.db.begin().await.map_err(StoreError::from)?;
    store::insert_workout_log(&mut *tx, &log).await?;
    store::save_state(&mut *tx, &updated).await?;
    tx.commit().await.map_err(StoreError::from)?;

    info!(
        exercise_id,
        %date,
        sets = log.sets,
        weight = log.weight,
        avg_rir = log.avg_rir,
        progression = %applied.progression_type,
        week = updated.current_mesocycle_week,
        landmark = %updated.volume_landmark,
        "logged workout"
    );

    Ok(LoggedWorkout {
        log,
        applied_recommendation: applied,
        state: updated,
    })
}

/// Recent sessions for an exercise, oldest first
pub async fn get_exercise_logs(
    state: &AppState,
    exercise_id: &str,
    limit: Option<u32>,
) -> Result<Vec<WorkoutLog>, CoachError> {
    let limit = limit.unwrap_or(state.history_limit);
    Ok(store::load_exercise_logs(&state.db, exercise_id, limit).await?)
}

pub async fn get_mesocycle_settings(
    state: &AppState,
    exercise_id: &str,
) -> Result<MesocycleSettings, CoachError> {
    require_settings(state, exercise_id).await
}

/// Apply a partial settings change after validating the result
pub async fn update_mesocycle_settings(
    state: &AppState,
    exercise_id: &str,
    patch: &SettingsPatch,
) -> Result<MesocycleSettings, CoachError> {
    let current = require_settings(state, exercise_id).await?;
    let updated = patch.apply(&current);
    updated.validate().map_err(CoachError::InvalidSettings)?;

    store::save_settings(&state.db, &updated).await?;
    info!(exercise_id, ?patch, "updated mesocycle settings");

    Ok(updated)
}

/// Mesocycle position of every tracked exercise
pub async fn get_progression_overview(state: &AppState) -> Result<Vec<ProgressionOverview>, CoachError> {
    let states = store::load_all_states(&state.db).await?;
    Ok(states.iter().map(ProgressionOverview::from).collect())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exercise::ExerciseCategory;
    use crate::models::progression::{ProgressionType, VolumeLandmark};
    use crate::test_utils::*;
    use serial_test::serial;

    async fn setup_state() -> AppState {
        let pool = setup_test_db().await;
        AppState { db: pool, history_limit: 10 }
    }

    fn bench() -> Exercise {
        Exercise::new("bench", "Bench Press", ExerciseCategory::Push)
    }

    #[tokio::test]
    #[serial]
    async fn test_initialize_seeds_defaults() {
        let state = setup_state().await;
        let squat = Exercise::new("squat", "Back Squat", ExerciseCategory::Legs);

        let (initial, settings) = initialize_exercise_progression(&state, &squat)
            .await
            .expect("Should initialize");

        assert_eq!(initial.current_mesocycle_week, 1);
        assert_eq!(settings.mev_sets, 4);
        assert_eq!(settings.weight_increment, 5.0);

        let stored = get_mesocycle_settings(&state, "squat").await.expect("Settings stored");
        assert_eq!(stored, settings);

        teardown_test_db(state.db).await;
    }

    #[tokio::test]
    #[serial]
    async fn test_recommendation_requires_initialization() {
        let state = setup_state().await;
        seed_test_exercises(&state.db).await;

        let err = get_progression_recommendation(&state, "bench").await.unwrap_err();
        assert!(matches!(err, CoachError::NotInitialized(ref id) if id == "bench"));

        let err = get_progression_recommendation(&state, "curl").await.unwrap_err();
        assert!(matches!(err, CoachError::UnknownExercise(_)));

        teardown_test_db(state.db).await;
    }

    #[tokio::test]
    #[serial]
    async fn test_cold_start_then_weight_progression() {
        let state = setup_state().await;
        initialize_exercise_progression(&state, &bench()).await.unwrap();

        let first = get_progression_recommendation(&state, "bench").await.unwrap();
        assert_eq!(first.progression_type, ProgressionType::Maintain);
        assert_eq!(first.recommended_sets, 3);
        assert_eq!(first.recommended_weight, 20.0);

        // Easy session: RIR 4, great performance
        let logged = log_workout(
            &state,
            "bench",
            date_days_ago(7),
            &mock_sets(50.0, 8, 4.0),
            &mock_ratings(2, 2, 5),
        )
        .await
        .expect("Should log workout");

        assert_eq!(logged.applied_recommendation.progression_type, ProgressionType::Maintain);
        assert_eq!(logged.state.current_mesocycle_week, 2);
        assert_eq!(logged.state.consecutive_weeks_progressing, 0);
        assert_eq!(logged.state.previous_weight, 50.0);
        assert_eq!(logged.state.volume_landmark, VolumeLandmark::Mev);

        let next = get_progression_recommendation(&state, "bench").await.unwrap();
        assert_eq!(next.progression_type, ProgressionType::Weight);
        assert_eq!(next.recommended_weight, 52.5);
        assert_eq!(next.target_rir, 3);
        assert_eq!(next.rest_time, 120);

        teardown_test_db(state.db).await;
    }

    #[tokio::test]
    #[serial]
    async fn test_fatigue_builds_to_deload_and_resets_state() {
        let state = setup_state().await;
        initialize_exercise_progression(&state, &bench()).await.unwrap();

        log_workout(&state, "bench", date_days_ago(14), &mock_sets(50.0, 8, 1.0), &mock_ratings(5, 5, 3))
            .await
            .unwrap();
        log_workout(&state, "bench", date_days_ago(7), &mock_sets(50.0, 8, 0.0), &mock_ratings(5, 5, 3))
            .await
            .unwrap();

        let rec = get_progression_recommendation(&state, "bench").await.unwrap();
        assert!(rec.deload_week);
        assert_eq!(rec.recommended_sets, 1);
        assert_eq!(rec.recommended_weight, 35.0);

        let deload_sets = vec![SetEntry { reps: 8, weight: 35.0, rir: Some(4.0) }];
        let logged = log_workout(&state, "bench", reference_date(), &deload_sets, &mock_ratings(2, 2, 3))
            .await
            .unwrap();

        assert!(logged.applied_recommendation.deload_week);
        assert_eq!(logged.state.current_mesocycle_week, 1);
        assert_eq!(logged.state.consecutive_weeks_progressing, 0);
        assert_eq!(logged.state.volume_landmark, VolumeLandmark::Mev);
        assert_eq!(logged.state.last_deload_date, Some(reference_date()));

        let overview = get_progression_overview(&state).await.unwrap();
        assert_eq!(overview.len(), 1);
        assert_eq!(overview[0].current_week, 1);
        assert_eq!(overview[0].last_deload, Some(reference_date()));

        teardown_test_db(state.db).await;
    }

    #[tokio::test]
    #[serial]
    async fn test_log_workout_rejects_empty_and_untracked() {
        let state = setup_state().await;
        seed_test_exercises(&state.db).await;

        let err = log_workout(&state, "bench", reference_date(), &[], &SessionRatings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoachError::EmptyWorkout(_)));

        let err = log_workout(
            &state,
            "bench",
            reference_date(),
            &mock_sets(50.0, 8, 2.0),
            &SessionRatings::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CoachError::NotInitialized(_)));

        // Nothing was written for the rejected calls
        assert!(get_exercise_logs(&state, "bench", None).await.unwrap().is_empty());

        teardown_test_db(state.db).await;
    }

    #[tokio::test]
    #[serial]
    async fn test_exercise_logs_respect_limit() {
        let state = setup_state().await;
        initialize_exercise_progression(&state, &bench()).await.unwrap();
        seed_test_logs(&state.db, "bench", 4).await;

        let all = get_exercise_logs(&state, "bench", None).await.unwrap();
        assert_eq!(all.len(), 4);

        let recent = get_exercise_logs(&state, "bench", Some(2)).await.unwrap();
        assert_eq!(recent, all[2..].to_vec());

        teardown_test_db(state.db).await;
    }

    #[tokio::test]
    #[serial]
    async fn test_update_settings_validates() {
        let state = setup_state().await;
        initialize_exercise_progression(&state, &bench()).await.unwrap();

        let updated = update_mesocycle_settings(
            &state,
            "bench",
            &SettingsPatch {
                mav_sets: Some(8),
                weight_increment: Some(1.25),
                ..Default::default()
            },
        )
        .await
        .expect("Should update");
        assert_eq!(updated.mav_sets, 8);
        assert_eq!(updated.mev_sets, 3);

        let err = update_mesocycle_settings(
            &state,
            "bench",
            &SettingsPatch {
                mev_sets: Some(9),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CoachError::InvalidSettings(_)));

        // Rejected patch left the stored settings alone
        let stored = get_mesocycle_settings(&state, "bench").await.unwrap();
        assert_eq!(stored.mev_sets, 3);
        assert_eq!(stored.mav_sets, 8);

        teardown_test_db(state.db).await;
    }

    #[tokio::test]
    #[serial]
    async fn test_failed_state_write_rolls_back_log() {
        let state = setup_state().await;
        initialize_exercise_progression(&state, &bench()).await.unwrap();

        sqlx::query(
            r#"
            CREATE TRIGGER block_state_write BEFORE INSERT ON progression_state
            BEGIN
                SELECT RAISE(ABORT, 'state write blocked');
            END
            "#,
        )
        .execute(&state.db)
        .await
        .expect("Should create trigger");

        let result = log_workout(
            &state,
            "bench",
            reference_date(),
            &mock_sets(50.0, 8, 2.0),
            &mock_ratings(2, 2, 3),
        )
        .await;
        assert!(matches!(result, Err(CoachError::Store(_))));

        let log_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workout_logs")
            .fetch_one(&state.db)
            .await
            .unwrap();
        assert_eq!(log_count, 0);

        let stored = store::load_state(&state.db, "bench").await.unwrap().expect("State exists");
        assert_eq!(stored.current_mesocycle_week, 1);

        teardown_test_db(state.db).await;
    }

    #[tokio::test]
    #[serial]
    async fn test_small_history_limit_keeps_deload_triggers() {
        let pool = setup_test_db().await;
        let state = AppState { db: pool, history_limit: 1 };
        initialize_exercise_progression(&state, &bench()).await.unwrap();

        log_workout(&state, "bench", date_days_ago(14), &mock_sets(50.0, 8, 2.0), &mock_ratings(5, 5, 3))
            .await
            .unwrap();
        log_workout(&state, "bench", date_days_ago(7), &mock_sets(50.0, 8, 2.0), &mock_ratings(5, 5, 3))
            .await
            .unwrap();

        let rec = get_progression_recommendation(&state, "bench").await.unwrap();
        assert!(rec.deload_week);
        assert_eq!(rec.progression_type, ProgressionType::Deload);

        // The display limit still applies to history listings
        assert_eq!(get_exercise_logs(&state, "bench", None).await.unwrap().len(), 1);

        teardown_test_db(state.db).await;
    }
}

//! Mesocycle Progression Engine
//!
//! Pure functions that turn a lifter's logged sessions into the next
//! session's prescription:
//! - deload detection from RIR, fatigue, performance and cadence
//! - progression axis selection (weight, volume, hold)
//! - concrete sets / weight / RIR / reps / rest targets
//! - folding a finished session back into the mesocycle state
//!
//! Key principles:
//! - No I/O, no clock reads except the `updated_at` stamp
//! - Only the latest log and a trailing window of 3 drive decisions
//! - Inputs are trusted: ratings are not range-checked here

use chrono::Utc;
use tracing::debug;

use crate::models::exercise::{beginner_base_weight, infer_category, Exercise, ExerciseCategory};
use crate::models::progression::{
    MesocyclePhase, MesocycleSettings, ProgressionState, ProgressionType, Recommendation,
    VolumeLandmark,
};
use crate::models::workout::WorkoutLog;

/// Sessions examined for trend detection
pub const TREND_WINDOW: usize = 3;

/// Recency weights for the rolling fatigue blend, newest first
const FATIGUE_WEIGHTS: [f64; TREND_WINDOW] = [0.5, 0.3, 0.2];

/// Rolling fatigue reported when there is nothing to blend
pub const DEFAULT_ROLLING_FATIGUE: f64 = 2.0;

/// Absolute set counts used when reclassifying the landmark after a session
pub const FIXED_MRV_SETS: u32 = 8;
pub const FIXED_MAV_SETS: u32 = 5;

const BEGINNER_TARGET_RIR: u8 = 3;
const BEGINNER_TARGET_REPS: u32 = 8;
const BEGINNER_REST_SECONDS: u32 = 90;

const DELOAD_VOLUME_FACTOR: f64 = 0.5;
const DELOAD_LOAD_FACTOR: f64 = 0.7;
const DELOAD_TARGET_RIR: u8 = 4;

const PROGRESSION_TARGET_RIR: u8 = 2;

// ---------------------------------------------------------------------------
/// Recommendation
// ---------------------------------------------------------------------------

/// Compute the next session's prescription for one exercise.
///
/// `logs` must be ordered oldest -> newest and may be empty.
pub fn generate_recommendation(
    exercise_id: &str,
    exercise_name: &str,
    logs: &[WorkoutLog],
    state: &ProgressionState,
    settings: &MesocycleSettings,
) -> Recommendation {
    let Some(latest) = logs.last() else {
        return beginner_recommendation(exercise_id, exercise_name, settings);
    };

    let rolling_fatigue = calculate_rolling_fatigue(trailing_window(logs));
    let triggers = deload_triggers(logs, state, settings);
    debug!(
        exercise_id,
        sessions = logs.len(),
        rolling_fatigue,
        ?triggers,
        "evaluating progression"
    );

    if !triggers.is_empty() {
        return deload_recommendation(exercise_id, exercise_name, latest);
    }

    let progression_type = determine_progression_type(latest, state, settings);
    debug!(exercise_id, %progression_type, "progression type selected");

    // A deload type gets real deload loads and deload_week = true, so the
    // state update resets the mesocycle instead of counting a progress week
    if progression_type == ProgressionType::Deload {
        return deload_recommendation(exercise_id, exercise_name, latest);
    }

    progression_recommendation(
        exercise_id,
        exercise_name,
        latest,
        state,
        settings,
        progression_type,
    )
}

/// Pick the axis to progress along, based on the latest session alone
pub fn determine_progression_type(
    latest: &WorkoutLog,
    state: &ProgressionState,
    settings: &MesocycleSettings,
) -> ProgressionType {
    let performance_good = latest.performance >= 4;
    let avg_rir = latest.avg_rir;

    if latest.fatigue_high() {
        return if avg_rir <= 0.0 {
            ProgressionType::Deload
        } else {
            ProgressionType::Maintain
        };
    }

    // Sets felt too easy: push intensity
    if performance_good && avg_rir > 3.0 {
        return ProgressionType::Weight;
    }

    if performance_good && (1.0..=2.0).contains(&avg_rir) {
        return if state.previous_sets < settings.mav_sets {
            ProgressionType::Volume
        } else {
            ProgressionType::Weight
        };
    }

    if avg_rir <= 0.0 {
        return if state.consecutive_weeks_progressing >= 2 {
            ProgressionType::Deload
        } else {
            ProgressionType::Maintain
        };
    }

    ProgressionType::Maintain
}

fn progression_recommendation(
    exercise_id: &str,
    exercise_name: &str,
    latest: &WorkoutLog,
    state: &ProgressionState,
    settings: &MesocycleSettings,
    progression_type: ProgressionType,
) -> Recommendation {
    let mut recommended_sets = latest.sets;
    let mut recommended_weight = latest.weight;

    let (reasoning, confidence) = match progression_type {
        ProgressionType::Weight => {
            recommended_weight = round_to_half(latest.weight + settings.weight_increment);
            (
                format!(
                    "Good recovery and high RIR ({}). Increasing weight by {}kg.",
                    latest.avg_rir, settings.weight_increment
                ),
                0.9,
            )
        }
        ProgressionType::Volume => {
            recommended_sets = (latest.sets + 1).min(settings.mav_sets);
            (
                format!(
                    "Good performance in RIR range ({}). Adding one set for volume progression.",
                    latest.avg_rir
                ),
                0.85,
            )
        }
        ProgressionType::Maintain | ProgressionType::Deload => (
            format!(
                "Maintaining current load. RIR: {}, Fatigue: {}",
                latest.avg_rir, latest.fatigue
            ),
            0.75,
        ),
    };

    Recommendation {
        exercise_id: exercise_id.to_string(),
        exercise_name: exercise_name.to_string(),
        recommended_sets,
        recommended_weight,
        target_rir: adjust_target_rir(PROGRESSION_TARGET_RIR, state.volume_landmark),
        target_reps: latest.avg_reps,
        rest_time: rest_time_seconds(progression_type, exercise_name),
        progression_type,
        confidence,
        reasoning,
        deload_week: false,
        mesocycle_phase: determine_mesocycle_phase(state.current_mesocycle_week, settings),
    }
}

fn beginner_recommendation(
    exercise_id: &str,
    exercise_name: &str,
    settings: &MesocycleSettings,
) -> Recommendation {
    Recommendation {
        exercise_id: exercise_id.to_string(),
        exercise_name: exercise_name.to_string(),
        recommended_sets: settings.mev_sets,
        recommended_weight: beginner_base_weight(exercise_name),
        target_rir: BEGINNER_TARGET_RIR,
        target_reps: BEGINNER_TARGET_REPS,
        rest_time: BEGINNER_REST_SECONDS,
        progression_type: ProgressionType::Maintain,
        confidence: 0.8,
        reasoning: "Starting recommendation for new exercise".to_string(),
        deload_week: false,
        mesocycle_phase: MesocyclePhase::Accumulation,
    }
}

/// Shift the target RIR by where volume currently sits
pub fn adjust_target_rir(base: u8, landmark: VolumeLandmark) -> u8 {
    match landmark {
        VolumeLandmark::Mrv => base.saturating_sub(1).clamp(1, 3),
        VolumeLandmark::Mev => base.saturating_add(1).clamp(1, 3),
        VolumeLandmark::Mav => base,
    }
}

/// Position within the mesocycle, cycling every `deload_frequency_weeks + 1` weeks
pub fn determine_mesocycle_phase(current_week: u32, settings: &MesocycleSettings) -> MesocyclePhase {
    let cycle_length = settings.deload_frequency_weeks.saturating_add(1);
    match current_week % cycle_length {
        0 => MesocyclePhase::Deload,
        1..=2 => MesocyclePhase::Accumulation,
        3..=4 => MesocyclePhase::Intensification,
        _ => MesocyclePhase::Reset,
    }
}

/// Rest between sets for the exercise's inferred category
pub fn rest_time_seconds(progression_type: ProgressionType, exercise_name: &str) -> u32 {
    let base = infer_category(exercise_name).base_rest_seconds();
    match progression_type {
        ProgressionType::Weight => base + 30,
        ProgressionType::Volume => base + 15,
        ProgressionType::Deload => base.saturating_sub(15),
        ProgressionType::Maintain => base,
    }
}

/// Round a load to the nearest 0.5
pub fn round_to_half(weight: f64) -> f64 {
    (weight * 2.0).round() / 2.0
}

fn trailing_window(logs: &[WorkoutLog]) -> &[WorkoutLog] {
    &logs[logs.len().saturating_sub(TREND_WINDOW)..]
}

// ---------------------------------------------------------------------------
/// Deload Detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeloadTrigger {
    /// Every session in the trailing window was taken to failure
    RirAtZero,
    /// The last two sessions both rated fatigue or soreness >= 4
    SustainedFatigue,
    /// Performance dropped more than one point across the window
    PerformanceDecline,
    /// Progressed for as many weeks as the deload cadence allows
    CadenceReached,
    /// Volume already at the recoverable ceiling
    VolumeAtMrv,
}

/// Every deload condition that currently holds. Needs at least two sessions.
pub fn deload_triggers(
    logs: &[WorkoutLog],
    state: &ProgressionState,
    settings: &MesocycleSettings,
) -> Vec<DeloadTrigger> {
    let mut triggers = Vec::new();
    if logs.len() < 2 {
        return triggers;
    }

    let recent = trailing_window(logs);

    if recent.iter().all(|log| log.avg_rir <= 0.0) {
        triggers.push(DeloadTrigger::RirAtZero);
    }

    let last_two = &recent[recent.len() - 2..];
    if last_two.iter().all(WorkoutLog::fatigue_high) {
        triggers.push(DeloadTrigger::SustainedFatigue);
    }

    if recent.len() >= TREND_WINDOW {
        let first = i32::from(recent[0].performance);
        let last = i32::from(recent[recent.len() - 1].performance);
        if last < first - 1 {
            triggers.push(DeloadTrigger::PerformanceDecline);
        }
    }

    if state.consecutive_weeks_progressing >= settings.deload_frequency_weeks {
        triggers.push(DeloadTrigger::CadenceReached);
    }

    if state.volume_landmark == VolumeLandmark::Mrv {
        triggers.push(DeloadTrigger::VolumeAtMrv);
    }

    triggers
}

pub fn should_deload(
    logs: &[WorkoutLog],
    state: &ProgressionState,
    settings: &MesocycleSettings,
) -> bool {
    !deload_triggers(logs, state, settings).is_empty()
}

fn deload_recommendation(exercise_id: &str, exercise_name: &str, latest: &WorkoutLog) -> Recommendation {
    let deload_sets = ((f64::from(latest.sets) * DELOAD_VOLUME_FACTOR).floor() as u32).max(1);
    let deload_weight = round_to_half(latest.weight * DELOAD_LOAD_FACTOR);

    Recommendation {
        exercise_id: exercise_id.to_string(),
        exercise_name: exercise_name.to_string(),
        recommended_sets: deload_sets,
        recommended_weight: deload_weight,
        target_rir: DELOAD_TARGET_RIR,
        target_reps: latest.avg_reps,
        rest_time: rest_time_seconds(ProgressionType::Deload, exercise_name),
        progression_type: ProgressionType::Deload,
        confidence: 0.95,
        reasoning: deload_reasoning(latest),
        deload_week: true,
        mesocycle_phase: MesocyclePhase::Deload,
    }
}

/// Explain a deload from what the latest session looked like
pub fn deload_reasoning(latest: &WorkoutLog) -> String {
    let mut reasons = Vec::new();

    if latest.avg_rir <= 0.0 {
        reasons.push("RIR at zero - approaching failure");
    }
    if latest.fatigue >= 4 {
        reasons.push("high fatigue levels");
    }
    if latest.soreness >= 4 {
        reasons.push("high soreness levels");
    }
    if latest.performance <= 2 {
        reasons.push("declining performance");
    }
    if reasons.is_empty() {
        reasons.push("scheduled deload for recovery");
    }

    format!("Deload recommended due to: {}.", reasons.join(", "))
}

// ---------------------------------------------------------------------------
/// Rolling Fatigue
// ---------------------------------------------------------------------------

/// Recency-weighted fatigue + soreness over the newest (at most 3) logs.
///
/// `logs` is ordered oldest -> newest; older entries are ignored.
pub fn calculate_rolling_fatigue(logs: &[WorkoutLog]) -> f64 {
    if logs.is_empty() {
        return DEFAULT_ROLLING_FATIGUE;
    }

    let (weighted_sum, total_weight) = logs
        .iter()
        .rev()
        .zip(FATIGUE_WEIGHTS)
        .fold((0.0, 0.0), |(sum, total), (log, weight)| {
            (sum + log.fatigue_load() * weight, total + weight)
        });

    weighted_sum / total_weight
}

// ---------------------------------------------------------------------------
/// State Update
// ---------------------------------------------------------------------------

/// Landmark from the absolute number of sets performed
pub fn classify_landmark_by_sets(sets: u32) -> VolumeLandmark {
    if sets >= FIXED_MRV_SETS {
        VolumeLandmark::Mrv
    } else if sets >= FIXED_MAV_SETS {
        VolumeLandmark::Mav
    } else {
        VolumeLandmark::Mev
    }
}

/// Fold a completed session into the mesocycle state.
///
/// `recommendation` is the prescription the session was performed against.
/// Rolling fatigue is recomputed from `new_log` alone.
pub fn update_progression_state(
    current: &ProgressionState,
    new_log: &WorkoutLog,
    recommendation: &Recommendation,
) -> ProgressionState {
    let mut updated = current.clone();

    updated.previous_sets = new_log.sets;
    updated.previous_weight = new_log.weight;
    updated.previous_rir_avg = new_log.avg_rir;
    updated.rolling_fatigue_score = calculate_rolling_fatigue(std::slice::from_ref(new_log));
    updated.updated_at = Utc::now();

    if recommendation.deload_week {
        updated.current_mesocycle_week = 1;
        updated.consecutive_weeks_progressing = 0;
        updated.last_deload_date = Some(new_log.date);
        updated.volume_landmark = VolumeLandmark::Mev;
    } else {
        updated.current_mesocycle_week = updated.current_mesocycle_week.saturating_add(1);
        if recommendation.progression_type != ProgressionType::Maintain {
            updated.consecutive_weeks_progressing =
                updated.consecutive_weeks_progressing.saturating_add(1);
        }
        updated.volume_landmark = classify_landmark_by_sets(new_log.sets);
    }

    updated
}

// ---------------------------------------------------------------------------
/// Default Settings
// ---------------------------------------------------------------------------

/// Category defaults seeded when an exercise is first tracked
pub fn get_default_mesocycle_settings(exercise: &Exercise) -> MesocycleSettings {
    let (mev_sets, mav_sets, mrv_sets, deload_frequency_weeks, weight_increment) =
        match exercise.category {
            ExerciseCategory::Legs => (4, 8, 12, 4, 5.0),
            ExerciseCategory::Push | ExerciseCategory::Pull => (3, 6, 10, 4, 2.5),
            ExerciseCategory::Core => (2, 4, 6, 6, 2.5),
        };

    MesocycleSettings {
        exercise_id: exercise.id.clone(),
        mev_sets,
        mav_sets,
        mrv_sets,
        deload_frequency_weeks,
        target_rir_range: (1, 3),
        weight_increment,
    }
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------

//! Set-history suggestions
//!
//! A simpler heuristic than the mesocycle engine: it looks only at raw
//! reps and weights, and needs no progression state or settings.

use serde::{Deserialize, Serialize};

use crate::models::exercise::{Exercise, ExerciseCategory};
use crate::models::workout::{SetEntry, WorkoutLog};
use crate::progression::round_to_half;

/// Sets examined for the recent rep average
pub const RECENT_SET_WINDOW: usize = 15;

const COMPLETION_RATIO: f64 = 0.8;
const STRUGGLE_RATIO: f64 = 0.9;
const MIN_SETS_FOR_WEIGHT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    Weight,
    Reps,
    Maintain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub exercise_name: String,
    pub suggested_weight: f64,
    pub suggested_reps: u32,
    pub reason: String,
    pub confidence: f64,
    /// Seconds
    pub rest_time: u32,
    pub progression_type: SuggestionType,
}

fn weight_increment(category: ExerciseCategory) -> f64 {
    match category {
        ExerciseCategory::Legs => 5.0,
        _ => 2.5,
    }
}

fn rest_time(category: ExerciseCategory, suggestion_type: SuggestionType) -> u32 {
    let base = category.base_rest_seconds();
    match suggestion_type {
        SuggestionType::Weight => base + 30,
        SuggestionType::Reps | SuggestionType::Maintain => base,
    }
}

fn beginner_suggestion(exercise: &Exercise) -> Suggestion {
    let (weight, reps) = match exercise.category {
        ExerciseCategory::Push => (20.0, 8),
        ExerciseCategory::Pull => (15.0, 8),
        ExerciseCategory::Legs => (30.0, 10),
        ExerciseCategory::Core => (0.0, 15),
    };

    Suggestion {
        exercise_name: exercise.name.clone(),
        suggested_weight: weight,
        suggested_reps: reps,
        reason: "Starting weight for beginners".to_string(),
        confidence: 0.8,
        rest_time: rest_time(exercise.category, SuggestionType::Maintain),
        progression_type: SuggestionType::Maintain,
    }
}

/// Suggest the next session from per-session set lists, ordered oldest -> newest
pub fn suggest_next_session(exercise: &Exercise, sessions: &[Vec<SetEntry>]) -> Suggestion {
    let all_sets: Vec<&SetEntry> = sessions.iter().flatten().collect();
    if all_sets.is_empty() {
        return beginner_suggestion(exercise);
    }

    let recent = &all_sets[all_sets.len().saturating_sub(RECENT_SET_WINDOW)..];
    let avg_reps = recent.iter().map(|s| f64::from(s.reps)).sum::<f64>() / recent.len() as f64;

    let last_session: &[SetEntry] = sessions
        .iter()
        .rev()
        .find(|sets| !sets.is_empty())
        .map(Vec::as_slice)
        .unwrap_or_default();

    let last_weight = last_session.iter().map(|s| s.weight).fold(f64::MIN, f64::max);
    let last_max_reps = last_session.iter().map(|s| s.reps).max().unwrap_or_default();

    let completed_all = last_session
        .iter()
        .all(|s| f64::from(s.reps) >= avg_reps * COMPLETION_RATIO);
    let rounded_avg = avg_reps.round() as u32;

    let (suggested_weight, suggested_reps, reason, confidence, suggestion_type) =
        if completed_all && last_session.len() >= MIN_SETS_FOR_WEIGHT {
            (
                round_to_half(last_weight + weight_increment(exercise.category)),
                rounded_avg,
                "Progressive overload - increase weight",
                0.9,
                SuggestionType::Weight,
            )
        } else if f64::from(last_max_reps) < avg_reps * STRUGGLE_RATIO {
            (
                last_weight,
                rounded_avg.min(last_max_reps + 1),
                "Focus on rep improvement",
                0.85,
                SuggestionType::Reps,
            )
        } else {
            (
                last_weight,
                rounded_avg,
                "Maintain current progression",
                0.8,
                SuggestionType::Maintain,
            )
        };

    Suggestion {
        exercise_name: exercise.name.clone(),
        suggested_weight,
        suggested_reps,
        reason: reason.to_string(),
        confidence,
        rest_time: rest_time(exercise.category, suggestion_type),
        progression_type: suggestion_type,
    }
}

/// Expand a summarised log back into uniform sets
pub fn sets_from_log(log: &WorkoutLog) -> Vec<SetEntry> {
    (0..log.sets)
        .map(|_| SetEntry {
            reps: log.avg_reps,
            weight: log.weight,
            rir: Some(log.avg_rir),
        })
        .collect()
}

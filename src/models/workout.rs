use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// RIR assumed for a set logged without one
pub const DEFAULT_SET_RIR: f64 = 3.0;
/// Session fatigue/soreness assumed when not rated
pub const DEFAULT_SESSION_RATING: u8 = 2;
/// Pump/performance assumed when not rated
pub const DEFAULT_EXERCISE_RATING: u8 = 3;

/// One performed set as entered by the lifter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetEntry {
  pub reps: u32,
  pub weight: f64,
  pub rir: Option<f64>,
}

/// Subjective ratings collected at the end of a session (1-5 scales)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRatings {
  pub fatigue: Option<u8>,
  pub soreness: Option<u8>,
  pub pump: Option<u8>,
  pub performance: Option<u8>,
}

/// Per-exercise summary of one completed session.
///
/// Immutable once built; the engine reads these oldest -> newest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutLog {
  pub exercise_id: String,
  pub date: NaiveDate,
  pub sets: u32,
  pub avg_reps: u32,
  /// Top weight used in the session
  pub weight: f64,
  /// Average reps in reserve, 0 = failure
  pub avg_rir: f64,
  pub fatigue: u8,
  pub soreness: u8,
  pub pump: u8,
  pub performance: u8,
}

impl WorkoutLog {
  /// Summarise raw sets into a log entry, filling unrated fields with defaults.
  /// Returns None when no sets were performed.
  pub fn from_sets(
    exercise_id: &str,
    date: NaiveDate,
    sets: &[SetEntry],
    ratings: &SessionRatings,
  ) -> Option<Self> {
    if sets.is_empty() {
      return None;
    }

    let count = sets.len() as f64;
    let avg_reps = sets.iter().map(|s| s.reps as f64).sum::<f64>() / count;
    let avg_rir = sets
      .iter()
      .map(|s| s.rir.unwrap_or(DEFAULT_SET_RIR))
      .sum::<f64>()
      / count;
    let top_weight = sets.iter().map(|s| s.weight).fold(f64::MIN, f64::max);

    Some(Self {
      exercise_id: exercise_id.to_string(),
      date,
      sets: sets.len() as u32,
      avg_reps: avg_reps.round() as u32,
      weight: top_weight,
      avg_rir: (avg_rir * 10.0).round() / 10.0,
      fatigue: ratings.fatigue.unwrap_or(DEFAULT_SESSION_RATING),
      soreness: ratings.soreness.unwrap_or(DEFAULT_SESSION_RATING),
      pump: ratings.pump.unwrap_or(DEFAULT_EXERCISE_RATING),
      performance: ratings.performance.unwrap_or(DEFAULT_EXERCISE_RATING),
    })
  }

  /// Combined fatigue + soreness load (2-10)
  pub fn fatigue_load(&self) -> f64 {
    f64::from(self.fatigue) + f64::from(self.soreness)
  }

  pub fn fatigue_high(&self) -> bool {
    self.fatigue >= 4 || self.soreness >= 4
  }
}

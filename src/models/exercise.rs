use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Exercise Category
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
  #[default]
  Push,
  Pull,
  Legs,
  Core,
}

impl ExerciseCategory {
  pub fn as_str(&self) -> &'static str {
    match self {
      ExerciseCategory::Push => "push",
      ExerciseCategory::Pull => "pull",
      ExerciseCategory::Legs => "legs",
      ExerciseCategory::Core => "core",
    }
  }

  /// Parse a stored label, falling back to push for anything unrecognised
  pub fn from_label(label: &str) -> Self {
    label.parse().unwrap_or_default()
  }

  /// Base rest between sets in seconds
  pub fn base_rest_seconds(&self) -> u32 {
    match self {
      ExerciseCategory::Legs => 120,
      ExerciseCategory::Push => 90,
      ExerciseCategory::Pull => 90,
      ExerciseCategory::Core => 60,
    }
  }
}

impl std::fmt::Display for ExerciseCategory {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for ExerciseCategory {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "push" => Ok(Self::Push),
      "pull" => Ok(Self::Pull),
      "legs" => Ok(Self::Legs),
      "core" => Ok(Self::Core),
      _ => Err(format!("Unknown exercise category: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Name Heuristics
/// ---------------------------------------------------------------------------

/// Keyword -> category, checked in order against the lowercased exercise name.
/// Best-effort only: names that match nothing are treated as push.
const CATEGORY_KEYWORDS: &[(&str, ExerciseCategory)] = &[
  ("squat", ExerciseCategory::Legs),
  ("deadlift", ExerciseCategory::Legs),
  ("lunge", ExerciseCategory::Legs),
  ("bench", ExerciseCategory::Push),
  ("press", ExerciseCategory::Push),
  ("dip", ExerciseCategory::Push),
  ("pull", ExerciseCategory::Pull),
  ("row", ExerciseCategory::Pull),
  ("plank", ExerciseCategory::Core),
  ("crunch", ExerciseCategory::Core),
];

/// Starting loads for an exercise with no history, first match wins
const BASE_WEIGHTS: &[(&str, f64)] = &[
  ("bench", 20.0),
  ("press", 15.0),
  ("squat", 30.0),
  ("deadlift", 40.0),
  ("row", 20.0),
  ("pullup", 0.0),
  ("dip", 0.0),
];

pub const DEFAULT_BASE_WEIGHT: f64 = 20.0;

/// Guess the category from the exercise name
pub fn infer_category(exercise_name: &str) -> ExerciseCategory {
  let key = exercise_name.to_lowercase();
  CATEGORY_KEYWORDS
    .iter()
    .find(|(keyword, _)| key.contains(keyword))
    .map(|(_, category)| *category)
    .unwrap_or_default()
}

/// Starting weight for a brand new exercise
pub fn beginner_base_weight(exercise_name: &str) -> f64 {
  let key = exercise_name.to_lowercase();
  BASE_WEIGHTS
    .iter()
    .find(|(keyword, _)| key.contains(keyword))
    .map(|(_, weight)| *weight)
    .unwrap_or(DEFAULT_BASE_WEIGHT)
}

/// ---------------------------------------------------------------------------
/// Exercise
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
  pub id: String,
  pub name: String,
  pub category: ExerciseCategory,
  #[serde(default)]
  pub muscle_groups: Vec<String>,
}

impl Exercise {
  pub fn new(id: impl Into<String>, name: impl Into<String>, category: ExerciseCategory) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      category,
      muscle_groups: Vec::new(),
    }
  }
}

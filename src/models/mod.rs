pub mod exercise;
pub mod progression;
pub mod workout;

pub use exercise::{Exercise, ExerciseCategory};
pub use progression::{
  MesocyclePhase, MesocycleSettings, ProgressionOverview, ProgressionState, ProgressionType,
  Recommendation, SettingsPatch, VolumeLandmark,
};
pub use workout::{SessionRatings, SetEntry, WorkoutLog};

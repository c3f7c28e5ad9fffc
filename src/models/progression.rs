use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Volume Landmark
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VolumeLandmark {
  /// Minimum effective volume
  #[default]
  #[serde(rename = "MEV")]
  Mev,
  /// Maximum adaptive volume
  #[serde(rename = "MAV")]
  Mav,
  /// Maximum recoverable volume
  #[serde(rename = "MRV")]
  Mrv,
}

impl std::fmt::Display for VolumeLandmark {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Mev => write!(f, "MEV"),
      Self::Mav => write!(f, "MAV"),
      Self::Mrv => write!(f, "MRV"),
    }
  }
}

impl std::str::FromStr for VolumeLandmark {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "MEV" => Ok(Self::Mev),
      "MAV" => Ok(Self::Mav),
      "MRV" => Ok(Self::Mrv),
      _ => Err(format!("Unknown volume landmark: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Progression Type / Mesocycle Phase
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionType {
  Weight,
  Volume,
  Deload,
  Maintain,
}

impl ProgressionType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Weight => "weight",
      Self::Volume => "volume",
      Self::Deload => "deload",
      Self::Maintain => "maintain",
    }
  }
}

impl std::fmt::Display for ProgressionType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MesocyclePhase {
  Accumulation,
  Intensification,
  Deload,
  Reset,
}

/// ---------------------------------------------------------------------------
/// Progression State: where the lifter sits in the current mesocycle
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionState {
  pub exercise_id: String,
  /// Starts at 1, reset to 1 by a deload
  pub current_mesocycle_week: u32,
  pub previous_sets: u32,
  pub previous_weight: f64,
  pub previous_rir_avg: f64,
  /// Weighted fatigue + soreness blend
  pub rolling_fatigue_score: f64,
  pub consecutive_weeks_progressing: u32,
  pub last_deload_date: Option<NaiveDate>,
  pub volume_landmark: VolumeLandmark,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl ProgressionState {
  /// Fresh state for an exercise that was just added to tracking
  pub fn new(exercise_id: impl Into<String>) -> Self {
    let now = Utc::now();
    Self {
      exercise_id: exercise_id.into(),
      current_mesocycle_week: 1,
      previous_sets: 3,
      previous_weight: 0.0,
      previous_rir_avg: 3.0,
      rolling_fatigue_score: 2.0,
      consecutive_weeks_progressing: 0,
      last_deload_date: None,
      volume_landmark: VolumeLandmark::Mev,
      created_at: now,
      updated_at: now,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Mesocycle Settings
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MesocycleSettings {
  pub exercise_id: String,
  pub mev_sets: u32,
  pub mav_sets: u32,
  pub mrv_sets: u32,
  pub deload_frequency_weeks: u32,
  /// Inclusive [min, max]
  pub target_rir_range: (u8, u8),
  pub weight_increment: f64,
}

impl MesocycleSettings {
  /// Check that the thresholds describe a usable mesocycle
  pub fn validate(&self) -> Result<(), String> {
    if self.mev_sets == 0 {
      return Err("MEV must be at least 1 set".to_string());
    }
    if self.mev_sets > self.mav_sets {
      return Err(format!(
        "MEV ({}) must not exceed MAV ({})",
        self.mev_sets, self.mav_sets
      ));
    }
    if self.mav_sets > self.mrv_sets {
      return Err(format!(
        "MAV ({}) must not exceed MRV ({})",
        self.mav_sets, self.mrv_sets
      ));
    }
    if self.deload_frequency_weeks == 0 {
      return Err("Deload frequency must be at least 1 week".to_string());
    }
    let (rir_min, rir_max) = self.target_rir_range;
    if rir_min > rir_max {
      return Err(format!(
        "Target RIR range is inverted ({}-{})",
        rir_min, rir_max
      ));
    }
    if !(self.weight_increment.is_finite() && self.weight_increment > 0.0) {
      return Err(format!(
        "Weight increment must be positive, got {}",
        self.weight_increment
      ));
    }
    Ok(())
  }
}

/// Partial settings update, unset fields keep their current value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
  pub mev_sets: Option<u32>,
  pub mav_sets: Option<u32>,
  pub mrv_sets: Option<u32>,
  pub deload_frequency_weeks: Option<u32>,
  pub target_rir_range: Option<(u8, u8)>,
  pub weight_increment: Option<f64>,
}

impl SettingsPatch {
  pub fn apply(&self, settings: &MesocycleSettings) -> MesocycleSettings {
    MesocycleSettings {
      exercise_id: settings.exercise_id.clone(),
      mev_sets: self.mev_sets.unwrap_or(settings.mev_sets),
      mav_sets: self.mav_sets.unwrap_or(settings.mav_sets),
      mrv_sets: self.mrv_sets.unwrap_or(settings.mrv_sets),
      deload_frequency_weeks: self
        .deload_frequency_weeks
        .unwrap_or(settings.deload_frequency_weeks),
      target_rir_range: self.target_rir_range.unwrap_or(settings.target_rir_range),
      weight_increment: self.weight_increment.unwrap_or(settings.weight_increment),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.mev_sets.is_none()
      && self.mav_sets.is_none()
      && self.mrv_sets.is_none()
      && self.deload_frequency_weeks.is_none()
      && self.target_rir_range.is_none()
      && self.weight_increment.is_none()
  }
}

/// ---------------------------------------------------------------------------
/// Recommendation (derived, never persisted)
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
  pub exercise_id: String,
  pub exercise_name: String,
  pub recommended_sets: u32,
  pub recommended_weight: f64,
  pub target_rir: u8,
  pub target_reps: u32,
  /// Rest between sets in seconds
  pub rest_time: u32,
  pub progression_type: ProgressionType,
  /// 0.0 - 1.0
  pub confidence: f64,
  pub reasoning: String,
  pub deload_week: bool,
  pub mesocycle_phase: MesocyclePhase,
}

/// Per-exercise snapshot for dashboards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionOverview {
  pub exercise_id: String,
  pub current_week: u32,
  pub volume_landmark: VolumeLandmark,
  pub rolling_fatigue: f64,
  pub weeks_progressing: u32,
  pub last_deload: Option<NaiveDate>,
}

impl From<&ProgressionState> for ProgressionOverview {
  fn from(state: &ProgressionState) -> Self {
    Self {
      exercise_id: state.exercise_id.clone(),
      current_week: state.current_mesocycle_week,
      volume_landmark: state.volume_landmark,
      rolling_fatigue: state.rolling_fatigue_score,
      weeks_progressing: state.consecutive_weeks_progressing,
      last_deload: state.last_deload_date,
    }
  }
}

//! rp-coach: mesocycle tracking and progression recommendations
//!
//! Usage:
//! ```bash
//! # Start tracking an exercise (category inferred from the name when omitted)
//! rp-coach init bench --name "Bench Press" --category push
//!
//! # What to do next session
//! rp-coach recommend bench
//!
//! # Log a session: sets as REPSxWEIGHT[@RIR]
//! rp-coach log bench --set 8x60@2 --set 8x60@2 --set 7x60@1 --fatigue 3 --performance 4
//!
//! # Tune the mesocycle
//! rp-coach settings set bench --mav 8 --increment 1.25
//! ```

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, warn};

use rp_coach_lib::commands::{self, progression, CoachError};
use rp_coach_lib::config::{AppConfig, ConfigError};
use rp_coach_lib::db::{self, AppState};
use rp_coach_lib::logging::init_tracing;
use rp_coach_lib::models::exercise::{infer_category, Exercise, ExerciseCategory};
use rp_coach_lib::models::progression::SettingsPatch;
use rp_coach_lib::models::workout::{SessionRatings, SetEntry};
use rp_coach_lib::store::StoreError;

#[derive(Debug, thiserror::Error)]
enum CliError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Store(#[from] StoreError),

  #[error(transparent)]
  Coach(#[from] CoachError),

  #[error("Failed to render output: {0}")]
  Output(#[from] serde_json::Error),
}

#[derive(Parser)]
#[command(
  name = "rp-coach",
  about = "Mesocycle-based strength progression coach",
  version
)]
struct Cli {
  #[command(subcommand)]
  command: Command,

  /// SQLite database path override
  #[arg(long, global = true)]
  db: Option<PathBuf>,

  /// Enable debug logging
  #[arg(long, short = 'v', global = true)]
  verbose: bool,
}

#[derive(Subcommand)]
enum Command {
  /// Start (or restart) progression tracking for an exercise
  Init {
    exercise_id: String,

    /// Display name, defaults to the id
    #[arg(long)]
    name: Option<String>,

    /// push | pull | legs | core, inferred from the name when omitted
    #[arg(long)]
    category: Option<ExerciseCategory>,
  },

  /// Recommendation for the next session
  Recommend { exercise_id: String },

  /// Set-history suggestion (no progression tracking needed)
  Suggest { exercise_id: String },

  /// Log a completed session
  Log {
    exercise_id: String,

    /// One set as REPSxWEIGHT[@RIR], repeat per set
    #[arg(long = "set", value_parser = parse_set, required = true)]
    sets: Vec<SetEntry>,

    /// Session date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,

    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    fatigue: Option<u8>,

    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    soreness: Option<u8>,

    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pump: Option<u8>,

    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    performance: Option<u8>,
  },

  /// Recent sessions, oldest first
  History {
    exercise_id: String,

    #[arg(long)]
    limit: Option<u32>,
  },

  /// Show or change mesocycle settings
  Settings {
    #[command(subcommand)]
    action: SettingsCommand,
  },

  /// Mesocycle position of every tracked exercise
  Overview,

  /// List known exercises
  Exercises,
}

#[derive(Subcommand)]
enum SettingsCommand {
  Show {
    exercise_id: String,
  },

  Set {
    exercise_id: String,

    #[arg(long)]
    mev: Option<u32>,

    #[arg(long)]
    mav: Option<u32>,

    #[arg(long)]
    mrv: Option<u32>,

    /// Weeks of progression before a deload is due
    #[arg(long)]
    deload_weeks: Option<u32>,

    #[arg(long, requires = "rir_max")]
    rir_min: Option<u8>,

    #[arg(long, requires = "rir_min")]
    rir_max: Option<u8>,

    /// Load added on weight progression
    #[arg(long)]
    increment: Option<f64>,
  },
}

/// Parse `REPSxWEIGHT` or `REPSxWEIGHT@RIR`, e.g. `8x60` or `8x62.5@2`
fn parse_set(raw: &str) -> Result<SetEntry, String> {
  let (volume, rir) = match raw.split_once('@') {
    Some((volume, rir)) => {
      let rir = rir
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|rir| rir.is_finite() && *rir >= 0.0)
        .ok_or_else(|| format!("invalid RIR in '{}'", raw))?;
      (volume, Some(rir))
    }
    None => (raw, None),
  };

  let (reps, weight) = volume
    .split_once(['x', 'X'])
    .ok_or_else(|| format!("expected REPSxWEIGHT, got '{}'", raw))?;
  let reps = reps
    .trim()
    .parse::<u32>()
    .ok()
    .filter(|reps| *reps > 0)
    .ok_or_else(|| format!("invalid reps in '{}'", raw))?;
  let weight = weight
    .trim()
    .parse::<f64>()
    .ok()
    .filter(|weight| weight.is_finite() && *weight >= 0.0)
    .ok_or_else(|| format!("invalid weight in '{}'", raw))?;

  Ok(SetEntry { reps, weight, rir })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

async fn run(command: Command, state: &AppState) -> Result<(), CliError> {
  match command {
    Command::Init {
      exercise_id,
      name,
      category,
    } => {
      let name = name.unwrap_or_else(|| exercise_id.clone());
      let category = category.unwrap_or_else(|| infer_category(&name));
      let exercise = Exercise::new(exercise_id, name, category);
      let (progression_state, settings) =
        progression::initialize_exercise_progression(state, &exercise).await?;
      print_json(&serde_json::json!({
        "exercise": exercise,
        "state": progression_state,
        "settings": settings,
      }))
    }
    Command::Recommend { exercise_id } => {
      print_json(&progression::get_progression_recommendation(state, &exercise_id).await?)
    }
    Command::Suggest { exercise_id } => {
      print_json(&commands::get_workout_suggestion(state, &exercise_id).await?)
    }
    Command::Log {
      exercise_id,
      sets,
      date,
      fatigue,
      soreness,
      pump,
      performance,
    } => {
      let date = date.unwrap_or_else(|| Local::now().date_naive());
      let ratings = SessionRatings {
        fatigue,
        soreness,
        pump,
        performance,
      };
      let logged = progression::log_workout(state, &exercise_id, date, &sets, &ratings).await?;
      print_json(&logged)
    }
    Command::History { exercise_id, limit } => {
      print_json(&progression::get_exercise_logs(state, &exercise_id, limit).await?)
    }
    Command::Settings { action } => match action {
      SettingsCommand::Show { exercise_id } => {
        print_json(&progression::get_mesocycle_settings(state, &exercise_id).await?)
      }
      SettingsCommand::Set {
        exercise_id,
        mev,
        mav,
        mrv,
        deload_weeks,
        rir_min,
        rir_max,
        increment,
      } => {
        let patch = SettingsPatch {
          mev_sets: mev,
          mav_sets: mav,
          mrv_sets: mrv,
          deload_frequency_weeks: deload_weeks,
          target_rir_range: rir_min.zip(rir_max),
          weight_increment: increment,
        };
        if patch.is_empty() {
          warn!(%exercise_id, "no settings given, nothing changed");
        }
        print_json(&progression::update_mesocycle_settings(state, &exercise_id, &patch).await?)
      }
    },
    Command::Overview => print_json(&progression::get_progression_overview(state).await?),
    Command::Exercises => print_json(&commands::list_exercises(state).await?),
  }
}

async fn execute(command: Command, config: &AppConfig) -> Result<(), CliError> {
  let state = db::open(config).await?;
  let outcome = run(command, &state).await;
  state.db.close().await;
  outcome
}

#[tokio::main]
async fn main() -> ExitCode {
  dotenvy::dotenv().ok();
  let cli = Cli::parse();

  let config = match AppConfig::from_env() {
    Ok(config) => config.with_database_path(cli.db),
    Err(err) => {
      eprintln!("Error: {}", err);
      return ExitCode::FAILURE;
    }
  };

  init_tracing(&config.log_filter, cli.verbose);
  debug!(?config, "configuration loaded");

  match execute(cli.command, &config).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      tracing::error!("{}", err);
      eprintln!("Error: {}", err);
      ExitCode::FAILURE
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_set() {
    assert_eq!(
      parse_set("8x62.5@2").unwrap(),
      SetEntry { reps: 8, weight: 62.5, rir: Some(2.0) }
    );
    assert_eq!(
      parse_set("10X40").unwrap(),
      SetEntry { reps: 10, weight: 40.0, rir: None }
    );
    assert!(parse_set("8-60").is_err());
    assert!(parse_set("eightx60").is_err());
    assert!(parse_set("8x60@hard").is_err());
  }

  #[test]
  fn test_parse_set_rejects_impossible_values() {
    for bad in ["8xNaN", "8xinf", "8x-20", "0x60", "8x60@-1", "8x60@NaN"] {
      assert!(parse_set(bad).is_err(), "{} should be rejected", bad);
    }
    assert_eq!(parse_set("12x0").unwrap().weight, 0.0);
  }

  #[test]
  fn test_cli_parses_log_command() {
    let cli = Cli::try_parse_from([
      "rp-coach", "--db", "/tmp/x.db", "log", "bench", "--set", "8x60@2", "--set", "7x60@1",
      "--fatigue", "4", "--date", "2025-03-03",
    ])
    .expect("Should parse");

    assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
    match cli.command {
      Command::Log { sets, fatigue, date, soreness, .. } => {
        assert_eq!(sets.len(), 2);
        assert_eq!(fatigue, Some(4));
        assert_eq!(soreness, None);
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 3));
      }
      _ => panic!("expected log command"),
    }
  }

  #[test]
  fn test_cli_rejects_out_of_range_rating() {
    let result = Cli::try_parse_from(["rp-coach", "log", "bench", "--set", "8x60", "--fatigue", "7"]);
    assert!(result.is_err());
  }

  #[test]
  fn test_rir_range_flags_come_in_pairs() {
    let result = Cli::try_parse_from(["rp-coach", "settings", "set", "bench", "--rir-min", "1"]);
    assert!(result.is_err());
  }
}

//! Mesocycle-based strength progression coach
//!
//! `progression` holds the pure engine; `commands` runs the
//! read -> recommend -> log -> update -> persist cycle against SQLite.

pub mod commands;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod progression;
pub mod store;
pub mod suggestions;

#[cfg(test)]
mod test_utils;

pub use commands::CoachError;
pub use db::AppState;
pub use progression::{generate_recommendation, get_default_mesocycle_settings, update_progression_state};

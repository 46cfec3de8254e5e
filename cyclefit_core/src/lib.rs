#![forbid(unsafe_code)]

//! Core domain model and business logic for Cyclefit.
//!
//! This crate provides:
//! - Domain types (phases, cycle stats, nutrition profile and targets)
//! - Cycle engine: cycle-length learning, phase classification, predictions
//! - Nutrition engine: BMR, activity multiplier, calorie and macro targets
//! - Persistence (period log WAL, user state, CSV export)
//!
//! The two engines are independent; cycle phase is not an input to the
//! nutrition targets.

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod dates;
pub mod history;
pub mod cycle;
pub mod phase;
pub mod prediction;
pub mod engine;
pub mod nutrition;
pub mod wal;
pub mod state;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use dates::{days_between, parse_iso_date};
pub use history::PeriodHistory;
pub use cycle::{
    compute_cycle_length_samples, compute_cycle_stats, confidence, learned_cycle_length,
    mark_outliers, variability,
};
pub use phase::{
    calculate_cycle_day, calculate_start_date_from_phase, get_phase_for_day, CycleShape,
};
pub use prediction::{get_ovulation_window, get_prediction_window, predict_next_period_start};
pub use engine::{evaluate_cycle, CycleContext, CycleOutlook, CycleSettings};
pub use nutrition::{calculate_target_ranges, BodyMetrics};
pub use wal::{JsonlSink, PeriodEvent, PeriodLogEntry, PeriodSink};
pub use state::UserState;
pub use export::export_cycle_samples;

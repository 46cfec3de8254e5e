//! Core domain types for the Cyclefit system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Cycle phases, confidence labels and phase provenance
//! - Derived cycle statistics and samples
//! - Prediction windows
//! - Nutrition profile inputs and targets

use crate::Error;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Cycle Types
// ============================================================================

/// Physiological segment of the menstrual cycle
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Menstrual,
    Follicular,
    Ovulatory,
    Luteal,
}

impl CyclePhase {
    pub const ALL: [CyclePhase; 4] = [
        CyclePhase::Menstrual,
        CyclePhase::Follicular,
        CyclePhase::Ovulatory,
        CyclePhase::Luteal,
    ];
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CyclePhase::Menstrual => "Menstrual",
            CyclePhase::Follicular => "Follicular",
            CyclePhase::Ovulatory => "Ovulatory",
            CyclePhase::Luteal => "Luteal",
        };
        f.write_str(name)
    }
}

impl FromStr for CyclePhase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "menstrual" | "period" => Ok(CyclePhase::Menstrual),
            "follicular" => Ok(CyclePhase::Follicular),
            "ovulatory" | "ovulation" => Ok(CyclePhase::Ovulatory),
            "luteal" => Ok(CyclePhase::Luteal),
            other => Err(Error::Other(format!("Unknown cycle phase: {}", other))),
        }
    }
}

/// Coarse reliability label for the learned cycle length
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        };
        f.write_str(name)
    }
}

/// Where the phase reported for a day came from
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhaseSource {
    /// Explicit "bleeding today" check-in
    CheckIn,
    /// Phase pinned manually by the user
    Override,
    /// Derived from the logged history
    Computed,
}

/// A phase pinned by the user, superseding the computed phase until the
/// next period start is logged
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhaseOverride {
    pub phase: CyclePhase,
    pub pinned_on: NaiveDate,
}

/// Explicit statement of bleeding status for a single day
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BleedingCheckIn {
    pub date: NaiveDate,
    pub bleeding: bool,
}

impl BleedingCheckIn {
    /// Whether this check-in reports bleeding on `date`
    pub fn bleeding_on(&self, date: NaiveDate) -> bool {
        self.bleeding && self.date == date
    }
}

/// Day count between two adjacent period starts
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleLengthSample {
    pub length: i64,
    /// The later of the two start dates
    pub anchor_date: NaiveDate,
    pub is_outlier: bool,
}

/// Summary statistics derived from the period-start history
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CycleStats {
    pub learned_cycle_length: u32,
    pub variability: f64,
    pub confidence: Confidence,
    pub valid_sample_count: usize,
    pub outlier_count: usize,
}

/// Inclusive range of calendar dates
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Window of `radius` days either side of `center`
    ///
    /// `None` when either end falls outside the representable calendar.
    pub fn around(center: NaiveDate, radius: i64) -> Option<Self> {
        let radius = Duration::days(radius);
        Some(Self {
            start: center.checked_sub_signed(radius)?,
            end: center.checked_add_signed(radius)?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days covered, counting both ends
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

// ============================================================================
// Nutrition Types
// ============================================================================

/// Day-to-day movement outside of training
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LifestyleLevel {
    #[default]
    Sedentary,
    Mixed,
    Active,
}

/// Typical daily step count band
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum StepsRange {
    /// Fewer than 4k steps
    #[default]
    #[serde(rename = "lt_4k", alias = "k0_4")]
    Under4k,
    /// 4k to 7k steps
    #[serde(rename = "k4_7")]
    From4kTo7k,
    /// 7k to 10k steps
    #[serde(rename = "k7_10")]
    From7kTo10k,
    /// More than 10k steps
    #[serde(rename = "gt_10k", alias = "k10_plus")]
    Over10k,
}

/// What the user is working towards
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    LoseFat,
    Recomp,
    GainMuscle,
    /// Also used for unrecognized goals
    #[default]
    #[serde(other)]
    Maintain,
}

/// Aggressiveness of the deficit or surplus
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaceTempo {
    Slow,
    Fast,
    /// Also used for unrecognized paces
    #[default]
    #[serde(other)]
    Average,
}

macro_rules! impl_from_str_via_serde {
    ($($ty:ty => $label:literal),* $(,)?) => {
        $(
            impl FromStr for $ty {
                type Err = Error;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    let value = serde_json::Value::String(s.trim().to_lowercase());
                    serde_json::from_value(value).map_err(|_| {
                        Error::InvalidProfile(format!("unknown {}: {}", $label, s))
                    })
                }
            }
        )*
    };
}

impl_from_str_via_serde!(
    LifestyleLevel => "lifestyle level",
    StepsRange => "steps range",
    Goal => "goal",
    PaceTempo => "pace",
);

/// Body, activity and goal inputs for the nutrition engine
///
/// Body metrics are optional because onboarding may not have collected them
/// yet; the engine declines to compute targets until all three are present.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct Profile {
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub training_days_per_week: u8,
    #[serde(default)]
    pub lifestyle_level: LifestyleLevel,
    #[serde(default)]
    pub steps_range: StepsRange,
    #[serde(default)]
    pub goal: Goal,
    #[serde(default)]
    pub pace_tempo: PaceTempo,
}

/// Daily calorie and macro targets
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NutritionTargets {
    pub bmr: f64,
    pub activity_multiplier: f64,
    pub tdee_estimate: u32,
    pub calorie_target: u32,
    pub protein_grams: u32,
    pub fat_grams: u32,
    pub carbs_grams: u32,
}

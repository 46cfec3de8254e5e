//! Calorie and macro target computation.
//!
//! The model, step by step:
//! - BMR from the women's Mifflin-St Jeor form: 10w + 6.25h - 5a - 161
//! - Activity score from lifestyle, steps and training days
//! - Activity multiplier from the highest score band reached
//! - TDEE = round(BMR × multiplier)
//! - Goal/pace factor applied to TDEE for the calorie target
//! - Protein and fat per kg body weight, carbs fill the remaining calories
//!
//! Cycle phase is not an input here.

use crate::{
    Error, Goal, LifestyleLevel, NutritionTargets, PaceTempo, Profile, Result, StepsRange,
};

const PROTEIN_KCAL_PER_GRAM: f64 = 4.0;
const CARBS_KCAL_PER_GRAM: f64 = 4.0;
const FAT_KCAL_PER_GRAM: f64 = 9.0;

const FAT_GRAMS_PER_KG: f64 = 0.9;

/// Activity score thresholds and their multipliers, highest band first
const ACTIVITY_BANDS: [(u32, f64); 4] = [(10, 1.9), (7, 1.725), (4, 1.55), (2, 1.375)];
const BASE_ACTIVITY_MULTIPLIER: f64 = 1.2;

/// Validated body metrics, all present and positive
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyMetrics {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: u32,
}

impl BodyMetrics {
    /// Extract the required metrics, or `None` if any is missing or non-positive
    pub fn from_profile(profile: &Profile) -> Option<Self> {
        let weight_kg = profile.weight_kg.filter(|w| w.is_finite() && *w > 0.0)?;
        let height_cm = profile.height_cm.filter(|h| h.is_finite() && *h > 0.0)?;
        let age = profile.age.filter(|a| *a > 0)?;

        Some(Self {
            weight_kg,
            height_cm,
            age,
        })
    }
}

impl Profile {
    /// Reject values no onboarding form should produce
    ///
    /// Missing body metrics are fine here; they only make targets unavailable.
    pub fn validate(&self) -> Result<()> {
        if self.training_days_per_week > 7 {
            return Err(Error::InvalidProfile(format!(
                "training days per week must be 0-7, got {}",
                self.training_days_per_week
            )));
        }

        for (name, value) in [("weight", self.weight_kg), ("height", self.height_cm)] {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(Error::InvalidProfile(format!(
                        "{} must be a positive number, got {}",
                        name, v
                    )));
                }
            }
        }

        if self.age == Some(0) {
            return Err(Error::InvalidProfile("age must be positive".into()));
        }

        Ok(())
    }
}

/// Basal metabolic rate in kcal/day
pub fn basal_metabolic_rate(body: &BodyMetrics) -> f64 {
    10.0 * body.weight_kg + 6.25 * body.height_cm - 5.0 * body.age as f64 - 161.0
}

/// Additive activity score from lifestyle, steps and training frequency
pub fn activity_score(profile: &Profile) -> u32 {
    let lifestyle = match profile.lifestyle_level {
        LifestyleLevel::Sedentary => 0,
        LifestyleLevel::Mixed => 1,
        LifestyleLevel::Active => 2,
    };

    let steps = match profile.steps_range {
        StepsRange::Under4k => 0,
        StepsRange::From4kTo7k => 1,
        StepsRange::From7kTo10k => 2,
        StepsRange::Over10k => 3,
    };

    let training = match profile.training_days_per_week {
        0 => 0,
        1..=2 => 1,
        3..=4 => 2,
        5..=6 => 3,
        _ => 4,
    };

    lifestyle + steps + training
}

/// Multiplier for the highest activity band the score reaches
pub fn activity_multiplier(score: u32) -> f64 {
    ACTIVITY_BANDS
        .iter()
        .find(|(threshold, _)| score >= *threshold)
        .map(|(_, multiplier)| *multiplier)
        .unwrap_or(BASE_ACTIVITY_MULTIPLIER)
}

/// Factor applied to TDEE for the goal and pace
pub fn goal_calorie_factor(goal: Goal, pace: PaceTempo) -> f64 {
    match goal {
        Goal::LoseFat | Goal::Recomp => match pace {
            PaceTempo::Slow => 0.90,
            PaceTempo::Average => 0.85,
            PaceTempo::Fast => 0.75,
        },
        Goal::GainMuscle => match pace {
            PaceTempo::Slow => 1.05,
            PaceTempo::Average => 1.10,
            PaceTempo::Fast => 1.15,
        },
        Goal::Maintain => 1.0,
    }
}

/// Protein grams per kg of body weight
pub fn protein_factor(goal: Goal) -> f64 {
    match goal {
        Goal::LoseFat | Goal::Recomp => 2.0,
        Goal::Maintain | Goal::GainMuscle => 1.8,
    }
}

/// Compute daily targets, or `None` when body metrics are insufficient
pub fn calculate_target_ranges(profile: &Profile) -> Option<NutritionTargets> {
    let Some(body) = BodyMetrics::from_profile(profile) else {
        tracing::debug!("Profile is missing weight, height or age; targets unavailable");
        return None;
    };

    let bmr = basal_metabolic_rate(&body);
    let score = activity_score(profile);
    let multiplier = activity_multiplier(score);
    let tdee = (bmr * multiplier).round().max(0.0);

    let calorie_target = match profile.goal {
        Goal::Maintain => tdee,
        goal => (tdee * goal_calorie_factor(goal, profile.pace_tempo)).round(),
    };

    let protein_grams = (body.weight_kg * protein_factor(profile.goal)).round();
    let fat_grams = (body.weight_kg * FAT_GRAMS_PER_KG).round();

    let remaining_kcal = calorie_target
        - protein_grams * PROTEIN_KCAL_PER_GRAM
        - fat_grams * FAT_KCAL_PER_GRAM;
    let carbs_grams = (remaining_kcal / CARBS_KCAL_PER_GRAM).max(0.0).round();

    tracing::debug!(
        "Nutrition: BMR {:.1}, activity score {} (x{}), TDEE {}, target {}",
        bmr,
        score,
        multiplier,
        tdee,
        calorie_target
    );

    Some(NutritionTargets {
        bmr,
        activity_multiplier: multiplier,
        tdee_estimate: tdee as u32,
        calorie_target: calorie_target as u32,
        protein_grams: protein_grams as u32,
        fat_grams: fat_grams as u32,
        carbs_grams: carbs_grams as u32,
    })
}

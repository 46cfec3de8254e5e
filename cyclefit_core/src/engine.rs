//! Cycle outlook for a single calendar date.
//!
//! This is the composition the hosting application performs every time it
//! renders "today": learn the cycle length from history, count the cycle
//! day, classify the phase and project the next period.
//!
//! Phase precedence:
//! 1. Bleeding check-in for the evaluated date → Menstrual
//! 2. Manual override pinned on or before the evaluated date
//! 3. Phase computed from the history

use crate::cycle::compute_cycle_stats;
use crate::phase::{calculate_cycle_day, get_phase_for_day, CycleShape};
use crate::prediction::{get_ovulation_window, get_prediction_window, predict_next_period_start};
use crate::{
    CyclePhase, CycleStats, DateWindow, Error, PeriodHistory, PhaseOverride, PhaseSource, Result,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-user cycle settings
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleSettings {
    /// Cycle length given at onboarding, used until history says otherwise
    pub fallback_cycle_length: u32,
    pub period_length: u32,
    pub luteal_length: u32,
}

impl CycleSettings {
    /// Check that the cycle geometry is usable
    ///
    /// Cycle length must be 15..=60 days; period and luteal lengths must be
    /// at least one day and shorter than the cycle.
    pub fn validate(&self) -> Result<()> {
        let cycle_length = self.fallback_cycle_length;

        if !(15..=60).contains(&cycle_length) {
            return Err(Error::Config(format!(
                "cycle length must be between 15 and 60 days, got {}",
                cycle_length
            )));
        }
        if self.period_length == 0 || self.period_length >= cycle_length {
            return Err(Error::Config(format!(
                "period length must be between 1 and {} days, got {}",
                cycle_length - 1,
                self.period_length
            )));
        }
        if self.luteal_length == 0 || self.luteal_length >= cycle_length {
            return Err(Error::Config(format!(
                "luteal length must be between 1 and {} days, got {}",
                cycle_length - 1,
                self.luteal_length
            )));
        }

        Ok(())
    }
}

/// Everything needed to evaluate one date
#[derive(Clone, Debug)]
pub struct CycleContext {
    pub today: NaiveDate,
    pub history: PeriodHistory,
    pub settings: CycleSettings,
    pub menstruating_now: bool,
    pub phase_override: Option<PhaseOverride>,
}

/// Cycle status for one date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CycleOutlook {
    pub date: NaiveDate,
    pub cycle_day: u32,
    pub phase: CyclePhase,
    pub phase_source: PhaseSource,
    pub last_period_start: Option<NaiveDate>,
    pub stats: CycleStats,
    pub next_period_start: Option<NaiveDate>,
    pub prediction_window: Option<DateWindow>,
    pub ovulation_window: Option<DateWindow>,
}

/// Evaluate the cycle for `ctx.today`
///
/// Starts logged after the evaluated date are ignored, so past dates read
/// the same as they did at the time.
pub fn evaluate_cycle(ctx: &CycleContext) -> CycleOutlook {
    let history = ctx.history.as_of(ctx.today);
    let stats = compute_cycle_stats(&history, ctx.settings.fallback_cycle_length);

    let shape = CycleShape {
        cycle_length: stats.learned_cycle_length,
        period_length: ctx.settings.period_length,
        luteal_length: ctx.settings.luteal_length,
    };

    let last_start = history.last();
    let cycle_day = calculate_cycle_day(last_start, ctx.today);

    let (phase, phase_source) = resolve_phase(ctx, cycle_day, &shape, last_start.is_some());

    let next_period_start = predict_next_period_start(&history, stats.learned_cycle_length);
    let prediction_window =
        get_prediction_window(&history, Some(stats.learned_cycle_length), stats.confidence);
    let ovulation_window = next_period_start
        .and_then(|next| get_ovulation_window(next, ctx.settings.luteal_length));

    tracing::info!(
        "Outlook for {}: day {}, {} ({:?}), learned length {} ({} confidence)",
        ctx.today,
        cycle_day,
        phase,
        phase_source,
        stats.learned_cycle_length,
        stats.confidence
    );

    CycleOutlook {
        date: ctx.today,
        cycle_day,
        phase,
        phase_source,
        last_period_start: last_start,
        stats,
        next_period_start,
        prediction_window,
        ovulation_window,
    }
}

fn resolve_phase(
    ctx: &CycleContext,
    cycle_day: u32,
    shape: &CycleShape,
    has_valid_start: bool,
) -> (CyclePhase, PhaseSource) {
    if ctx.menstruating_now {
        return (CyclePhase::Menstrual, PhaseSource::CheckIn);
    }

    if let Some(pinned) = ctx.phase_override.filter(|o| o.pinned_on <= ctx.today) {
        tracing::info!(
            "Using phase {} pinned on {} instead of computed phase",
            pinned.phase,
            pinned.pinned_on
        );
        return (pinned.phase, PhaseSource::Override);
    }

    let phase = get_phase_for_day(cycle_day, shape, false, has_valid_start);
    (phase, PhaseSource::Computed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Confidence;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn settings() -> CycleSettings {
        CycleSettings {
            fallback_cycle_length: 28,
            period_length: 5,
            luteal_length: 14,
        }
    }

    fn create_test_context(today: &str, starts: &[&str]) -> CycleContext {
        crate::logging::init_test();
        CycleContext {
            today: date(today),
            history: PeriodHistory::from_dates(starts.iter().map(|s| date(s))),
            settings: settings(),
            menstruating_now: false,
            phase_override: None,
        }
    }

    #[test]
    fn test_no_history_defaults() {
        let ctx = create_test_context("2024-03-10", &[]);
        let outlook = evaluate_cycle(&ctx);

        assert_eq!(outlook.cycle_day, 1);
        assert_eq!(outlook.phase, CyclePhase::Luteal);
        assert_eq!(outlook.phase_source, PhaseSource::Computed);
        assert_eq!(outlook.stats.learned_cycle_length, 28);
        assert_eq!(outlook.stats.confidence, Confidence::Low);
        assert!(outlook.next_period_start.is_none());
        assert!(outlook.prediction_window.is_none());
        assert!(outlook.ovulation_window.is_none());
    }

    #[test]
    fn test_regular_history() {
        let ctx = create_test_context(
            "2024-04-22",
            &[
                "2024-01-01",
                "2024-01-29",
                "2024-02-26",
                "2024-03-25",
                "2024-04-22",
            ],
        );
        let outlook = evaluate_cycle(&ctx);

        assert_eq!(outlook.cycle_day, 1);
        assert_eq!(outlook.phase, CyclePhase::Follicular);
        assert_eq!(outlook.stats.learned_cycle_length, 28);
        assert_eq!(outlook.stats.confidence, Confidence::High);
        assert_eq!(outlook.next_period_start, Some(date("2024-05-20")));

        let prediction = outlook.prediction_window.unwrap();
        assert_eq!(prediction.start, date("2024-05-18"));
        assert_eq!(prediction.end, date("2024-05-22"));

        let ovulation = outlook.ovulation_window.unwrap();
        assert_eq!(ovulation.start, date("2024-05-05"));
        assert_eq!(ovulation.end, date("2024-05-07"));
    }

    #[test]
    fn test_fertile_window_day() {
        // 2024-01-01 + 9 days is cycle day 10
        let ctx = create_test_context("2024-01-10", &["2024-01-01"]);
        let outlook = evaluate_cycle(&ctx);

        assert_eq!(outlook.cycle_day, 10);
        assert_eq!(outlook.phase, CyclePhase::Ovulatory);
    }

    #[test]
    fn test_overdue_cycle_keeps_counting() {
        let ctx = create_test_context("2024-02-04", &["2024-01-01"]);
        let outlook = evaluate_cycle(&ctx);

        assert_eq!(outlook.cycle_day, 35);
        assert_eq!(outlook.phase, CyclePhase::Luteal);
    }

    #[test]
    fn test_checkin_beats_override() {
        let mut ctx = create_test_context("2024-01-10", &["2024-01-01"]);
        ctx.menstruating_now = true;
        ctx.phase_override = Some(PhaseOverride {
            phase: CyclePhase::Luteal,
            pinned_on: date("2024-01-09"),
        });

        let outlook = evaluate_cycle(&ctx);
        assert_eq!(outlook.phase, CyclePhase::Menstrual);
        assert_eq!(outlook.phase_source, PhaseSource::CheckIn);
    }

    #[test]
    fn test_override_beats_computed() {
        let mut ctx = create_test_context("2024-01-10", &["2024-01-01"]);
        ctx.phase_override = Some(PhaseOverride {
            phase: CyclePhase::Luteal,
            pinned_on: date("2024-01-09"),
        });

        let outlook = evaluate_cycle(&ctx);
        assert_eq!(outlook.phase, CyclePhase::Luteal);
        assert_eq!(outlook.phase_source, PhaseSource::Override);
    }

    #[test]
    fn test_override_pinned_later_is_ignored() {
        let mut ctx = create_test_context("2024-01-10", &["2024-01-01"]);
        ctx.phase_override = Some(PhaseOverride {
            phase: CyclePhase::Luteal,
            pinned_on: date("2024-01-20"),
        });

        let outlook = evaluate_cycle(&ctx);
        assert_eq!(outlook.phase, CyclePhase::Ovulatory);
        assert_eq!(outlook.phase_source, PhaseSource::Computed);
    }

    #[test]
    fn test_future_starts_are_ignored() {
        let ctx = create_test_context("2024-01-10", &["2024-01-01", "2024-01-29"]);
        let outlook = evaluate_cycle(&ctx);

        assert_eq!(outlook.last_period_start, Some(date("2024-01-01")));
        assert_eq!(outlook.cycle_day, 10);
        assert_eq!(outlook.stats.valid_sample_count, 0);
    }

    #[test]
    fn test_learned_length_shifts_phase() {
        // Consistent 35-day cycles move ovulation to day 21
        let ctx = create_test_context(
            "2024-04-26",
            &["2024-01-01", "2024-02-05", "2024-03-11", "2024-04-15"],
        );
        let outlook = evaluate_cycle(&ctx);

        assert_eq!(outlook.stats.learned_cycle_length, 35);
        assert_eq!(outlook.cycle_day, 12);
        assert_eq!(outlook.phase, CyclePhase::Follicular);
    }

    #[test]
    fn test_settings_validation() {
        assert!(settings().validate().is_ok());

        let mut bad = settings();
        bad.fallback_cycle_length = 90;
        assert!(matches!(bad.validate(), Err(Error::Config(_))));

        let mut bad = settings();
        bad.fallback_cycle_length = 21;
        bad.period_length = 21;
        assert!(matches!(bad.validate(), Err(Error::Config(_))));

        let mut bad = settings();
        bad.luteal_length = 0;
        assert!(matches!(bad.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_calendar_end_degrades_to_no_prediction() {
        crate::logging::init_test();
        let ctx = CycleContext {
            today: NaiveDate::MAX,
            history: PeriodHistory::from_dates(vec![NaiveDate::MAX]),
            settings: settings(),
            menstruating_now: false,
            phase_override: None,
        };

        let outlook = evaluate_cycle(&ctx);
        assert_eq!(outlook.cycle_day, 1);
        assert_eq!(outlook.last_period_start, Some(NaiveDate::MAX));
        assert!(outlook.next_period_start.is_none());
        assert!(outlook.prediction_window.is_none());
        assert!(outlook.ovulation_window.is_none());
    }
}

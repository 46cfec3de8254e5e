//! Phase classification for a day in the cycle.
//!
//! Day counts are linear from the last logged start: an overdue cycle keeps
//! counting (day 35 of a 28-day cycle stays day 35) and only a newly logged
//! start resets it. Classification rules, in priority order:
//!
//! 1. Explicit bleeding check-in → Menstrual
//! 2. No logged start at all → Luteal
//! 3. Past the expected cycle length → Luteal (late luteal)
//! 4. Inside the fertile window → Ovulatory, after it → Luteal, before it → Follicular
//!
//! Day count alone never yields Menstrual.

use crate::dates::days_between;
use crate::CyclePhase;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Assumed days from ovulation to the next period start
pub const DEFAULT_LUTEAL_LENGTH: u32 = 14;

/// Days before ovulation that count as fertile
const FERTILE_DAYS_BEFORE_OVULATION: i64 = 5;

/// Days after ovulation that count as fertile
const FERTILE_DAYS_AFTER_OVULATION: i64 = 1;

/// Geometry of one cycle, in days
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleShape {
    pub cycle_length: u32,
    pub period_length: u32,
    pub luteal_length: u32,
}

impl CycleShape {
    /// Shape with the default 14-day luteal phase
    pub fn new(cycle_length: u32, period_length: u32) -> Self {
        Self {
            cycle_length,
            period_length,
            luteal_length: DEFAULT_LUTEAL_LENGTH,
        }
    }

    /// Cycle day on which ovulation is expected
    pub fn ovulation_day(&self) -> i64 {
        self.cycle_length as i64 - self.luteal_length as i64
    }

    /// First and last cycle day of the fertile window, inclusive
    pub fn fertile_window(&self) -> (i64, i64) {
        let ovulation = self.ovulation_day();
        (
            ovulation - FERTILE_DAYS_BEFORE_OVULATION,
            ovulation + FERTILE_DAYS_AFTER_OVULATION,
        )
    }
}

/// 1-based linear day of the cycle that began on `start_date`
///
/// Returns 1 when there is no start date or `target_date` precedes it.
pub fn calculate_cycle_day(start_date: Option<NaiveDate>, target_date: NaiveDate) -> u32 {
    let Some(start) = start_date else {
        return 1;
    };

    let day = days_between(start, target_date) + 1;
    u32::try_from(day).ok().filter(|d| *d >= 1).unwrap_or(1)
}

/// Classify a cycle day into a phase
pub fn get_phase_for_day(
    day: u32,
    shape: &CycleShape,
    is_menstruating_now: bool,
    has_valid_start_date: bool,
) -> CyclePhase {
    if is_menstruating_now {
        return CyclePhase::Menstrual;
    }

    if !has_valid_start_date {
        return CyclePhase::Luteal;
    }

    let day = day as i64;
    let cycle_length = shape.cycle_length as i64;

    // Overdue: stay late luteal until a new start is logged
    if day > cycle_length {
        return CyclePhase::Luteal;
    }

    let (fertile_start, fertile_end) = shape.fertile_window();
    if (fertile_start..=fertile_end).contains(&day) {
        CyclePhase::Ovulatory
    } else if day > fertile_end {
        CyclePhase::Luteal
    } else {
        CyclePhase::Follicular
    }
}

/// Representative cycle day for a phase, clamped to `1..=cycle_length`
pub fn estimated_day_for_phase(phase: CyclePhase, shape: &CycleShape) -> u32 {
    let (fertile_start, fertile_end) = shape.fertile_window();

    let day = match phase {
        CyclePhase::Menstrual => 1,
        CyclePhase::Follicular => {
            let midpoint = (shape.period_length as i64 + fertile_start).div_euclid(2);
            if fertile_start > 1 {
                midpoint.min(fertile_start - 1)
            } else {
                midpoint
            }
        }
        CyclePhase::Ovulatory => shape.ovulation_day(),
        CyclePhase::Luteal => (fertile_end + 1 + shape.cycle_length as i64).div_euclid(2),
    };

    day.clamp(1, shape.cycle_length.max(1) as i64) as u32
}

/// Estimate the period start date implied by "today I am in `phase`"
///
/// Clamped to the first representable date.
pub fn calculate_start_date_from_phase(
    target_phase: CyclePhase,
    shape: &CycleShape,
    today: NaiveDate,
) -> NaiveDate {
    let day = estimated_day_for_phase(target_phase, shape);
    let start = today
        .checked_sub_signed(Duration::days(day as i64 - 1))
        .unwrap_or(NaiveDate::MIN);

    tracing::debug!(
        "Phase {} maps to cycle day {}, estimated start {}",
        target_phase,
        day,
        start
    );

    start
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn standard() -> CycleShape {
        CycleShape::new(28, 5)
    }

    #[test]
    fn test_cycle_day_starts_at_one() {
        let start = date("2024-01-01");
        assert_eq!(calculate_cycle_day(Some(start), start), 1);
    }

    #[test]
    fn test_cycle_day_does_not_wrap() {
        let start = date("2024-01-01");
        assert_eq!(
            calculate_cycle_day(Some(start), start + Duration::days(34)),
            35
        );
    }

    #[test]
    fn test_cycle_day_safe_defaults() {
        let start = date("2024-01-10");
        assert_eq!(calculate_cycle_day(None, start), 1);
        assert_eq!(calculate_cycle_day(Some(start), date("2024-01-01")), 1);
    }

    #[test]
    fn test_fertile_window_geometry() {
        assert_eq!(standard().ovulation_day(), 14);
        assert_eq!(standard().fertile_window(), (9, 15));
    }

    #[test]
    fn test_phase_for_day_standard_cycle() {
        let shape = standard();
        assert_eq!(get_phase_for_day(9, &shape, false, true), CyclePhase::Ovulatory);
        assert_eq!(get_phase_for_day(15, &shape, false, true), CyclePhase::Ovulatory);
        assert_eq!(get_phase_for_day(16, &shape, false, true), CyclePhase::Luteal);
        assert_eq!(get_phase_for_day(28, &shape, false, true), CyclePhase::Luteal);
        assert_eq!(get_phase_for_day(8, &shape, false, true), CyclePhase::Follicular);
    }

    #[test]
    fn test_checkin_wins() {
        assert_eq!(
            get_phase_for_day(1, &standard(), true, true),
            CyclePhase::Menstrual
        );
        assert_eq!(
            get_phase_for_day(20, &standard(), true, false),
            CyclePhase::Menstrual
        );
    }

    #[test]
    fn test_no_start_date_assumes_luteal() {
        assert_eq!(
            get_phase_for_day(1, &standard(), false, false),
            CyclePhase::Luteal
        );
    }

    #[test]
    fn test_period_days_are_not_menstrual_without_checkin() {
        for day in 1..=5 {
            assert_eq!(
                get_phase_for_day(day, &standard(), false, true),
                CyclePhase::Follicular
            );
        }
    }

    #[test]
    fn test_overdue_cycle_stays_luteal() {
        assert_eq!(
            get_phase_for_day(35, &standard(), false, true),
            CyclePhase::Luteal
        );
    }

    #[test]
    fn test_estimated_days() {
        let shape = standard();
        assert_eq!(estimated_day_for_phase(CyclePhase::Menstrual, &shape), 1);
        assert_eq!(estimated_day_for_phase(CyclePhase::Follicular, &shape), 7);
        assert_eq!(estimated_day_for_phase(CyclePhase::Ovulatory, &shape), 14);
        assert_eq!(estimated_day_for_phase(CyclePhase::Luteal, &shape), 22);
    }

    #[test]
    fn test_start_date_from_phase_backdates() {
        let today = date("2024-03-20");
        let shape = standard();
        assert_eq!(
            calculate_start_date_from_phase(CyclePhase::Menstrual, &shape, today),
            today
        );
        assert_eq!(
            calculate_start_date_from_phase(CyclePhase::Ovulatory, &shape, today),
            date("2024-03-07")
        );
    }

    #[test]
    fn test_start_date_from_phase_roundtrip() {
        let today = date("2024-03-20");

        for cycle_length in 21..=40 {
            for period_length in 3..=7 {
                let shape = CycleShape::new(cycle_length, period_length);

                for phase in [CyclePhase::Follicular, CyclePhase::Ovulatory, CyclePhase::Luteal] {
                    let start = calculate_start_date_from_phase(phase, &shape, today);
                    let day = calculate_cycle_day(Some(start), today);
                    assert_eq!(
                        get_phase_for_day(day, &shape, false, true),
                        phase,
                        "cycle {} period {} phase {}",
                        cycle_length,
                        period_length,
                        phase
                    );
                }

                // Menstrual only comes back through the explicit check-in
                let start = calculate_start_date_from_phase(CyclePhase::Menstrual, &shape, today);
                let day = calculate_cycle_day(Some(start), today);
                assert_eq!(day, 1);
                assert_eq!(
                    get_phase_for_day(day, &shape, true, true),
                    CyclePhase::Menstrual
                );
            }
        }
    }

    #[test]
    fn test_estimated_day_clamped_for_tiny_cycles() {
        let shape = CycleShape::new(15, 5);
        let day = estimated_day_for_phase(CyclePhase::Follicular, &shape);
        assert!((1..=15).contains(&day));
    }

    #[test]
    fn test_start_date_from_phase_clamps_at_calendar_start() {
        let shape = standard();
        assert_eq!(
            calculate_start_date_from_phase(CyclePhase::Luteal, &shape, NaiveDate::MIN),
            NaiveDate::MIN
        );
    }
}

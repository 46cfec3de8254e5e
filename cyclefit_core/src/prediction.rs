//! Forward predictions from the period-start history.

use crate::{Confidence, DateWindow, PeriodHistory};
use chrono::{Duration, NaiveDate};

/// Expected next period start: last logged start plus the cycle length
///
/// `None` without history or when the result would leave the calendar.
pub fn predict_next_period_start(history: &PeriodHistory, cycle_length: u32) -> Option<NaiveDate> {
    history
        .last()?
        .checked_add_signed(Duration::days(cycle_length as i64))
}

/// Three-day window centred on the expected ovulation date
pub fn get_ovulation_window(
    next_period_start: NaiveDate,
    luteal_length: u32,
) -> Option<DateWindow> {
    let center = next_period_start.checked_sub_signed(Duration::days(luteal_length as i64))?;
    DateWindow::around(center, 1)
}

/// Uncertainty window around the next predicted start
///
/// Low confidence widens the window to ±3 days, otherwise ±2.
pub fn get_prediction_window(
    history: &PeriodHistory,
    cycle_length: Option<u32>,
    confidence: Confidence,
) -> Option<DateWindow> {
    let cycle_length = cycle_length.filter(|len| *len > 0)?;
    let predicted = predict_next_period_start(history, cycle_length)?;

    let radius = match confidence {
        Confidence::Low => 3,
        Confidence::Medium | Confidence::High => 2,
    };

    DateWindow::around(predicted, radius)
}

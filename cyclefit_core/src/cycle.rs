//! Cycle-length learning.
//!
//! Turns a period-start history into cycle-length samples, rejects
//! implausible samples, and summarises the rest as a learned cycle length
//! with a variability figure and a confidence label:
//! - Samples: day counts between adjacent starts
//! - Outliers: outside 21..=45 days, or more than 10 days from the median
//! - Learned length: rounded median of the 6 most recent valid samples

use crate::dates::days_between;
use crate::{Confidence, CycleLengthSample, CycleStats, PeriodHistory};

/// Shortest cycle length treated as a real cycle
pub const MIN_PLAUSIBLE_CYCLE: i64 = 21;

/// Longest cycle length treated as a real cycle
pub const MAX_PLAUSIBLE_CYCLE: i64 = 45;

/// Largest allowed distance from the median sample length
pub const MAX_MEDIAN_DEVIATION: f64 = 10.0;

/// Number of most recent valid samples used for learning
pub const RECENT_SAMPLE_WINDOW: usize = 6;

/// Emit one sample per pair of adjacent start dates
///
/// Samples come back unflagged; run them through [`mark_outliers`].
pub fn compute_cycle_length_samples(history: &PeriodHistory) -> Vec<CycleLengthSample> {
    let dates = history.dates();

    dates
        .windows(2)
        .map(|pair| CycleLengthSample {
            length: days_between(pair[0], pair[1]),
            anchor_date: pair[1],
            is_outlier: false,
        })
        .collect()
}

/// Flag samples that most likely reflect a missed log
pub fn mark_outliers(samples: &[CycleLengthSample]) -> Vec<CycleLengthSample> {
    let lengths: Vec<f64> = samples.iter().map(|s| s.length as f64).collect();
    let Some(median_length) = median(&lengths) else {
        return Vec::new();
    };

    samples
        .iter()
        .map(|sample| {
            let is_outlier = sample.length < MIN_PLAUSIBLE_CYCLE
                || sample.length > MAX_PLAUSIBLE_CYCLE
                || (sample.length as f64 - median_length).abs() > MAX_MEDIAN_DEVIATION;

            if is_outlier {
                tracing::debug!(
                    "Cycle ending {} ({} days) flagged as outlier (median {})",
                    sample.anchor_date,
                    sample.length,
                    median_length
                );
            }

            CycleLengthSample {
                is_outlier,
                ..*sample
            }
        })
        .collect()
}

/// Rounded median of the recent valid samples, or `fallback` if none
pub fn learned_cycle_length(samples: &[CycleLengthSample], fallback: u32) -> u32 {
    let recent = recent_valid_lengths(samples);

    match median(&recent) {
        Some(m) => m.round() as u32,
        None => fallback,
    }
}

/// Standard deviation of the recent valid samples, to one decimal
///
/// Zero when fewer than two valid samples exist.
pub fn variability(samples: &[CycleLengthSample]) -> f64 {
    let recent = recent_valid_lengths(samples);
    if recent.len() < 2 {
        return 0.0;
    }

    let mean = recent.iter().sum::<f64>() / recent.len() as f64;
    let variance = recent.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / recent.len() as f64;

    (variance.sqrt() * 10.0).round() / 10.0
}

/// Confidence label from sample count and spread
///
/// Checked in order, so many samples with a wide spread never reach `High`.
pub fn confidence(valid_sample_count: usize, variability: f64) -> Confidence {
    if valid_sample_count < 2 {
        Confidence::Low
    } else if valid_sample_count >= 4 && variability <= 3.0 {
        Confidence::High
    } else if variability <= 5.0 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Run the full learning pipeline over a history
pub fn compute_cycle_stats(history: &PeriodHistory, fallback: u32) -> CycleStats {
    let samples = mark_outliers(&compute_cycle_length_samples(history));

    let outlier_count = samples.iter().filter(|s| s.is_outlier).count();
    let valid_sample_count = samples.len() - outlier_count;
    let learned = learned_cycle_length(&samples, fallback);
    let spread = variability(&samples);
    let label = confidence(valid_sample_count, spread);

    tracing::debug!(
        "Cycle stats: {} samples ({} outliers), learned {} days, sd {}, {} confidence",
        samples.len(),
        outlier_count,
        learned,
        spread,
        label
    );

    CycleStats {
        learned_cycle_length: learned,
        variability: spread,
        confidence: label,
        valid_sample_count,
        outlier_count,
    }
}

/// Lengths of the most recent valid samples, oldest first
fn recent_valid_lengths(samples: &[CycleLengthSample]) -> Vec<f64> {
    let valid: Vec<f64> = samples
        .iter()
        .filter(|s| !s.is_outlier)
        .map(|s| s.length as f64)
        .collect();

    let skip = valid.len().saturating_sub(RECENT_SAMPLE_WINDOW);
    valid[skip..].to_vec()
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

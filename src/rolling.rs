//! Rolling-average intervals and trend classification
//!
//! Averages include the partial interval from the most recent activity up to
//! today, so a gap that has not been closed yet still counts. With `k`
//! activities in the window that is `k` intervals spanning from the oldest
//! activity in the window to today.

use crate::calendar::days_between;
use crate::types::Trend;
use chrono::NaiveDate;

/// Recent window (activities)
pub const SHORT_WINDOW: usize = 3;

/// Longer reference window (activities)
pub const LONG_WINDOW: usize = 10;

/// Default `|short - long|` below which the trend is stable (days)
pub const DEFAULT_STABLE_THRESHOLD_DAYS: f64 = 0.5;

/// Round to one decimal place, halves rounding up
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0 + 0.5).floor() / 10.0
}

/// Mean interval over the most recent `min(window, count)` activities.
///
/// `dates_desc` are local calendar days, most recent first. Returns `None`
/// for an empty history or a zero window.
pub fn rolling_average(dates_desc: &[NaiveDate], today: NaiveDate, window: usize) -> Option<f64> {
    let k = window.min(dates_desc.len());
    if k == 0 {
        return None;
    }

    let oldest = dates_desc[k - 1];
    let span = days_between(oldest, today) as f64;
    Some(round_one_decimal(span / k as f64))
}

/// Compare the short-window average against the long-window one.
///
/// A smaller recent interval means activities are getting more frequent.
pub fn classify_trend(short: Option<f64>, long: Option<f64>, stable_threshold_days: f64) -> Trend {
    match (short, long) {
        (Some(short), Some(long)) => {
            // Both sides are tenths; compare in tenths so 2.8 vs 2.3 is exactly 0.5
            let diff_tenths = ((short - long).abs() * 10.0).round();
            if diff_tenths < (stable_threshold_days * 10.0).round() {
                Trend::Stable
            } else if short < long {
                Trend::Improving
            } else {
                Trend::Declining
            }
        }
        (Some(_), None) | (None, Some(_)) => Trend::Stable,
        (None, None) => Trend::InsufficientData,
    }
}

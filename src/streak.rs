//! Streak detection and lifetime averages over off-time-filtered history
//!
//! Both functions take local calendar days sorted ascending. Unlike the
//! rolling averages, nothing here counts the open gap after the last activity.

use crate::calendar::days_between;
use crate::rolling::round_one_decimal;
use crate::types::LongestStreak;
use chrono::NaiveDate;

/// Find the longest window of activities whose mean spacing meets the target.
///
/// Every `(i, j)` pair with `i < j` is tried. A window qualifies when
/// `(date[j] - date[i]) / (j - i) <= desired_frequency`; the longest span in
/// days wins, and only a strictly longer span replaces the current best, so
/// ties keep the earliest start and then the earliest end.
///
/// Histories are per user and per type (tens to low hundreds of entries), so
/// the quadratic scan is fine.
pub fn longest_streak(dates_asc: &[NaiveDate], desired_frequency: f64) -> LongestStreak {
    let mut best = LongestStreak::default();
    if dates_asc.len() < 2 {
        return best;
    }

    for i in 0..dates_asc.len() {
        for j in (i + 1)..dates_asc.len() {
            let span = days_between(dates_asc[i], dates_asc[j]);
            let average = span as f64 / (j - i) as f64;

            if average <= desired_frequency && span > best.longest_streak_days {
                best = LongestStreak {
                    longest_streak_days: span,
                    average_interval: round_one_decimal(average),
                    start_date: Some(dates_asc[i]),
                    end_date: Some(dates_asc[j]),
                };
            }
        }
    }

    best
}

/// Mean interval between consecutive activities, first to last.
///
/// Returns 0 with fewer than two activities.
pub fn lifetime_average(dates_asc: &[NaiveDate]) -> f64 {
    match (dates_asc.first(), dates_asc.last()) {
        (Some(first), Some(last)) if dates_asc.len() >= 2 => {
            let span = days_between(*first, *last) as f64;
            round_one_decimal(span / (dates_asc.len() - 1) as f64)
        }
        _ => 0.0,
    }
}

//! Due/overdue status classification
//!
//! Buckets are chosen on the absolute distance from the desired frequency,
//! with the sign deciding between "overdue" and "ahead" once the distance
//! reaches two days. Priority scores only drive ordering.

use crate::types::{Recommendation, Status};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Priority of a type with no recorded activities
pub const NO_DATA_PRIORITY: f64 = -1000.0;

/// Base priority added for each bucket
const DUE_TODAY_BASE: f64 = 100.0;
const OVERDUE_BASE: f64 = 200.0;
const CRITICAL_BASE: f64 = 300.0;

/// Outcome of classifying one activity type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusAssessment {
    pub difference: Option<f64>,
    pub status: Status,
    pub priority_score: f64,
}

/// Classify an activity type from whole days since its last activity.
///
/// ```text
/// no activities        no_data             -1000
/// |d| < 1              due_today           100 + d
/// |d| < 2              due_soon            d
/// d >= 2, |d| <= 3     overdue             200 + d
/// d > 3                critically_overdue  300 + d
/// d <= -2              ahead               d
/// ```
pub fn classify(
    days_since_last_activity: Option<i64>,
    desired_frequency: f64,
) -> StatusAssessment {
    let Some(days_since) = days_since_last_activity else {
        return StatusAssessment {
            difference: None,
            status: Status::NoData,
            priority_score: NO_DATA_PRIORITY,
        };
    };

    let d = days_since as f64 - desired_frequency;
    let a = d.abs();

    let (status, priority_score) = if a < 1.0 {
        (Status::DueToday, DUE_TODAY_BASE + d)
    } else if a < 2.0 {
        (Status::DueSoon, d)
    } else if d > 0.0 {
        if a <= 3.0 {
            (Status::Overdue, OVERDUE_BASE + d)
        } else {
            (Status::CriticallyOverdue, CRITICAL_BASE + d)
        }
    } else {
        (Status::Ahead, d)
    };

    StatusAssessment {
        difference: Some(d),
        status,
        priority_score,
    }
}

/// Order recommendations most urgent first.
///
/// Descending priority; ties keep a deterministic order by name, then id.
pub fn sort_by_priority(recommendations: &mut [Recommendation]) {
    recommendations.sort_by(|a, b| {
        priority_order(a.priority_score, b.priority_score)
            .then_with(|| a.activity_type.name.cmp(&b.activity_type.name))
            .then_with(|| a.activity_type.id.cmp(&b.activity_type.id))
    });
}

/// Compare two scores in ranking order
pub fn priority_order(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

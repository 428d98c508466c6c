//! Notification projection
//!
//! Turns ranked recommendations into notification intents. Delivery (Web Push
//! or otherwise) belongs to the caller; this only decides what to say and
//! gives each intent a dedupe key stable for one local day.

use crate::types::{Recommendation, Status};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which recommendations produce notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPolicy {
    /// Statuses that notify
    pub statuses: Vec<Status>,
    /// Cap per run, most urgent first
    pub max_per_run: usize,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            statuses: vec![Status::DueToday, Status::Overdue, Status::CriticallyOverdue],
            max_per_run: 5,
        }
    }
}

/// A notification ready to hand to a delivery channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationIntent {
    pub intent_id: String,
    pub activity_type_id: String,
    pub status: Status,
    pub title: String,
    pub body: String,
    pub priority_score: f64,
    pub dedupe_key: String,
}

/// Project ranked recommendations into notification intents.
///
/// `recommendations` should already be in priority order.
pub fn project_notifications(
    recommendations: &[Recommendation],
    reference_date: NaiveDate,
    policy: &NotificationPolicy,
) -> Vec<NotificationIntent> {
    recommendations
        .iter()
        .filter(|r| policy.statuses.contains(&r.status))
        .take(policy.max_per_run)
        .enumerate()
        .map(|(i, rec)| {
            let type_id = &rec.activity_type.id;
            NotificationIntent {
                intent_id: format!("ni-{type_id}-{reference_date}-{i}"),
                activity_type_id: type_id.clone(),
                status: rec.status,
                title: title_for(rec),
                body: body_for(rec),
                priority_score: rec.priority_score,
                dedupe_key: format!("{type_id}:{reference_date}:{}", rec.status),
            }
        })
        .collect()
}

fn title_for(rec: &Recommendation) -> String {
    let name = &rec.activity_type.name;
    match rec.status {
        Status::CriticallyOverdue => format!("{name} is well overdue"),
        Status::Overdue => format!("{name} is overdue"),
        Status::DueToday => format!("{name} is due today"),
        Status::DueSoon => format!("{name} is coming up"),
        Status::Ahead => format!("{name} is ahead of schedule"),
        Status::NoData => format!("Log your first {name}"),
    }
}

fn body_for(rec: &Recommendation) -> String {
    let target = format_days(rec.desired_frequency);
    match (rec.days_since_last_activity, rec.difference) {
        (Some(days_since), Some(difference)) if difference > 0.0 => format!(
            "Last done {days_since} days ago, {} days past your every-{target}-days target.",
            format_days(difference)
        ),
        (Some(days_since), _) => {
            format!("Last done {days_since} days ago. Target: every {target} days.")
        }
        (None, _) => format!("No activities yet. Target: every {target} days."),
    }
}

/// Whole numbers without decimals, everything else to one place
fn format_days(days: f64) -> String {
    if days.fract() == 0.0 {
        format!("{days:.0}")
    } else {
        format!("{days:.1}")
    }
}

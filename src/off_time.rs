//! Off-time exclusion
//!
//! Activities that fall inside an applicable off-time period are dropped from
//! analytics and streak inputs. They stay in raw listings and are not removed
//! from the live status classifier.

use crate::calendar::local_date;
use crate::types::{Activity, OffTimePeriod};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Off-time membership test bound to the user's timezone
pub struct OffTimeFilter<'a> {
    periods: &'a [OffTimePeriod],
    tz: Tz,
}

/// Activities of one type split by off-time membership
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredHistory {
    /// Local calendar days of kept activities, ascending
    pub dates: Vec<NaiveDate>,
    pub excluded: usize,
}

impl<'a> OffTimeFilter<'a> {
    pub fn new(periods: &'a [OffTimePeriod], tz: Tz) -> Self {
        Self { periods, tz }
    }

    /// Periods whose scope reaches this activity type, directly or by tag
    pub fn periods_for<'s>(
        &'s self,
        activity_type_id: &'s str,
    ) -> impl Iterator<Item = &'a OffTimePeriod> + 's {
        self.periods
            .iter()
            .filter(move |p| p.scope.covers(activity_type_id))
    }

    /// Whether a calendar day is inside any applicable period
    pub fn contains_date(&self, activity_type_id: &str, date: NaiveDate) -> bool {
        self.periods_for(activity_type_id).any(|p| p.contains(date))
    }

    /// Whether an activity instant is excluded for this type
    pub fn is_excluded(&self, activity_type_id: &str, instant: DateTime<Utc>) -> bool {
        self.contains_date(activity_type_id, local_date(instant, self.tz))
    }

    /// Keep the activities outside every applicable period, as ascending local days
    pub fn filter(&self, activity_type_id: &str, activities: &[Activity]) -> FilteredHistory {
        let applicable: Vec<&OffTimePeriod> = self.periods_for(activity_type_id).collect();

        let mut history = FilteredHistory::default();
        for activity in activities {
            let date = local_date(activity.date, self.tz);
            if applicable.iter().any(|p| p.contains(date)) {
                history.excluded += 1;
            } else {
                history.dates.push(date);
            }
        }
        history.dates.sort_unstable();

        if history.excluded > 0 {
            tracing::debug!(
                activity_type_id,
                excluded = history.excluded,
                kept = history.dates.len(),
                "off-time exclusion applied"
            );
        }
        history
    }
}

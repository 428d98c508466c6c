//! Core types for the Cadence scoring engine
//!
//! This module defines the read-only views the engine consumes (activity types,
//! activities, off-time periods) and the records it emits (recommendations,
//! analytics, streaks, report envelopes).

use crate::error::EngineError;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Calendar season used to pick a desired frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Fall];

    /// Map a calendar month (1-12) to its season.
    ///
    /// Dec-Feb winter, Mar-May spring, Jun-Aug summer, Sep-Nov fall.
    pub fn from_month(month: u32) -> Season {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Fall,
            _ => Season::Winter,
        }
    }

    /// Season containing a calendar date
    pub fn of_date(date: NaiveDate) -> Season {
        Season::from_month(date.month())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
        }
    }
}

impl FromStr for Season {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "winter" => Ok(Season::Winter),
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "fall" | "autumn" => Ok(Season::Fall),
            other => Err(EngineError::InvalidFrequency(format!(
                "unknown season '{other}'"
            ))),
        }
    }
}

/// Desired frequency per season, keyed by [`Season`].
///
/// Serialized as `{"winter": 3, "spring": 2, "summer": 2, "fall": 3}`. All four
/// seasons must be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, f64>",
    into = "BTreeMap<String, f64>"
)]
pub struct SeasonalFrequency {
    days: BTreeMap<Season, f64>,
}

impl SeasonalFrequency {
    /// Build from a season mapping; every season must have a value
    pub fn new(days: BTreeMap<Season, f64>) -> Result<Self, EngineError> {
        if let Some(missing) = Season::ALL.iter().find(|s| !days.contains_key(s)) {
            return Err(EngineError::InvalidFrequency(format!(
                "missing {} frequency",
                missing.as_str()
            )));
        }
        Ok(Self { days })
    }

    /// Same frequency in every season
    pub fn uniform(days: f64) -> Self {
        Self {
            days: Season::ALL.iter().map(|s| (*s, days)).collect(),
        }
    }

    /// Frequency for a season
    pub fn get(&self, season: Season) -> f64 {
        self.days.get(&season).copied().unwrap_or(f64::NAN)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Season, f64)> + '_ {
        self.days.iter().map(|(s, d)| (*s, *d))
    }
}

impl TryFrom<BTreeMap<String, f64>> for SeasonalFrequency {
    type Error = EngineError;

    fn try_from(raw: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let mut days = BTreeMap::new();
        for (name, value) in raw {
            days.insert(name.parse::<Season>()?, value);
        }
        SeasonalFrequency::new(days)
    }
}

impl From<SeasonalFrequency> for BTreeMap<String, f64> {
    fn from(freq: SeasonalFrequency) -> Self {
        freq.days
            .into_iter()
            .map(|(s, d)| (s.as_str().to_string(), d))
            .collect()
    }
}

/// Desired recurrence interval of an activity type, in days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DesiredFrequency {
    Uniform(f64),
    Seasonal(SeasonalFrequency),
}

impl DesiredFrequency {
    /// Frequency in effect during a season
    pub fn for_season(&self, season: Season) -> f64 {
        match self {
            DesiredFrequency::Uniform(days) => *days,
            DesiredFrequency::Seasonal(seasonal) => seasonal.get(season),
        }
    }

    /// Frequency in effect on a calendar date
    pub fn for_date(&self, date: NaiveDate) -> f64 {
        self.for_season(Season::of_date(date))
    }

    /// Every configured value, for validation
    pub fn values(&self) -> Vec<f64> {
        match self {
            DesiredFrequency::Uniform(days) => vec![*days],
            DesiredFrequency::Seasonal(seasonal) => seasonal.iter().map(|(_, d)| d).collect(),
        }
    }
}

impl From<f64> for DesiredFrequency {
    fn from(days: f64) -> Self {
        DesiredFrequency::Uniform(days)
    }
}

/// A user-defined category of recurring activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityType {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub desired_frequency: DesiredFrequency,
}

impl ActivityType {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        desired_frequency: impl Into<DesiredFrequency>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            desired_frequency: desired_frequency.into(),
        }
    }
}

/// A single recorded activity (absolute instant)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub date: DateTime<Utc>,
}

impl Activity {
    pub fn at(date: DateTime<Utc>) -> Self {
        Self { id: None, date }
    }
}

/// What an off-time period applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OffTimeScope {
    /// One activity type directly
    ActivityType { activity_type_id: String },
    /// Every activity type carrying a tag
    Tag {
        tag_id: String,
        activity_type_ids: Vec<String>,
    },
}

impl OffTimeScope {
    /// Whether this scope reaches the given activity type
    pub fn covers(&self, activity_type_id: &str) -> bool {
        match self {
            OffTimeScope::ActivityType { activity_type_id: id } => id == activity_type_id,
            OffTimeScope::Tag {
                activity_type_ids, ..
            } => activity_type_ids.iter().any(|id| id == activity_type_id),
        }
    }
}

/// Closed calendar-date interval excluded from analytics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffTimePeriod {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(deserialize_with = "crate::calendar::deserialize_calendar_date")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "crate::calendar::deserialize_calendar_date")]
    pub end_date: NaiveDate,
    pub scope: OffTimeScope,
}

impl OffTimePeriod {
    /// Inclusive containment on both ends
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Due/overdue classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    NoData,
    Ahead,
    DueSoon,
    DueToday,
    Overdue,
    CriticallyOverdue,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::NoData => "no_data",
            Status::Ahead => "ahead",
            Status::DueSoon => "due_soon",
            Status::DueToday => "due_today",
            Status::Overdue => "overdue",
            Status::CriticallyOverdue => "critically_overdue",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of recent frequency relative to the longer history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
    InsufficientData,
}

/// Ranked recommendation for one activity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub activity_type: ActivityType,
    /// Frequency resolved for the current season (days)
    pub desired_frequency: f64,
    pub last_performed_date: Option<DateTime<Utc>>,
    pub days_since_last_activity: Option<i64>,
    pub average_frequency_last3: Option<f64>,
    pub average_frequency_last10: Option<f64>,
    pub trend: Trend,
    /// `days_since_last_activity - desired_frequency`
    pub difference: Option<f64>,
    pub status: Status,
    /// Sort key only, never displayed
    pub priority_score: f64,
}

/// Lifetime analytics for one activity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeAnalytics {
    pub activity_type_id: String,
    pub name: String,
    pub desired_frequency: f64,
    pub total_activities: usize,
    /// Activities left after off-time exclusion
    pub counted_activities: usize,
    pub excluded_activities: usize,
    /// Mean interval between consecutive counted activities (0 with fewer than two)
    pub average_interval_days: f64,
}

/// Longest window whose mean spacing meets the desired frequency
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LongestStreak {
    pub longest_streak_days: i64,
    pub average_interval: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Streak record tied to its activity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeStreak {
    pub activity_type_id: String,
    pub name: String,
    #[serde(flatten)]
    pub streak: LongestStreak,
}

/// Producer metadata stamped on every report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Ordered recommendations for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub report_version: String,
    pub producer: EngineProducer,
    pub timezone: String,
    /// "Today" in the user's timezone
    pub reference_date: NaiveDate,
    pub computed_at_utc: DateTime<Utc>,
    pub recommendations: Vec<Recommendation>,
}

/// Per-type analytics and streaks as parallel arrays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub report_version: String,
    pub producer: EngineProducer,
    pub timezone: String,
    pub reference_date: NaiveDate,
    pub computed_at_utc: DateTime<Utc>,
    pub analytics: Vec<TypeAnalytics>,
    pub streaks: Vec<TypeStreak>,
}

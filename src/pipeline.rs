//! Pipeline orchestration
//!
//! This module provides the public API for Cadence. Each activity type is
//! scored independently:
//!
//! 1. Resolve the user's timezone and today's local date
//! 2. Reduce activity instants to local calendar days
//! 3. Classify due/overdue status from days since the last activity
//! 4. Compute rolling averages and the trend
//! 5. Rank by priority (recommendations) or filter off-time and search
//!    streaks (analytics)
//!
//! The engine is stateless between calls; "now" is always passed in so that
//! identical input yields identical output.

use crate::calendar::{days_between, local_date, resolve_timezone};
use crate::config::EngineConfig;
use crate::encoder::{NotificationReport, ReportEncoder};
use crate::error::EngineError;
use crate::input::EngineInput;
use crate::notify::{project_notifications, NotificationIntent};
use crate::off_time::OffTimeFilter;
use crate::rolling::{classify_trend, rolling_average};
use crate::status::{classify, sort_by_priority};
use crate::streak::{lifetime_average, longest_streak};
use crate::types::{
    Activity, ActivityType, AnalyticsReport, Recommendation, RecommendationReport,
    TypeAnalytics, TypeStreak,
};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Score one activity type against today's local date.
///
/// `activities` may arrive in any order; the most recent one drives the
/// status. Rolling windows and the trend threshold come from `config`.
/// Off-time periods are not consulted here.
pub fn score_activity_type(
    activity_type: &ActivityType,
    activities: &[Activity],
    tz: Tz,
    today: NaiveDate,
    config: &EngineConfig,
) -> Recommendation {
    let desired_frequency = activity_type.desired_frequency.for_date(today);

    let mut instants: Vec<DateTime<Utc>> = activities.iter().map(|a| a.date).collect();
    instants.sort_unstable_by(|a, b| b.cmp(a));
    let dates_desc: Vec<NaiveDate> = instants.iter().map(|i| local_date(*i, tz)).collect();

    let last_performed_date = instants.first().copied();
    let days_since_last_activity = dates_desc.first().map(|last| days_between(*last, today));

    let assessment = classify(days_since_last_activity, desired_frequency);
    let average_frequency_last3 = rolling_average(&dates_desc, today, config.short_window);
    let average_frequency_last10 = rolling_average(&dates_desc, today, config.long_window);
    let trend = classify_trend(
        average_frequency_last3,
        average_frequency_last10,
        config.trend_stable_threshold_days,
    );

    tracing::debug!(
        activity_type_id = %activity_type.id,
        activities = activities.len(),
        days_since = ?days_since_last_activity,
        status = %assessment.status,
        priority = assessment.priority_score,
        "scored activity type"
    );

    Recommendation {
        activity_type: activity_type.clone(),
        desired_frequency,
        last_performed_date,
        days_since_last_activity,
        average_frequency_last3,
        average_frequency_last10,
        trend,
        difference: assessment.difference,
        status: assessment.status,
        priority_score: assessment.priority_score,
    }
}

/// Lifetime analytics and longest streak for one activity type
pub fn analyze_activity_type(
    activity_type: &ActivityType,
    activities: &[Activity],
    filter: &OffTimeFilter<'_>,
    today: NaiveDate,
) -> (TypeAnalytics, TypeStreak) {
    let desired_frequency = activity_type.desired_frequency.for_date(today);
    let history = filter.filter(&activity_type.id, activities);

    let analytics = TypeAnalytics {
        activity_type_id: activity_type.id.clone(),
        name: activity_type.name.clone(),
        desired_frequency,
        total_activities: activities.len(),
        counted_activities: history.dates.len(),
        excluded_activities: history.excluded,
        average_interval_days: lifetime_average(&history.dates),
    };

    let streak = TypeStreak {
        activity_type_id: activity_type.id.clone(),
        name: activity_type.name.clone(),
        streak: longest_streak(&history.dates, desired_frequency),
    };

    (analytics, streak)
}

/// Frequency scoring engine bound to a configuration
pub struct FrequencyEngine {
    config: EngineConfig,
    encoder: ReportEncoder,
}

impl Default for FrequencyEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FrequencyEngine {
    /// Create an engine with default settings
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            encoder: ReportEncoder::new(),
        }
    }

    /// Create an engine with a validated configuration
    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            encoder: ReportEncoder::new(),
        })
    }

    /// Replace the report encoder (fixed instance ids in tests and replays)
    pub fn with_encoder(mut self, encoder: ReportEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The user's zone and today's calendar day in it
    pub fn resolve_day(&self, input: &EngineInput, now: DateTime<Utc>) -> (Tz, NaiveDate) {
        let tz = resolve_timezone(input.timezone.as_deref(), &self.config.default_timezone);
        (tz, local_date(now, tz))
    }

    /// Recommendations for every activity type, most urgent first
    pub fn recommend(&self, input: &EngineInput, now: DateTime<Utc>) -> Vec<Recommendation> {
        let (tz, today) = self.resolve_day(input, now);
        self.recommend_on(input, tz, today)
    }

    fn recommend_on(&self, input: &EngineInput, tz: Tz, today: NaiveDate) -> Vec<Recommendation> {
        let mut recommendations: Vec<Recommendation> = input
            .activity_types
            .iter()
            .map(|activity_type| {
                score_activity_type(
                    activity_type,
                    input.activities_for(&activity_type.id),
                    tz,
                    today,
                    &self.config,
                )
            })
            .collect();

        sort_by_priority(&mut recommendations);
        recommendations
    }

    /// Analytics and streaks, as parallel arrays in activity type order
    pub fn analytics(
        &self,
        input: &EngineInput,
        now: DateTime<Utc>,
    ) -> (Vec<TypeAnalytics>, Vec<TypeStreak>) {
        let (tz, today) = self.resolve_day(input, now);
        self.analytics_on(input, tz, today)
    }

    fn analytics_on(
        &self,
        input: &EngineInput,
        tz: Tz,
        today: NaiveDate,
    ) -> (Vec<TypeAnalytics>, Vec<TypeStreak>) {
        let filter = OffTimeFilter::new(&input.off_time_periods, tz);

        input
            .activity_types
            .iter()
            .map(|activity_type| {
                analyze_activity_type(
                    activity_type,
                    input.activities_for(&activity_type.id),
                    &filter,
                    today,
                )
            })
            .unzip()
    }

    /// Notification intents for the current recommendations
    pub fn notifications(
        &self,
        input: &EngineInput,
        now: DateTime<Utc>,
    ) -> Vec<NotificationIntent> {
        let (tz, today) = self.resolve_day(input, now);
        let recommendations = self.recommend_on(input, tz, today);
        project_notifications(&recommendations, today, &self.config.notifications)
    }

    pub fn recommendation_report(
        &self,
        input: &EngineInput,
        now: DateTime<Utc>,
    ) -> RecommendationReport {
        let (tz, today) = self.resolve_day(input, now);
        let recommendations = self.recommend_on(input, tz, today);
        self.encoder.recommendations(tz, today, now, recommendations)
    }

    pub fn analytics_report(&self, input: &EngineInput, now: DateTime<Utc>) -> AnalyticsReport {
        let (tz, today) = self.resolve_day(input, now);
        let (analytics, streaks) = self.analytics_on(input, tz, today);
        self.encoder.analytics(tz, today, now, analytics, streaks)
    }

    pub fn notification_report(
        &self,
        input: &EngineInput,
        now: DateTime<Utc>,
    ) -> NotificationReport {
        let (tz, today) = self.resolve_day(input, now);
        let recommendations = self.recommend_on(input, tz, today);
        let notifications =
            project_notifications(&recommendations, today, &self.config.notifications);
        self.encoder.notifications(tz, today, now, notifications)
    }

    /// Input JSON in, recommendation report JSON out
    pub fn recommend_json(
        &self,
        input_json: &str,
        now: DateTime<Utc>,
    ) -> Result<String, EngineError> {
        let input = EngineInput::from_json(input_json)?;
        self.encoder.to_json(&self.recommendation_report(&input, now))
    }

    /// Input JSON in, analytics report JSON out
    pub fn analytics_json(
        &self,
        input_json: &str,
        now: DateTime<Utc>,
    ) -> Result<String, EngineError> {
        let input = EngineInput::from_json(input_json)?;
        self.encoder.to_json(&self.analytics_report(&input, now))
    }

    /// Input JSON in, notification report JSON out
    pub fn notifications_json(
        &self,
        input_json: &str,
        now: DateTime<Utc>,
    ) -> Result<String, EngineError> {
        let input = EngineInput::from_json(input_json)?;
        self.encoder.to_json(&self.notification_report(&input, now))
    }
}

/// Engine for a one-shot run; the instance id is derived from the input and `now`
fn one_shot(input_json: &str, now: DateTime<Utc>) -> FrequencyEngine {
    FrequencyEngine::new().with_encoder(ReportEncoder::for_run(input_json, now))
}

/// Score input JSON into a recommendation report (stateless, one-shot).
///
/// Identical `input_json` and `now` yield identical report JSON.
///
/// # Example
/// ```ignore
/// let report_json = recommend_json(input_json, Utc::now())?;
/// ```
pub fn recommend_json(input_json: String, now: DateTime<Utc>) -> Result<String, EngineError> {
    one_shot(&input_json, now).recommend_json(&input_json, now)
}

/// Score input JSON into an analytics report (stateless, one-shot).
pub fn analytics_json(input_json: String, now: DateTime<Utc>) -> Result<String, EngineError> {
    one_shot(&input_json, now).analytics_json(&input_json, now)
}

/// Project input JSON into a notification report (stateless, one-shot).
pub fn notifications_json(input_json: String, now: DateTime<Utc>) -> Result<String, EngineError> {
    one_shot(&input_json, now).notifications_json(&input_json, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OffTimePeriod, OffTimeScope, Status, Trend};
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 16, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> Activity {
        Activity::at(now() - Duration::days(days))
    }

    fn utc_input(
        activity_types: Vec<ActivityType>,
        activities: Vec<(&str, Vec<Activity>)>,
    ) -> EngineInput {
        EngineInput {
            timezone: Some("UTC".to_string()),
            activity_types,
            activities: activities
                .into_iter()
                .map(|(id, list)| (id.to_string(), list))
                .collect(),
            off_time_periods: Vec::new(),
        }
    }

    #[test]
    fn test_no_activities() {
        let input = utc_input(vec![ActivityType::new("run", "Run", 3.0)], vec![]);
        let recs = FrequencyEngine::new().recommend(&input, now());

        let rec = &recs[0];
        assert_eq!(rec.status, Status::NoData);
        assert_eq!(rec.priority_score, -1000.0);
        assert_eq!(rec.average_frequency_last3, None);
        assert_eq!(rec.average_frequency_last10, None);
        assert_eq!(rec.trend, Trend::InsufficientData);
        assert_eq!(rec.last_performed_date, None);
        assert_eq!(rec.difference, None);
    }

    #[test]
    fn test_single_activity_five_days_ago() {
        let input = utc_input(
            vec![ActivityType::new("run", "Run", 7.0)],
            vec![("run", vec![days_ago(5)])],
        );
        let rec = &FrequencyEngine::new().recommend(&input, now())[0];

        assert_eq!(rec.days_since_last_activity, Some(5));
        assert_eq!(rec.average_frequency_last3, Some(5.0));
        assert_eq!(rec.difference, Some(-2.0));
        assert_eq!(rec.status, Status::Ahead);
        assert_eq!(rec.trend, Trend::Stable);
    }

    #[test]
    fn test_unsorted_activities_use_most_recent() {
        let input = utc_input(
            vec![ActivityType::new("run", "Run", 3.0)],
            vec![("run", vec![days_ago(9), days_ago(2), days_ago(5)])],
        );
        let rec = &FrequencyEngine::new().recommend(&input, now())[0];

        assert_eq!(rec.days_since_last_activity, Some(2));
        assert_eq!(rec.last_performed_date, Some(now() - Duration::days(2)));
        assert_eq!(rec.average_frequency_last3, Some(3.0));
    }

    #[test]
    fn test_trend_improving() {
        // Recent cadence every 2 days after a long stretch of weekly ones
        let mut history: Vec<Activity> = (0..3).map(|i| days_ago(1 + i * 2)).collect();
        history.extend((1..8).map(|i| days_ago(5 + i * 7)));

        let input = utc_input(
            vec![ActivityType::new("run", "Run", 3.0)],
            vec![("run", history)],
        );
        let rec = &FrequencyEngine::new().recommend(&input, now())[0];

        assert_eq!(rec.average_frequency_last3, Some(1.7));
        assert_eq!(rec.average_frequency_last10, Some(5.4));
        assert_eq!(rec.trend, Trend::Improving);
    }

    #[test]
    fn test_ranking_across_types() {
        let input = utc_input(
            vec![
                ActivityType::new("yoga", "Yoga", 2.0),
                ActivityType::new("run", "Run", 3.0),
                ActivityType::new("swim", "Swim", 7.0),
                ActivityType::new("bike", "Bike", 4.0),
            ],
            vec![
                ("yoga", vec![days_ago(2)]),
                ("run", vec![days_ago(10)]),
                ("swim", vec![days_ago(1)]),
            ],
        );
        let recs = FrequencyEngine::new().recommend(&input, now());

        let order: Vec<(&str, Status)> = recs
            .iter()
            .map(|r| (r.activity_type.id.as_str(), r.status))
            .collect();
        assert_eq!(
            order,
            vec![
                ("run", Status::CriticallyOverdue),
                ("yoga", Status::DueToday),
                ("swim", Status::Ahead),
                ("bike", Status::NoData),
            ]
        );
    }

    #[test]
    fn test_timezone_boundary() {
        // 23:30 UTC on Jan 15 is Jan 16 in Tokyo
        let activity = Activity::at(Utc.with_ymd_and_hms(2025, 1, 15, 23, 30, 0).unwrap());
        let now = Utc.with_ymd_and_hms(2025, 1, 18, 3, 0, 0).unwrap();

        let mut input = utc_input(
            vec![ActivityType::new("run", "Run", 3.0)],
            vec![("run", vec![activity])],
        );
        input.timezone = Some("Asia/Tokyo".to_string());

        let rec = &FrequencyEngine::new().recommend(&input, now)[0];
        // Local today is Jan 18, local activity day Jan 16
        assert_eq!(rec.days_since_last_activity, Some(2));

        input.timezone = Some("UTC".to_string());
        let rec = &FrequencyEngine::new().recommend(&input, now)[0];
        assert_eq!(rec.days_since_last_activity, Some(3));
    }

    #[test]
    fn test_unknown_timezone_falls_back_to_default() {
        let mut input = utc_input(vec![ActivityType::new("run", "Run", 3.0)], vec![]);
        input.timezone = Some("Not/AZone".to_string());

        let (tz, _) = FrequencyEngine::new().resolve_day(&input, now());
        assert_eq!(tz, chrono_tz::America::New_York);
    }

    #[test]
    fn test_seasonal_frequency_uses_local_today() {
        let freq: crate::types::DesiredFrequency =
            serde_json::from_str(r#"{"winter": 10, "spring": 5, "summer": 2, "fall": 5}"#).unwrap();
        let activity_type = ActivityType {
            id: "swim".to_string(),
            name: "Swim".to_string(),
            description: None,
            desired_frequency: freq,
        };
        let input = utc_input(vec![activity_type], vec![("swim", vec![days_ago(4)])]);

        let rec = &FrequencyEngine::new().recommend(&input, now())[0];
        assert_eq!(rec.desired_frequency, 2.0);
        assert_eq!(rec.status, Status::Overdue);
    }

    #[test]
    fn test_idempotent() {
        let input = utc_input(
            vec![
                ActivityType::new("run", "Run", 3.0),
                ActivityType::new("swim", "Swim", 7.0),
            ],
            vec![("run", vec![days_ago(4), days_ago(8)])],
        );
        let engine = FrequencyEngine::new();

        assert_eq!(engine.recommend(&input, now()), engine.recommend(&input, now()));
        assert_eq!(
            engine.recommendation_report(&input, now()),
            engine.recommendation_report(&input, now())
        );
        assert_eq!(engine.analytics(&input, now()), engine.analytics(&input, now()));
    }

    #[test]
    fn test_off_time_only_affects_analytics() {
        let activities = vec![
            Activity::at(Utc.with_ymd_and_hms(2025, 1, 25, 12, 0, 0).unwrap()),
            Activity::at(Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()),
            Activity::at(Utc.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap()),
        ];
        let mut input = utc_input(
            vec![ActivityType::new("run", "Run", 10.0)],
            vec![("run", activities)],
        );
        input.off_time_periods.push(OffTimePeriod {
            id: None,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 20).unwrap(),
            scope: OffTimeScope::ActivityType {
                activity_type_id: "run".to_string(),
            },
        });
        let now = Utc.with_ymd_and_hms(2025, 1, 26, 12, 0, 0).unwrap();
        let engine = FrequencyEngine::new();

        let (analytics, streaks) = engine.analytics(&input, now);
        assert_eq!(analytics[0].total_activities, 3);
        assert_eq!(analytics[0].counted_activities, 2);
        assert_eq!(analytics[0].excluded_activities, 1);
        assert_eq!(analytics[0].average_interval_days, 20.0);
        assert_eq!(streaks[0].streak.longest_streak_days, 0);

        // The live view still sees the Jan 15 activity
        let rec = &engine.recommend(&input, now)[0];
        assert_eq!(rec.average_frequency_last3, Some(7.0));
    }

    #[test]
    fn test_analytics_parallel_arrays() {
        let input = utc_input(
            vec![
                ActivityType::new("run", "Run", 3.0),
                ActivityType::new("swim", "Swim", 7.0),
            ],
            vec![("run", vec![days_ago(0), days_ago(3), days_ago(6), days_ago(9)])],
        );
        let (analytics, streaks) = FrequencyEngine::new().analytics(&input, now());

        assert_eq!(analytics.len(), 2);
        assert_eq!(streaks.len(), 2);
        assert_eq!(streaks[0].activity_type_id, "run");
        assert_eq!(streaks[0].streak.longest_streak_days, 9);
        assert_eq!(streaks[0].streak.average_interval, 3.0);
        assert_eq!(analytics[0].average_interval_days, 3.0);
        assert_eq!(streaks[1].streak.longest_streak_days, 0);
        assert_eq!(analytics[1].average_interval_days, 0.0);
    }

    #[test]
    fn test_notifications() {
        let input = utc_input(
            vec![
                ActivityType::new("run", "Run", 3.0),
                ActivityType::new("swim", "Swim", 7.0),
            ],
            vec![("run", vec![days_ago(6)]), ("swim", vec![days_ago(1)])],
        );
        let intents = FrequencyEngine::new().notifications(&input, now());

        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].activity_type_id, "run");
        assert_eq!(intents[0].status, Status::Overdue);
        assert_eq!(intents[0].dedupe_key, "run:2025-06-15:overdue");
    }

    #[test]
    fn test_recommend_json_stateless() {
        let json = r#"{
            "timezone": "UTC",
            "activity_types": [{ "id": "run", "name": "Run", "desired_frequency": 3 }],
            "activities": { "run": [{ "date": "2025-06-10T08:00:00Z" }] }
        }"#;

        let report = recommend_json(json.to_string(), now()).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&report).unwrap();

        assert_eq!(payload["timezone"], "UTC");
        assert_eq!(payload["reference_date"], "2025-06-15");
        let rec = &payload["recommendations"][0];
        assert_eq!(rec["status"], "overdue");
        assert_eq!(rec["days_since_last_activity"], 5);
        assert_eq!(rec["difference"], 2.0);
        assert_eq!(rec["activity_type"]["id"], "run");
    }

    #[test]
    fn test_stateless_json_is_repeatable() {
        let json = r#"{
            "timezone": "UTC",
            "activity_types": [{ "id": "run", "name": "Run", "desired_frequency": 3 }],
            "activities": { "run": [{ "date": "2025-06-10T08:00:00Z" }] }
        }"#;

        let first = recommend_json(json.to_string(), now()).unwrap();
        let second = recommend_json(json.to_string(), now()).unwrap();
        assert_eq!(first, second);

        assert_eq!(
            analytics_json(json.to_string(), now()).unwrap(),
            analytics_json(json.to_string(), now()).unwrap()
        );
        assert_eq!(
            notifications_json(json.to_string(), now()).unwrap(),
            notifications_json(json.to_string(), now()).unwrap()
        );

        // A different reference time is a different run
        let later = recommend_json(json.to_string(), now() + Duration::hours(1)).unwrap();
        let id = |report: &str| {
            let payload: serde_json::Value = serde_json::from_str(report).unwrap();
            payload["producer"]["instance_id"].as_str().unwrap().to_string()
        };
        assert_ne!(id(&first), id(&later));
    }

    #[test]
    fn test_configured_windows() {
        // Gaps of 1, 2, 3, 4 days back from today
        let input = utc_input(
            vec![ActivityType::new("run", "Run", 3.0)],
            vec![("run", vec![days_ago(1), days_ago(3), days_ago(6), days_ago(10)])],
        );

        let default_rec = &FrequencyEngine::new().recommend(&input, now())[0];
        assert_eq!(default_rec.average_frequency_last3, Some(2.0));
        assert_eq!(default_rec.average_frequency_last10, Some(2.5));

        let config = EngineConfig {
            short_window: 2,
            long_window: 4,
            ..Default::default()
        };
        let engine = FrequencyEngine::with_config(config).unwrap();
        let rec = &engine.recommend(&input, now())[0];
        assert_eq!(rec.average_frequency_last3, Some(1.5));
        assert_eq!(rec.average_frequency_last10, Some(2.5));
        assert_eq!(rec.trend, Trend::Improving);
    }

    #[test]
    fn test_invalid_json() {
        assert!(recommend_json("not valid json".to_string(), now()).is_err());
        assert!(analytics_json("{}".to_string(), now()).is_err());
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let config = EngineConfig {
            trend_stable_threshold_days: f64::NAN,
            ..Default::default()
        };
        assert!(FrequencyEngine::with_config(config).is_err());

        let config = EngineConfig {
            short_window: 10,
            long_window: 3,
            ..Default::default()
        };
        assert!(FrequencyEngine::with_config(config).is_err());
    }
}

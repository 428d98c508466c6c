//! Report encoding
//!
//! Wraps computed records in report envelopes carrying producer metadata, the
//! user's timezone and the reference day, and serializes them to JSON.

use crate::error::EngineError;
use crate::notify::NotificationIntent;
use crate::types::{
    AnalyticsReport, EngineProducer, Recommendation, RecommendationReport, TypeAnalytics,
    TypeStreak,
};
use crate::{ENGINE_VERSION, PRODUCER_NAME};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Notification intents for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationReport {
    pub report_version: String,
    pub producer: EngineProducer,
    pub timezone: String,
    pub reference_date: NaiveDate,
    pub computed_at_utc: DateTime<Utc>,
    pub notifications: Vec<NotificationIntent>,
}

/// Envelope encoder; one instance id per encoder
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encoder whose instance id is derived from the run's input and `now`.
    ///
    /// Used by the one-shot entry points so that the same input document and
    /// reference time always produce byte-identical reports.
    pub fn for_run(input_json: &str, now: DateTime<Utc>) -> Self {
        let mut name = Vec::with_capacity(input_json.len() + 32);
        name.extend_from_slice(now.to_rfc3339().as_bytes());
        name.push(b'\n');
        name.extend_from_slice(input_json.as_bytes());

        Self {
            instance_id: Uuid::new_v5(&Uuid::NAMESPACE_OID, &name).to_string(),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    fn producer(&self) -> EngineProducer {
        EngineProducer {
            name: PRODUCER_NAME.to_string(),
            version: ENGINE_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        }
    }

    pub fn recommendations(
        &self,
        tz: Tz,
        reference_date: NaiveDate,
        computed_at: DateTime<Utc>,
        recommendations: Vec<Recommendation>,
    ) -> RecommendationReport {
        RecommendationReport {
            report_version: REPORT_VERSION.to_string(),
            producer: self.producer(),
            timezone: tz.name().to_string(),
            reference_date,
            computed_at_utc: computed_at,
            recommendations,
        }
    }

    pub fn analytics(
        &self,
        tz: Tz,
        reference_date: NaiveDate,
        computed_at: DateTime<Utc>,
        analytics: Vec<TypeAnalytics>,
        streaks: Vec<TypeStreak>,
    ) -> AnalyticsReport {
        AnalyticsReport {
            report_version: REPORT_VERSION.to_string(),
            producer: self.producer(),
            timezone: tz.name().to_string(),
            reference_date,
            computed_at_utc: computed_at,
            analytics,
            streaks,
        }
    }

    pub fn notifications(
        &self,
        tz: Tz,
        reference_date: NaiveDate,
        computed_at: DateTime<Utc>,
        notifications: Vec<NotificationIntent>,
    ) -> NotificationReport {
        NotificationReport {
            report_version: REPORT_VERSION.to_string(),
            producer: self.producer(),
            timezone: tz.name().to_string(),
            reference_date,
            computed_at_utc: computed_at,
            notifications,
        }
    }

    /// Encode any report to pretty JSON
    pub fn to_json<T: Serialize>(&self, report: &T) -> Result<String, EngineError> {
        serde_json::to_string_pretty(report).map_err(|e| EngineError::EncodingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_envelope_metadata() {
        let encoder = ReportEncoder::with_instance_id("instance-1".to_string());
        let computed_at = Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap();
        let reference_date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();

        let report = encoder.recommendations(
            chrono_tz::Europe::London,
            reference_date,
            computed_at,
            Vec::new(),
        );
        let json: serde_json::Value =
            serde_json::from_str(&encoder.to_json(&report).unwrap()).unwrap();

        assert_eq!(json["report_version"], "1.0.0");
        assert_eq!(json["producer"]["name"], "cadence");
        assert_eq!(json["producer"]["instance_id"], "instance-1");
        assert_eq!(json["timezone"], "Europe/London");
        assert_eq!(json["reference_date"], "2025-04-01");
        assert!(json["recommendations"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_unique_instance_ids() {
        let a = ReportEncoder::new();
        let b = ReportEncoder::new();
        assert_ne!(a.instance_id(), b.instance_id());
    }

    #[test]
    fn test_run_instance_id_is_stable() {
        let now = Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 4, 2, 12, 0, 0).unwrap();

        let a = ReportEncoder::for_run("{}", now);
        let b = ReportEncoder::for_run("{}", now);
        assert_eq!(a.instance_id(), b.instance_id());

        assert_ne!(a.instance_id(), ReportEncoder::for_run("{}", later).instance_id());
        assert_ne!(a.instance_id(), ReportEncoder::for_run("[]", now).instance_id());
    }
}

//! Engine input document
//!
//! The persistence layer hands the engine one JSON document per user:
//!
//! ```json
//! {
//!   "timezone": "America/Chicago",
//!   "activity_types": [
//!     { "id": "run", "name": "Run", "desired_frequency": 3 },
//!     { "id": "swim", "name": "Swim",
//!       "desired_frequency": { "winter": 14, "spring": 7, "summer": 3, "fall": 7 } }
//!   ],
//!   "activities": {
//!     "run": [
//!       { "id": "a2", "date": "2025-01-14T12:00:00Z" },
//!       { "date": "2025-01-11T07:30:00Z" }
//!     ]
//!   },
//!   "off_time_periods": [
//!     { "start_date": "2025-01-10", "end_date": "2025-01-20",
//!       "scope": { "kind": "activity_type", "activity_type_id": "run" } }
//!   ]
//! }
//! ```
//!
//! Validation reports every problem at once; the engine itself never rejects
//! input.

use crate::calendar::parse_timezone;
use crate::error::EngineError;
use crate::types::{Activity, ActivityType, OffTimePeriod, OffTimeScope};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Everything the engine reads for one user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineInput {
    /// IANA zone; falls back to the configured default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    pub activity_types: Vec<ActivityType>,
    /// Activities keyed by activity type id, most recent first
    #[serde(default)]
    pub activities: BTreeMap<String, Vec<Activity>>,
    #[serde(default)]
    pub off_time_periods: Vec<OffTimePeriod>,
}

impl EngineInput {
    /// Parse an input document
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|e| EngineError::ParseError(e.to_string()))
    }

    /// Activities recorded against a type (empty if none)
    pub fn activities_for(&self, activity_type_id: &str) -> &[Activity] {
        self.activities
            .get(activity_type_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Check the document for problems the scoring math would silently absorb
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if let Some(tz) = &self.timezone {
            if parse_timezone(tz).is_err() {
                errors.push(ValidationError::UnknownTimezone { name: tz.clone() });
            }
        }

        let mut seen = HashSet::new();
        for activity_type in &self.activity_types {
            if !seen.insert(activity_type.id.as_str()) {
                errors.push(ValidationError::DuplicateActivityType {
                    id: activity_type.id.clone(),
                });
            }
            for value in activity_type.desired_frequency.values() {
                if !value.is_finite() || value <= 0.0 {
                    errors.push(ValidationError::InvalidFrequency {
                        activity_type_id: activity_type.id.clone(),
                        value,
                    });
                }
            }
        }

        for type_id in self.activities.keys() {
            if !seen.contains(type_id.as_str()) {
                errors.push(ValidationError::UnknownActivityType {
                    context: "activities".to_string(),
                    id: type_id.clone(),
                });
            }
        }

        for period in &self.off_time_periods {
            if period.start_date > period.end_date {
                errors.push(ValidationError::InvertedOffTimePeriod {
                    start: period.start_date,
                    end: period.end_date,
                });
            }
            match &period.scope {
                OffTimeScope::ActivityType { activity_type_id } => {
                    if !seen.contains(activity_type_id.as_str()) {
                        errors.push(ValidationError::UnknownActivityType {
                            context: "off_time_periods".to_string(),
                            id: activity_type_id.clone(),
                        });
                    }
                }
                OffTimeScope::Tag {
                    tag_id,
                    activity_type_ids,
                } => {
                    if activity_type_ids.is_empty() {
                        errors.push(ValidationError::EmptyTag {
                            tag_id: tag_id.clone(),
                        });
                    }
                }
            }
        }

        errors
    }
}

/// A problem found in an input document
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Unknown timezone: {name}")]
    UnknownTimezone { name: String },

    #[error("Duplicate activity type id: {id}")]
    DuplicateActivityType { id: String },

    #[error("Activity type {activity_type_id} has invalid desired frequency {value}")]
    InvalidFrequency { activity_type_id: String, value: f64 },

    #[error("{context} references unknown activity type {id}")]
    UnknownActivityType { context: String, id: String },

    #[error("Off-time period starts {start} after it ends {end}")]
    InvertedOffTimePeriod { start: NaiveDate, end: NaiveDate },

    #[error("Off-time tag {tag_id} has no member activity types")]
    EmptyTag { tag_id: String },
}

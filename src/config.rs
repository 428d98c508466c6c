//! Engine configuration
//!
//! Passed explicitly at construction time; the engine holds no global state.

use crate::calendar::{parse_timezone, DEFAULT_TIMEZONE};
use crate::error::EngineError;
use crate::notify::NotificationPolicy;
use crate::rolling::{DEFAULT_STABLE_THRESHOLD_DAYS, LONG_WINDOW, SHORT_WINDOW};
use serde::{Deserialize, Serialize};

/// Tunable engine parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// IANA zone used when the input carries none or an unknown one
    pub default_timezone: String,
    /// Activities in the recent rolling average
    pub short_window: usize,
    /// Activities in the reference rolling average
    pub long_window: usize,
    /// Rolling-average difference below which the trend is stable (days)
    pub trend_stable_threshold_days: f64,
    /// Which recommendations notify
    pub notifications: NotificationPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timezone: DEFAULT_TIMEZONE.to_string(),
            short_window: SHORT_WINDOW,
            long_window: LONG_WINDOW,
            trend_stable_threshold_days: DEFAULT_STABLE_THRESHOLD_DAYS,
            notifications: NotificationPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::EncodingError(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        parse_timezone(&self.default_timezone)?;

        if self.short_window == 0 || self.long_window == 0 {
            return Err(EngineError::InvalidConfig(format!(
                "rolling windows must hold at least one activity, got {} and {}",
                self.short_window, self.long_window
            )));
        }
        if self.short_window > self.long_window {
            return Err(EngineError::InvalidConfig(format!(
                "short_window ({}) must not exceed long_window ({})",
                self.short_window, self.long_window
            )));
        }

        let threshold = self.trend_stable_threshold_days;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "trend_stable_threshold_days must be a non-negative number, got {threshold}"
            )));
        }

        Ok(())
    }
}

//! Cadence - frequency scoring engine for recurring activities
//!
//! Given a user's timezone, their activity types with desired recurrence
//! frequencies, and the history of activities recorded against each type,
//! Cadence computes how due or overdue every type is, ranks them, and derives
//! lifetime analytics and longest streaks.
//!
//! The engine is deterministic and side-effect free: input document in,
//! report out, with "now" always supplied by the caller.
//!
//! ## Modules
//!
//! - **Recommendations**: status, priority, rolling averages and trend per type
//! - **Analytics**: off-time-aware lifetime averages and streak search
//! - **Notifications**: which recommendations deserve a push, and what it says

pub mod calendar;
pub mod config;
pub mod encoder;
pub mod error;
pub mod input;
pub mod notify;
pub mod off_time;
pub mod pipeline;
pub mod rolling;
pub mod status;
pub mod streak;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::EngineConfig;
pub use error::EngineError;
pub use input::{EngineInput, ValidationError};
pub use pipeline::{analytics_json, notifications_json, recommend_json, FrequencyEngine};
pub use types::{
    Activity, ActivityType, DesiredFrequency, OffTimePeriod, OffTimeScope, Recommendation,
    Season, Status, Trend,
};

/// Engine version embedded in all reports
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "cadence";

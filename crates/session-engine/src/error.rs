//! Error types for session-engine operations.
//!
//! Every variant is a caller-facing validation outcome. None of them signal a
//! programmer error, so they are returned, never panicked on.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Proposed time is outside the tutor's availability")]
    OutsideAvailability,

    #[error("Proposed time overlaps an existing booking")]
    ConflictsWithExisting,

    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("Invalid time range: start {start} is not before end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Occurrence has already started and can no longer be cancelled")]
    AlreadyStarted,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ScheduleError {
    /// Stable upper-case code for UI message lookup.
    pub fn code(&self) -> &'static str {
        match self {
            ScheduleError::OutsideAvailability => "OUTSIDE_AVAILABILITY",
            ScheduleError::ConflictsWithExisting => "CONFLICTS_WITH_EXISTING",
            ScheduleError::InvalidRule(_) => "INVALID_RULE",
            ScheduleError::InvalidRange { .. } => "INVALID_RANGE",
            ScheduleError::AlreadyStarted => "ALREADY_STARTED",
            ScheduleError::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;

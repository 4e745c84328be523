//! Materialized instances of a recurrence rule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::range::TimeRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceStatus {
    #[default]
    Upcoming,
    Cancelled,
}

/// Identity of an occurrence: the owning rule plus its scheduled start.
///
/// Re-expanding a rule produces the same keys, which is what makes
/// materialization an upsert-if-absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OccurrenceKey {
    pub rule_id: String,
    pub scheduled_start: DateTime<Utc>,
}

impl std::fmt::Display for OccurrenceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.rule_id, self.scheduled_start.to_rfc3339())
    }
}

/// One concrete session of a recurring group class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub rule_id: String,
    #[serde(flatten)]
    pub scheduled: TimeRange,
    #[serde(default)]
    pub status: OccurrenceStatus,
}

impl Occurrence {
    pub fn upcoming(rule_id: impl Into<String>, scheduled: TimeRange) -> Self {
        Self {
            rule_id: rule_id.into(),
            scheduled,
            status: OccurrenceStatus::Upcoming,
        }
    }

    pub fn key(&self) -> OccurrenceKey {
        OccurrenceKey {
            rule_id: self.rule_id.clone(),
            scheduled_start: self.scheduled.start(),
        }
    }

    /// Display identifier, `rule_id@start`.
    pub fn id(&self) -> String {
        self.key().to_string()
    }

    pub fn scheduled_start(&self) -> DateTime<Utc> {
        self.scheduled.start()
    }

    pub fn scheduled_end(&self) -> DateTime<Utc> {
        self.scheduled.end()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == OccurrenceStatus::Cancelled
    }

    /// Derived, never stored: the occurrence is past once its end is not after `now`.
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.scheduled.end() <= now
    }

    /// Cancel this occurrence alone. Allowed only strictly before it starts.
    ///
    /// Cancelling an already-cancelled occurrence is a no-op.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.is_cancelled() {
            return Ok(());
        }
        if now >= self.scheduled.start() {
            return Err(ScheduleError::AlreadyStarted);
        }
        self.status = OccurrenceStatus::Cancelled;
        Ok(())
    }
}

impl AsRef<TimeRange> for Occurrence {
    fn as_ref(&self) -> &TimeRange {
        &self.scheduled
    }
}

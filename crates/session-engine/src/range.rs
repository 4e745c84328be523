//! Half-open time intervals.
//!
//! A [`TimeRange`] covers `[start, end)`. Two ranges that merely touch
//! (`a.end == b.start`) do not overlap, which is what lets back-to-back
//! sessions coexist.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

/// An immutable `[start, end)` interval with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Unvalidated wire shape; deserialization goes through [`TimeRange::new`].
#[derive(Deserialize)]
struct RawRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawRange> for TimeRange {
    type Error = ScheduleError;

    fn try_from(raw: RawRange) -> Result<Self> {
        TimeRange::new(raw.start, raw.end)
    }
}

impl TimeRange {
    /// Build a range, rejecting `start >= end` with [`ScheduleError::InvalidRange`].
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(ScheduleError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Build a range of `minutes` starting at `start`.
    pub fn starting_at(start: DateTime<Utc>, minutes: u32) -> Result<Self> {
        Self::new(start, start + Duration::minutes(i64::from(minutes)))
    }

    /// Callers must guarantee `start < end`.
    pub(crate) fn from_ordered(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start < end);
        Self { start, end }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// `true` iff `self.start < other.end && other.start < self.end`.
    ///
    /// Symmetric. Touching endpoints never overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// `true` iff `other` lies entirely inside `self` (endpoints inclusive).
    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// `true` iff `instant` falls in `[start, end)`.
    pub fn contains_instant(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// The shared part of two ranges, if they overlap.
    pub fn intersection(&self, other: &TimeRange) -> Option<TimeRange> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Self::from_ordered(
            self.start.max(other.start),
            self.end.min(other.end),
        ))
    }

    /// Minutes of overlap with `other`; zero when disjoint or adjacent.
    pub fn overlap_minutes(&self, other: &TimeRange) -> i64 {
        self.intersection(other)
            .map(|shared| shared.duration_minutes())
            .unwrap_or(0)
    }
}

impl AsRef<TimeRange> for TimeRange {
    fn as_ref(&self) -> &TimeRange {
        self
    }
}

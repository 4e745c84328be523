//! Bookability of a proposed range against a tutor's windows and commitments.
//!
//! A proposal is bookable when it sits entirely inside a single availability
//! window and overlaps no busy block. Spanning two windows is refused even when
//! they are contiguous. All functions here are pure over borrowed snapshots, so
//! many proposals can be checked concurrently against the same slices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::{self, Conflict};
use crate::error::{Result, ScheduleError};
use crate::range::TimeRange;

/// A tutor-declared open interval on a given date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvailabilityWindow {
    range: TimeRange,
}

impl AvailabilityWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        TimeRange::new(start, end).map(Self::from)
    }

    pub fn range(&self) -> &TimeRange {
        &self.range
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.range.start()
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.range.end()
    }
}

impl From<TimeRange> for AvailabilityWindow {
    fn from(range: TimeRange) -> Self {
        Self { range }
    }
}

impl AsRef<TimeRange> for AvailabilityWindow {
    fn as_ref(&self) -> &TimeRange {
        &self.range
    }
}

/// An interval made unavailable by a committed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusyBlock {
    range: TimeRange,
}

impl BusyBlock {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        TimeRange::new(start, end).map(Self::from)
    }

    pub fn range(&self) -> &TimeRange {
        &self.range
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.range.start()
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.range.end()
    }
}

impl From<TimeRange> for BusyBlock {
    fn from(range: TimeRange) -> Self {
        Self { range }
    }
}

impl AsRef<TimeRange> for BusyBlock {
    fn as_ref(&self) -> &TimeRange {
        &self.range
    }
}

/// Why a proposal was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rejection {
    /// Not fully inside any single availability window.
    OutsideAvailability,
    /// Overlaps at least one busy block.
    ConflictsWithExisting,
}

impl Rejection {
    pub fn code(self) -> &'static str {
        match self {
            Rejection::OutsideAvailability => "OUTSIDE_AVAILABILITY",
            Rejection::ConflictsWithExisting => "CONFLICTS_WITH_EXISTING",
        }
    }
}

impl From<Rejection> for ScheduleError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::OutsideAvailability => ScheduleError::OutsideAvailability,
            Rejection::ConflictsWithExisting => ScheduleError::ConflictsWithExisting,
        }
    }
}

/// Check a proposal, reporting the first failed rule.
///
/// Containment is evaluated before conflicts, so a proposal outside every
/// window is `OutsideAvailability` regardless of the busy set.
pub fn check_bookable(
    proposed: &TimeRange,
    windows: &[AvailabilityWindow],
    busy: &[BusyBlock],
) -> std::result::Result<(), Rejection> {
    if !windows.iter().any(|w| w.range.contains(proposed)) {
        return Err(Rejection::OutsideAvailability);
    }
    if conflict::overlaps_any(proposed, busy) {
        return Err(Rejection::ConflictsWithExisting);
    }
    Ok(())
}

/// Boolean form of [`check_bookable`].
pub fn is_bookable(
    proposed: &TimeRange,
    windows: &[AvailabilityWindow],
    busy: &[BusyBlock],
) -> bool {
    check_bookable(proposed, windows, busy).is_ok()
}

/// Busy blocks a proposal collides with, with overlap minutes for messaging.
pub fn conflicts_with(proposed: &TimeRange, busy: &[BusyBlock]) -> Vec<Conflict> {
    conflict::find_conflicts(std::slice::from_ref(proposed), busy)
}

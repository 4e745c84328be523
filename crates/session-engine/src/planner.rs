//! Quantized start-time enumeration for flexible-length bookings.
//!
//! For a chosen date and session length, every availability window on that
//! date is walked in fixed granularity steps. A step is offered only when the
//! whole session fits before the window closes and the resulting range passes
//! [`availability::is_bookable`]. Partial slots are never produced.
//!
//! Legacy fixed-slot calendars need no separate path: pre-slice their slots
//! into one window each and request a duration equal to the slot length.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::availability::{self, AvailabilityWindow, BusyBlock};
use crate::conflict;
use crate::error::Result;
use crate::range::TimeRange;

/// Default step between candidate start times.
pub const DEFAULT_GRANULARITY_MINUTES: u32 = 15;

/// What the booker asked for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotRequest {
    /// Calendar date, interpreted in `timezone`.
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub granularity_minutes: u32,
    /// Zone used to decide which windows fall on `date`.
    pub timezone: Tz,
}

impl SlotRequest {
    /// A request with the default 15-minute granularity, dates in UTC.
    pub fn new(date: NaiveDate, duration_minutes: u32) -> Self {
        Self {
            date,
            duration_minutes,
            granularity_minutes: DEFAULT_GRANULARITY_MINUTES,
            timezone: chrono_tz::UTC,
        }
    }

    pub fn with_granularity(mut self, minutes: u32) -> Self {
        self.granularity_minutes = minutes;
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes))
    }

    fn step(&self) -> Duration {
        Duration::minutes(i64::from(self.granularity_minutes))
    }

    fn is_degenerate(&self) -> bool {
        self.duration_minutes == 0 || self.granularity_minutes == 0
    }

    /// Windows whose start falls on the requested local date, sorted by start.
    fn windows_on_date<'a>(
        &self,
        windows: &'a [AvailabilityWindow],
    ) -> Vec<&'a AvailabilityWindow> {
        let mut on_date: Vec<&AvailabilityWindow> = windows
            .iter()
            .filter(|w| w.start().with_timezone(&self.timezone).date_naive() == self.date)
            .collect();
        on_date.sort_by_key(|w| (w.start(), w.end()));
        on_date
    }
}

/// Display status of a candidate slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Booked,
    Unavailable,
}

impl SlotStatus {
    /// Preference when two windows offer the same start.
    fn rank(self) -> u8 {
        match self {
            SlotStatus::Available => 0,
            SlotStatus::Booked => 1,
            SlotStatus::Unavailable => 2,
        }
    }
}

/// A display-only slot; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSlot {
    #[serde(flatten)]
    pub range: TimeRange,
    pub status: SlotStatus,
}

impl AsRef<TimeRange> for CandidateSlot {
    fn as_ref(&self) -> &TimeRange {
        &self.range
    }
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    next: DateTime<Utc>,
    last_start: DateTime<Utc>,
}

/// Lazy, ascending, duplicate-free sequence of bookable start instants.
///
/// Holds no state beyond per-window cursors; cloning it or calling
/// [`enumerate_starts`] again replays the same sequence.
#[derive(Debug, Clone)]
pub struct SlotStarts<'a> {
    cursors: Vec<Cursor>,
    windows: &'a [AvailabilityWindow],
    busy: &'a [BusyBlock],
    duration: Duration,
    step: Duration,
}

impl Iterator for SlotStarts<'_> {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let t = self
                .cursors
                .iter()
                .filter(|c| c.next <= c.last_start)
                .map(|c| c.next)
                .min()?;

            // Overlapping windows may share a grid point; advance all of them.
            for cursor in self.cursors.iter_mut().filter(|c| c.next == t) {
                cursor.next += self.step;
            }

            let proposed = TimeRange::from_ordered(t, t + self.duration);
            if availability::is_bookable(&proposed, self.windows, self.busy) {
                return Some(t);
            }
        }
    }
}

/// Enumerate bookable start times for `request`.
///
/// A start `t` from a window's grid is yielded iff `t + duration <= window.end`
/// and `{t, t + duration}` is bookable against all `windows` and `busy`. Zero
/// duration or granularity yields nothing.
pub fn enumerate_starts<'a>(
    request: &SlotRequest,
    windows: &'a [AvailabilityWindow],
    busy: &'a [BusyBlock],
) -> SlotStarts<'a> {
    let duration = request.duration();
    let cursors = if request.is_degenerate() {
        Vec::new()
    } else {
        request
            .windows_on_date(windows)
            .into_iter()
            .filter(|w| w.range().duration() >= duration)
            .map(|w| Cursor {
                next: w.start(),
                last_start: w.end() - duration,
            })
            .collect()
    };

    SlotStarts {
        cursors,
        windows,
        busy,
        duration,
        step: request.step(),
    }
}

/// Every grid point of every window on the date, classified for display.
///
/// `available` slots are exactly those [`enumerate_starts`] yields. A slot that
/// fits its window but overlaps a busy block is `booked`; one that runs past
/// the window end is `unavailable`.
pub fn candidate_slots(
    request: &SlotRequest,
    windows: &[AvailabilityWindow],
    busy: &[BusyBlock],
) -> Vec<CandidateSlot> {
    if request.is_degenerate() {
        return Vec::new();
    }

    let duration = request.duration();
    let step = request.step();
    let mut slots = Vec::new();

    for window in request.windows_on_date(windows) {
        let mut t = window.start();
        while t < window.end() {
            let range = TimeRange::from_ordered(t, t + duration);
            let status = if range.end() > window.end() {
                SlotStatus::Unavailable
            } else if conflict::overlaps_any(&range, busy) {
                SlotStatus::Booked
            } else {
                SlotStatus::Available
            };
            slots.push(CandidateSlot { range, status });
            t += step;
        }
    }

    slots.sort_by_key(|s| (s.range.start(), s.status.rank()));
    slots.dedup_by_key(|s| s.range.start());

    debug!(
        date = %request.date,
        duration = request.duration_minutes,
        candidates = slots.len(),
        "classified candidate slots"
    );
    slots
}

/// Re-check a previously chosen start after the session length changed.
pub fn revalidate_start(
    start: DateTime<Utc>,
    duration_minutes: u32,
    windows: &[AvailabilityWindow],
    busy: &[BusyBlock],
) -> Result<()> {
    let proposed = TimeRange::starting_at(start, duration_minutes)?;
    availability::check_bookable(&proposed, windows, busy)?;
    Ok(())
}

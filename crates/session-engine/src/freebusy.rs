//! Compute open time inside availability windows.
//!
//! Sorts busy blocks by start time, merges overlapping periods, then computes
//! the gaps between merged periods within each window.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::availability::{AvailabilityWindow, BusyBlock};
use crate::range::TimeRange;

/// A stretch of open time inside one availability window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i64,
}

impl FreeSlot {
    fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            duration_minutes: (end - start).num_minutes(),
        }
    }
}

/// Merge overlapping or adjacent busy blocks, clipped to `window`.
///
/// Returns a sorted, non-overlapping list of ranges.
pub fn merge_busy_periods(busy: &[BusyBlock], window: &TimeRange) -> Vec<TimeRange> {
    // Clip to the window, discarding blocks entirely outside.
    let mut intervals: Vec<TimeRange> = busy
        .iter()
        .filter_map(|b| b.range().intersection(window))
        .collect();

    intervals.sort();

    let mut merged: Vec<TimeRange> = Vec::with_capacity(intervals.len());
    for range in intervals {
        if let Some(last) = merged.last_mut() {
            if range.start() <= last.end() {
                // Overlapping or adjacent, extend the current interval.
                let end = last.end().max(range.end());
                *last = TimeRange::from_ordered(last.start(), end);
                continue;
            }
        }
        merged.push(range);
    }

    merged
}

/// Open gaps inside a single window.
pub fn find_free_slots(busy: &[BusyBlock], window: &TimeRange) -> Vec<FreeSlot> {
    let merged = merge_busy_periods(busy, window);

    let mut free_slots = Vec::new();
    let mut cursor = window.start();

    for block in &merged {
        if cursor < block.start() {
            free_slots.push(FreeSlot::between(cursor, block.start()));
        }
        cursor = cursor.max(block.end());
    }

    if cursor < window.end() {
        free_slots.push(FreeSlot::between(cursor, window.end()));
    }

    free_slots
}

/// Open gaps across all windows, sorted by start.
///
/// Gaps are computed per window and never joined across window boundaries,
/// matching the rule that a booking may not span two windows.
pub fn open_intervals(windows: &[AvailabilityWindow], busy: &[BusyBlock]) -> Vec<FreeSlot> {
    let mut slots: Vec<FreeSlot> = windows
        .iter()
        .flat_map(|w| find_free_slots(busy, w.range()))
        .collect();
    slots.sort_by_key(|s| (s.start, s.end));
    slots
}

/// First open gap of at least `min_duration_minutes`.
pub fn find_first_open(
    windows: &[AvailabilityWindow],
    busy: &[BusyBlock],
    min_duration_minutes: i64,
) -> Option<FreeSlot> {
    open_intervals(windows, busy)
        .into_iter()
        .find(|slot| slot.duration_minutes >= min_duration_minutes)
}

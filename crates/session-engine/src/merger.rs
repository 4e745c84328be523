//! Read-side timeline assembly.
//!
//! Combines candidate slots and busy blocks into one chronologically ordered,
//! conflict-annotated view, and splits occurrence lists into future and past
//! halves around `now`. Inputs are borrowed and never mutated.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::availability::BusyBlock;
use crate::conflict;
use crate::occurrence::Occurrence;
use crate::planner::{CandidateSlot, SlotStatus};
use crate::range::TimeRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    // Declared first so busy blocks sort ahead of slots with the same range.
    Busy,
    Slot,
}

/// One row of the merged timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    #[serde(flatten)]
    pub range: TimeRange,
    pub kind: EntryKind,
    /// Slot status after annotation; `None` for busy blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SlotStatus>,
    /// For slots: overlaps a busy block. For busy blocks: overlaps a slot that
    /// was offered as available.
    pub conflicting: bool,
}

/// Merge slots and busy blocks into one ascending timeline.
///
/// An `available` slot that overlaps a busy block is reported as `booked`.
/// Ordering is by `(start, end)`, busy blocks first on ties, then input order.
pub fn merge(slots: &[CandidateSlot], busy: &[BusyBlock]) -> Vec<TimelineEntry> {
    let offered: Vec<&TimeRange> = slots
        .iter()
        .filter(|s| s.status == SlotStatus::Available)
        .map(|s| &s.range)
        .collect();

    let mut entries: Vec<TimelineEntry> = Vec::with_capacity(slots.len() + busy.len());

    for block in busy {
        entries.push(TimelineEntry {
            range: *block.range(),
            kind: EntryKind::Busy,
            status: None,
            conflicting: offered.iter().any(|r| r.overlaps(block.range())),
        });
    }

    for slot in slots {
        let conflicting = conflict::overlaps_any(&slot.range, busy);
        let status = match slot.status {
            SlotStatus::Available if conflicting => SlotStatus::Booked,
            other => other,
        };
        entries.push(TimelineEntry {
            range: slot.range,
            kind: EntryKind::Slot,
            status: Some(status),
            conflicting,
        });
    }

    entries.sort_by_key(|e| (e.range.start(), e.range.end(), e.kind));
    entries
}

/// Occurrences split around a point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Partitioned {
    pub future: Vec<Occurrence>,
    pub past: Vec<Occurrence>,
}

/// Split occurrences into `future` (`scheduled_end > now`) and `past`.
///
/// Stored status is ignored; a cancelled occurrence still lands on the side
/// its times put it. Both halves are ascending by start.
pub fn partition(occurrences: &[Occurrence], now: DateTime<Utc>) -> Partitioned {
    let mut sorted: Vec<Occurrence> = occurrences.to_vec();
    sorted.sort_by(|a, b| {
        (a.scheduled_start(), a.scheduled_end(), &a.rule_id)
            .cmp(&(b.scheduled_start(), b.scheduled_end(), &b.rule_id))
    });

    let (future, past): (Vec<Occurrence>, Vec<Occurrence>) =
        sorted.into_iter().partition(|occ| occ.scheduled_end() > now);

    Partitioned { future, past }
}

/// Bounded view: the next `next_n` future and the most recent `last_m` past
/// occurrences, each still ascending.
pub fn partition_window(
    occurrences: &[Occurrence],
    now: DateTime<Utc>,
    next_n: usize,
    last_m: usize,
) -> Partitioned {
    let Partitioned { mut future, past } = partition(occurrences, now);
    future.truncate(next_n);
    let skip = past.len().saturating_sub(last_m);
    Partitioned {
        future,
        past: past.into_iter().skip(skip).collect(),
    }
}

/// A page of an already ordered view.
pub fn page<T>(entries: &[T], offset: usize, limit: usize) -> &[T] {
    let start = offset.min(entries.len());
    let end = start.saturating_add(limit).min(entries.len());
    &entries[start..end]
}

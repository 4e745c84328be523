//! Tests for the merged timeline and occurrence partitioning.

use chrono::{DateTime, Duration, TimeZone, Utc};
use session_engine::merger::{page, EntryKind};
use session_engine::{
    merge, partition, partition_window, BusyBlock, CandidateSlot, Occurrence, SlotStatus,
    TimeRange,
};

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, hour, min, 0).unwrap()
}

fn slot(h: u32, m: u32, minutes: u32, status: SlotStatus) -> CandidateSlot {
    CandidateSlot {
        range: TimeRange::starting_at(at(h, m), minutes).unwrap(),
        status,
    }
}

fn busy(sh: u32, sm: u32, eh: u32, em: u32) -> BusyBlock {
    BusyBlock::new(at(sh, sm), at(eh, em)).unwrap()
}

fn weekly_occurrences(count: i64) -> Vec<Occurrence> {
    let first = Utc.with_ymd_and_hms(2025, 1, 6, 18, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let start = first + Duration::weeks(i);
            Occurrence::upcoming("algebra-101", TimeRange::starting_at(start, 60).unwrap())
        })
        .collect()
}

// ── merge ───────────────────────────────────────────────────────────────────

#[test]
fn merge_orders_slots_and_busy_chronologically() {
    let slots = vec![
        slot(11, 0, 30, SlotStatus::Available),
        slot(9, 0, 30, SlotStatus::Available),
    ];
    let blocks = vec![busy(10, 0, 10, 30)];

    let timeline = merge(&slots, &blocks);

    let starts: Vec<_> = timeline.iter().map(|e| e.range.start()).collect();
    assert_eq!(starts, vec![at(9, 0), at(10, 0), at(11, 0)]);
    assert_eq!(timeline[1].kind, EntryKind::Busy);
    assert!(timeline.iter().all(|e| !e.conflicting));
}

#[test]
fn merge_annotates_conflicts_and_downgrades_available() {
    let slots = vec![
        slot(10, 0, 30, SlotStatus::Available),
        slot(10, 15, 30, SlotStatus::Unavailable),
    ];
    let blocks = vec![busy(10, 0, 10, 30)];

    let timeline = merge(&slots, &blocks);

    // Busy first on the tie at 10:00.
    assert_eq!(timeline[0].kind, EntryKind::Busy);
    assert!(timeline[0].conflicting);
    assert_eq!(timeline[1].status, Some(SlotStatus::Booked));
    assert!(timeline[1].conflicting);
    assert_eq!(timeline[2].status, Some(SlotStatus::Unavailable));
    assert!(timeline[2].conflicting);
}

#[test]
fn merge_does_not_flag_busy_for_non_offered_slots() {
    let slots = vec![slot(10, 0, 30, SlotStatus::Booked)];
    let blocks = vec![busy(10, 0, 10, 30)];

    let timeline = merge(&slots, &blocks);

    assert!(!timeline[0].conflicting);
    assert!(timeline[1].conflicting);
}

#[test]
fn merge_leaves_inputs_untouched() {
    let slots = vec![slot(10, 0, 30, SlotStatus::Available)];
    let blocks = vec![busy(10, 0, 10, 30)];
    let before = slots.clone();

    let _ = merge(&slots, &blocks);

    assert_eq!(slots, before);
}

#[test]
fn busy_entries_serialize_without_status() {
    let timeline = merge(&[], &[busy(10, 0, 10, 30)]);
    let json = serde_json::to_value(&timeline).unwrap();
    assert_eq!(json[0]["kind"], "busy");
    assert!(json[0].get("status").is_none());
    assert_eq!(json[0]["start"], "2025-06-02T10:00:00Z");
}

// ── partition ───────────────────────────────────────────────────────────────

#[test]
fn partition_splits_on_scheduled_end() {
    let occs = weekly_occurrences(4);
    // During the second occurrence: it has not ended, so it is future.
    let now = occs[1].scheduled_start() + Duration::minutes(10);

    let split = partition(&occs, now);

    assert_eq!(split.past.len(), 1);
    assert_eq!(split.future.len(), 3);
    assert_eq!(split.future[0], occs[1]);
}

#[test]
fn partition_ignores_status_and_sorts() {
    let mut occs = weekly_occurrences(3);
    let cancel_at = occs[2].scheduled_start() - Duration::days(1);
    occs[2].cancel(cancel_at).unwrap();
    occs.reverse();

    let now = occs[0].scheduled_start() - Duration::days(30);
    let split = partition(&occs, now);

    assert_eq!(split.future.len(), 3);
    assert!(split.future[2].is_cancelled());
    assert!(split.future.windows(2).all(|w| w[0].scheduled_start() < w[1].scheduled_start()));
}

#[test]
fn ending_exactly_now_is_past() {
    let occs = weekly_occurrences(1);
    let split = partition(&occs, occs[0].scheduled_end());
    assert_eq!(split.past.len(), 1);
    assert!(split.future.is_empty());
}

#[test]
fn partition_window_keeps_nearest_entries() {
    let occs = weekly_occurrences(10);
    let now = occs[5].scheduled_start() - Duration::hours(1);

    let view = partition_window(&occs, now, 2, 3);

    assert_eq!(view.future, occs[5..7].to_vec());
    assert_eq!(view.past, occs[2..5].to_vec());
}

#[test]
fn partition_window_with_small_sets() {
    let occs = weekly_occurrences(2);
    let now = occs[1].scheduled_end() + Duration::days(1);

    let view = partition_window(&occs, now, 5, 5);

    assert!(view.future.is_empty());
    assert_eq!(view.past, occs);
}

#[test]
fn page_slices_preserve_order() {
    let items: Vec<u32> = (0..10).collect();
    assert_eq!(page(&items, 0, 3), &[0u32, 1, 2]);
    assert_eq!(page(&items, 8, 5), &[8u32, 9]);
    assert!(page(&items, 20, 5).is_empty());
}

//! Property-based tests for the scheduling core using proptest.
//!
//! These verify invariants that should hold for *any* valid input, not just the
//! specific examples in the other test files.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use proptest::prelude::*;
use session_engine::{
    check_bookable, enumerate_starts, expand, is_bookable, AvailabilityWindow, BusyBlock,
    Frequency, MaxOccurrences, RecurrenceRule, Rejection, SlotRequest, TimeRange,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap()
}

/// A range on 2025-06-02 expressed as (start minute, length) within the day.
fn arb_range() -> impl Strategy<Value = TimeRange> {
    (0i64..1380, 1i64..=180).prop_map(|(start, len)| {
        let s = base() + Duration::minutes(start);
        TimeRange::new(s, s + Duration::minutes(len)).unwrap()
    })
}

fn arb_windows() -> impl Strategy<Value = Vec<AvailabilityWindow>> {
    prop::collection::vec(arb_range().prop_map(AvailabilityWindow::from), 0..4)
}

fn arb_busy() -> impl Strategy<Value = Vec<BusyBlock>> {
    prop::collection::vec(arb_range().prop_map(BusyBlock::from), 0..6)
}

fn arb_rule() -> impl Strategy<Value = RecurrenceRule> {
    (
        prop_oneof![Just(Frequency::None), Just(Frequency::Daily), Just(Frequency::Weekly)],
        prop::collection::btree_set(0u8..7, 1..4),
        0u32..24,
        15u32..=120,
        (2025i32..=2026, 1u32..=12, 1u32..=28),
        prop::option::of(0i64..120),
    )
        .prop_map(|(frequency, days, hour, duration, (y, m, d), span)| {
            let starts_on = NaiveDate::from_ymd_opt(y, m, d).unwrap();
            RecurrenceRule {
                frequency,
                days_of_week: days,
                start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
                duration_minutes: duration,
                starts_on,
                ends_on: span.map(|s| starts_on + Duration::days(s)),
                timezone: "UTC".to_string(),
            }
        })
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: overlap is symmetric and touching ranges never overlap
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn overlap_is_symmetric(a in arb_range(), b in arb_range()) {
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }

    #[test]
    fn back_to_back_never_overlaps(a in arb_range(), len in 1i64..240) {
        let b = TimeRange::new(a.end(), a.end() + Duration::minutes(len)).unwrap();
        prop_assert!(!a.overlaps(&b));
        prop_assert!(!b.overlaps(&a));
    }
}

// ---------------------------------------------------------------------------
// Property 2: containment is necessary, conflicts are always caught
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn uncontained_is_outside_availability(
        proposed in arb_range(),
        windows in arb_windows(),
        busy in arb_busy(),
    ) {
        let contained = windows.iter().any(|w| w.range().contains(&proposed));
        if !contained {
            prop_assert_eq!(
                check_bookable(&proposed, &windows, &busy),
                Err(Rejection::OutsideAvailability)
            );
        }
    }

    #[test]
    fn overlapping_busy_is_never_bookable(
        proposed in arb_range(),
        block in arb_range(),
    ) {
        let windows = vec![AvailabilityWindow::new(base(), base() + Duration::days(1)).unwrap()];
        let busy = vec![BusyBlock::from(block)];
        if proposed.overlaps(&block) {
            prop_assert_eq!(
                check_bookable(&proposed, &windows, &busy),
                Err(Rejection::ConflictsWithExisting)
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: every enumerated start is bookable, ascending and unique
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn enumerated_starts_are_sound(
        windows in arb_windows(),
        busy in arb_busy(),
        duration in 5u32..=120,
        granularity in prop_oneof![Just(5u32), Just(10), Just(15), Just(30)],
    ) {
        let request = SlotRequest::new(base().date_naive(), duration).with_granularity(granularity);
        let starts: Vec<_> = enumerate_starts(&request, &windows, &busy).collect();

        for t in &starts {
            let proposed = TimeRange::starting_at(*t, duration).unwrap();
            prop_assert!(is_bookable(&proposed, &windows, &busy));
        }
        for pair in starts.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 4: expansion is deterministic, ordered, bounded and prefix-stable
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn expansion_is_idempotent_and_sorted(rule in arb_rule(), cap in 1u32..=60) {
        let cap = MaxOccurrences::new(cap);
        let a = expand(&rule, cap).unwrap();
        let b = expand(&rule, cap).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert!(a.len() <= usize::from(cap.get()));
        for pair in a.windows(2) {
            prop_assert!(pair[0].start() < pair[1].start());
        }
        for r in &a {
            prop_assert!(r.start().date_naive() >= rule.starts_on);
            if let Some(ends_on) = rule.ends_on {
                prop_assert!(r.start().date_naive() <= ends_on);
            }
        }
    }

    #[test]
    fn weekly_days_are_respected(rule in arb_rule()) {
        let rule = RecurrenceRule { frequency: Frequency::Weekly, ..rule };
        let allowed: BTreeSet<u8> = rule.days_of_week.clone();
        for r in expand(&rule, MaxOccurrences::new(40)).unwrap() {
            let day = r.start().weekday().num_days_from_monday() as u8;
            prop_assert!(allowed.contains(&day));
        }
    }

    #[test]
    fn extending_ends_on_preserves_prefix(rule in arb_rule(), extra in 1i64..60) {
        let mut short_rule = rule.clone();
        short_rule.ends_on = Some(rule.starts_on + Duration::days(14));
        let mut long_rule = short_rule.clone();
        long_rule.ends_on = short_rule.ends_on.map(|e| e + Duration::days(extra));

        let cap = MaxOccurrences::default();
        let short = expand(&short_rule, cap).unwrap();
        let long = expand(&long_rule, cap).unwrap();

        prop_assert!(long.len() >= short.len());
        prop_assert_eq!(&long[..short.len()], &short[..]);
    }
}

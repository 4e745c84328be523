//! Detect overlapping intervals between two schedules.
//!
//! Performs pairwise comparison between two lists to find time overlaps.
//! Adjacent ranges (where one ends exactly when another starts) are NOT conflicts.

use serde::Serialize;

use crate::range::TimeRange;

/// A detected conflict between two ranges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    pub a: TimeRange,
    pub b: TimeRange,
    pub overlap_minutes: i64,
}

/// Find all pairwise conflicts between two lists.
///
/// Accepts anything that exposes a [`TimeRange`], so proposals can be checked
/// against busy blocks, occurrences, or plain ranges alike. Results are in
/// `a`-major order.
pub fn find_conflicts<A, B>(a: &[A], b: &[B]) -> Vec<Conflict>
where
    A: AsRef<TimeRange>,
    B: AsRef<TimeRange>,
{
    let mut conflicts = Vec::new();

    for left in a {
        let left = left.as_ref();
        for right in b {
            let right = right.as_ref();
            if let Some(shared) = left.intersection(right) {
                conflicts.push(Conflict {
                    a: *left,
                    b: *right,
                    overlap_minutes: shared.duration_minutes(),
                });
            }
        }
    }

    conflicts
}

/// `true` if `range` overlaps any entry of `others`.
pub fn overlaps_any<T: AsRef<TimeRange>>(range: &TimeRange, others: &[T]) -> bool {
    others.iter().any(|other| range.overlaps(other.as_ref()))
}

//! Write-side commitment of bookings and occurrences.
//!
//! [`BookingLedger`] turns an accepted proposal into a [`BusyBlock`]. The
//! bookability check is repeated against the committed set while that tutor's
//! lock is held, and the insert happens under the same lock, so two
//! overlapping confirmations for one tutor can never both succeed. Different
//! tutors do not contend.
//!
//! [`OccurrenceStore`] keeps materialized occurrences keyed by
//! `(rule_id, scheduled_start)` and inserts only absent keys, so concurrent
//! expansions of the same rule are idempotent.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::availability::{self, AvailabilityWindow, BusyBlock, Rejection};
use crate::error::Result;
use crate::expander::{self, MaxOccurrences, RecurrenceRule};
use crate::occurrence::{Occurrence, OccurrenceKey};
use crate::range::TimeRange;

type TutorBlocks = Arc<Mutex<Vec<BusyBlock>>>;

/// Committed busy blocks per tutor.
///
/// A tutor's entry is dropped once a cancellation leaves it empty, so the map
/// only holds tutors with live commitments.
#[derive(Debug, Default)]
pub struct BookingLedger {
    tutors: DashMap<String, TutorBlocks>,
}

impl BookingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn blocks_for(&self, tutor_id: &str) -> TutorBlocks {
        Arc::clone(&self.tutors.entry(tutor_id.to_string()).or_default())
    }

    /// Snapshot of a tutor's committed blocks, ascending.
    pub fn busy_blocks(&self, tutor_id: &str) -> Vec<BusyBlock> {
        let mut snapshot = self
            .tutors
            .get(tutor_id)
            .map(|blocks| blocks.lock().clone())
            .unwrap_or_default();
        snapshot.sort_by_key(|b| *b.range());
        snapshot
    }

    /// Seed a tutor's committed set from the external store.
    pub fn load(&self, tutor_id: &str, blocks: impl IntoIterator<Item = BusyBlock>) {
        let slot = self.blocks_for(tutor_id);
        let mut guard = slot.lock();
        guard.extend(blocks);
        debug!(tutor_id, committed = guard.len(), "loaded busy blocks");
    }

    /// Atomically re-check and commit a booking.
    ///
    /// A time conflict is terminal: the caller should surface it, not retry.
    pub fn confirm(
        &self,
        tutor_id: &str,
        proposed: TimeRange,
        windows: &[AvailabilityWindow],
    ) -> std::result::Result<BusyBlock, Rejection> {
        let slot = self.blocks_for(tutor_id);
        let mut committed = slot.lock();

        if let Err(rejection) = availability::check_bookable(&proposed, windows, &committed) {
            warn!(
                tutor_id,
                start = %proposed.start(),
                end = %proposed.end(),
                reason = rejection.code(),
                "booking rejected"
            );
            drop(committed);
            drop(slot);
            self.release_if_empty(tutor_id);
            return Err(rejection);
        }

        let block = BusyBlock::from(proposed);
        committed.push(block);
        info!(
            tutor_id,
            start = %proposed.start(),
            end = %proposed.end(),
            "booking confirmed"
        );
        Ok(block)
    }

    /// Release a committed block. Returns `false` if nothing matched.
    pub fn cancel(&self, tutor_id: &str, range: &TimeRange) -> bool {
        let Some(slot) = self.tutors.get(tutor_id).map(|blocks| Arc::clone(&blocks)) else {
            return false;
        };

        let removed = {
            let mut committed = slot.lock();
            let before = committed.len();
            committed.retain(|b| b.range() != range);
            committed.len() != before
        };
        drop(slot);

        if removed {
            info!(tutor_id, start = %range.start(), end = %range.end(), "booking cancelled");
        }
        self.release_if_empty(tutor_id);
        removed
    }

    /// Number of tutors with committed blocks, plus any with a confirmation in
    /// flight.
    pub fn tutor_count(&self) -> usize {
        self.tutors.len()
    }

    /// Drop a tutor's entry once nothing is committed. Callers must not hold a
    /// clone of the entry.
    fn release_if_empty(&self, tutor_id: &str) {
        // The shard lock blocks new clones, so a count of one means no other
        // thread is between lookup and insert for this tutor.
        self.tutors.remove_if(tutor_id, |_, blocks| {
            Arc::strong_count(blocks) == 1 && blocks.lock().is_empty()
        });
    }
}

/// Materialized occurrences keyed by `(rule_id, scheduled_start)`.
#[derive(Debug, Default)]
pub struct OccurrenceStore {
    occurrences: Mutex<BTreeMap<OccurrenceKey, Occurrence>>,
}

impl OccurrenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert occurrences whose key is absent. Returns how many were added.
    pub fn upsert_missing(&self, incoming: impl IntoIterator<Item = Occurrence>) -> usize {
        let mut stored = self.occurrences.lock();
        let mut added = 0;
        for occ in incoming {
            if let std::collections::btree_map::Entry::Vacant(slot) = stored.entry(occ.key()) {
                slot.insert(occ);
                added += 1;
            }
        }
        added
    }

    /// Expand `rule` and store any occurrences not yet present.
    pub fn expand_rule(
        &self,
        rule_id: &str,
        rule: &RecurrenceRule,
        cap: MaxOccurrences,
    ) -> Result<usize> {
        let ranges = expander::expand(rule, cap)?;
        let added =
            self.upsert_missing(ranges.into_iter().map(|r| Occurrence::upcoming(rule_id, r)));
        info!(rule_id, added, "materialized occurrences");
        Ok(added)
    }

    /// Occurrences of one rule, ascending by start.
    pub fn occurrences(&self, rule_id: &str) -> Vec<Occurrence> {
        self.occurrences.lock()
            .values()
            .filter(|occ| occ.rule_id == rule_id)
            .cloned()
            .collect()
    }

    /// Cancel a single occurrence; siblings and the rule are untouched.
    ///
    /// Returns `Ok(false)` when no occurrence has that key.
    pub fn cancel(&self, key: &OccurrenceKey, now: DateTime<Utc>) -> Result<bool> {
        let mut stored = self.occurrences.lock();
        match stored.get_mut(key) {
            Some(occ) => {
                occ.cancel(now)?;
                info!(occurrence = %key, "occurrence cancelled");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove every occurrence of a rule, e.g. when the rule is deleted.
    pub fn remove_rule(&self, rule_id: &str) -> usize {
        let mut stored = self.occurrences.lock();
        let before = stored.len();
        stored.retain(|key, _| key.rule_id != rule_id);
        before - stored.len()
    }
}

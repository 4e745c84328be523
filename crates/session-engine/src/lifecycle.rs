//! Real-time join gating for scheduled occurrences.
//!
//! The join window opens `pre_roll_minutes` before the scheduled start and
//! closes `grace_minutes` after the scheduled end; both bounds are inclusive.
//! `now` is always supplied by the caller and nothing is cached, so the result
//! must be recomputed whenever the clock moves.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::occurrence::Occurrence;

pub const DEFAULT_PRE_ROLL_MINUTES: u32 = 15;
pub const DEFAULT_GRACE_MINUTES: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinPolicy {
    pub pre_roll_minutes: u32,
    pub grace_minutes: u32,
}

impl Default for JoinPolicy {
    fn default() -> Self {
        Self {
            pre_roll_minutes: DEFAULT_PRE_ROLL_MINUTES,
            grace_minutes: DEFAULT_GRACE_MINUTES,
        }
    }
}

impl JoinPolicy {
    fn opens_at(&self, occurrence: &Occurrence) -> DateTime<Utc> {
        occurrence.scheduled_start() - Duration::minutes(i64::from(self.pre_roll_minutes))
    }

    fn closes_at(&self, occurrence: &Occurrence) -> DateTime<Utc> {
        occurrence.scheduled_end() + Duration::minutes(i64::from(self.grace_minutes))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    TooEarly,
    Live,
    Ended,
}

/// Where `now` sits relative to the occurrence's join window.
///
/// Ignores cancellation; see [`can_join`].
pub fn classify(occurrence: &Occurrence, now: DateTime<Utc>, policy: &JoinPolicy) -> Phase {
    if now < policy.opens_at(occurrence) {
        Phase::TooEarly
    } else if now > policy.closes_at(occurrence) {
        Phase::Ended
    } else {
        Phase::Live
    }
}

/// A join is permitted only while `Live` and not cancelled.
pub fn can_join(occurrence: &Occurrence, now: DateTime<Utc>, policy: &JoinPolicy) -> bool {
    !occurrence.is_cancelled() && classify(occurrence, now, policy) == Phase::Live
}

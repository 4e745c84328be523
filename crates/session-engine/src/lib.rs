//! # session-engine
//!
//! Time-window scheduling for tutoring sessions: when a tutor is bookable,
//! which start times to offer, how recurring group classes expand into
//! concrete occurrences, and when a participant may join one.
//!
//! Every read-side operation is a pure function over plain snapshots, with
//! `now` always passed in. Persistence and transport belong to the caller; the
//! one write-side concern, committing a booking without double-booking, lives
//! in [`ledger`].
//!
//! ## Modules
//!
//! - [`range`] — half-open `TimeRange` with overlap/containment predicates
//! - [`conflict`] — pairwise overlap detection
//! - [`availability`] — windows, busy blocks, `is_bookable` with a reason
//! - [`freebusy`] — open gaps inside availability windows
//! - [`planner`] — quantized start enumeration and candidate slot grids
//! - [`expander`] — recurrence rule → ordered occurrence ranges
//! - [`occurrence`] — materialized occurrences and cancellation
//! - [`lifecycle`] — `TOO_EARLY` / `LIVE` / `ENDED` and `can_join`
//! - [`merger`] — unified timeline, past/future partition, paging
//! - [`ledger`] — atomic booking confirmation and idempotent occurrence upsert
//! - [`config`] — engine tunables
//! - [`error`] — error taxonomy

pub mod availability;
pub mod config;
pub mod conflict;
pub mod error;
pub mod expander;
pub mod freebusy;
pub mod ledger;
pub mod lifecycle;
pub mod merger;
pub mod occurrence;
pub mod planner;
pub mod range;

pub use availability::{check_bookable, is_bookable, AvailabilityWindow, BusyBlock, Rejection};
pub use config::EngineConfig;
pub use conflict::find_conflicts;
pub use error::ScheduleError;
pub use expander::{expand, materialize, Frequency, MaxOccurrences, RecurrenceRule};
pub use ledger::{BookingLedger, OccurrenceStore};
pub use lifecycle::{can_join, classify, JoinPolicy, Phase};
pub use merger::{merge, partition, partition_window, Partitioned, TimelineEntry};
pub use occurrence::{Occurrence, OccurrenceKey, OccurrenceStatus};
pub use planner::{candidate_slots, enumerate_starts, CandidateSlot, SlotRequest, SlotStatus};
pub use range::TimeRange;

//! Recurrence expansion -- converts a session rule into concrete time ranges.
//!
//! Rules are rendered as RFC 5545 text and expanded with the `rrule` crate, so
//! the session keeps its local wall-clock start across DST changes in the
//! rule's timezone (`chrono-tz`).
//!
//! Expansion is always bounded. With no `ends_on`, at most
//! [`MaxOccurrences`] ranges are produced and the rest are silently dropped;
//! callers that want a longer horizon re-expand later and rely on
//! [`materialize`] to add only the new keys.

use std::collections::{BTreeSet, HashSet};

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScheduleError};
use crate::occurrence::{Occurrence, OccurrenceKey};
use crate::range::TimeRange;

/// RFC 5545 day codes, indexed Monday = 0 through Sunday = 6.
const DAY_CODES: [&str; 7] = ["MO", "TU", "WE", "TH", "FR", "SA", "SU"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// A single session.
    #[default]
    None,
    Daily,
    /// Every listed weekday.
    Weekly,
}

/// A tutor-owned definition of a recurring group session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    /// Weekly only. `0` is Monday, `6` is Sunday.
    #[serde(default)]
    pub days_of_week: BTreeSet<u8>,
    /// Local wall-clock start in `timezone`.
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
    pub starts_on: NaiveDate,
    /// Inclusive last date, if any.
    #[serde(default)]
    pub ends_on: Option<NaiveDate>,
    /// IANA timezone name.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl RecurrenceRule {
    /// Check the rule's invariants, returning its parsed timezone.
    pub fn validate(&self) -> Result<Tz> {
        if self.duration_minutes == 0 {
            return Err(ScheduleError::InvalidRule(
                "duration_minutes must be positive".to_string(),
            ));
        }
        if self.frequency == Frequency::Weekly {
            if self.days_of_week.is_empty() {
                return Err(ScheduleError::InvalidRule(
                    "weekly rule needs at least one day of week".to_string(),
                ));
            }
            if let Some(day) = self.days_of_week.iter().find(|d| **d > 6) {
                return Err(ScheduleError::InvalidRule(format!(
                    "day of week {} is out of range 0..=6",
                    day
                )));
            }
        }
        if let Some(ends_on) = self.ends_on {
            if ends_on < self.starts_on {
                return Err(ScheduleError::InvalidRule(format!(
                    "ends_on {} is before starts_on {}",
                    ends_on, self.starts_on
                )));
            }
        }
        self.timezone.parse::<Tz>().map_err(|_| {
            ScheduleError::InvalidRule(format!("unknown timezone: {}", self.timezone))
        })
    }

    /// First date on or after `starts_on` that the pattern selects.
    fn first_date(&self) -> NaiveDate {
        match self.frequency {
            Frequency::None | Frequency::Daily => self.starts_on,
            Frequency::Weekly => self
                .starts_on
                .iter_days()
                .take(7)
                .find(|d| {
                    let index = d.weekday().num_days_from_monday() as u8;
                    self.days_of_week.contains(&index)
                })
                .unwrap_or(self.starts_on),
        }
    }

    /// Where the rendered rule starts, and how many extra leading instances
    /// fall before `first` and must be dropped.
    ///
    /// DTSTART has to exist in local time. When `first` at `start_time` falls
    /// in a DST gap, the rule is anchored one period earlier so the gap day is
    /// produced as a regular instance, shifted forward the same way a gap in
    /// the middle of a series is.
    fn anchor(&self, tz: Tz, first: NaiveDate) -> (NaiveDate, u16) {
        if tz.from_local_datetime(&first.and_time(self.start_time)).earliest().is_some() {
            return (first, 0);
        }
        match self.frequency {
            Frequency::None | Frequency::Daily => (first - Duration::days(1), 1),
            // One instance per selected weekday precedes `first`.
            Frequency::Weekly => (first - Duration::days(7), self.days_of_week.len() as u16),
        }
    }

    fn rrule_body(&self, count: u16) -> String {
        match self.frequency {
            Frequency::None | Frequency::Daily => format!("FREQ=DAILY;COUNT={}", count),
            Frequency::Weekly => {
                let days: Vec<&str> = self
                    .days_of_week
                    .iter()
                    .map(|d| DAY_CODES[usize::from(*d)])
                    .collect();
                format!("FREQ=WEEKLY;BYDAY={};COUNT={}", days.join(","), count)
            }
        }
    }
}

/// Upper bound on occurrences produced by one expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MaxOccurrences(u16);

impl MaxOccurrences {
    /// One year of a weekly class.
    pub const DEFAULT: u16 = 52;
    /// Requests above this are clamped.
    pub const CEILING: u16 = 500;

    pub fn new(count: u32) -> Self {
        Self(count.min(u32::from(Self::CEILING)) as u16)
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl Default for MaxOccurrences {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Expand a rule into ascending, non-duplicated time ranges.
///
/// Identical inputs always give identical output. Nothing is generated before
/// `starts_on` or after `ends_on`. `Frequency::None` yields one range unless
/// `cap` is zero.
///
/// # Errors
/// Returns [`ScheduleError::InvalidRule`] when the rule breaks an invariant
/// (see [`RecurrenceRule::validate`]) or the rendered RRULE is rejected.
pub fn expand(rule: &RecurrenceRule, cap: MaxOccurrences) -> Result<Vec<TimeRange>> {
    let tz = rule.validate()?;

    // Short-circuit: caller explicitly wants zero instances.
    if cap.get() == 0 {
        return Ok(Vec::new());
    }

    let first = rule.first_date();
    if rule.ends_on.is_some_and(|ends_on| first > ends_on) {
        return Ok(Vec::new());
    }

    let count = match rule.frequency {
        Frequency::None => 1,
        Frequency::Daily | Frequency::Weekly => cap.get(),
    };
    let (dtstart, lead) = rule.anchor(tz, first);

    let rrule_text = format!(
        "DTSTART;TZID={}:{}\nRRULE:{}",
        tz.name(),
        dtstart.and_time(rule.start_time).format("%Y%m%dT%H%M%S"),
        rule.rrule_body(count + lead)
    );

    let rrule_set: RRuleSet = rrule_text
        .parse()
        .map_err(|e| ScheduleError::InvalidRule(format!("{}", e)))?;

    let duration = Duration::minutes(i64::from(rule.duration_minutes));
    let local_date = |start: &chrono::DateTime<Utc>| start.with_timezone(&tz).date_naive();

    let ranges: Vec<TimeRange> = rrule_set
        .all(count + lead)
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc))
        // Drops the instances produced before `first` by a shifted anchor.
        .skip_while(|start| local_date(start) < rule.starts_on)
        .take(usize::from(count))
        .take_while(|start| rule.ends_on.is_none_or(|ends_on| local_date(start) <= ends_on))
        .map(|start| TimeRange::from_ordered(start, start + duration))
        .collect();

    debug!(
        frequency = ?rule.frequency,
        starts_on = %rule.starts_on,
        cap = cap.get(),
        produced = ranges.len(),
        "expanded recurrence rule"
    );

    Ok(ranges)
}

/// Expand `rule` and return only occurrences not already in `existing`.
///
/// Keys are `(rule_id, scheduled_start)`, so running this twice, or after
/// extending `ends_on`, never duplicates an occurrence. New occurrences are
/// `upcoming`.
pub fn materialize(
    rule_id: &str,
    rule: &RecurrenceRule,
    cap: MaxOccurrences,
    existing: &[Occurrence],
) -> Result<Vec<Occurrence>> {
    let known: HashSet<OccurrenceKey> = existing.iter().map(Occurrence::key).collect();

    let fresh = expand(rule, cap)?
        .into_iter()
        .map(|range| Occurrence::upcoming(rule_id, range))
        .filter(|occ| !known.contains(&occ.key()))
        .collect();

    Ok(fresh)
}

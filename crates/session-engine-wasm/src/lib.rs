//! WASM bindings for session-engine.
//!
//! Exposes bookability checks, slot planning, recurrence expansion, join-window
//! gating and timeline assembly to JavaScript via `wasm-bindgen`. All complex
//! types cross the boundary as JSON strings using the engine's own serde
//! shapes; instants are RFC 3339 strings.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p session-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target nodejs --out-dir packages/session-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/session_engine_wasm.wasm
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use session_engine::availability::{AvailabilityWindow, BusyBlock, Rejection};
use session_engine::planner::{CandidateSlot, SlotRequest};
use session_engine::{JoinPolicy, MaxOccurrences, Occurrence, Phase, RecurrenceRule, TimeRange};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct BookableDto {
    bookable: bool,
    reason: Option<Rejection>,
}

/// Slot request as sent from JavaScript. Omitted fields take engine defaults.
#[derive(Deserialize)]
struct SlotRequestInput {
    date: NaiveDate,
    duration_minutes: u32,
    #[serde(default)]
    granularity_minutes: Option<u32>,
    #[serde(default)]
    timezone: Option<String>,
}

impl SlotRequestInput {
    fn into_request(self) -> Result<SlotRequest, JsValue> {
        let mut request = SlotRequest::new(self.date, self.duration_minutes);
        if let Some(minutes) = self.granularity_minutes {
            request = request.with_granularity(minutes);
        }
        if let Some(name) = self.timezone {
            let tz: Tz = name
                .parse()
                .map_err(|_| JsValue::from_str(&format!("Unknown timezone '{}'", name)))?;
            request = request.with_timezone(tz);
        }
        Ok(request)
    }
}

#[derive(Serialize)]
struct OccurrenceDto<'a> {
    id: String,
    #[serde(flatten)]
    occurrence: &'a Occurrence,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse an ISO 8601 datetime string into `DateTime<Utc>`.
///
/// Accepts RFC 3339 with an offset, or a naive datetime interpreted as UTC.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, JsValue> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| JsValue::from_str(&format!("Invalid datetime '{}': {}", s, e)))
}

fn parse_json<T: DeserializeOwned>(json: &str, what: &str) -> Result<T, JsValue> {
    serde_json::from_str(json)
        .map_err(|e| JsValue::from_str(&format!("Invalid {} JSON: {}", what, e)))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn join_policy(pre_roll_minutes: Option<u32>, grace_minutes: Option<u32>) -> JoinPolicy {
    let defaults = JoinPolicy::default();
    JoinPolicy {
        pre_roll_minutes: pre_roll_minutes.unwrap_or(defaults.pre_roll_minutes),
        grace_minutes: grace_minutes.unwrap_or(defaults.grace_minutes),
    }
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Check whether a proposed `{start, end}` range is bookable.
///
/// `windows_json` and `busy_json` are JSON arrays of `{start, end}` objects.
/// Returns `{bookable, reason}` where `reason` is `OUTSIDE_AVAILABILITY`,
/// `CONFLICTS_WITH_EXISTING`, or `null`.
#[wasm_bindgen(js_name = "isBookable")]
pub fn is_bookable(
    proposed_json: &str,
    windows_json: &str,
    busy_json: &str,
) -> Result<String, JsValue> {
    let proposed: TimeRange = parse_json(proposed_json, "range")?;
    let windows: Vec<AvailabilityWindow> = parse_json(windows_json, "windows")?;
    let busy: Vec<BusyBlock> = parse_json(busy_json, "busy")?;

    let reason = session_engine::check_bookable(&proposed, &windows, &busy).err();
    to_json(&BookableDto {
        bookable: reason.is_none(),
        reason,
    })
}

/// Bookable start instants for `{date, duration_minutes, granularity_minutes?, timezone?}`.
///
/// Returns a JSON array of RFC 3339 strings, ascending and duplicate-free.
#[wasm_bindgen(js_name = "enumerateStarts")]
pub fn enumerate_starts(
    request_json: &str,
    windows_json: &str,
    busy_json: &str,
) -> Result<String, JsValue> {
    let request = parse_json::<SlotRequestInput>(request_json, "request")?.into_request()?;
    let windows: Vec<AvailabilityWindow> = parse_json(windows_json, "windows")?;
    let busy: Vec<BusyBlock> = parse_json(busy_json, "busy")?;

    let starts: Vec<String> = session_engine::enumerate_starts(&request, &windows, &busy)
        .map(|t| t.to_rfc3339())
        .collect();
    to_json(&starts)
}

/// Every candidate start on the requested date with its display status.
#[wasm_bindgen(js_name = "candidateSlots")]
pub fn candidate_slots(
    request_json: &str,
    windows_json: &str,
    busy_json: &str,
) -> Result<String, JsValue> {
    let request = parse_json::<SlotRequestInput>(request_json, "request")?.into_request()?;
    let windows: Vec<AvailabilityWindow> = parse_json(windows_json, "windows")?;
    let busy: Vec<BusyBlock> = parse_json(busy_json, "busy")?;

    to_json(&session_engine::candidate_slots(&request, &windows, &busy))
}

/// Expand a recurrence rule into occurrences keyed by `rule_id`.
///
/// `max_count` defaults to 52 and is clamped to 500.
#[wasm_bindgen(js_name = "expandRule")]
pub fn expand_rule(
    rule_json: &str,
    rule_id: &str,
    max_count: Option<u32>,
) -> Result<String, JsValue> {
    let rule: RecurrenceRule = parse_json(rule_json, "rule")?;
    let cap = max_count.map(MaxOccurrences::new).unwrap_or_default();

    let occurrences = session_engine::materialize(rule_id, &rule, cap, &[])
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let dtos: Vec<OccurrenceDto> = occurrences
        .iter()
        .map(|occurrence| OccurrenceDto {
            id: occurrence.id(),
            occurrence,
        })
        .collect();
    to_json(&dtos)
}

/// `TOO_EARLY`, `LIVE`, or `ENDED` for one occurrence at `now`, as a plain
/// string (not JSON-quoted).
#[wasm_bindgen(js_name = "classifyOccurrence")]
pub fn classify_occurrence(
    occurrence_json: &str,
    now: &str,
    pre_roll_minutes: Option<u32>,
    grace_minutes: Option<u32>,
) -> Result<String, JsValue> {
    let occurrence: Occurrence = parse_json(occurrence_json, "occurrence")?;
    let now = parse_datetime(now)?;
    let phase = session_engine::classify(
        &occurrence,
        now,
        &join_policy(pre_roll_minutes, grace_minutes),
    );
    Ok(match phase {
        Phase::TooEarly => "TOO_EARLY",
        Phase::Live => "LIVE",
        Phase::Ended => "ENDED",
    }
    .to_string())
}

/// Whether a participant may join the occurrence at `now`.
#[wasm_bindgen(js_name = "canJoin")]
pub fn can_join(
    occurrence_json: &str,
    now: &str,
    pre_roll_minutes: Option<u32>,
    grace_minutes: Option<u32>,
) -> Result<bool, JsValue> {
    let occurrence: Occurrence = parse_json(occurrence_json, "occurrence")?;
    let now = parse_datetime(now)?;
    Ok(session_engine::can_join(
        &occurrence,
        now,
        &join_policy(pre_roll_minutes, grace_minutes),
    ))
}

/// Split occurrences into `{future, past}` around `now`.
///
/// When `next` or `last` is given, only that many nearest occurrences are kept
/// on the respective side.
#[wasm_bindgen(js_name = "partitionOccurrences")]
pub fn partition_occurrences(
    occurrences_json: &str,
    now: &str,
    next: Option<u32>,
    last: Option<u32>,
) -> Result<String, JsValue> {
    let occurrences: Vec<Occurrence> = parse_json(occurrences_json, "occurrences")?;
    let now = parse_datetime(now)?;

    let split = match (next, last) {
        (None, None) => session_engine::partition(&occurrences, now),
        (next, last) => session_engine::partition_window(
            &occurrences,
            now,
            next.map_or(usize::MAX, |n| n as usize),
            last.map_or(usize::MAX, |m| m as usize),
        ),
    };
    to_json(&split)
}

/// Open gaps inside availability windows, as `{start, end, duration_minutes}`.
#[wasm_bindgen(js_name = "findOpenIntervals")]
pub fn find_open_intervals(windows_json: &str, busy_json: &str) -> Result<String, JsValue> {
    let windows: Vec<AvailabilityWindow> = parse_json(windows_json, "windows")?;
    let busy: Vec<BusyBlock> = parse_json(busy_json, "busy")?;

    to_json(&session_engine::freebusy::open_intervals(&windows, &busy))
}

/// Merge candidate slots and busy blocks into one annotated timeline.
#[wasm_bindgen(js_name = "mergeTimeline")]
pub fn merge_timeline(slots_json: &str, busy_json: &str) -> Result<String, JsValue> {
    let slots: Vec<CandidateSlot> = parse_json(slots_json, "slots")?;
    let busy: Vec<BusyBlock> = parse_json(busy_json, "busy")?;

    to_json(&session_engine::merge(&slots, &busy))
}

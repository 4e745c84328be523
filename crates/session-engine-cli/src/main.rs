//! `sessions` CLI — run session-engine operations over JSON documents.
//!
//! ## Usage
//!
//! ```sh
//! # Is this range bookable?
//! sessions check -i proposal.json
//!
//! # Bookable 60-minute starts on a date, 15-minute steps
//! sessions slots -i day.json
//!
//! # Same date as a classified candidate grid, 30-minute steps, Berlin dates
//! sessions grid -i day.json --granularity 30 --timezone Europe/Berlin
//!
//! # Expand a recurring class into occurrences, at most 12
//! sessions expand -i rule.json --rule-id algebra-101 --cap 12
//!
//! # Join-window status of each occurrence (uses "now" from the input if given)
//! sessions classify -i occurrences.json
//!
//! # Next 5 / last 3 occurrences around now
//! sessions partition -i occurrences.json --next 5 --last 3
//! ```
//!
//! Input is read from `-i FILE` or stdin; JSON is written to `-o FILE` or
//! stdout. Logs go to stderr and are controlled by `RUST_LOG`.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use session_engine::availability::conflicts_with;
use session_engine::conflict::Conflict;
use session_engine::freebusy::{self, FreeSlot};
use session_engine::merger::{self, TimelineEntry};
use session_engine::{
    AvailabilityWindow, BusyBlock, CandidateSlot, EngineConfig, Occurrence, Phase, Rejection,
    TimeRange,
};

#[derive(Parser)]
#[command(
    name = "sessions",
    version,
    about = "Tutoring session scheduling: bookability, slots, recurrence, join windows"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON engine config file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Minutes between candidate start times
    #[arg(long, global = true)]
    granularity: Option<u32>,

    /// IANA timezone used to assign windows to dates
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// Minutes before start that joining opens
    #[arg(long, global = true)]
    pre_roll: Option<u32>,

    /// Minutes after end that joining stays open
    #[arg(long, global = true)]
    grace: Option<u32>,

    /// Maximum occurrences per expansion
    #[arg(long, global = true)]
    cap: Option<u32>,
}

#[derive(Args)]
struct Io {
    /// Input file (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<String>,
    /// Output file (writes to stdout if omitted)
    #[arg(short, long)]
    output: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a proposed range is bookable
    Check {
        #[command(flatten)]
        io: Io,
    },
    /// List bookable start times for a date and duration
    Slots {
        #[command(flatten)]
        io: Io,
    },
    /// Show every candidate start on a date with its status
    Grid {
        #[command(flatten)]
        io: Io,
    },
    /// Show open gaps inside availability windows
    Free {
        #[command(flatten)]
        io: Io,
        /// Only return the first gap at least this long
        #[arg(long)]
        min_minutes: Option<i64>,
    },
    /// Expand a recurrence rule into occurrences
    Expand {
        #[command(flatten)]
        io: Io,
        /// Identifier of the rule, used to key occurrences
        #[arg(long, default_value = "rule")]
        rule_id: String,
    },
    /// Classify occurrences against the join window
    Classify {
        #[command(flatten)]
        io: Io,
    },
    /// Merge candidate slots and busy blocks into one timeline
    Timeline {
        #[command(flatten)]
        io: Io,
        /// Entries to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Maximum entries to return
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Split occurrences into future and past
    Partition {
        #[command(flatten)]
        io: Io,
        /// Keep only the next N future occurrences
        #[arg(long)]
        next: Option<usize>,
        /// Keep only the last M past occurrences
        #[arg(long)]
        last: Option<usize>,
    },
}

// ---------------------------------------------------------------------------
// Input / output documents
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct CheckInput {
    proposed: TimeRange,
    #[serde(default)]
    windows: Vec<AvailabilityWindow>,
    #[serde(default)]
    busy: Vec<BusyBlock>,
}

#[derive(Serialize)]
struct CheckOutput {
    bookable: bool,
    reason: Option<Rejection>,
    conflicts: Vec<Conflict>,
}

#[derive(Deserialize)]
struct DayInput {
    date: NaiveDate,
    duration_minutes: u32,
    #[serde(default)]
    windows: Vec<AvailabilityWindow>,
    #[serde(default)]
    busy: Vec<BusyBlock>,
}

#[derive(Deserialize)]
struct FreeInput {
    #[serde(default)]
    windows: Vec<AvailabilityWindow>,
    #[serde(default)]
    busy: Vec<BusyBlock>,
}

#[derive(Deserialize)]
struct OccurrencesInput {
    occurrences: Vec<Occurrence>,
    /// Defaults to the current wall-clock time.
    #[serde(default)]
    now: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct TimelineInput {
    #[serde(default)]
    slots: Vec<CandidateSlot>,
    #[serde(default)]
    busy: Vec<BusyBlock>,
}

#[derive(Serialize)]
struct OccurrenceView<'a> {
    id: String,
    #[serde(flatten)]
    occurrence: &'a Occurrence,
}

impl<'a> From<&'a Occurrence> for OccurrenceView<'a> {
    fn from(occurrence: &'a Occurrence) -> Self {
        Self {
            id: occurrence.id(),
            occurrence,
        }
    }
}

#[derive(Serialize)]
struct ClassifyOutput {
    id: String,
    phase: Phase,
    can_join: bool,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    debug!(?config, "effective configuration");

    match cli.command {
        Commands::Check { io } => {
            let input: CheckInput = read_json(&io)?;
            let reason =
                session_engine::check_bookable(&input.proposed, &input.windows, &input.busy)
                    .err();
            let output = CheckOutput {
                bookable: reason.is_none(),
                reason,
                conflicts: conflicts_with(&input.proposed, &input.busy),
            };
            write_json(&io, &output)?;
        }
        Commands::Slots { io } => {
            let input: DayInput = read_json(&io)?;
            let request = config.slot_request(input.date, input.duration_minutes)?;
            let starts: Vec<String> =
                session_engine::enumerate_starts(&request, &input.windows, &input.busy)
                    .map(|t| t.to_rfc3339())
                    .collect();
            write_json(&io, &starts)?;
        }
        Commands::Grid { io } => {
            let input: DayInput = read_json(&io)?;
            let request = config.slot_request(input.date, input.duration_minutes)?;
            let slots = session_engine::candidate_slots(&request, &input.windows, &input.busy);
            write_json(&io, &slots)?;
        }
        Commands::Free { io, min_minutes } => {
            let input: FreeInput = read_json(&io)?;
            let open: Vec<FreeSlot> = match min_minutes {
                Some(min) => freebusy::find_first_open(&input.windows, &input.busy, min)
                    .into_iter()
                    .collect(),
                None => freebusy::open_intervals(&input.windows, &input.busy),
            };
            write_json(&io, &open)?;
        }
        Commands::Expand { io, rule_id } => {
            let rule: session_engine::RecurrenceRule = read_json(&io)?;
            let occurrences =
                session_engine::materialize(&rule_id, &rule, config.max_occurrences(), &[])
                    .context("Failed to expand recurrence rule")?;
            let views: Vec<OccurrenceView> = occurrences.iter().map(OccurrenceView::from).collect();
            write_json(&io, &views)?;
        }
        Commands::Classify { io } => {
            let input: OccurrencesInput = read_json(&io)?;
            let now = input.now.unwrap_or_else(Utc::now);
            let policy = config.join_policy();
            let output: Vec<ClassifyOutput> = input
                .occurrences
                .iter()
                .map(|occ| ClassifyOutput {
                    id: occ.id(),
                    phase: session_engine::classify(occ, now, &policy),
                    can_join: session_engine::can_join(occ, now, &policy),
                })
                .collect();
            write_json(&io, &output)?;
        }
        Commands::Timeline { io, offset, limit } => {
            let input: TimelineInput = read_json(&io)?;
            let timeline: Vec<TimelineEntry> = merger::merge(&input.slots, &input.busy);
            let view = merger::page(&timeline, offset, limit.unwrap_or(usize::MAX));
            write_json(&io, &view)?;
        }
        Commands::Partition { io, next, last } => {
            let input: OccurrencesInput = read_json(&io)?;
            let now = input.now.unwrap_or_else(Utc::now);
            let split = match (next, last) {
                (None, None) => merger::partition(&input.occurrences, now),
                (next, last) => merger::partition_window(
                    &input.occurrences,
                    now,
                    next.unwrap_or(usize::MAX),
                    last.unwrap_or(usize::MAX),
                ),
            };
            write_json(&io, &split)?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Config file first, then command-line overrides.
fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match cli.config.as_deref() {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            EngineConfig::from_json_str(&text)
                .with_context(|| format!("Invalid config file: {}", path))?
        }
        None => EngineConfig::default(),
    };

    if let Some(granularity) = cli.granularity {
        config.granularity_minutes = granularity;
    }
    if let Some(timezone) = &cli.timezone {
        config.timezone = timezone.clone();
    }
    if let Some(pre_roll) = cli.pre_roll {
        config.pre_roll_minutes = pre_roll;
    }
    if let Some(grace) = cli.grace {
        config.grace_minutes = grace;
    }
    if let Some(cap) = cli.cap {
        config.max_occurrences = cap;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn read_json<T: for<'de> Deserialize<'de>>(io: &Io) -> Result<T> {
    let text = read_input(io.input.as_deref())?;
    serde_json::from_str(&text).context("Failed to parse input JSON")
}

fn write_json<T: Serialize + ?Sized>(io: &Io, value: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    write_output(io.output.as_deref(), &json)
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}

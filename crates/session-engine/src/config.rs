//! Engine-wide tunables.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::expander::MaxOccurrences;
use crate::lifecycle::{JoinPolicy, DEFAULT_GRACE_MINUTES, DEFAULT_PRE_ROLL_MINUTES};
use crate::planner::{SlotRequest, DEFAULT_GRANULARITY_MINUTES};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Step between candidate start times.
    pub granularity_minutes: u32,
    /// How early a participant may join.
    pub pre_roll_minutes: u32,
    /// How long after the scheduled end joining stays open.
    pub grace_minutes: u32,
    /// Cap for a single expansion; clamped to [`MaxOccurrences::CEILING`].
    pub max_occurrences: u32,
    /// IANA zone used to assign windows to calendar dates.
    pub timezone: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            granularity_minutes: DEFAULT_GRANULARITY_MINUTES,
            pre_roll_minutes: DEFAULT_PRE_ROLL_MINUTES,
            grace_minutes: DEFAULT_GRACE_MINUTES,
            max_occurrences: u32::from(MaxOccurrences::DEFAULT),
            timezone: "UTC".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ScheduleError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.granularity_minutes == 0 {
            return Err(ScheduleError::InvalidConfig(
                "granularity_minutes must be positive".to_string(),
            ));
        }
        self.tz().map(|_| ())
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|_| {
            ScheduleError::InvalidConfig(format!("unknown timezone: {}", self.timezone))
        })
    }

    pub fn join_policy(&self) -> JoinPolicy {
        JoinPolicy {
            pre_roll_minutes: self.pre_roll_minutes,
            grace_minutes: self.grace_minutes,
        }
    }

    pub fn max_occurrences(&self) -> MaxOccurrences {
        MaxOccurrences::new(self.max_occurrences)
    }

    /// A slot request carrying this config's granularity and timezone.
    pub fn slot_request(&self, date: NaiveDate, duration_minutes: u32) -> Result<SlotRequest> {
        Ok(SlotRequest::new(date, duration_minutes)
            .with_granularity(self.granularity_minutes)
            .with_timezone(self.tz()?))
    }
}

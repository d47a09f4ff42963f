//! Scheduled job definitions.
//!
//! Defines the [`ScheduledJob`] type, the [`Schedule`] enum for timing and
//! the fixed set of [`JobKind`]s the bot runs.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

const DAY_SECS: i64 = 86_400;

/// How often a job should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schedule {
    /// Run every N seconds.
    Interval {
        /// Interval in seconds between runs.
        secs: u64,
    },
    /// Run once daily at a given local hour and minute.
    Daily {
        /// Hour of day (0-23, local).
        hour: u8,
        /// Minute of hour (0-59).
        min: u8,
    },
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interval { secs } => {
                if *secs >= 3600 && secs % 3600 == 0 {
                    write!(f, "every {} hours", secs / 3600)
                } else if *secs >= 60 {
                    write!(f, "every {} minutes", secs / 60)
                } else {
                    write!(f, "every {secs} seconds")
                }
            }
            Self::Daily { hour, min } => write!(f, "daily at {hour:02}:{min:02} local"),
        }
    }
}

/// The jobs the bot schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Remind users who have not started or not reported.
    GeneralSweep,
    /// Nudge users who reported today and still have items left.
    ProgressSweep,
    /// Clear daily marks and announce the new day.
    DailyReset,
    /// Ask users without both lists to post them.
    MorningNudge,
}

impl JobKind {
    /// Stable identifier used in logs.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::GeneralSweep => "general_sweep",
            Self::ProgressSweep => "progress_sweep",
            Self::DailyReset => "daily_reset",
            Self::MorningNudge => "morning_nudge",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// A job that runs on a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub kind: JobKind,
    /// When to run this job.
    pub schedule: Schedule,
    /// Unix epoch seconds of the last run, if any.
    pub last_run: Option<u64>,
    /// Whether the job is enabled.
    pub enabled: bool,
}

impl ScheduledJob {
    /// Create a new enabled job with the given schedule.
    pub fn new(kind: JobKind, schedule: Schedule) -> Self {
        Self {
            kind,
            schedule,
            last_run: None,
            enabled: true,
        }
    }

    /// Returns `true` if the job is enabled and due at `now`.
    ///
    /// `offset_secs` is the local UTC offset that daily slots are expressed
    /// in.
    #[must_use]
    pub fn is_due_at(&self, now: u64, offset_secs: i32) -> bool {
        if !self.enabled {
            return false;
        }

        match self.schedule {
            Schedule::Interval { secs } => match self.last_run {
                None => true,
                Some(last) => now.saturating_sub(last) >= secs,
            },
            Schedule::Daily { hour, min } => {
                let scheduled = daily_slot(now, offset_secs, hour, min);
                let now = i64::try_from(now).unwrap_or(i64::MAX);
                match self.last_run {
                    None => now >= scheduled,
                    Some(last) => {
                        i64::try_from(last).unwrap_or(i64::MAX) < scheduled && now >= scheduled
                    }
                }
            }
        }
    }

    /// Record that the job ran at `now`.
    pub fn mark_run_at(&mut self, now: u64) {
        self.last_run = Some(now);
    }
}

/// Epoch seconds of today's `hour:min` slot in local time.
fn daily_slot(now: u64, offset_secs: i32, hour: u8, min: u8) -> i64 {
    let local_now = i64::try_from(now).unwrap_or(i64::MAX) + i64::from(offset_secs);
    let local_day_start = local_now - local_now.rem_euclid(DAY_SECS);
    let slot = i64::from(hour) * 3600 + i64::from(min) * 60;
    local_day_start + slot - i64::from(offset_secs)
}

/// Returns current UTC seconds since epoch.
#[must_use]
pub fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

//! Configuration types for the bot.
//!
//! Values come from an optional TOML file (path in `TASKNAG_CONFIG`) and are
//! then overridden by environment variables, which is how the bot is usually
//! deployed.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "TASKNAG_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Chat transport settings.
    pub telegram: TelegramConfig,
    /// Forum topics that route group messages to a track.
    pub topics: TopicsConfig,
    /// Reminder timing.
    pub schedule: ScheduleConfig,
    /// Liveness probe.
    pub health: HealthConfig,
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot credential. Required at startup.
    pub bot_token: String,
    /// The single tracked group chat.
    pub group_id: i64,
    /// Bot API base URL (overridable for tests and proxies).
    pub api_base: String,
    /// Long-polling timeout for `getUpdates`, in seconds.
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            group_id: -1_003_401_230_283,
            api_base: "https://api.telegram.org".to_owned(),
            poll_timeout_secs: 30,
        }
    }
}

/// Forum thread identifiers inside the tracked group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicsConfig {
    /// Thread for IT task lists and reports.
    pub it: i64,
    /// Thread for sport plans and reports.
    pub sport: i64,
    /// Thread for monthly goals.
    pub monthly: i64,
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            it: 4,
            sport: 6,
            monthly: 130,
        }
    }
}

/// Reminder timing. All wall-clock values are local time at `utc_offset_hours`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Fixed offset from UTC used for "today" and for quiet hours.
    pub utc_offset_hours: i32,
    /// Reminders never go out before this local hour.
    pub start_hour: u8,
    /// Interval of the general reminder sweep.
    pub check_interval_secs: u64,
    /// Interval of the progress sweep. Defaults to 1.5x the general interval.
    pub progress_check_interval_secs: Option<u64>,
    /// Local hour of the daily reset.
    pub reset_hour: u8,
    /// Local minute of the daily reset.
    pub reset_min: u8,
    /// How often the scheduler checks for due jobs.
    pub tick_interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: 5,
            start_hour: 10,
            check_interval_secs: 3600,
            progress_check_interval_secs: None,
            reset_hour: 0,
            reset_min: 0,
            tick_interval_secs: 30,
        }
    }
}

impl ScheduleConfig {
    /// Effective progress sweep interval.
    #[must_use]
    pub fn progress_interval_secs(&self) -> u64 {
        self.progress_check_interval_secs
            .unwrap_or_else(|| self.check_interval_secs.saturating_mul(3) / 2)
    }

    /// The configured fixed offset, or UTC when the hour count is out of range.
    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours.saturating_mul(3600)).unwrap_or(Utc.fix())
    }

    /// Current local time at the configured offset.
    #[must_use]
    pub fn local_now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset())
    }
}

/// Liveness probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Whether to serve the probe at all.
    pub enabled: bool,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_owned(),
            port: 5000,
        }
    }
}

impl BotConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::BotError::Config(e.to_string()))
    }

    /// Load the config file named by `TASKNAG_CONFIG` (if any), then apply
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or a variable does not parse.
    pub fn from_env() -> crate::error::Result<Self> {
        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(&PathBuf::from(path))?,
            None => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BotError::Config`] naming the first variable whose
    /// value does not parse.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> crate::error::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("BOT_TOKEN") {
            self.telegram.bot_token = token.trim().to_owned();
        }
        if let Some(base) = lookup("TELEGRAM_API_BASE") {
            self.telegram.api_base = base.trim().trim_end_matches('/').to_owned();
        }
        override_parsed(&lookup, "GROUP_ID", &mut self.telegram.group_id)?;
        override_parsed(&lookup, "IT_TOPIC_ID", &mut self.topics.it)?;
        override_parsed(&lookup, "SPORT_TOPIC_ID", &mut self.topics.sport)?;
        override_parsed(&lookup, "MONTHLY_TOPIC_ID", &mut self.topics.monthly)?;
        override_parsed(&lookup, "UTC_OFFSET_HOURS", &mut self.schedule.utc_offset_hours)?;
        override_parsed(&lookup, "START_HOUR", &mut self.schedule.start_hour)?;
        override_parsed(
            &lookup,
            "CHECK_INTERVAL_SECS",
            &mut self.schedule.check_interval_secs,
        )?;
        if let Some(raw) = lookup("PROGRESS_CHECK_INTERVAL_SECS") {
            self.schedule.progress_check_interval_secs = Some(parse_var(
                "PROGRESS_CHECK_INTERVAL_SECS",
                &raw,
            )?);
        }
        override_parsed(&lookup, "PORT", &mut self.health.port)?;
        Ok(())
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, slot: &mut T) -> crate::error::Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(raw) = lookup(key) {
        *slot = parse_var(key, &raw)?;
    }
    Ok(())
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> crate::error::Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| crate::error::BotError::Config(format!("{key} has invalid value `{raw}`")))
}

//! Chat transport and the liveness probe.
//!
//! The transport is pluggable behind [`traits::ChannelAdapter`]; this module
//! owns config validation and keeps the adapter's receive loop alive.

pub mod health;
pub mod telegram;
pub mod traits;

use crate::channels::traits::{ChannelAdapter, ChannelInboundMessage};
use crate::config::BotConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// First pause before restarting a failed adapter.
pub const INITIAL_BACKOFF: Duration = Duration::from_secs(2);

/// Upper bound for the restart pause.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Largest accepted distance from UTC, in hours.
const MAX_UTC_OFFSET_HOURS: i32 = 14;

/// Configuration validation issue severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelValidationSeverity {
    Warning,
    Error,
}

/// Validation issue surfaced at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelValidationIssue {
    pub id: String,
    pub title: String,
    pub severity: ChannelValidationSeverity,
    pub summary: String,
}

impl ChannelValidationIssue {
    fn error(id: &str, title: &str, summary: String) -> Self {
        Self {
            id: id.to_owned(),
            title: title.to_owned(),
            severity: ChannelValidationSeverity::Error,
            summary,
        }
    }

    fn warning(id: &str, title: &str, summary: String) -> Self {
        Self {
            id: id.to_owned(),
            title: title.to_owned(),
            severity: ChannelValidationSeverity::Warning,
            summary,
        }
    }
}

/// Validate configuration without network calls.
#[must_use]
pub fn validate_config(config: &BotConfig) -> Vec<ChannelValidationIssue> {
    let mut issues = Vec::new();

    if config.telegram.bot_token.trim().is_empty() {
        issues.push(ChannelValidationIssue::error(
            "telegram-missing-token",
            "Bot token missing",
            "Set BOT_TOKEN to the Telegram bot credential.".to_owned(),
        ));
    }
    if config.telegram.group_id >= 0 {
        issues.push(ChannelValidationIssue::warning(
            "telegram-group-id-positive",
            "Group id looks like a user id",
            format!(
                "Group chat ids are negative; `{}` will never match a group message.",
                config.telegram.group_id
            ),
        ));
    }

    let topics = &config.topics;
    if topics.it == topics.sport || topics.it == topics.monthly || topics.sport == topics.monthly {
        issues.push(ChannelValidationIssue::error(
            "topics-duplicate",
            "Topic ids overlap",
            format!(
                "IT ({}), sport ({}) and monthly ({}) topics must be distinct.",
                topics.it, topics.sport, topics.monthly
            ),
        ));
    }

    let schedule = &config.schedule;
    if schedule.start_hour > 23 {
        issues.push(ChannelValidationIssue::error(
            "schedule-start-hour-out-of-range",
            "Start hour out of range",
            format!("START_HOUR is {}; expected 0-23.", schedule.start_hour),
        ));
    }
    if schedule.reset_hour > 23 || schedule.reset_min > 59 {
        issues.push(ChannelValidationIssue::error(
            "schedule-reset-time-out-of-range",
            "Reset time out of range",
            format!(
                "Daily reset at {}:{:02} is not a valid time of day.",
                schedule.reset_hour, schedule.reset_min
            ),
        ));
    }
    if schedule.utc_offset_hours.abs() > MAX_UTC_OFFSET_HOURS {
        issues.push(ChannelValidationIssue::error(
            "schedule-offset-out-of-range",
            "UTC offset out of range",
            format!(
                "UTC_OFFSET_HOURS is {}; expected -{MAX_UTC_OFFSET_HOURS} to +{MAX_UTC_OFFSET_HOURS}.",
                schedule.utc_offset_hours
            ),
        ));
    }
    if schedule.check_interval_secs == 0 || schedule.progress_interval_secs() == 0 {
        issues.push(ChannelValidationIssue::error(
            "schedule-zero-interval",
            "Sweep interval is zero",
            "CHECK_INTERVAL_SECS and PROGRESS_CHECK_INTERVAL_SECS must be positive.".to_owned(),
        ));
    }

    issues
}

/// Whether any issue prevents startup.
#[must_use]
pub fn has_blocking_issues(issues: &[ChannelValidationIssue]) -> bool {
    issues
        .iter()
        .any(|issue| issue.severity == ChannelValidationSeverity::Error)
}

/// Keep `adapter.run` alive, restarting it with exponential backoff.
///
/// Stops once the inbound receiver is dropped.
pub fn supervise(
    adapter: Arc<dyn ChannelAdapter>,
    inbound_tx: mpsc::Sender<ChannelInboundMessage>,
    initial_backoff: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut backoff = initial_backoff;
        loop {
            match adapter.run(inbound_tx.clone()).await {
                Ok(()) => tracing::warn!("channel {} stopped", adapter.id()),
                Err(err) => tracing::warn!(
                    "channel {} failed: {err}; retrying in {}s",
                    adapter.id(),
                    backoff.as_secs_f32()
                ),
            }
            if inbound_tx.is_closed() {
                tracing::info!("channel {} supervisor exiting", adapter.id());
                return;
            }
            tokio::time::sleep(backoff).await;
            backoff = backoff.saturating_mul(2).min(MAX_BACKOFF);
        }
    })
}

/// Best-effort health check of the transport.
pub async fn check_health(adapter: &dyn ChannelAdapter) -> bool {
    match adapter.health_check().await {
        Ok(ok) => ok,
        Err(err) => {
            tracing::warn!("channel {} health check failed: {err}", adapter.id());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::channels::traits::{ChannelOutboundMessage, DeliveryError};
    use crate::config::{ScheduleConfig, TopicsConfig};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn valid_config() -> BotConfig {
        let mut config = BotConfig::default();
        config.telegram.bot_token = "123:abc".to_owned();
        config
    }

    fn ids(config: &BotConfig) -> Vec<String> {
        validate_config(config).into_iter().map(|i| i.id).collect()
    }

    #[test]
    fn defaults_with_token_are_valid() {
        assert!(validate_config(&valid_config()).is_empty());
    }

    #[test]
    fn validation_flags_missing_token() {
        let issues = validate_config(&BotConfig::default());
        assert!(issues.iter().any(|i| i.id == "telegram-missing-token"));
        assert!(has_blocking_issues(&issues));
    }

    #[test]
    fn validation_flags_duplicate_topics() {
        let config = BotConfig {
            topics: TopicsConfig {
                it: 4,
                sport: 4,
                monthly: 130,
            },
            ..valid_config()
        };
        assert_eq!(ids(&config), vec!["topics-duplicate"]);
    }

    #[test]
    fn validation_flags_schedule_ranges() {
        let config = BotConfig {
            schedule: ScheduleConfig {
                start_hour: 24,
                utc_offset_hours: 15,
                check_interval_secs: 0,
                progress_check_interval_secs: None,
                ..ScheduleConfig::default()
            },
            ..valid_config()
        };
        let found = ids(&config);
        assert!(found.contains(&"schedule-start-hour-out-of-range".to_owned()));
        assert!(found.contains(&"schedule-offset-out-of-range".to_owned()));
        assert!(found.contains(&"schedule-zero-interval".to_owned()));
    }

    #[test]
    fn positive_group_id_is_only_a_warning() {
        let mut config = valid_config();
        config.telegram.group_id = 42;
        let issues = validate_config(&config);
        assert_eq!(issues.len(), 1);
        assert!(!has_blocking_issues(&issues));
    }

    /// Fails the first two runs, then waits until the receiver closes.
    #[derive(Default)]
    struct FailingTwice {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl ChannelAdapter for FailingTwice {
        fn id(&self) -> &'static str {
            "failing"
        }

        async fn send(&self, _message: ChannelOutboundMessage) -> Result<(), DeliveryError> {
            Ok(())
        }

        async fn run(&self, inbound_tx: mpsc::Sender<ChannelInboundMessage>) -> anyhow::Result<()> {
            if self.runs.fetch_add(1, Ordering::SeqCst) < 2 {
                anyhow::bail!("connection reset");
            }
            inbound_tx.closed().await;
            Ok(())
        }

        async fn health_check(&self) -> anyhow::Result<bool> {
            anyhow::bail!("unreachable")
        }
    }

    #[tokio::test]
    async fn supervisor_restarts_until_receiver_closes() {
        let adapter = Arc::new(FailingTwice::default());
        let (tx, rx) = mpsc::channel(8);
        let handle = supervise(adapter.clone(), tx, Duration::from_millis(1));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(adapter.runs.load(Ordering::SeqCst), 3);

        drop(rx);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("supervisor exits")
            .expect("no panic");
    }

    #[tokio::test]
    async fn failing_health_check_reads_as_unhealthy() {
        assert!(!check_health(&FailingTwice::default()).await);
    }
}

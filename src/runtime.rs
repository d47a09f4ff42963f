//! Single-owner event loop.
//!
//! One task owns the [`StateStore`] and interleaves inbound chat messages with
//! scheduled jobs, so no callback ever observes a half-applied mutation. Each
//! callback runs to completion (including its sends) before the next starts.

use crate::channels::health;
use crate::channels::telegram::TelegramAdapter;
use crate::channels::traits::{ChannelAdapter, ChannelInboundMessage, ChannelOutboundMessage};
use crate::channels::{
    ChannelValidationSeverity, INITIAL_BACKOFF, check_health, has_blocking_issues, supervise,
    validate_config,
};
use crate::config::{BotConfig, ScheduleConfig, TopicsConfig};
use crate::scheduler::tasks::now_epoch_secs;
use crate::scheduler::{JobKind, Scheduler};
use crate::tracking::commands::{self, Command};
use crate::tracking::phrases::{PhraseChooser, RandomPhrases};
use crate::tracking::reminders::{QuietHours, ReminderScheduler};
use crate::tracking::store::{MemoryStore, StateStore};
use crate::tracking::types::Track;
use crate::tracking::{Dispatcher, TextExtractor, engine, replies, reset};
use chrono::{DateTime, FixedOffset, NaiveDate};
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Buffered inbound messages between the adapter and the runtime.
const INBOUND_CAPACITY: usize = 256;

/// Where an inbound message goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// A slash command, accepted in any chat.
    Command(Command),
    /// A message in one of the track threads.
    Track(Track),
    /// A message in the monthly-goals thread.
    Goals,
    /// Anything outside the tracked group and threads.
    Ignored,
}

/// Owns the tracking state and reacts to messages and jobs.
pub struct BotRuntime<S: StateStore> {
    store: S,
    extractor: TextExtractor,
    dispatcher: Dispatcher,
    reminders: ReminderScheduler,
    phrases: Arc<dyn PhraseChooser>,
    group_id: i64,
    topics: TopicsConfig,
    schedule: ScheduleConfig,
}

impl<S: StateStore> BotRuntime<S> {
    /// Build a runtime around `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in text patterns fail to compile.
    pub fn new(
        config: &BotConfig,
        store: S,
        dispatcher: Dispatcher,
        phrases: Arc<dyn PhraseChooser>,
    ) -> crate::Result<Self> {
        let reminders = ReminderScheduler::new(
            dispatcher.clone(),
            Arc::clone(&phrases),
            QuietHours::new(config.schedule.start_hour),
        );
        Ok(Self {
            store,
            extractor: TextExtractor::new()?,
            dispatcher,
            reminders,
            phrases,
            group_id: config.telegram.group_id,
            topics: config.topics.clone(),
            schedule: config.schedule.clone(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Decide how `inbound` is handled.
    #[must_use]
    pub fn route(&self, inbound: &ChannelInboundMessage) -> Route {
        if let Some(command) = Command::parse(&inbound.text) {
            return Route::Command(command);
        }
        if inbound.chat_id != self.group_id {
            return Route::Ignored;
        }
        match inbound.thread_id {
            Some(thread) if thread == self.topics.it => Route::Track(Track::It),
            Some(thread) if thread == self.topics.sport => Route::Track(Track::Sport),
            Some(thread) if thread == self.topics.monthly => Route::Goals,
            _ => Route::Ignored,
        }
    }

    /// Handle one inbound message using the current local date.
    pub async fn handle_inbound(&mut self, inbound: ChannelInboundMessage) {
        let today = self.schedule.local_now().date_naive();
        self.handle_inbound_on(inbound, today).await;
    }

    /// Handle one inbound message as if it arrived on `today`.
    pub async fn handle_inbound_on(&mut self, inbound: ChannelInboundMessage, today: NaiveDate) {
        let user = inbound.sender_id;
        let reply = match self.route(&inbound) {
            Route::Command(command) => {
                debug!(user, command = command.name(), "command received");
                Some(commands::execute(&mut self.store, user, command, today))
            }
            Route::Track(track) => {
                let Some(intent) = self.extractor.classify(track, &inbound.text) else {
                    debug!(user, %track, "message carries no tracking intent");
                    return;
                };
                let outcome = engine::apply(&mut self.store, user, track, intent, today);
                Some(replies::outcome_reply(
                    &mention(&inbound),
                    track,
                    outcome,
                    self.phrases.as_ref(),
                ))
            }
            Route::Goals => {
                let goals = self.extractor.parse_goals(&inbound.text);
                if goals.is_empty() {
                    debug!(user, "goals message without items");
                    None
                } else {
                    let count = engine::set_goals(&mut self.store, user, goals, today);
                    Some(replies::goals_reply(&mention(&inbound), count))
                }
            }
            Route::Ignored => None,
        };

        if let Some(text) = reply {
            self.dispatcher
                .reply(ChannelOutboundMessage::reply_to(&inbound, text))
                .await;
        }
    }

    /// Run a scheduled job at the current local time.
    pub async fn run_job(&mut self, kind: JobKind) {
        let now = self.schedule.local_now();
        self.run_job_at(kind, now).await;
    }

    /// Run a scheduled job as if it fired at local time `now`.
    pub async fn run_job_at(&mut self, kind: JobKind, now: DateTime<FixedOffset>) {
        debug!(job = %kind, "running job");
        match kind {
            JobKind::GeneralSweep => {
                self.reminders.general_sweep(&mut self.store, now).await;
            }
            JobKind::ProgressSweep => {
                self.reminders.progress_sweep(&mut self.store, now).await;
            }
            JobKind::DailyReset => {
                reset::run_daily_reset(&mut self.store, &self.dispatcher, now.date_naive()).await;
            }
            JobKind::MorningNudge => {
                reset::run_morning_nudge(&mut self.store, &self.dispatcher).await;
            }
        }
    }

    /// Process messages and jobs until both channels close.
    ///
    /// A panic inside one callback is logged and the loop keeps going.
    pub async fn run(
        mut self,
        mut inbound_rx: mpsc::Receiver<ChannelInboundMessage>,
        mut job_rx: mpsc::UnboundedReceiver<JobKind>,
    ) -> S {
        let mut inbound_open = true;
        let mut jobs_open = true;
        while inbound_open || jobs_open {
            tokio::select! {
                message = inbound_rx.recv(), if inbound_open => match message {
                    Some(message) => {
                        let sender = message.sender_id;
                        if AssertUnwindSafe(self.handle_inbound(message))
                            .catch_unwind()
                            .await
                            .is_err()
                        {
                            error!(user = sender, "message handler panicked");
                        }
                    }
                    None => {
                        info!("inbound channel closed");
                        inbound_open = false;
                    }
                },
                kind = job_rx.recv(), if jobs_open => match kind {
                    Some(kind) => {
                        if AssertUnwindSafe(self.run_job(kind))
                            .catch_unwind()
                            .await
                            .is_err()
                        {
                            error!(job = %kind, "job panicked");
                        }
                    }
                    None => {
                        info!("job channel closed");
                        jobs_open = false;
                    }
                },
            }
        }
        info!("runtime stopped");
        self.store
    }
}

/// How a sender is addressed in group replies.
fn mention(inbound: &ChannelInboundMessage) -> String {
    inbound
        .sender_name
        .clone()
        .unwrap_or_else(|| format!("user {}", inbound.sender_id))
}

/// Start the bot: transport, scheduler, health probe and the owner loop.
///
/// # Errors
///
/// Fails when the configuration has blocking issues or the text patterns
/// cannot be compiled.
pub async fn serve(config: BotConfig) -> anyhow::Result<()> {
    let issues = validate_config(&config);
    for issue in &issues {
        match issue.severity {
            ChannelValidationSeverity::Error => {
                error!(id = %issue.id, "{}: {}", issue.title, issue.summary);
            }
            ChannelValidationSeverity::Warning => {
                warn!(id = %issue.id, "{}: {}", issue.title, issue.summary);
            }
        }
    }
    if has_blocking_issues(&issues) {
        anyhow::bail!("configuration is invalid, see the errors above");
    }

    let adapter: Arc<dyn ChannelAdapter> = Arc::new(TelegramAdapter::new(&config.telegram));
    if !check_health(adapter.as_ref()).await {
        warn!("telegram getMe did not succeed; polling will keep retrying");
    }

    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
    let (job_tx, job_rx) = mpsc::unbounded_channel();

    let _supervisor = supervise(Arc::clone(&adapter), inbound_tx, INITIAL_BACKOFF);
    let _scheduler = Scheduler::from_config(&config.schedule, job_tx, now_epoch_secs()).run();

    if config.health.enabled {
        let health_config = config.health.clone();
        tokio::spawn(async move {
            if let Err(err) = health::serve(&health_config).await {
                error!("health probe stopped: {err}");
            }
        });
    }

    let phrases: Arc<dyn PhraseChooser> = Arc::new(RandomPhrases);
    let runtime = BotRuntime::new(&config, MemoryStore::new(), Dispatcher::new(adapter), phrases)?;
    info!(
        group = config.telegram.group_id,
        offset_hours = config.schedule.utc_offset_hours,
        start_hour = config.schedule.start_hour,
        "bot started"
    );
    runtime.run(inbound_rx, job_rx).await;
    Ok(())
}

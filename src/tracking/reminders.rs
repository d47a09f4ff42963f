//! Reminder sweeps.
//!
//! Each `(user, track)` pair is in one of four [`TrackState`]s for the day.
//! The general sweep nags users who have not started; the progress sweep
//! nudges users who reported today but still have items left. Both are
//! gated by [`QuietHours`].

use crate::tracking::dispatch::{DeliveryReport, Dispatcher};
use crate::tracking::phrases::{PhraseCategory, PhraseChooser};
use crate::tracking::store::StateStore;
use crate::tracking::types::{MonthlyGoals, Track, UserId};
use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, info};

/// Fixed last line of every reminder.
pub const SIGN_OFF: &str = "Back to work.";

/// How many goals a summary lists before truncating.
pub const GOAL_SUMMARY_LIMIT: usize = 3;

/// Daily state of one `(user, track)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    /// No list set.
    NoList,
    /// List set, nothing reported today.
    Pending,
    /// Reported today, items remain.
    Reported,
    /// Completion mark dated today.
    Completed,
}

/// Classify `(user, track)` on `today`.
///
/// A report from an earlier day counts as [`TrackState::Pending`].
#[must_use]
pub fn track_state<S: StateStore>(
    store: &S,
    user: UserId,
    track: Track,
    today: NaiveDate,
) -> TrackState {
    if store.completed_on(user, track) == Some(today) {
        return TrackState::Completed;
    }
    match store.progress(user, track) {
        None => TrackState::NoList,
        Some(progress) if !progress.has_list() => TrackState::NoList,
        Some(progress) if progress.reported_on(today) && progress.remaining > 0 => {
            TrackState::Reported
        }
        Some(_) => TrackState::Pending,
    }
}

/// Blocks reminders before a local start hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietHours {
    pub start_hour: u8,
}

impl QuietHours {
    pub fn new(start_hour: u8) -> Self {
        Self { start_hour }
    }

    /// Whether reminders may go out at local time `now`.
    #[must_use]
    pub fn allows(&self, now: &DateTime<FixedOffset>) -> bool {
        now.hour() >= u32::from(self.start_hour)
    }
}

/// Which reminder text to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    /// No list yet: ask for one.
    SetList,
    /// List set but no report today.
    ReportPending,
    /// Reported today with items left.
    KeepGoing,
}

/// One planned reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedReminder {
    pub user: UserId,
    pub track: Track,
    pub kind: ReminderKind,
}

/// Reminders the general sweep would send on `today`.
#[must_use]
pub fn plan_general<S: StateStore>(store: &S, today: NaiveDate) -> Vec<PlannedReminder> {
    plan(store, today, |state| match state {
        TrackState::NoList => Some(ReminderKind::SetList),
        TrackState::Pending => Some(ReminderKind::ReportPending),
        TrackState::Reported | TrackState::Completed => None,
    })
}

/// Reminders the progress sweep would send on `today`.
#[must_use]
pub fn plan_progress<S: StateStore>(store: &S, today: NaiveDate) -> Vec<PlannedReminder> {
    plan(store, today, |state| {
        (state == TrackState::Reported).then_some(ReminderKind::KeepGoing)
    })
}

fn plan<S, F>(store: &S, today: NaiveDate, select: F) -> Vec<PlannedReminder>
where
    S: StateStore,
    F: Fn(TrackState) -> Option<ReminderKind>,
{
    let mut planned = Vec::new();
    for user in store.subscribers() {
        for track in Track::ALL {
            let state = track_state(store, user, track, today);
            match select(state) {
                Some(kind) => planned.push(PlannedReminder { user, track, kind }),
                None => debug!(user, %track, ?state, "no reminder due"),
            }
        }
    }
    planned
}

/// Bulleted summary of the first goals, or `None` when the user has none.
#[must_use]
pub fn goal_summary(goals: &MonthlyGoals) -> Option<String> {
    if goals.goals.is_empty() {
        return None;
    }
    let sorted = goals.goals.sorted();
    let mut summary = String::new();
    for item in sorted.iter().take(GOAL_SUMMARY_LIMIT) {
        let _ = writeln!(summary, "• {}", item.text);
    }
    if sorted.len() > GOAL_SUMMARY_LIMIT {
        let _ = writeln!(
            summary,
            "• ... and {} more",
            sorted.len() - GOAL_SUMMARY_LIMIT
        );
    }
    Some(summary)
}

/// Decides and sends reminders.
#[derive(Clone)]
pub struct ReminderScheduler {
    dispatcher: Dispatcher,
    phrases: Arc<dyn PhraseChooser>,
    quiet: QuietHours,
}

impl ReminderScheduler {
    pub fn new(dispatcher: Dispatcher, phrases: Arc<dyn PhraseChooser>, quiet: QuietHours) -> Self {
        Self {
            dispatcher,
            phrases,
            quiet,
        }
    }

    /// Reminder text for `reminder`, built from current state.
    #[must_use]
    pub fn compose<S: StateStore>(&self, store: &S, reminder: PlannedReminder) -> String {
        let PlannedReminder { user, track, kind } = reminder;
        let (total, remaining) = store
            .progress(user, track)
            .map_or((0, 0), |p| (p.total(), p.remaining));

        let mut text = format!("{} Reminder!\n\n", track.icon());
        match kind {
            ReminderKind::SetList => {
                let _ = write!(
                    text,
                    "You haven't set your {} list for today yet.\n\
                     Post it in the {} topic like this:\n\
                     1. Task 1\n2. Task 2\n3. Task 3\n\n{}\n\n",
                    track.label(),
                    track.topic_name(),
                    self.phrases.choose(PhraseCategory::Nudge),
                );
            }
            ReminderKind::ReportPending => {
                let _ = write!(
                    text,
                    "You haven't reported on your {label} {unit} today.\n\
                     Total {unit}: {total}\n\
                     Post '{example}' in the {topic} topic!\n\n",
                    label = track.label(),
                    unit = track.unit(),
                    example = track.progress_example(),
                    topic = track.topic_name(),
                );
            }
            ReminderKind::KeepGoing => {
                let _ = write!(
                    text,
                    "You have {remaining} of {total} {} left.\n{}\n\n",
                    track.unit(),
                    self.phrases.choose(PhraseCategory::KeepGoing),
                );
            }
        }

        if let Some(summary) = store.goals(user).and_then(goal_summary) {
            text.push_str("🎯 Don't forget your goals for the month:\n");
            text.push_str(&summary);
            text.push('\n');
        }
        text.push_str(SIGN_OFF);
        text
    }

    /// Run the general sweep at local time `now`.
    ///
    /// Returns `None` when quiet hours suppressed the sweep.
    pub async fn general_sweep<S: StateStore>(
        &self,
        store: &mut S,
        now: DateTime<FixedOffset>,
    ) -> Option<DeliveryReport> {
        self.sweep(store, now, "general", plan_general).await
    }

    /// Run the progress sweep at local time `now`.
    ///
    /// Returns `None` when quiet hours suppressed the sweep.
    pub async fn progress_sweep<S: StateStore>(
        &self,
        store: &mut S,
        now: DateTime<FixedOffset>,
    ) -> Option<DeliveryReport> {
        self.sweep(store, now, "progress", plan_progress).await
    }

    async fn sweep<S: StateStore>(
        &self,
        store: &mut S,
        now: DateTime<FixedOffset>,
        name: &'static str,
        planner: fn(&S, NaiveDate) -> Vec<PlannedReminder>,
    ) -> Option<DeliveryReport> {
        if !self.quiet.allows(&now) {
            debug!(
                sweep = name,
                hour = now.hour(),
                start_hour = self.quiet.start_hour,
                "quiet hours, sweep skipped"
            );
            return None;
        }

        let today = now.date_naive();
        let messages: Vec<(UserId, String)> = planner(store, today)
            .into_iter()
            .map(|reminder| (reminder.user, self.compose(store, reminder)))
            .collect();
        let planned = messages.len();
        let report = self.dispatcher.send_all(store, messages).await;
        info!(
            sweep = name,
            planned,
            sent = report.sent,
            failed = report.failed,
            unsubscribed = report.unsubscribed,
            "reminder sweep finished"
        );
        Some(report)
    }
}

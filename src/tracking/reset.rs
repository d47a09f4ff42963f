//! Start-of-day jobs: the daily reset broadcast and the morning list nudge.

use crate::tracking::dispatch::{DeliveryReport, Dispatcher};
use crate::tracking::reminders::goal_summary;
use crate::tracking::store::StateStore;
use crate::tracking::types::{Track, UserId};
use chrono::NaiveDate;
use tracing::info;

/// Counters from one [`reset_daily_state`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetSummary {
    /// Completion marks dated before today that were removed.
    pub purged_completions: usize,
    /// Track records whose daily fields were rearmed.
    pub tracks_rearmed: usize,
}

/// Clear yesterday's marks and rearm every track for `today`.
///
/// Task lists survive; `remaining` goes back to each list's total.
pub fn reset_daily_state<S: StateStore>(store: &mut S, today: NaiveDate) -> ResetSummary {
    let purged_completions = store.purge_completions_before(today);
    let keys = store.progress_keys();
    for (user, track) in &keys {
        let progress = store.progress_entry(*user, *track);
        progress.wrote_progress_today = false;
        progress.last_progress_date = None;
        progress.remaining = progress.total();
    }
    let summary = ResetSummary {
        purged_completions,
        tracks_rearmed: keys.len(),
    };
    info!(
        %today,
        purged = summary.purged_completions,
        rearmed = summary.tracks_rearmed,
        "daily state reset"
    );
    summary
}

/// The new-day broadcast for `user`, with their goals appended.
#[must_use]
pub fn new_day_message<S: StateStore>(store: &S, user: UserId) -> String {
    let mut text = format!(
        "🔄 A new day has started!\n\n\
         Don't forget to:\n\
         1. Post your task list in the {it} topic\n\
         2. Post your sport plan in the {sport} topic\n\
         3. Report your progress:\n\
         • '{it_example}' for IT\n\
         • '{sport_example}' for sport\n\n",
        it = Track::It.topic_name(),
        sport = Track::Sport.topic_name(),
        it_example = Track::It.progress_example(),
        sport_example = Track::Sport.progress_example(),
    );
    if let Some(summary) = store.goals(user).and_then(goal_summary) {
        text.push_str("🎯 Your goals for the month:\n");
        text.push_str(&summary);
        text.push_str("\nKeep moving toward your goals! 💪");
    }
    text
}

/// Reset state for `today`, then send the new-day message to every
/// subscriber.
pub async fn run_daily_reset<S: StateStore>(
    store: &mut S,
    dispatcher: &Dispatcher,
    today: NaiveDate,
) -> (ResetSummary, DeliveryReport) {
    let summary = reset_daily_state(store, today);
    let messages: Vec<(UserId, String)> = store
        .subscribers()
        .into_iter()
        .map(|user| (user, new_day_message(store, user)))
        .collect();
    let report = dispatcher.send_all(store, messages).await;
    info!(
        sent = report.sent,
        failed = report.failed,
        unsubscribed = report.unsubscribed,
        "new-day broadcast finished"
    );
    (summary, report)
}

/// Text of the morning "set your lists" nudge.
pub const MORNING_NUDGE: &str = "⏰ Good morning! Time to plan the day.\n\n\
    👇 Post in the matching topics:\n\
    • IT topic: your IT task list\n\
    • Sport topic: your sport plan\n\
    • Monthly goals topic: your goals for the month\n\n\
    Format:\n1. Task 1\n2. Task 2\n3. Task 3";

/// Subscribers still missing the list for at least one track.
#[must_use]
pub fn morning_nudge_recipients<S: StateStore>(store: &S) -> Vec<UserId> {
    store
        .subscribers()
        .into_iter()
        .filter(|user| {
            Track::ALL
                .iter()
                .any(|track| !store.progress(*user, *track).is_some_and(|p| p.has_list()))
        })
        .collect()
}

/// Send [`MORNING_NUDGE`] to everyone without both lists.
pub async fn run_morning_nudge<S: StateStore>(
    store: &mut S,
    dispatcher: &Dispatcher,
) -> DeliveryReport {
    let recipients = morning_nudge_recipients(store);
    let report = dispatcher.broadcast(store, &recipients, MORNING_NUDGE).await;
    info!(
        recipients = recipients.len(),
        sent = report.sent,
        failed = report.failed,
        unsubscribed = report.unsubscribed,
        "morning nudge finished"
    );
    report
}

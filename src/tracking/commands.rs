//! User-invokable slash commands.
//!
//! Everything here except `/start` and `/stop` is a pure read over the store.

use crate::tracking::store::StateStore;
use crate::tracking::types::{Track, TrackProgress, UserId};
use chrono::NaiveDate;
use std::fmt::Write as _;
use tracing::info;

/// Date format used in goal views.
const DATE_FORMAT: &str = "%d.%m.%Y";

/// A recognised slash command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Status,
    MyTasks,
    MySport,
    MyGoals,
    Help,
}

impl Command {
    /// Parse the leading `/command` of `text`.
    ///
    /// Accepts an `@botname` suffix and ignores trailing arguments.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let token = text.trim_start().split_whitespace().next()?;
        let name = token.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            "status" => Some(Self::Status),
            "mytasks" => Some(Self::MyTasks),
            "mysport" => Some(Self::MySport),
            "mygoals" => Some(Self::MyGoals),
            "help" => Some(Self::Help),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Status => "status",
            Self::MyTasks => "mytasks",
            Self::MySport => "mysport",
            Self::MyGoals => "mygoals",
            Self::Help => "help",
        }
    }
}

/// Run `command` for `user` and return the reply text.
pub fn execute<S: StateStore>(
    store: &mut S,
    user: UserId,
    command: Command,
    today: NaiveDate,
) -> String {
    match command {
        Command::Start => subscribe(store, user),
        Command::Stop => unsubscribe(store, user),
        Command::Status => status(store, user, today),
        Command::MyTasks => track_list(store, user, Track::It),
        Command::MySport => track_list(store, user, Track::Sport),
        Command::MyGoals => goals(store, user),
        Command::Help => help(),
    }
}

fn subscribe<S: StateStore>(store: &mut S, user: UserId) -> String {
    if store.subscribe(user) {
        info!(user, "user subscribed");
    }
    for track in Track::ALL {
        store.progress_entry(user, track);
    }
    format!(
        "🔔 You are subscribed to personal reminders!\n\n\
         🤖 How to use:\n\
         1. Post your task list in the {it} topic\n\
         2. Post your sport plan in the {sport} topic\n\
         3. Post your goals in the monthly goals topic\n\n\
         📊 Reports:\n\
         • '{it_progress}' for IT\n\
         • '{sport_progress}' for sport\n\
         • '{it_done}' or '{sport_done}' when everything is done\n\n\
         {schedule}\n\n\
         🎯 I will remind you about your tasks and track your progress!",
        it = Track::It.topic_name(),
        sport = Track::Sport.topic_name(),
        it_progress = Track::It.progress_example(),
        sport_progress = Track::Sport.progress_example(),
        it_done = Track::It.completion_example(),
        sport_done = Track::Sport.completion_example(),
        schedule = SCHEDULE,
    )
}

fn unsubscribe<S: StateStore>(store: &mut S, user: UserId) -> String {
    if store.unsubscribe(user) {
        info!(user, "user unsubscribed");
        "❌ You have unsubscribed from reminders.".to_owned()
    } else {
        "You are not subscribed anyway.".to_owned()
    }
}

const SCHEDULE: &str = "⏰ Schedule:\n\
    • At the start hour: morning reminder\n\
    • Every hour: completion check\n\
    • Midnight: reset for the new day";

fn help() -> String {
    format!(
        "🤖 AVAILABLE COMMANDS:\n\n\
         📊 Status and lists:\n\
         /status - your personal status for every track\n\
         /mytasks - show your IT tasks\n\
         /mysport - show your sport plan\n\
         /mygoals - show your goals for the month\n\n\
         ⚙️ Settings:\n\
         /start - subscribe to reminders\n\
         /stop - unsubscribe from reminders\n\
         /help - show this message\n\n\
         {SCHEDULE}\n\n\
         📝 How to use:\n\
         1. Post numbered lists in the matching topics\n\
         2. Report progress with the report phrases\n\
         3. Get personal reminders!"
    )
}

fn track_list<S: StateStore>(store: &S, user: UserId, track: Track) -> String {
    let Some(progress) = store.progress(user, track).filter(|p| p.has_list()) else {
        return format!(
            "{icon} No {label} list set yet.\n\n\
             Post it in the {topic} topic like this:\n\
             1. First item\n2. Second item\n3. Third item\n\n\
             I will count the {unit} automatically!",
            icon = track.icon(),
            label = track.label(),
            topic = track.topic_name(),
            unit = track.unit(),
        );
    };

    let mut text = format!("{} Your {} list for today:\n\n", track.icon(), track.label());
    for item in progress.task_list.sorted() {
        let _ = writeln!(text, "{}. {}", item.number, item.text);
    }
    let _ = write!(
        text,
        "\nTotal {}: {}\n\nPost '{}' in the {} topic to report!",
        track.unit(),
        progress.total(),
        track.progress_example(),
        track.topic_name(),
    );
    text
}

fn goals<S: StateStore>(store: &S, user: UserId) -> String {
    let Some(goals) = store.goals(user).filter(|g| !g.goals.is_empty()) else {
        return "🎯 You don't have goals for the month yet.\n\n\
                Post them in the monthly goals topic like this:\n\
                Goals for the month:\n\
                1. First goal\n2. Second goal\n3. Third goal\n\n\
                I will remind you about them every day!"
            .to_owned();
    };

    let mut text = "🎯 Your goals for the month:\n\n".to_owned();
    for item in goals.goals.sorted() {
        let _ = writeln!(text, "{}. {}", item.number, item.text);
    }
    let _ = write!(
        text,
        "\n📅 Goals set on: {}\n\nTotal goals: {}",
        goals.created_date.format(DATE_FORMAT),
        goals.goals.len()
    );
    text
}

fn status<S: StateStore>(store: &S, user: UserId, today: NaiveDate) -> String {
    let mut text = "📊 YOUR STATUS\n\n".to_owned();

    for track in Track::ALL {
        if store.completed_on(user, track) == Some(today) {
            let _ = write!(
                text,
                "✅ {label} {unit}: DONE!\n• No more {label} reminders today\n\n",
                label = track.label(),
                unit = track.unit(),
            );
        } else {
            let _ = write!(
                text,
                "❌ {} {}: NOT DONE YET\n• Post '{}' once everything is done\n\n",
                track.label(),
                track.unit(),
                track.completion_example(),
            );
        }
    }

    for track in Track::ALL {
        let progress = store.progress(user, track);
        let _ = writeln!(text, "{} {} progress:", track.icon(), track.label());
        match progress.filter(|p| p.reported_on(today)) {
            Some(p) => {
                let _ = writeln!(text, "• {} left: {}", track.unit(), p.remaining);
            }
            None => text.push_str("• No interim report today\n"),
        }
        let _ = writeln!(text, "• List: {}", list_total(progress));
        text.push('\n');
    }

    match store.goals(user).filter(|g| !g.goals.is_empty()) {
        Some(goals) => {
            let _ = writeln!(
                text,
                "🎯 Goals for the month: {} (since {})",
                goals.goals.len(),
                goals.created_date.format(DATE_FORMAT)
            );
        }
        None => text.push_str("🎯 Goals for the month: not set\n"),
    }

    let _ = write!(
        text,
        "\n📈 Overall:\n• Subscribers: {}\n• Finished IT today: {}\n• Finished sport today: {}",
        store.subscribers().len(),
        store.completed_count(Track::It, today),
        store.completed_count(Track::Sport, today),
    );
    text
}

fn list_total(progress: Option<&TrackProgress>) -> String {
    match progress.filter(|p| p.has_list()) {
        Some(p) => format!("{} items", p.total()),
        None => "not set".to_owned(),
    }
}

//! Core data model for per-user daily tracking.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Chat-transport user identifier.
pub type UserId = i64;

/// One of the two independent completion domains tracked per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    /// IT / work tasks.
    It,
    /// Sport exercises.
    Sport,
}

impl Track {
    /// Both tracks, in display order.
    pub const ALL: [Track; 2] = [Track::It, Track::Sport];

    /// Short label used in messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::It => "IT",
            Self::Sport => "sport",
        }
    }

    /// Plural unit word for items on this track.
    #[must_use]
    pub fn unit(self) -> &'static str {
        match self {
            Self::It => "tasks",
            Self::Sport => "exercises",
        }
    }

    /// Name of the forum topic where this track is posted.
    #[must_use]
    pub fn topic_name(self) -> &'static str {
        match self {
            Self::It => "IT",
            Self::Sport => "Sport",
        }
    }

    /// Icon prefixed to reminders for this track.
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::It => "📋",
            Self::Sport => "🏃",
        }
    }

    /// A report phrasing the extractor recognises, shown in help texts.
    #[must_use]
    pub fn progress_example(self) -> &'static str {
        match self {
            Self::It => "Interim summary: did N tasks",
            Self::Sport => "Sport interim summary: did N exercises",
        }
    }

    /// A completion phrasing the extractor recognises, shown in help texts.
    #[must_use]
    pub fn completion_example(self) -> &'static str {
        match self {
            Self::It => "Finished all tasks for today",
            Self::Sport => "Finished all sport tasks for today",
        }
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single numbered line of a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    /// Number the user wrote in front of the item.
    pub number: u32,
    /// Item text with surrounding whitespace removed.
    pub text: String,
}

impl ListItem {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// Numbered items in the order they were written.
///
/// Numbers need not be contiguous or start at 1. The list's
/// [`total`](TaskList::total) is the highest number present, not the
/// item count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    items: Vec<ListItem>,
}

impl TaskList {
    pub fn new(items: Vec<ListItem>) -> Self {
        Self { items }
    }

    /// Items in message order.
    #[must_use]
    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Highest item number, or 0 for an empty list.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.items.iter().map(|item| item.number).max().unwrap_or(0)
    }

    /// Items ordered by number; equal numbers keep message order.
    #[must_use]
    pub fn sorted(&self) -> Vec<&ListItem> {
        let mut items: Vec<&ListItem> = self.items.iter().collect();
        items.sort_by_key(|item| item.number);
        items
    }
}

/// Per-user, per-track progress for the current day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackProgress {
    /// Current list; persists across days until replaced.
    pub task_list: TaskList,
    /// Items still open, `total - completed` clamped at zero.
    pub remaining: u32,
    /// Whether a progress report was recorded since the last reset.
    pub wrote_progress_today: bool,
    /// Local date of the last progress report.
    pub last_progress_date: Option<NaiveDate>,
}

impl TrackProgress {
    /// Total of the current list.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.task_list.total()
    }

    #[must_use]
    pub fn has_list(&self) -> bool {
        self.total() > 0
    }

    /// Whether a progress report was recorded on `day`.
    #[must_use]
    pub fn reported_on(&self, day: NaiveDate) -> bool {
        self.wrote_progress_today && self.last_progress_date == Some(day)
    }
}

/// A user's goals for the month. Replaced wholesale on each goals message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyGoals {
    pub goals: TaskList,
    pub created_date: NaiveDate,
}

//! Free-text recognition of lists, completion phrases and progress reports.
//!
//! Every recognizer is an ordered cascade evaluated first-match-wins. The
//! cascades are plain data ([`TrackPatterns`]) so phrasings can be added
//! without touching control flow.

use crate::error::{BotError, Result};
use crate::tracking::types::{ListItem, TaskList, Track};
use regex::{Captures, Regex};

/// Pulls a completed-count out of a matched count pattern.
pub type CountExtractor = fn(&Captures<'_>) -> Option<u32>;

/// What a message in a track thread means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackIntent {
    /// A completion phrase: every item on the track is done.
    Completion,
    /// A progress report. `None` when no count could be recovered.
    Progress { completed: Option<u32> },
    /// A new numbered list.
    List(TaskList),
}

/// Phrase sets for one track, as regex source strings.
///
/// Patterns are matched against the lowercased message. `{unit}` in a count
/// pattern is replaced with the track's unit alternation.
#[derive(Debug, Clone)]
pub struct TrackPatterns {
    pub completion: Vec<String>,
    /// Any match vetoes a completion phrase ("haven't finished all tasks").
    pub completion_negations: Vec<String>,
    /// Explicit report keywords, honoured even inside a list message.
    pub progress_intent: Vec<String>,
    /// Bare count phrasings ("did 3 tasks"), only for messages without a list.
    pub bare_reports: Vec<String>,
    pub counts: Vec<(String, CountExtractor)>,
    pub unit: String,
}

const MISSPELLED_FINISHED: &str =
    r"(?:finished|finsihed|finised|finshed|fnished|finishd|completed|compleated|completd|done|did)";
const MISSPELLED_INTERIM: &str = r"(?:interim|intrim|interm|interium|intermediate)";
const MISSPELLED_SUMMARY: &str = r"(?:summary|sumary|summery|sumery|summry)";
const NEGATION: &str = r"(?:not|never|haven['’]?t|hasn['’]?t|didn['’]?t|havent|didnt)";

fn first_group(caps: &Captures<'_>) -> Option<u32> {
    caps.get(1)?.as_str().parse().ok()
}

const FIRST_GROUP: CountExtractor = first_group;

fn default_counts() -> Vec<(String, CountExtractor)> {
    vec![
        (
            r"\b(?:completed|finished|did|done)\s+(\d+)\s+(?:of|out\s+of)\s+(?:\d+\s+)?(?:(?:my|the)\s+)?{unit}\b"
                .to_owned(),
            FIRST_GROUP,
        ),
        (r"\bdid\s+(\d+)\s+{unit}\b".to_owned(), FIRST_GROUP),
        (
            r"\b(?:completed|finished|done|closed)\s+(\d+)\s+{unit}\b".to_owned(),
            FIRST_GROUP,
        ),
        // "2 of 5 tasks done": the count precedes "of", the total follows it.
        (
            r"\b(\d+)\s+(?:of|out\s+of)\s+\d+\s+(?:(?:my|the)\s+)?{unit}\b".to_owned(),
            FIRST_GROUP,
        ),
        (
            r"\b(\d+)\s+{unit}\s+(?:are\s+)?(?:done|completed|finished)\b".to_owned(),
            FIRST_GROUP,
        ),
        (r"\b(\d+)\s*/\s*\d+\s+{unit}\b".to_owned(), FIRST_GROUP),
    ]
}

fn default_negations() -> Vec<String> {
    vec![
        format!(r"\b{NEGATION}\s+(?:\w+\s+){{0,2}}{MISSPELLED_FINISHED}\b"),
        r"\b(?:are|is)(?:n['’]?t|\s+not)\s+(?:yet\s+)?(?:done|finished|completed|complete)\b"
            .to_owned(),
    ]
}

impl TrackPatterns {
    /// Built-in phrasings for `track`.
    #[must_use]
    pub fn builtin(track: Track) -> Self {
        match track {
            Track::It => Self {
                completion: vec![
                    format!(
                        r"\b{MISSPELLED_FINISHED}\s+(?:with\s+)?all\s+(?:of\s+)?(?:(?:my|the)\s+)?(?:it\s+)?tasks?\b"
                    ),
                    r"\ball\s+(?:(?:my|the)\s+)?(?:it\s+)?tasks?\s+(?:are\s+|is\s+)?(?:done|finished|completed|complete)\b"
                        .to_owned(),
                ],
                completion_negations: default_negations(),
                progress_intent: vec![
                    format!(r"\b{MISSPELLED_INTERIM}\s+{MISSPELLED_SUMMARY}\b"),
                    r"\bprogress\s+(?:report|update)\b".to_owned(),
                ],
                bare_reports: vec![
                    r"\b(?:did|completed|finished|done)\s+\d+\s+(?:(?:of|out\s+of)\s+\d+\s+)?tasks?\b"
                        .to_owned(),
                ],
                counts: default_counts(),
                unit: r"(?:tasks?)".to_owned(),
            },
            Track::Sport => Self {
                completion: vec![
                    format!(
                        r"\b{MISSPELLED_FINISHED}\s+(?:with\s+)?all\s+(?:of\s+)?(?:(?:my|the)\s+)?(?:sports?\s+(?:tasks?|exercises?)|exercises?|workouts?|training)\b"
                    ),
                    r"\ball\s+(?:(?:my|the)\s+)?(?:sports?\s+tasks?|exercises?|workouts?)\s+(?:are\s+)?(?:done|finished|completed|complete)\b"
                        .to_owned(),
                    r"\bworkout\s+(?:is\s+)?(?:done|finished|complete|completed)\b".to_owned(),
                ],
                completion_negations: default_negations(),
                progress_intent: vec![
                    format!(r"\bsports?\s+{MISSPELLED_INTERIM}\s+{MISSPELLED_SUMMARY}\b"),
                    r"\b(?:sports?|workout|training)\s+progress\b".to_owned(),
                ],
                bare_reports: vec![
                    r"\b(?:did|completed|finished|done)\s+\d+\s+(?:(?:of|out\s+of)\s+\d+\s+)?exercises?\b"
                        .to_owned(),
                ],
                counts: default_counts(),
                unit: r"(?:exercises?)".to_owned(),
            },
        }
    }
}

struct CountRule {
    pattern: Regex,
    extract: CountExtractor,
}

struct CompiledTrack {
    completion: Vec<Regex>,
    completion_negations: Vec<Regex>,
    progress_intent: Vec<Regex>,
    bare_reports: Vec<Regex>,
    counts: Vec<CountRule>,
}

fn compile_all(sources: &[String]) -> Result<Vec<Regex>> {
    sources.iter().map(|p| compile(p)).collect()
}

impl CompiledTrack {
    fn compile(patterns: &TrackPatterns) -> Result<Self> {
        let counts = patterns
            .counts
            .iter()
            .map(|(source, extract)| {
                Ok(CountRule {
                    pattern: compile(&source.replace("{unit}", &patterns.unit))?,
                    extract: *extract,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            completion: compile_all(&patterns.completion)?,
            completion_negations: compile_all(&patterns.completion_negations)?,
            progress_intent: compile_all(&patterns.progress_intent)?,
            bare_reports: compile_all(&patterns.bare_reports)?,
            counts,
        })
    }
}

fn compile(source: &str) -> Result<Regex> {
    Regex::new(source).map_err(|e| BotError::Config(format!("invalid pattern `{source}`: {e}")))
}

/// Parses message text into track intents and goal lists.
pub struct TextExtractor {
    list_line: Regex,
    goals_header: Regex,
    bare_integer: Regex,
    it: CompiledTrack,
    sport: CompiledTrack,
}

impl TextExtractor {
    /// Extractor with the built-in phrasings for both tracks.
    ///
    /// # Errors
    ///
    /// Fails only if a built-in pattern does not compile.
    pub fn new() -> Result<Self> {
        Self::with_patterns(
            &TrackPatterns::builtin(Track::It),
            &TrackPatterns::builtin(Track::Sport),
        )
    }

    /// Extractor with custom phrasings.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Config`] naming the first pattern that does not
    /// compile.
    pub fn with_patterns(it: &TrackPatterns, sport: &TrackPatterns) -> Result<Self> {
        Ok(Self {
            list_line: compile(r"^(\d+)[.)]\s+(\S.*)$")?,
            goals_header: compile(r"(?i)\bgoals\s+for\s+the\s+month\b")?,
            bare_integer: compile(r"\d+")?,
            it: CompiledTrack::compile(it)?,
            sport: CompiledTrack::compile(sport)?,
        })
    }

    fn track(&self, track: Track) -> &CompiledTrack {
        match track {
            Track::It => &self.it,
            Track::Sport => &self.sport,
        }
    }

    /// Classify a message posted in `track`'s thread.
    ///
    /// A completion phrase beats a progress report, and both beat a list.
    /// Inside a list message only an explicit report keyword counts as a
    /// report; a list line like "re-check: did 2 tasks" stays a list item.
    #[must_use]
    pub fn classify(&self, track: Track, text: &str) -> Option<TrackIntent> {
        if self.is_completion(track, text) {
            return Some(TrackIntent::Completion);
        }
        let list = self.parse_list(text);
        let has_list = list.total() > 0;
        if let Some(completed) = self.report(track, text, !has_list) {
            return Some(TrackIntent::Progress { completed });
        }
        has_list.then_some(TrackIntent::List(list))
    }

    /// Numbered lines of `text`. Other lines are ignored.
    #[must_use]
    pub fn parse_list(&self, text: &str) -> TaskList {
        self.parse_lines(text.lines())
    }

    fn parse_lines<'a>(&self, lines: impl Iterator<Item = &'a str>) -> TaskList {
        let items = lines
            .filter_map(|line| {
                let caps = self.list_line.captures(line.trim_start())?;
                let number: u32 = caps.get(1)?.as_str().parse().ok()?;
                let text = caps.get(2)?.as_str().trim();
                (number > 0 && !text.is_empty()).then(|| ListItem::new(number, text))
            })
            .collect();
        TaskList::new(items)
    }

    /// Goals list from `text`.
    ///
    /// If a "goals for the month" header line is present, only lines after
    /// the first header are scanned; otherwise the whole message is.
    #[must_use]
    pub fn parse_goals(&self, text: &str) -> TaskList {
        let mut lines = text.lines();
        let has_header = text.lines().any(|line| self.goals_header.is_match(line));
        if has_header {
            for line in lines.by_ref() {
                if self.goals_header.is_match(line) {
                    break;
                }
            }
        }
        self.parse_lines(lines)
    }

    /// Whether `text` contains one of `track`'s completion phrases and no
    /// negation of them.
    #[must_use]
    pub fn is_completion(&self, track: Track, text: &str) -> bool {
        let lowered = text.to_lowercase();
        let compiled = self.track(track);
        if compiled
            .completion_negations
            .iter()
            .any(|pattern| pattern.is_match(&lowered))
        {
            return false;
        }
        compiled
            .completion
            .iter()
            .any(|pattern| pattern.is_match(&lowered))
    }

    /// Progress report on `track`.
    ///
    /// Returns `None` when `text` is not a report, `Some(None)` when it is a
    /// report but no count can be recovered.
    #[must_use]
    pub fn progress_report(&self, track: Track, text: &str) -> Option<Option<u32>> {
        self.report(track, text, true)
    }

    fn report(&self, track: Track, text: &str, allow_bare: bool) -> Option<Option<u32>> {
        let lowered = text.to_lowercase();
        let compiled = self.track(track);
        let keyword = compiled
            .progress_intent
            .iter()
            .any(|pattern| pattern.is_match(&lowered));
        let bare = allow_bare
            && compiled
                .bare_reports
                .iter()
                .any(|pattern| pattern.is_match(&lowered));
        if !keyword && !bare {
            return None;
        }

        let unit_count = compiled.counts.iter().find_map(|rule| {
            rule.pattern
                .captures(&lowered)
                .and_then(|caps| (rule.extract)(&caps))
        });
        Some(unit_count.or_else(|| self.first_integer(text)))
    }

    fn first_integer(&self, raw: &str) -> Option<u32> {
        self.bare_integer
            .find_iter(raw)
            .find_map(|m| m.as_str().parse().ok())
    }
}

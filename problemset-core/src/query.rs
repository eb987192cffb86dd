//! In-memory search, filtering, ordering and summaries over catalog entries.

use std::{cmp::Ordering, collections::BTreeSet, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::problem::{Difficulty, Problem};

/// Filter applied to a list of catalog entries. Empty criteria match all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemQuery {
    /// Case-insensitive match on title and topic; plain substring on serial.
    pub search: Option<String>,
    pub difficulty: Option<Difficulty>,
    /// Matches any comma-separated tag, case-insensitively.
    pub topic: Option<String>,
}

impl ProblemQuery {
    /// Returns `true` if no criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search.as_deref().is_none_or(|s| s.trim().is_empty())
            && self.difficulty.is_none()
            && self.topic.as_deref().is_none_or(|t| t.trim().is_empty())
    }

    /// Returns `true` if `problem` satisfies every criterion.
    #[must_use]
    pub fn matches(&self, problem: &Problem) -> bool {
        self.matches_search(problem) && self.matches_difficulty(problem) && self.matches_topic(problem)
    }

    /// Keeps the matching entries, preserving their order.
    #[must_use]
    pub fn apply(&self, problems: Vec<Problem>) -> Vec<Problem> {
        if self.is_empty() {
            return problems;
        }
        problems.into_iter().filter(|p| self.matches(p)).collect()
    }

    fn matches_search(&self, problem: &Problem) -> bool {
        let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return true;
        };
        let needle = term.to_lowercase();
        problem.title.to_lowercase().contains(&needle)
            || problem.serial.to_string().contains(term)
            || problem.topic.to_lowercase().contains(&needle)
    }

    fn matches_difficulty(&self, problem: &Problem) -> bool {
        self.difficulty.is_none_or(|d| d == problem.difficulty)
    }

    fn matches_topic(&self, problem: &Problem) -> bool {
        let Some(wanted) = self.topic.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return true;
        };
        problem.tags().any(|tag| tag.eq_ignore_ascii_case(wanted))
    }
}

/// Orders two entries by serial: numbers ascending first, then text.
#[must_use]
pub fn compare_serials(a: &Problem, b: &Problem) -> Ordering {
    match (a.serial.as_number(), b.serial.as_number()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.serial.to_string().cmp(&b.serial.to_string()),
    }
}

/// Stable sort of `problems` by [`compare_serials`].
pub fn sort_by_serial(problems: &mut [Problem]) {
    problems.sort_by(compare_serials);
}

/// Per-difficulty totals and the distinct topic tags of a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub total: usize,
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
    /// Distinct tags, sorted.
    pub topics: Vec<String>,
}

impl CatalogSummary {
    #[must_use]
    pub fn of(problems: &[Problem]) -> Self {
        let count = |d: Difficulty| problems.iter().filter(|p| p.difficulty == d).count();
        let topics: BTreeSet<&str> = problems.iter().flat_map(Problem::tags).collect();
        Self {
            total: problems.len(),
            easy: count(Difficulty::Easy),
            medium: count(Difficulty::Medium),
            hard: count(Difficulty::Hard),
            topics: topics.into_iter().map(str::to_owned).collect(),
        }
    }
}

static YOUTUBE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*(youtu.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*")
        .expect("valid youtube pattern")
});

/// Extracts the 11-character video id from a YouTube link, if any.
#[must_use]
pub fn youtube_video_id(url: &str) -> Option<&str> {
    let id = YOUTUBE_ID.captures(url)?.get(2)?.as_str();
    (id.len() == 11).then_some(id)
}

//! Sample catalog entries used by tests, fuzzing and local demos.

use crate::{
    id::ProblemId,
    problem::{Difficulty, Problem, ProblemDraft, Serial},
};

/// Returns three valid drafts covering every difficulty and both serial kinds.
#[must_use]
pub fn sample_drafts() -> Vec<ProblemDraft> {
    vec![
        ProblemDraft {
            serial: Serial::Number(1),
            title: "Two Sum".to_owned(),
            difficulty: Difficulty::Easy,
            topic: "Array, Hash Table".to_owned(),
            question_link: "https://leetcode.com/problems/two-sum/".to_owned(),
            solution_link: "https://www.youtube.com/watch?v=KLlXCFG5TnA".to_owned(),
        },
        ProblemDraft {
            serial: Serial::Text("3".to_owned()),
            title: "Longest Substring Without Repeating Characters".to_owned(),
            difficulty: Difficulty::Medium,
            topic: "String, Sliding Window".to_owned(),
            question_link: "https://leetcode.com/problems/longest-substring-without-repeating-characters/"
                .to_owned(),
            solution_link: String::new(),
        },
        ProblemDraft {
            serial: Serial::Number(4),
            title: "Median of Two Sorted Arrays".to_owned(),
            difficulty: Difficulty::Hard,
            topic: "Array, Binary Search".to_owned(),
            question_link: "https://leetcode.com/problems/median-of-two-sorted-arrays/".to_owned(),
            solution_link: "https://youtu.be/q6IEA26hvXc".to_owned(),
        },
    ]
}

/// [`sample_drafts`] with deterministic ids `sample-1`, `sample-2`, `sample-3`.
#[must_use]
pub fn sample_problems() -> Vec<Problem> {
    sample_drafts()
        .into_iter()
        .enumerate()
        .map(|(i, draft)| Problem::from_draft(ProblemId::new(format!("sample-{}", i + 1)), draft))
        .collect()
}

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::CoreError,
    id::{ProblemId, SerialKey},
};

/// User-assigned identifier of a catalog entry, either numeric or textual.
///
/// Serialised untagged so that `12` and `"12"` round-trip as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Serial {
    /// A JSON integer serial.
    Number(i64),
    /// A textual serial, e.g. `"42"` or `"two-sum"`.
    Text(String),
}

impl Serial {
    /// Returns the canonical key used for uniqueness checks.
    ///
    /// Numeric-looking text collapses onto the numeric form, so `12`, `"12"`,
    /// `" 12 "` and `"12.0"` share the key `12`. Other text is keyed by its
    /// trimmed form.
    #[must_use]
    pub fn key(&self) -> SerialKey {
        match self {
            Serial::Number(n) => SerialKey::new(n.to_string()),
            Serial::Text(text) => {
                let trimmed = text.trim();
                if let Ok(n) = trimmed.parse::<i64>() {
                    return SerialKey::new(n.to_string());
                }
                match trimmed.parse::<f64>() {
                    Ok(f) if f.is_finite() => SerialKey::new(canonical_float(f)),
                    _ => SerialKey::new(trimmed.to_owned()),
                }
            }
        }
    }

    /// Returns the numeric value if the serial is a number or numeric text.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            #[expect(clippy::cast_precision_loss, reason = "ordering only")]
            Serial::Number(n) => Some(*n as f64),
            Serial::Text(text) => text.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        }
    }
}

#[expect(clippy::cast_possible_truncation, reason = "guarded by the range check")]
fn canonical_float(f: f64) -> String {
    const EXACT_INT_LIMIT: f64 = 9_007_199_254_740_992.0;
    if f.fract() == 0.0 && f.abs() < EXACT_INT_LIMIT {
        (f as i64).to_string()
    } else {
        f.to_string()
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Serial::Number(n) => write!(f, "{n}"),
            Serial::Text(text) => f.write_str(text),
        }
    }
}

/// Difficulty rating of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// All difficulties in ascending order.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Returns the canonical label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = CoreError;

    /// Parses a label case-insensitively, ignoring surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CoreError::InvalidDifficulty { value: s.to_owned() })
    }
}

/// A validated and sanitised catalog entry that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDraft {
    pub serial: Serial,
    pub title: String,
    pub difficulty: Difficulty,
    /// Comma-separable tag list, e.g. `"Array, Hash Table"`.
    pub topic: String,
    pub question_link: String,
    /// Empty when no valid solution link was supplied.
    pub solution_link: String,
}

impl ProblemDraft {
    /// Shorthand for `self.serial.key()`.
    #[must_use]
    pub fn serial_key(&self) -> SerialKey {
        self.serial.key()
    }
}

/// A stored catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    #[serde(rename = "_id")]
    pub id: ProblemId,
    pub serial: Serial,
    pub title: String,
    pub difficulty: Difficulty,
    pub topic: String,
    pub question_link: String,
    pub solution_link: String,
}

impl Problem {
    /// Attaches a store-assigned id to a draft.
    #[must_use]
    pub fn from_draft(id: ProblemId, draft: ProblemDraft) -> Self {
        Self {
            id,
            serial: draft.serial,
            title: draft.title,
            difficulty: draft.difficulty,
            topic: draft.topic,
            question_link: draft.question_link,
            solution_link: draft.solution_link,
        }
    }

    /// Iterates the non-empty, trimmed tags of the topic list.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.topic.split(',').map(str::trim).filter(|t| !t.is_empty())
    }
}

/// A stored admin credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCredential {
    pub username: String,
    /// bcrypt hash of the password.
    pub password_hash: String,
}

impl AdminCredential {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_key_collapses_numeric_text_onto_number() {
        let number = Serial::Number(12);
        assert_eq!(number.key(), Serial::Text("12".to_owned()).key());
        assert_eq!(number.key(), Serial::Text(" 12 ".to_owned()).key());
        assert_eq!(number.key(), Serial::Text("12.0".to_owned()).key());
        assert_eq!(number.key().as_str(), "12");
    }

    #[test]
    fn serial_key_keeps_non_numeric_text() {
        let key = Serial::Text("two-sum".to_owned()).key();
        assert_eq!(key.as_str(), "two-sum");
        assert_ne!(key, Serial::Text("Two-Sum".to_owned()).key());
    }

    #[test]
    fn serial_key_rejects_non_finite_as_number() {
        assert_eq!(Serial::Text("NaN".to_owned()).key().as_str(), "NaN");
        assert_eq!(Serial::Text("inf".to_owned()).key().as_str(), "inf");
        assert_eq!(Serial::Text("1.5".to_owned()).key().as_str(), "1.5");
    }

    #[test]
    fn serial_serializes_untagged() {
        let json = match serde_json::to_string(&vec![Serial::Number(7), Serial::Text("7".to_owned())]) {
            Ok(s) => s,
            Err(e) => panic!("serialization failed: {e}"),
        };
        assert_eq!(json, r#"[7,"7"]"#);
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert!(matches!("easy".parse::<Difficulty>(), Ok(Difficulty::Easy)));
        assert!(matches!(" HARD ".parse::<Difficulty>(), Ok(Difficulty::Hard)));
        assert!(matches!(
            "Extreme".parse::<Difficulty>(),
            Err(CoreError::InvalidDifficulty { .. })
        ));
    }

    #[test]
    fn problem_serializes_with_wire_field_names() {
        let problem = Problem {
            id: ProblemId::new("abc"),
            serial: Serial::Number(1),
            title: "Two Sum".to_owned(),
            difficulty: Difficulty::Easy,
            topic: "Array, Hash Table".to_owned(),
            question_link: "https://leetcode.com/problems/two-sum/".to_owned(),
            solution_link: String::new(),
        };
        let value = match serde_json::to_value(&problem) {
            Ok(v) => v,
            Err(e) => panic!("serialization failed: {e}"),
        };
        assert_eq!(value["_id"], "abc");
        assert_eq!(value["serial"], 1);
        assert_eq!(value["difficulty"], "Easy");
        assert_eq!(value["questionLink"], "https://leetcode.com/problems/two-sum/");
        assert_eq!(value["solutionLink"], "");
    }

    #[test]
    fn problem_tags_split_and_trim() {
        let problem = Problem {
            id: ProblemId::new("abc"),
            serial: Serial::Number(1),
            title: "Two Sum".to_owned(),
            difficulty: Difficulty::Easy,
            topic: "Array, Hash Table,, ".to_owned(),
            question_link: String::new(),
            solution_link: String::new(),
        };
        let tags: Vec<&str> = problem.tags().collect();
        assert_eq!(tags, vec!["Array", "Hash Table"]);
    }
}

//! Presence, type, length and URL-shape checks for catalog payloads, plus the
//! sanitisation applied before anything is written.

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::{
    error::ValidationError,
    problem::{Difficulty, ProblemDraft, Serial},
};

pub const MAX_SERIAL_LEN: usize = 32;
pub const MAX_TEXT_LEN: usize = 200;
pub const MAX_URL_LEN: usize = 2048;
pub const MIN_PASSWORD_LEN: usize = 8;
/// bcrypt ignores input past 72 bytes.
pub const MAX_PASSWORD_LEN: usize = 72;

/// Raw catalog payload as received over the wire.
///
/// Every field is an untyped JSON value so that type errors surface as
/// [`ValidationError`]s instead of deserialisation failures. Unknown fields
/// are ignored and never stored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemInput {
    #[serde(rename = "_id")]
    pub id: Option<Value>,
    pub serial: Option<Value>,
    pub title: Option<Value>,
    pub difficulty: Option<Value>,
    pub topic: Option<Value>,
    pub question_link: Option<Value>,
    pub solution_link: Option<Value>,
}

/// Validates and sanitises a catalog payload into a [`ProblemDraft`].
///
/// # Errors
/// Returns the first [`ValidationError`] encountered, in field order.
pub fn validate_problem(input: &ProblemInput) -> Result<ProblemDraft, ValidationError> {
    let serial = validate_serial(input.serial.as_ref())?;
    let title = required_text("title", input.title.as_ref(), MAX_TEXT_LEN)?;
    let difficulty = validate_difficulty(input.difficulty.as_ref())?;
    let topic = required_text("topic", input.topic.as_ref(), MAX_TEXT_LEN)?;
    let question_link = required_url("questionLink", input.question_link.as_ref())?;
    let solution_link = optional_url("solutionLink", input.solution_link.as_ref())?;

    Ok(ProblemDraft {
        serial,
        title: escape_html(&title),
        difficulty,
        topic: escape_html(&topic),
        question_link,
        solution_link,
    })
}

/// Checks the length bounds of a new password.
///
/// # Errors
/// Returns [`ValidationError::PasswordLength`] when out of range.
pub fn validate_new_password(password: &str) -> Result<(), ValidationError> {
    if (MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&password.len()) {
        Ok(())
    } else {
        Err(ValidationError::PasswordLength {
            min: MIN_PASSWORD_LEN,
            max: MAX_PASSWORD_LEN,
        })
    }
}

/// Escapes the five HTML-significant characters.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

/// Trims `raw` and returns it if it is an absolute http(s) URL with a host.
#[must_use]
pub fn normalize_link(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).ok()?;
    let web = matches!(parsed.scheme(), "http" | "https");
    (web && parsed.has_host()).then(|| trimmed.to_owned())
}

fn validate_serial(value: Option<&Value>) -> Result<Serial, ValidationError> {
    const FIELD: &str = "serial";
    match value {
        None => Err(ValidationError::Missing { field: FIELD }),
        Some(Value::Number(n)) => n.as_i64().map(Serial::Number).ok_or(ValidationError::WrongType {
            field: FIELD,
            expected: "an integer or a string",
        }),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::Empty { field: FIELD });
            }
            if trimmed.chars().count() > MAX_SERIAL_LEN {
                return Err(ValidationError::TooLong {
                    field: FIELD,
                    max: MAX_SERIAL_LEN,
                });
            }
            Ok(Serial::Text(escape_html(trimmed)))
        }
        Some(_) => Err(ValidationError::WrongType {
            field: FIELD,
            expected: "an integer or a string",
        }),
    }
}

fn validate_difficulty(value: Option<&Value>) -> Result<Difficulty, ValidationError> {
    let raw = required_str("difficulty", value)?;
    raw.parse().map_err(|_| ValidationError::InvalidDifficulty)
}

fn required_str<'a>(field: &'static str, value: Option<&'a Value>) -> Result<&'a str, ValidationError> {
    match value {
        None => Err(ValidationError::Missing { field }),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "a string",
        }),
    }
}

fn required_text(field: &'static str, value: Option<&Value>, max: usize) -> Result<String, ValidationError> {
    let trimmed = required_str(field, value)?.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

fn required_url(field: &'static str, value: Option<&Value>) -> Result<String, ValidationError> {
    let raw = required_str(field, value)?;
    if raw.len() > MAX_URL_LEN {
        return Err(ValidationError::TooLong { field, max: MAX_URL_LEN });
    }
    normalize_link(raw).ok_or(ValidationError::InvalidUrl { field })
}

fn optional_url(field: &'static str, value: Option<&Value>) -> Result<String, ValidationError> {
    if value.is_none() {
        return Ok(String::new());
    }
    let raw = required_str(field, value)?;
    if raw.len() > MAX_URL_LEN {
        return Err(ValidationError::TooLong { field, max: MAX_URL_LEN });
    }
    Ok(normalize_link(raw).unwrap_or_default())
}

//! Core types for the problemset interview-problem catalog.
//!
//! Defines catalog entries and their serials, admin credentials, payload
//! validation and sanitisation, in-memory list queries, and the client-local
//! progress record.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod id;
pub mod problem;
pub mod progress;
pub mod query;
pub mod samples;
pub mod validate;

pub use error::{CoreError, ValidationError};
pub use id::{ProblemId, SerialKey};
pub use problem::{AdminCredential, Difficulty, Problem, ProblemDraft, Serial};
pub use progress::{LocalStore, ProgressEntry, ProgressRecord, ProgressSummary};
pub use query::{CatalogSummary, ProblemQuery};
pub use validate::{validate_new_password, validate_problem, ProblemInput};

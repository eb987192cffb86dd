//! Per-visitor progress tracking.
//!
//! Progress lives entirely on the client: a single keyed record mapping entry
//! id to `{done, revised}` inside a local key-value store. The server never
//! reads or writes it.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{error::CoreError, id::ProblemId, problem::Problem};

/// Key under which the progress record is persisted.
pub const PROGRESS_KEY: &str = "leetcode-progress";

/// Completion flags for one catalog entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub done: bool,
    pub revised: bool,
}

/// Mapping from entry id to its completion flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressRecord(BTreeMap<ProblemId, ProgressEntry>);

impl ProgressRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags for `id`; untracked entries are neither done nor revised.
    #[must_use]
    pub fn get(&self, id: &ProblemId) -> ProgressEntry {
        self.0.get(id).copied().unwrap_or_default()
    }

    /// Flips the `done` flag and returns the new value.
    pub fn toggle_done(&mut self, id: &ProblemId) -> bool {
        let entry = self.0.entry(id.clone()).or_default();
        entry.done = !entry.done;
        entry.done
    }

    /// Flips the `revised` flag and returns the new value.
    pub fn toggle_revised(&mut self, id: &ProblemId) -> bool {
        let entry = self.0.entry(id.clone()).or_default();
        entry.revised = !entry.revised;
        entry.revised
    }

    /// Drops entries whose id is not in `problems`, e.g. after a delete.
    pub fn retain_known(&mut self, problems: &[Problem]) {
        self.0.retain(|id, _| problems.iter().any(|p| &p.id == id));
    }

    /// Done/revised totals over the given catalog.
    #[must_use]
    pub fn summary(&self, problems: &[Problem]) -> ProgressSummary {
        let done = problems.iter().filter(|p| self.get(&p.id).done).count();
        let revised = problems.iter().filter(|p| self.get(&p.id).revised).count();
        ProgressSummary {
            total: problems.len(),
            done,
            revised,
            done_percent: percent(done, problems.len()),
            revised_percent: percent(revised, problems.len()),
        }
    }
}

/// Aggregate progress over a catalog. Percentages are rounded half up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub total: usize,
    pub done: usize,
    pub revised: usize,
    pub done_percent: usize,
    pub revised_percent: usize,
}

fn percent(part: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    (part * 200 + total) / (total * 2)
}

/// Client-local string key-value store, the shape of browser local storage.
pub trait LocalStore {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    /// Returns [`CoreError::LocalStore`] if the backing medium fails.
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns [`CoreError::LocalStore`] if the backing medium fails.
    fn set(&mut self, key: &str, value: String) -> Result<(), CoreError>;
}

/// Volatile [`LocalStore`].
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    values: HashMap<String, String>,
}

impl MemoryLocalStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), CoreError> {
        self.values.insert(key.to_owned(), value);
        Ok(())
    }
}

/// [`LocalStore`] persisted as one JSON object file.
///
/// Writes go to a sibling temp file that is then renamed over the target.
#[derive(Debug, Clone)]
pub struct FileLocalStore {
    path: PathBuf,
}

impl FileLocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, CoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl LocalStore for FileLocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), CoreError> {
        let mut values = self.read_all()?;
        values.insert(key.to_owned(), value);
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&values)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Loads the progress record, or an empty one if nothing was saved yet.
///
/// # Errors
/// Returns [`CoreError::CorruptProgress`] if the stored value is not a valid
/// record, or any error of the underlying store.
pub fn load_progress(store: &dyn LocalStore) -> Result<ProgressRecord, CoreError> {
    match store.get(PROGRESS_KEY)? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(ProgressRecord::new()),
    }
}

/// Persists the progress record under [`PROGRESS_KEY`].
///
/// # Errors
/// Propagates serialisation and store errors.
pub fn save_progress(store: &mut dyn LocalStore, record: &ProgressRecord) -> Result<(), CoreError> {
    let raw = serde_json::to_string(record)?;
    store.set(PROGRESS_KEY, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::sample_problems;

    #[test]
    fn toggles_flip_independently() {
        let mut record = ProgressRecord::new();
        let id = ProblemId::new("p1");
        assert_eq!(record.get(&id), ProgressEntry::default());
        assert!(record.toggle_done(&id));
        assert!(record.toggle_revised(&id));
        assert!(!record.toggle_done(&id));
        assert_eq!(record.get(&id), ProgressEntry { done: false, revised: true });
    }

    #[test]
    fn summary_rounds_percentages() {
        let problems = sample_problems();
        let mut record = ProgressRecord::new();
        record.toggle_done(&problems[0].id);
        record.toggle_revised(&problems[0].id);
        record.toggle_revised(&problems[1].id);
        let summary = record.summary(&problems);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.done, 1);
        assert_eq!(summary.revised, 2);
        assert_eq!(summary.done_percent, 33);
        assert_eq!(summary.revised_percent, 67);
    }

    #[test]
    fn summary_of_empty_catalog_is_zero() {
        assert_eq!(ProgressRecord::new().summary(&[]), ProgressSummary::default());
    }

    #[test]
    fn retain_known_drops_deleted_entries() {
        let problems = sample_problems();
        let mut record = ProgressRecord::new();
        record.toggle_done(&problems[0].id);
        record.toggle_done(&ProblemId::new("gone"));
        record.retain_known(&problems);
        assert!(!record.get(&ProblemId::new("gone")).done);
        assert!(record.get(&problems[0].id).done);
    }

    #[test]
    fn record_persists_as_keyed_object() {
        let mut store = MemoryLocalStore::new();
        let mut record = ProgressRecord::new();
        record.toggle_done(&ProblemId::new("abc"));
        if let Err(e) = save_progress(&mut store, &record) {
            panic!("save failed: {e}");
        }
        let raw = match store.get(PROGRESS_KEY) {
            Ok(Some(raw)) => raw,
            other => panic!("expected stored value, got {other:?}"),
        };
        assert_eq!(raw, r#"{"abc":{"done":true,"revised":false}}"#);
        let loaded = match load_progress(&store) {
            Ok(r) => r,
            Err(e) => panic!("load failed: {e}"),
        };
        assert_eq!(loaded, record);
    }

    #[test]
    fn corrupt_record_is_reported() {
        let mut store = MemoryLocalStore::new();
        if let Err(e) = store.set(PROGRESS_KEY, "not json".to_owned()) {
            panic!("set failed: {e}");
        }
        assert!(matches!(load_progress(&store), Err(CoreError::CorruptProgress(_))));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = match tempfile::tempdir() {
            Ok(d) => d,
            Err(e) => panic!("tempdir failed: {e}"),
        };
        let path = dir.path().join("local-storage.json");

        let mut store = FileLocalStore::new(&path);
        assert!(matches!(load_progress(&store), Ok(r) if r == ProgressRecord::new()));

        let mut record = ProgressRecord::new();
        record.toggle_revised(&ProblemId::new("xyz"));
        if let Err(e) = save_progress(&mut store, &record) {
            panic!("save failed: {e}");
        }

        let reopened = FileLocalStore::new(&path);
        let loaded = match load_progress(&reopened) {
            Ok(r) => r,
            Err(e) => panic!("load failed: {e}"),
        };
        assert!(loaded.get(&ProblemId::new("xyz")).revised);
    }
}

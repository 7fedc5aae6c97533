use std::collections::{HashMap, HashSet};

use shared::domain::{UserId, UserRecord};
use tracing::warn;

/// UI-only status of one record. Absent from the store means idle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStatus {
    pub deleting: bool,
    pub delete_error: Option<String>,
}

impl RecordStatus {
    fn is_idle(&self) -> bool {
        !self.deleting && self.delete_error.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchToken(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchApplied {
    Loaded { count: usize },
    Failed,
    Stale,
}

/// The record collection plus collection-level and per-record transient
/// state. `version` changes whenever the set or order of records changes.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<UserRecord>,
    statuses: HashMap<UserId, RecordStatus>,
    loading: bool,
    error: Option<String>,
    version: u64,
    last_fetch: u64,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[UserRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn contains(&self, id: &UserId) -> bool {
        self.records.iter().any(|record| &record.id == id)
    }

    pub fn status(&self, id: &UserId) -> RecordStatus {
        self.statuses.get(id).cloned().unwrap_or_default()
    }

    /// Marks a fetch in flight. Only the outcome carrying the newest token is
    /// applied.
    pub fn begin_fetch(&mut self) -> FetchToken {
        self.last_fetch += 1;
        self.loading = true;
        FetchToken(self.last_fetch)
    }

    /// On success the fetched records become the collection: delete errors
    /// are cleared, in-flight deletes of records still present keep their
    /// status, and status of records no longer present is dropped. On failure
    /// the last good collection is kept.
    pub fn apply_fetch(
        &mut self,
        token: FetchToken,
        outcome: Result<Vec<UserRecord>, String>,
    ) -> FetchApplied {
        if token.0 != self.last_fetch {
            return FetchApplied::Stale;
        }
        self.loading = false;

        match outcome {
            Ok(records) => {
                self.records = dedupe_by_id(records);
                self.error = None;
                let present: HashSet<&UserId> = self.records.iter().map(|r| &r.id).collect();
                self.statuses.retain(|id, status| {
                    status.delete_error = None;
                    present.contains(id) && !status.is_idle()
                });
                self.version += 1;
                FetchApplied::Loaded {
                    count: self.records.len(),
                }
            }
            Err(reason) => {
                self.error = Some(reason);
                FetchApplied::Failed
            }
        }
    }

    /// Returns false when the record is not in the collection.
    pub fn mark_deleting(&mut self, id: &UserId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.statuses.insert(
            id.clone(),
            RecordStatus {
                deleting: true,
                delete_error: None,
            },
        );
        true
    }

    pub fn mark_delete_failed(&mut self, id: &UserId, reason: String) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.statuses.insert(
            id.clone(),
            RecordStatus {
                deleting: false,
                delete_error: Some(reason),
            },
        );
        true
    }

    pub fn remove(&mut self, id: &UserId) -> bool {
        let before = self.records.len();
        self.records.retain(|record| &record.id != id);
        self.statuses.remove(id);
        if self.records.len() == before {
            return false;
        }
        self.version += 1;
        true
    }
}

fn dedupe_by_id(records: Vec<UserRecord>) -> Vec<UserRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    let mut unique = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(record.id.clone()) {
            unique.push(record);
        } else {
            warn!(record_id = %record.id, "store: dropping duplicate record id from fetch");
        }
    }
    unique
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;

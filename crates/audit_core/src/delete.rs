//! Per-record delete state machine.
//!
//! Idle -> Deleting on request, Deleting -> removed on success, Deleting ->
//! Errored on failure, Errored -> Deleting on retry. Each request gets a
//! token; a failure only applies when it belongs to the newest request for
//! the record, while a success from any request removes it.

use std::collections::HashMap;

use shared::domain::UserId;

use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteToken(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletePhase {
    Idle,
    Deleting,
    Errored(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteResolution {
    Removed,
    Failed(String),
    /// A failure overtaken by a newer request, or an outcome for a record a
    /// fetch or earlier success already dropped.
    Superseded,
    /// The record left the collection before the outcome arrived.
    Vanished,
}

#[derive(Debug, Default)]
pub struct DeleteLifecycle {
    inflight: HashMap<UserId, DeleteToken>,
    next_token: u64,
}

impl DeleteLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a delete of `id`. Returns `None` when the record is absent.
    pub fn request(&mut self, store: &mut RecordStore, id: &UserId) -> Option<DeleteToken> {
        if !store.mark_deleting(id) {
            return None;
        }
        self.next_token += 1;
        let token = DeleteToken(self.next_token);
        self.inflight.insert(id.clone(), token);
        Some(token)
    }

    pub fn resolve(
        &mut self,
        store: &mut RecordStore,
        id: &UserId,
        token: DeleteToken,
        outcome: Result<(), String>,
    ) -> DeleteResolution {
        let current = self.inflight.get(id) == Some(&token);
        match outcome {
            // The server already dropped the record, whichever request did it.
            Ok(()) => {
                self.inflight.remove(id);
                if store.remove(id) {
                    DeleteResolution::Removed
                } else if current {
                    DeleteResolution::Vanished
                } else {
                    DeleteResolution::Superseded
                }
            }
            Err(_) if !current => DeleteResolution::Superseded,
            Err(reason) => {
                self.inflight.remove(id);
                if store.mark_delete_failed(id, reason.clone()) {
                    DeleteResolution::Failed(reason)
                } else {
                    DeleteResolution::Vanished
                }
            }
        }
    }

    pub fn phase(&self, store: &RecordStore, id: &UserId) -> DeletePhase {
        let status = store.status(id);
        match (status.deleting, status.delete_error) {
            (true, _) => DeletePhase::Deleting,
            (false, Some(reason)) => DeletePhase::Errored(reason),
            (false, None) => DeletePhase::Idle,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    /// Drops tokens of records a fetch removed so their late outcomes are
    /// treated as superseded.
    pub fn forget_absent(&mut self, store: &RecordStore) {
        self.inflight.retain(|id, _| store.contains(id));
    }
}

#[cfg(test)]
#[path = "tests/delete_tests.rs"]
mod tests;

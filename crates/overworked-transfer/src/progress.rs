//! Per-transfer progress tracking
//!
//! Every upload gets its own entry keyed by a [`TransferId`], so concurrent
//! files never overwrite each other. Each entry is a watch channel: the
//! interface layer can follow one transfer or take a snapshot of all of them.

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use uuid::Uuid;

/// Identifier of one transfer task, independent of the remote file id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferId(Uuid);

impl TransferId {
    pub fn new() -> Self {
        TransferId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TransferId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a single file upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferState {
    Pending,
    Registering,
    Uploading { chunk: usize, of: usize },
    RegistrationFailed,
    ChunkFailed { chunk: usize },
    Completed,
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferState::RegistrationFailed
                | TransferState::ChunkFailed { .. }
                | TransferState::Completed
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferProgress {
    pub file_name: String,
    /// Remote identifier, set once registration succeeds.
    pub file_id: Option<String>,
    pub state: TransferState,
    pub chunks_sent: usize,
    pub total_chunks: usize,
}

impl TransferProgress {
    fn new(file_name: String, total_chunks: usize) -> Self {
        TransferProgress {
            file_name,
            file_id: None,
            state: TransferState::Pending,
            chunks_sent: 0,
            total_chunks,
        }
    }

    /// Acknowledged chunks over total, in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total_chunks == 0 {
            return if self.state == TransferState::Completed {
                1.0
            } else {
                0.0
            };
        }
        self.chunks_sent as f64 / self.total_chunks as f64
    }
}

/// Registry of progress channels, cheap to clone and share.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    entries: Arc<Mutex<HashMap<TransferId, watch::Sender<TransferProgress>>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<TransferId, watch::Sender<TransferProgress>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a new entry in the `Pending` state.
    pub fn begin(&self, file_name: impl Into<String>, total_chunks: usize) -> TransferId {
        let id = TransferId::new();
        let (tx, _rx) = watch::channel(TransferProgress::new(file_name.into(), total_chunks));
        self.entries().insert(id, tx);
        id
    }

    /// Apply `f` to an entry and notify its subscribers.
    ///
    /// Unknown ids are ignored; the entry may already have been removed.
    pub fn update<F>(&self, id: TransferId, f: F)
    where
        F: FnOnce(&mut TransferProgress),
    {
        if let Some(tx) = self.entries().get(&id) {
            tx.send_modify(f);
        }
    }

    pub fn set_state(&self, id: TransferId, state: TransferState) {
        self.update(id, |p| p.state = state);
    }

    pub fn set_file_id(&self, id: TransferId, file_id: &str) {
        self.update(id, |p| p.file_id = Some(file_id.to_string()));
    }

    pub fn record_chunk(&self, id: TransferId, chunks_sent: usize) {
        self.update(id, |p| p.chunks_sent = chunks_sent);
    }

    pub fn subscribe(&self, id: TransferId) -> Option<watch::Receiver<TransferProgress>> {
        self.entries().get(&id).map(|tx| tx.subscribe())
    }

    pub fn get(&self, id: TransferId) -> Option<TransferProgress> {
        self.entries().get(&id).map(|tx| tx.borrow().clone())
    }

    /// Transfer attached to the given remote file id, if any.
    pub fn find_by_file_id(&self, file_id: &str) -> Option<(TransferId, TransferProgress)> {
        self.entries()
            .iter()
            .map(|(id, tx)| (*id, tx.borrow().clone()))
            .find(|(_, p)| p.file_id.as_deref() == Some(file_id))
    }

    pub fn snapshot(&self) -> Vec<(TransferId, TransferProgress)> {
        self.entries()
            .iter()
            .map(|(id, tx)| (*id, tx.borrow().clone()))
            .collect()
    }

    pub fn remove(&self, id: TransferId) -> Option<TransferProgress> {
        self.entries().remove(&id).map(|tx| tx.borrow().clone())
    }

    /// Drop every entry that reached a terminal state. Returns how many went.
    pub fn clear_finished(&self) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, tx| !tx.borrow().state.is_terminal());
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

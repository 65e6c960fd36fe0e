//! Resumable upload sessions
//!
//! A session records which chunks of a registered file the store has
//! acknowledged. Acknowledgments form a contiguous prefix because chunks are
//! sent strictly in order.

use crate::error::{TransferError, TransferResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSession {
    session_id: Uuid,
    file_id: String,
    file_name: String,
    total_chunks: usize,
    acknowledged: usize,
    finalized: bool,
}

impl TransferSession {
    pub fn new(file_id: impl Into<String>, file_name: impl Into<String>, total_chunks: usize) -> Self {
        TransferSession {
            session_id: Uuid::new_v4(),
            file_id: file_id.into(),
            file_name: file_name.into(),
            total_chunks,
            acknowledged: 0,
            finalized: false,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn total_chunks(&self) -> usize {
        self.total_chunks
    }

    /// Number of chunks acknowledged so far.
    pub fn acknowledged(&self) -> usize {
        self.acknowledged
    }

    /// Index of the first chunk still to send.
    pub fn next_index(&self) -> usize {
        self.acknowledged
    }

    pub fn remaining(&self) -> usize {
        self.total_chunks - self.acknowledged
    }

    /// True once the store accepted the final chunk.
    pub fn is_complete(&self) -> bool {
        self.finalized
    }

    /// Record that the store accepted chunk `index`.
    ///
    /// Only the next expected index is accepted. Acknowledging the last index
    /// completes the session.
    pub fn acknowledge(&mut self, index: usize) -> TransferResult<()> {
        if self.finalized || index != self.acknowledged || index >= self.total_chunks {
            return Err(TransferError::SessionMismatch(format!(
                "Unexpected acknowledgment for chunk {} (next is {} of {})",
                index, self.acknowledged, self.total_chunks
            )));
        }

        self.acknowledged += 1;
        if self.acknowledged == self.total_chunks {
            self.finalized = true;
        }
        Ok(())
    }

    /// Record the finalizing call of a file with no chunks.
    pub fn finalize_empty(&mut self) -> TransferResult<()> {
        if self.total_chunks != 0 {
            return Err(TransferError::SessionMismatch(format!(
                "Session for {} still expects {} chunks",
                self.file_id,
                self.remaining()
            )));
        }
        self.finalized = true;
        Ok(())
    }
}

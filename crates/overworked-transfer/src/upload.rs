//! Upload sequencing
//!
//! One file goes through: register metadata, then send each chunk in index
//! order, awaiting the store's acknowledgment before issuing the next. The
//! last chunk carries the `done` flag. A file without chunks gets a single
//! empty finalizing call so the store still stamps its upload time.
//!
//! Failures never escape as errors; every attempt ends in an
//! [`UploadOutcome`]. When a chunk fails after registration the partial
//! record is either deleted remotely or handed back as a resumable
//! [`TransferSession`], depending on the [`PartialUploadPolicy`].

use crate::chunker::{file_chunks, split_into_chunks};
use crate::error::{log_error, TransferError, TransferResult};
use crate::progress::{ProgressTracker, TransferId, TransferState};
use crate::session::TransferSession;
use bytes::Bytes;
use overworked_core::error::detailed_message;
use overworked_core::{ErrorMetadata, FileChunks, PartialUploadPolicy, StoredFile, UploadOutcome};
use overworked_storage::{RemoteStore, StorageError};
use std::sync::Arc;
use std::time::Instant;

/// Result of one upload attempt.
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub outcome: UploadOutcome,
    /// Progress entry the attempt published to.
    pub transfer_id: Option<TransferId>,
    /// Present when a partial upload was kept and can be resumed.
    pub session: Option<TransferSession>,
}

impl UploadReport {
    pub(crate) fn finished(outcome: UploadOutcome, transfer_id: Option<TransferId>) -> Self {
        UploadReport {
            outcome,
            transfer_id,
            session: None,
        }
    }
}

pub struct UploadSequencer {
    store: Arc<dyn RemoteStore>,
    chunk_size: usize,
    policy: PartialUploadPolicy,
    progress: ProgressTracker,
}

impl UploadSequencer {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        chunk_size: usize,
        policy: PartialUploadPolicy,
        progress: ProgressTracker,
    ) -> Self {
        UploadSequencer {
            store,
            chunk_size,
            policy,
            progress,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn policy(&self) -> PartialUploadPolicy {
        self.policy
    }

    /// Upload `data` under the metadata in `props`.
    ///
    /// Any payload already attached to `props` is replaced by `data`.
    pub async fn upload(&self, data: Bytes, props: StoredFile) -> UploadReport {
        let file = StoredFile {
            size: data.len() as u64,
            data,
            ..props
        };

        match file_chunks(&file, self.chunk_size) {
            Ok(chunks) => self.upload_chunks(&file, chunks).await,
            Err(e) => {
                log_error(&e, &file.name);
                UploadReport::finished(UploadOutcome::from(e), None)
            }
        }
    }

    /// Register `props` and send pre-split `chunks`.
    pub async fn upload_chunks(&self, props: &StoredFile, chunks: FileChunks) -> UploadReport {
        let start = Instant::now();
        let transfer = self.progress.begin(props.name.clone(), chunks.len());

        tracing::info!(
            transfer_id = %transfer,
            file_name = %props.name,
            size_bytes = chunks.total_size(),
            chunk_count = chunks.len(),
            "Starting upload"
        );

        let file_id = match self.register(transfer, props, &chunks).await {
            Ok(file_id) => file_id,
            Err(e) => {
                self.progress
                    .set_state(transfer, TransferState::RegistrationFailed);
                log_error(&e, &props.name);
                return UploadReport::finished(UploadOutcome::from(e), Some(transfer));
            }
        };

        let mut session = TransferSession::new(&file_id, &props.name, chunks.len());
        let report = self.send_chunks(transfer, &mut session, &chunks.chunks).await;

        if report.outcome.resolution.is_success() {
            tracing::info!(
                transfer_id = %transfer,
                file_id = %file_id,
                duration_ms = start.elapsed().as_millis() as u64,
                "Upload completed"
            );
        }

        report
    }

    /// Continue a kept session from its first unacknowledged chunk.
    ///
    /// `data` must be the same source bytes the session was started with.
    /// Chunks the store already holds past the resume point are verified
    /// against the source and acknowledged instead of being sent again. A file
    /// the store already finalized resolves `AlreadyUploaded`.
    pub async fn resume(&self, mut session: TransferSession, data: Bytes) -> UploadReport {
        let file_id = session.file_id().to_string();
        let transfer = self
            .progress
            .begin(session.file_name().to_string(), session.total_chunks());
        self.progress.set_file_id(transfer, &file_id);
        self.progress.record_chunk(transfer, session.acknowledged());

        tracing::info!(
            transfer_id = %transfer,
            file_id = %file_id,
            next_chunk = session.next_index(),
            total_chunks = session.total_chunks(),
            "Resuming upload"
        );

        let chunks = match split_into_chunks(&data, self.chunk_size) {
            Ok(chunks) => chunks,
            Err(e) => {
                log_error(&e, session.file_name());
                return UploadReport {
                    outcome: UploadOutcome::new(&file_id, e.resolution(), e.client_message()),
                    transfer_id: Some(transfer),
                    session: Some(session),
                };
            }
        };

        if let Err(e) = self.check_resumable(&mut session, &chunks).await {
            let state = if matches!(e, TransferError::AlreadyUploaded(_)) {
                TransferState::Completed
            } else {
                TransferState::ChunkFailed {
                    chunk: session.next_index(),
                }
            };
            self.progress.set_state(transfer, state);
            self.progress.record_chunk(transfer, session.acknowledged());
            log_error(&e, session.file_name());

            // Nothing left to resume or abort for these.
            let finished = matches!(
                e,
                TransferError::AlreadyUploaded(_)
                    | TransferError::Storage(StorageError::NotFound(_))
            );
            return UploadReport {
                outcome: UploadOutcome::new(&file_id, e.resolution(), e.client_message()),
                transfer_id: Some(transfer),
                session: (!finished).then_some(session),
            };
        }

        self.progress.record_chunk(transfer, session.acknowledged());
        self.send_chunks(transfer, &mut session, &chunks).await
    }

    /// Remove a kept partial upload from the store.
    pub async fn abort(&self, session: &TransferSession) -> TransferResult<bool> {
        let deleted = self
            .store
            .delete_files(&[session.file_id().to_string()])
            .await?;

        tracing::info!(
            file_id = %session.file_id(),
            acknowledged = session.acknowledged(),
            deleted = deleted,
            "Aborted partial upload"
        );

        Ok(deleted > 0)
    }

    async fn register(
        &self,
        transfer: TransferId,
        props: &StoredFile,
        chunks: &FileChunks,
    ) -> TransferResult<String> {
        self.progress.set_state(transfer, TransferState::Registering);

        let mut metadata = props.without_data();
        metadata.id = String::new();
        metadata.size = chunks.total_size();
        metadata.uploaded_at = None;

        match self.store.add_file(&metadata).await? {
            Some(file_id) => {
                self.progress.set_file_id(transfer, &file_id);
                tracing::debug!(transfer_id = %transfer, file_id = %file_id, "File registered");
                Ok(file_id)
            }
            None => Err(TransferError::RegistrationFailed(format!(
                "Store assigned no id to {}",
                props.name
            ))),
        }
    }

    async fn check_resumable(
        &self,
        session: &mut TransferSession,
        chunks: &[Bytes],
    ) -> TransferResult<()> {
        if session.is_complete() {
            return Err(TransferError::AlreadyUploaded(session.file_id().to_string()));
        }

        if chunks.len() != session.total_chunks() {
            return Err(TransferError::SessionMismatch(format!(
                "Source splits into {} chunks, session expects {}",
                chunks.len(),
                session.total_chunks()
            )));
        }

        match self.store.get_file_by_id(session.file_id()).await? {
            Some(meta) if meta.is_finalized() => {
                return Err(TransferError::AlreadyUploaded(session.file_id().to_string()))
            }
            Some(_) => {}
            None => {
                return Err(TransferError::Storage(StorageError::NotFound(
                    session.file_id().to_string(),
                )))
            }
        }

        self.reconcile_stored_chunks(session, chunks).await
    }

    /// Acknowledge chunks the store holds past the session's resume point.
    ///
    /// A send that failed in transit may still have been applied remotely.
    /// Each stored range must equal the source chunk at the same index; any
    /// difference means the remote file cannot be completed from this source.
    async fn reconcile_stored_chunks(
        &self,
        session: &mut TransferSession,
        chunks: &[Bytes],
    ) -> TransferResult<()> {
        let file_id = session.file_id().to_string();

        while session.next_index() < chunks.len() {
            let index = session.next_index();
            let stored = self
                .store
                .get_bytes(&file_id, self.chunk_size, index)
                .await?;
            if stored.is_empty() {
                break;
            }

            if stored != chunks[index] {
                return Err(TransferError::StoredDataConflict {
                    file_id,
                    index,
                });
            }

            // The last chunk landed without sealing the file.
            if index == chunks.len() - 1
                && !self.store.add_bytes(&file_id, Bytes::new(), true).await?
            {
                return Err(TransferError::ChunkRejected {
                    file_id,
                    index,
                    total: chunks.len(),
                });
            }

            tracing::info!(
                file_id = %file_id,
                chunk_index = index,
                size_bytes = stored.len(),
                "Chunk already stored, acknowledging without resend"
            );
            session.acknowledge(index)?;
        }

        Ok(())
    }

    /// Send every chunk from the session's resume point, then settle the outcome.
    async fn send_chunks(
        &self,
        transfer: TransferId,
        session: &mut TransferSession,
        chunks: &[Bytes],
    ) -> UploadReport {
        let file_id = session.file_id().to_string();

        match self.send_remaining(transfer, session, chunks).await {
            Ok(()) => {
                self.progress.set_state(transfer, TransferState::Completed);
                UploadReport::finished(UploadOutcome::success(file_id), Some(transfer))
            }
            Err(e) => {
                self.progress.set_state(
                    transfer,
                    TransferState::ChunkFailed {
                        chunk: session.next_index(),
                    },
                );
                log_error(&e, session.file_name());

                let outcome = UploadOutcome::new(&file_id, e.resolution(), e.client_message());
                let session = self.settle_partial(session).await;
                UploadReport {
                    outcome,
                    transfer_id: Some(transfer),
                    session,
                }
            }
        }
    }

    async fn send_remaining(
        &self,
        transfer: TransferId,
        session: &mut TransferSession,
        chunks: &[Bytes],
    ) -> TransferResult<()> {
        let total = chunks.len();
        let file_id = session.file_id().to_string();

        if total == 0 {
            self.progress
                .set_state(transfer, TransferState::Uploading { chunk: 0, of: 0 });
            if !self.store.add_bytes(&file_id, Bytes::new(), true).await? {
                return Err(TransferError::ChunkRejected {
                    file_id,
                    index: 0,
                    total,
                });
            }
            return session.finalize_empty();
        }

        for index in session.next_index()..total {
            self.progress
                .set_state(transfer, TransferState::Uploading { chunk: index, of: total });

            let chunk = chunks[index].clone();
            let size = chunk.len();
            let is_last = index == total - 1;

            let accepted = self.store.add_bytes(&file_id, chunk, is_last).await?;
            if !accepted {
                return Err(TransferError::ChunkRejected {
                    file_id,
                    index,
                    total,
                });
            }

            session.acknowledge(index)?;
            self.progress.record_chunk(transfer, session.acknowledged());

            tracing::debug!(
                file_id = %file_id,
                chunk_index = index,
                size_bytes = size,
                is_last = is_last,
                "Chunk acknowledged"
            );
        }

        Ok(())
    }

    /// Apply the partial-upload policy. Returns the session when it is kept.
    async fn settle_partial(&self, session: &TransferSession) -> Option<TransferSession> {
        match self.policy {
            PartialUploadPolicy::Keep => {
                tracing::info!(
                    file_id = %session.file_id(),
                    next_chunk = session.next_index(),
                    "Keeping partial upload for resume"
                );
                Some(session.clone())
            }
            PartialUploadPolicy::Delete => {
                if let Err(e) = self.abort(session).await {
                    tracing::warn!(
                        file_id = %session.file_id(),
                        error = %detailed_message(&e),
                        "Failed to delete partial upload"
                    );
                }
                None
            }
        }
    }
}

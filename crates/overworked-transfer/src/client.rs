//! Storage client
//!
//! Entry point used by the interface layer. Batches fan out with bounded
//! concurrency and settle every file, so `upload_files` and `get_files_by_id`
//! never fail as a whole; per-file problems show up in the results.

use crate::download::RangeFetcher;
use crate::error::{log_error, TransferResult};
use crate::guard::SessionGuard;
use crate::progress::ProgressTracker;
use crate::reassemble::reassemble;
use crate::session::TransferSession;
use crate::upload::{UploadReport, UploadSequencer};
use anyhow::Context;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use overworked_core::{ErrorMetadata, StoredFile, TransferConfig, UploadOutcome};
use overworked_storage::{create_store, RemoteStore};
use std::sync::Arc;

pub struct StorageClient {
    store: Arc<dyn RemoteStore>,
    config: TransferConfig,
    progress: ProgressTracker,
    sequencer: UploadSequencer,
    fetcher: RangeFetcher,
    guard: Option<SessionGuard>,
}

impl StorageClient {
    /// Build a client around an existing store.
    ///
    /// A session guard is installed when the configuration carries a token.
    pub fn new(store: Arc<dyn RemoteStore>, config: TransferConfig) -> Self {
        let progress = ProgressTracker::new();
        let sequencer = UploadSequencer::new(
            Arc::clone(&store),
            config.chunk_size,
            config.partial_upload_policy,
            progress.clone(),
        );
        let fetcher = RangeFetcher::new(Arc::clone(&store), config.chunk_size);
        let guard = config
            .session_token
            .clone()
            .map(|token| SessionGuard::new(Arc::clone(&store), Some(token)));

        StorageClient {
            store,
            config,
            progress,
            sequencer,
            fetcher,
            guard,
        }
    }

    /// Build the configured backend and wrap it.
    pub fn from_config(config: TransferConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let store = create_store(&config).context("Failed to create remote store")?;

        tracing::info!(
            backend = %store.backend_type(),
            chunk_size = config.chunk_size,
            max_concurrent_uploads = config.max_concurrent_uploads,
            partial_upload_policy = %config.partial_upload_policy,
            "Storage client initialized"
        );

        Ok(Self::new(store, config))
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let config = TransferConfig::from_env().context("Failed to load transfer configuration")?;
        Self::from_config(config)
    }

    /// Require a verified session before privileged operations.
    ///
    /// Build the guard over `store()` so the token it verifies is the one the
    /// store presents.
    pub fn with_session_guard(mut self, guard: SessionGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn RemoteStore> {
        &self.store
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn session_guard(&self) -> Option<&SessionGuard> {
        self.guard.as_ref()
    }

    fn concurrency(&self) -> usize {
        self.config.max_concurrent_uploads.max(1)
    }

    async fn authorize(&self) -> TransferResult<()> {
        match &self.guard {
            Some(guard) => guard.authorize().await.map(|_| ()),
            None => Ok(()),
        }
    }

    /// Upload every file and report one outcome per input, in input order.
    pub async fn upload_files(&self, files: Vec<(Bytes, StoredFile)>) -> Vec<UploadOutcome> {
        self.upload_files_with_reports(files)
            .await
            .into_iter()
            .map(|report| report.outcome)
            .collect()
    }

    /// Same as [`upload_files`](Self::upload_files) but keeps progress ids and
    /// resumable sessions.
    pub async fn upload_files_with_reports(
        &self,
        files: Vec<(Bytes, StoredFile)>,
    ) -> Vec<UploadReport> {
        if files.is_empty() {
            return Vec::new();
        }

        if let Err(e) = self.authorize().await {
            log_error(&e, "batch");
            return files
                .iter()
                .map(|_| {
                    UploadReport::finished(
                        UploadOutcome::new("", e.resolution(), e.client_message()),
                        None,
                    )
                })
                .collect();
        }

        tracing::info!(file_count = files.len(), "Uploading batch");

        let sequencer = &self.sequencer;
        stream::iter(files)
            .map(move |(data, props)| sequencer.upload(data, props))
            .buffered(self.concurrency())
            .collect()
            .await
    }

    pub async fn upload_file(&self, data: Bytes, props: StoredFile) -> UploadReport {
        if let Err(e) = self.authorize().await {
            log_error(&e, &props.name);
            return UploadReport::finished(UploadOutcome::from(e), None);
        }

        self.sequencer.upload(data, props).await
    }

    /// Fetch and reassemble one file. Unknown ids and fetch failures give `None`.
    pub async fn get_file_by_id(&self, file_id: &str) -> Option<StoredFile> {
        match self.fetcher.fetch(file_id).await {
            Ok(Some((meta, data))) => Some(reassemble(data, meta)),
            Ok(None) => None,
            Err(e) => {
                log_error(&e, file_id);
                None
            }
        }
    }

    /// Fetch several files, skipping the ones that could not be retrieved.
    pub async fn get_files_by_id(&self, file_ids: &[String]) -> Vec<StoredFile> {
        let client = self;
        stream::iter(file_ids)
            .map(move |file_id| client.get_file_by_id(file_id))
            .buffered(self.concurrency())
            .filter_map(|file| async move { file })
            .collect()
            .await
    }

    /// Delete files owned by the session's principal.
    pub async fn delete_files(&self, file_ids: &[String]) -> TransferResult<usize> {
        self.authorize().await?;
        let deleted = self.store.delete_files(file_ids).await?;
        tracing::info!(requested = file_ids.len(), deleted = deleted, "Files deleted");
        Ok(deleted)
    }

    /// Continue a kept partial upload with the same source bytes.
    pub async fn resume_upload(&self, session: TransferSession, data: Bytes) -> UploadReport {
        if let Err(e) = self.authorize().await {
            log_error(&e, session.file_name());
            return UploadReport {
                outcome: UploadOutcome::new(session.file_id(), e.resolution(), e.client_message()),
                transfer_id: None,
                session: Some(session),
            };
        }

        self.sequencer.resume(session, data).await
    }

    /// Give up on a kept partial upload and delete it remotely.
    pub async fn abort_upload(&self, session: TransferSession) -> TransferResult<bool> {
        self.authorize().await?;
        self.sequencer.abort(&session).await
    }
}

impl std::fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageClient")
            .field("backend", &self.store.backend_type())
            .field("chunk_size", &self.config.chunk_size)
            .field("session_guard", &self.guard.is_some())
            .finish()
    }
}

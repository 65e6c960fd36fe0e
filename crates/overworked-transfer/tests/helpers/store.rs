use async_trait::async_trait;
use bytes::Bytes;
use overworked_core::{Principal, StorageBackend, StoredFile, StoredFileMeta};
use overworked_storage::{MemoryStore, RemoteStore, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    AddFile { name: String },
    AddBytes { file_id: String, len: usize, done: bool },
    GetFileById { file_id: String },
    GetBytes { file_id: String, chunk_size: usize, chunk_index: usize },
    DeleteFiles { file_ids: Vec<String> },
    VerifySession,
}

#[derive(Debug, Clone, Copy)]
enum ChunkFailure {
    Reject(usize),
    Transport(usize),
    TransportAfterApply(usize),
}

/// Memory store that records every call and can be told to misbehave.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    calls: Mutex<Vec<StoreCall>>,
    refuse_registration: Mutex<bool>,
    chunk_failure: Mutex<Option<ChunkFailure>>,
    chunk_delay: Mutex<Option<Duration>>,
    accepted_chunks: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share the state of an existing memory store (and its caller).
    pub fn wrapping(inner: MemoryStore) -> Self {
        RecordingStore {
            inner,
            ..Default::default()
        }
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn add_bytes_calls(&self) -> Vec<(String, usize, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::AddBytes { file_id, len, done } => Some((file_id, len, done)),
                _ => None,
            })
            .collect()
    }

    pub fn get_bytes_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, StoreCall::GetBytes { .. }))
            .count()
    }

    pub fn delete_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::DeleteFiles { file_ids } => Some(file_ids),
                _ => None,
            })
            .collect()
    }

    /// Calls other than session verification.
    pub fn storage_call_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| !matches!(call, StoreCall::VerifySession))
            .count()
    }

    pub fn refuse_registration(&self) {
        *self.refuse_registration.lock().unwrap() = true;
    }

    /// Answer `false` when a file's chunk `index` arrives.
    pub fn reject_chunk(&self, index: usize) {
        *self.chunk_failure.lock().unwrap() = Some(ChunkFailure::Reject(index));
    }

    /// Fail with a transport error when a file's chunk `index` arrives.
    pub fn fail_chunk(&self, index: usize) {
        *self.chunk_failure.lock().unwrap() = Some(ChunkFailure::Transport(index));
    }

    /// Apply a file's chunk `index`, then report a transport error anyway.
    pub fn fail_chunk_after_apply(&self, index: usize) {
        *self.chunk_failure.lock().unwrap() = Some(ChunkFailure::TransportAfterApply(index));
    }

    pub fn clear_failures(&self) {
        *self.refuse_registration.lock().unwrap() = false;
        *self.chunk_failure.lock().unwrap() = None;
    }

    pub fn delay_chunks(&self, delay: Duration) {
        *self.chunk_delay.lock().unwrap() = Some(delay);
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RemoteStore for RecordingStore {
    async fn add_file(&self, file: &StoredFile) -> StorageResult<Option<String>> {
        self.record(StoreCall::AddFile {
            name: file.name.clone(),
        });
        if *self.refuse_registration.lock().unwrap() {
            return Ok(None);
        }
        self.inner.add_file(file).await
    }

    async fn add_bytes(&self, file_id: &str, bytes: Bytes, done: bool) -> StorageResult<bool> {
        self.record(StoreCall::AddBytes {
            file_id: file_id.to_string(),
            len: bytes.len(),
            done,
        });

        let index = *self
            .accepted_chunks
            .lock()
            .unwrap()
            .get(file_id)
            .unwrap_or(&0);
        let failure = *self.chunk_failure.lock().unwrap();
        match failure {
            Some(ChunkFailure::Reject(at)) if at == index => return Ok(false),
            Some(ChunkFailure::Transport(at)) if at == index => {
                return Err(StorageError::Transport("connection reset".to_string()))
            }
            _ => {}
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.chunk_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.inner.add_bytes(file_id, bytes, done).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Ok(true) = result {
            *self
                .accepted_chunks
                .lock()
                .unwrap()
                .entry(file_id.to_string())
                .or_insert(0) += 1;
        }

        match failure {
            Some(ChunkFailure::TransportAfterApply(at)) if at == index => {
                Err(StorageError::Transport("timed out waiting for response".to_string()))
            }
            _ => result,
        }
    }

    async fn get_file_by_id(&self, file_id: &str) -> StorageResult<Option<StoredFileMeta>> {
        self.record(StoreCall::GetFileById {
            file_id: file_id.to_string(),
        });
        self.inner.get_file_by_id(file_id).await
    }

    async fn get_bytes(
        &self,
        file_id: &str,
        chunk_size: usize,
        chunk_index: usize,
    ) -> StorageResult<Bytes> {
        self.record(StoreCall::GetBytes {
            file_id: file_id.to_string(),
            chunk_size,
            chunk_index,
        });
        self.inner.get_bytes(file_id, chunk_size, chunk_index).await
    }

    async fn delete_files(&self, file_ids: &[String]) -> StorageResult<usize> {
        self.record(StoreCall::DeleteFiles {
            file_ids: file_ids.to_vec(),
        });
        self.inner.delete_files(file_ids).await
    }

    async fn verify_session(&self, token: &str) -> StorageResult<Option<Principal>> {
        self.record(StoreCall::VerifySession);
        self.inner.verify_session(token).await
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}

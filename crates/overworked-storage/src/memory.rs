use crate::traits::{RemoteStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::Utc;
use overworked_core::constants::GROUP_NOT_AUTHORIZED_MESSAGE;
use overworked_core::{Access, Principal, StoredFile, StoredFileMeta};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

struct StoredEntry {
    file: StoredFile,
    data: BytesMut,
}

#[derive(Default)]
struct MemoryState {
    files: HashMap<String, StoredEntry>,
    sessions: HashMap<String, Principal>,
}

/// In-process remote store
///
/// Behaves like the storage service: the caller becomes the owner of every
/// file it registers, only the owner may append bytes, and the final chunk
/// stamps the upload time after which the file is sealed. Clones and
/// [`MemoryStore::as_caller`] views share the same state.
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
    caller: Principal,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store acting for the anonymous principal.
    pub fn new() -> Self {
        MemoryStore {
            state: Arc::new(RwLock::new(MemoryState::default())),
            caller: Principal::anonymous(),
        }
    }

    /// View of the same store acting on behalf of another principal.
    pub fn as_caller(&self, caller: Principal) -> Self {
        MemoryStore {
            state: Arc::clone(&self.state),
            caller,
        }
    }

    pub fn caller(&self) -> &Principal {
        &self.caller
    }

    /// Issue a session token for `principal`.
    pub fn register_session(&self, token: impl Into<String>, principal: Principal) {
        self.write()
            .sessions
            .insert(token.into(), principal);
    }

    pub fn revoke_session(&self, token: &str) {
        self.write().sessions.remove(token);
    }

    /// Number of files currently held, finalized or not.
    pub fn file_count(&self) -> usize {
        self.read().files.len()
    }

    /// Raw bytes received so far for a file, bypassing permission checks.
    pub fn received_bytes(&self, file_id: &str) -> Option<Bytes> {
        self.read()
            .files
            .get(file_id)
            .map(|entry| Bytes::copy_from_slice(&entry.data))
    }

    // Every mutation completes before its guard drops, so a poisoned lock
    // still holds consistent state.
    fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Owner, public files, explicit grants and group membership all allow reads.
    fn can_read(&self, file: &StoredFile) -> bool {
        file.owner == self.caller
            || file.public
            || file
                .allowed_users
                .iter()
                .any(|(p, access)| *p == self.caller && *access != Access::Removed)
            || file
                .groups
                .iter()
                .any(|group| group.grants(&self.caller, &Access::all()))
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn add_file(&self, file: &StoredFile) -> StorageResult<Option<String>> {
        if file.groups.iter().any(|group| !group.can_edit(&self.caller)) {
            tracing::warn!(
                caller = %self.caller,
                name = %file.name,
                "Memory store refused registration for group without edit access"
            );
            return Err(StorageError::Unauthorized(
                GROUP_NOT_AUTHORIZED_MESSAGE.to_string(),
            ));
        }

        let key = Uuid::new_v4().to_string();
        let mut inserted = file.without_data();
        inserted.id = key.clone();
        inserted.owner = self.caller.clone();
        inserted.uploaded_at = None;

        let mut state = self.write();
        if state.files.contains_key(&key) {
            return Ok(None);
        }
        state.files.insert(
            key.clone(),
            StoredEntry {
                file: inserted,
                data: BytesMut::new(),
            },
        );

        tracing::debug!(
            file_id = %key,
            caller = %self.caller,
            name = %file.name,
            "Memory store registered file"
        );

        Ok(Some(key))
    }

    async fn add_bytes(&self, file_id: &str, bytes: Bytes, done: bool) -> StorageResult<bool> {
        let mut state = self.write();
        let Some(entry) = state.files.get_mut(file_id) else {
            return Ok(false);
        };

        if entry.file.is_finalized() || entry.file.owner != self.caller {
            return Ok(false);
        }

        entry.data.extend_from_slice(&bytes);
        if done {
            entry.file.uploaded_at = Some(Utc::now());
        }

        tracing::debug!(
            file_id = %file_id,
            size_bytes = bytes.len(),
            done = done,
            "Memory store appended chunk"
        );

        Ok(true)
    }

    async fn get_file_by_id(&self, file_id: &str) -> StorageResult<Option<StoredFileMeta>> {
        let state = self.read();
        Ok(state
            .files
            .get(file_id)
            .filter(|entry| self.can_read(&entry.file))
            .map(|entry| entry.file.metadata()))
    }

    async fn get_bytes(
        &self,
        file_id: &str,
        chunk_size: usize,
        chunk_index: usize,
    ) -> StorageResult<Bytes> {
        let state = self.read();
        let Some(entry) = state
            .files
            .get(file_id)
            .filter(|entry| self.can_read(&entry.file))
        else {
            return Ok(Bytes::new());
        };

        let data = &entry.data;
        let start = chunk_index.saturating_mul(chunk_size);
        if start >= data.len() {
            return Ok(Bytes::new());
        }

        let end = usize::min(start.saturating_add(chunk_size), data.len());
        Ok(Bytes::copy_from_slice(&data[start..end]))
    }

    async fn delete_files(&self, file_ids: &[String]) -> StorageResult<usize> {
        let mut state = self.write();
        let mut deleted = 0;

        for file_id in file_ids {
            let owned = state
                .files
                .get(file_id)
                .is_some_and(|entry| entry.file.owner == self.caller);
            if owned && state.files.remove(file_id).is_some() {
                deleted += 1;
            }
        }

        tracing::debug!(
            caller = %self.caller,
            requested = file_ids.len(),
            deleted = deleted,
            "Memory store deleted files"
        );

        Ok(deleted)
    }

    async fn verify_session(&self, token: &str) -> StorageResult<Option<Principal>> {
        Ok(self.read().sessions.get(token).cloned())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

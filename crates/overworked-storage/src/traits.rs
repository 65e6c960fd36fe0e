//! Remote store abstraction trait
//!
//! This module defines the RemoteStore trait that every storage backend must
//! implement. The transfer client only ever talks to a store through it.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use overworked_core::{ErrorMetadata, LogLevel, Principal, StoredFile, StoredFileMeta};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Invalid file id: {0}")]
    InvalidFileId(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl ErrorMetadata for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            StorageError::UploadFailed(_) => "UPLOAD_FAILED",
            StorageError::DownloadFailed(_) => "DOWNLOAD_FAILED",
            StorageError::DeleteFailed(_) => "DELETE_FAILED",
            StorageError::NotFound(_) => "NOT_FOUND",
            StorageError::Unauthorized(_) => "UNAUTHORIZED",
            StorageError::InvalidFileId(_) => "INVALID_FILE_ID",
            StorageError::Transport(_) => "TRANSPORT_ERROR",
            StorageError::BackendError(_) => "STORAGE_ERROR",
            StorageError::ConfigError(_) => "CONFIG_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StorageError::UploadFailed(_)
                | StorageError::DownloadFailed(_)
                | StorageError::DeleteFailed(_)
                | StorageError::Transport(_)
                | StorageError::BackendError(_)
        )
    }

    fn client_message(&self) -> String {
        match self {
            StorageError::NotFound(_) => "File not found".to_string(),
            StorageError::Unauthorized(msg) => msg.clone(),
            StorageError::InvalidFileId(msg) => format!("Invalid file id: {}", msg),
            StorageError::ConfigError(_) => "Storage is not configured".to_string(),
            _ => "Failed to access storage".to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            StorageError::NotFound(_) | StorageError::InvalidFileId(_) => LogLevel::Debug,
            StorageError::Unauthorized(_) => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

/// Remote store abstraction trait
///
/// All backends (in-memory, HTTP) implement this trait. Calls are made on
/// behalf of the caller the backend was built for; ownership checks happen
/// on the store side.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Register file metadata and return the identifier assigned by the store.
    ///
    /// `Ok(None)` means the store declined to assign an identifier. A refusal
    /// because of group permissions is reported as `StorageError::Unauthorized`.
    async fn add_file(&self, file: &StoredFile) -> StorageResult<Option<String>>;

    /// Append one chunk to a registered file. `done` marks the final chunk,
    /// after which the store stamps the upload time and refuses more bytes.
    ///
    /// Returns whether the store accepted the chunk.
    async fn add_bytes(&self, file_id: &str, bytes: Bytes, done: bool) -> StorageResult<bool>;

    /// Fetch metadata only; never carries file data.
    async fn get_file_by_id(&self, file_id: &str) -> StorageResult<Option<StoredFileMeta>>;

    /// Fetch the byte range `[chunk_index * chunk_size, +chunk_size)`.
    ///
    /// An empty buffer signals that the range starts past the end of the data.
    async fn get_bytes(
        &self,
        file_id: &str,
        chunk_size: usize,
        chunk_index: usize,
    ) -> StorageResult<Bytes>;

    /// Delete files owned by the caller and return how many were removed.
    async fn delete_files(&self, file_ids: &[String]) -> StorageResult<usize>;

    /// Resolve a session token to the principal it belongs to.
    ///
    /// `Ok(None)` means the token is unknown or expired.
    async fn verify_session(&self, token: &str) -> StorageResult<Option<Principal>>;

    /// Replace the session token the backend presents on later calls.
    ///
    /// Backends that do not authenticate per call ignore it.
    fn set_session_token(&self, _token: Option<String>) {}

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

//! Transfer errors and their mapping onto upload outcomes.

use overworked_core::error::detailed_message;
use overworked_core::{ErrorMetadata, FileUploadResolveType, LogLevel, UploadOutcome};
use overworked_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Invalid chunk size: {0}")]
    InvalidChunkSize(usize),

    #[error("Registration failed: {0}")]
    RegistrationFailed(String),

    #[error("Chunk {index} of {total} rejected for file {file_id}")]
    ChunkRejected {
        file_id: String,
        index: usize,
        total: usize,
    },

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("File already uploaded: {0}")]
    AlreadyUploaded(String),

    #[error("Session mismatch: {0}")]
    SessionMismatch(String),

    #[error("Stored chunk {index} of file {file_id} differs from the source")]
    StoredDataConflict { file_id: String, index: usize },

    #[error("Storage operation failed")]
    Storage(#[from] StorageError),
}

pub type TransferResult<T> = Result<T, TransferError>;

impl TransferError {
    /// Coarse outcome reported to the interface layer for this error.
    pub fn resolution(&self) -> FileUploadResolveType {
        match self {
            TransferError::NotAuthorized(_)
            | TransferError::Storage(StorageError::Unauthorized(_)) => {
                FileUploadResolveType::NotAuthorized
            }
            TransferError::AlreadyUploaded(_) => FileUploadResolveType::AlreadyUploaded,
            _ => FileUploadResolveType::FailedToUpload,
        }
    }
}

impl ErrorMetadata for TransferError {
    fn error_code(&self) -> &'static str {
        match self {
            TransferError::InvalidChunkSize(_) => "INVALID_CHUNK_SIZE",
            TransferError::RegistrationFailed(_) => "REGISTRATION_FAILED",
            TransferError::ChunkRejected { .. } => "CHUNK_REJECTED",
            TransferError::NotAuthorized(_) => "NOT_AUTHORIZED",
            TransferError::AlreadyUploaded(_) => "ALREADY_UPLOADED",
            TransferError::SessionMismatch(_) => "SESSION_MISMATCH",
            TransferError::StoredDataConflict { .. } => "STORED_DATA_CONFLICT",
            TransferError::Storage(e) => e.error_code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            TransferError::RegistrationFailed(_) | TransferError::ChunkRejected { .. } => true,
            TransferError::Storage(e) => e.is_recoverable(),
            _ => false,
        }
    }

    fn client_message(&self) -> String {
        match self {
            TransferError::InvalidChunkSize(_) => "Invalid chunk size".to_string(),
            TransferError::RegistrationFailed(_) => "Failed to register file.".to_string(),
            TransferError::ChunkRejected { index, .. } => {
                format!("Failed to upload chunk {}.", index)
            }
            TransferError::NotAuthorized(msg) => msg.clone(),
            TransferError::AlreadyUploaded(_) => "File is already uploaded.".to_string(),
            TransferError::SessionMismatch(msg) => msg.clone(),
            TransferError::StoredDataConflict { .. } => {
                "Stored data does not match the source file.".to_string()
            }
            TransferError::Storage(e) => e.client_message(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            TransferError::AlreadyUploaded(_) => LogLevel::Debug,
            TransferError::NotAuthorized(_) | TransferError::SessionMismatch(_) => LogLevel::Warn,
            TransferError::Storage(e) => e.log_level(),
            _ => LogLevel::Error,
        }
    }
}

/// Outcome for a file that never got a remote id.
impl From<TransferError> for UploadOutcome {
    fn from(e: TransferError) -> Self {
        UploadOutcome::new("", e.resolution(), e.client_message())
    }
}

/// Log an error, with its source chain, at the level it reports for itself.
pub fn log_error(error: &TransferError, file_name: &str) {
    let error_code = error.error_code();
    let details = detailed_message(error);
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %details, error_code = error_code, file_name = %file_name, "Transfer error");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %details, error_code = error_code, file_name = %file_name, "Transfer error");
        }
        LogLevel::Error => {
            tracing::error!(error = %details, error_code = error_code, file_name = %file_name, "Transfer error");
        }
    }
}

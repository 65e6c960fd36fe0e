//! Overworked Core Library
//!
//! This crate provides the domain models, error metadata, configuration and
//! constants shared by the storage backends and the transfer client.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{PartialUploadPolicy, TransferConfig};
pub use error::{ErrorMetadata, LogLevel};
pub use models::{
    Access, FileAttributes, FileChunks, FileUploadResolveType, Group, Principal, StoredFile,
    StoredFileMeta, UploadOutcome,
};
pub use storage_types::StorageBackend;

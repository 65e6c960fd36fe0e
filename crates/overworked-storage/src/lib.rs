//! Overworked Storage Library
//!
//! This crate provides the remote store abstraction the transfer client talks
//! to, together with an in-memory backend and an HTTP backend.
//!
//! # Operations
//!
//! A remote store registers file metadata (`add_file`), appends chunks to a
//! registered file (`add_bytes`, the last call carrying `done = true`), serves
//! metadata (`get_file_by_id`) and byte ranges (`get_bytes`), and deletes
//! files (`delete_files`). It also validates session tokens, since the store
//! is the only party that can vouch for a caller.

pub mod factory;
#[cfg(feature = "storage-http")]
pub mod http;
#[cfg(feature = "storage-memory")]
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use factory::create_store;
#[cfg(feature = "storage-http")]
pub use http::HttpStore;
#[cfg(feature = "storage-memory")]
pub use memory::MemoryStore;
pub use overworked_core::StorageBackend;
pub use traits::{RemoteStore, StorageError, StorageResult};

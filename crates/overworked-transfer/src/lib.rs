//! Overworked Transfer Library
//!
//! Client side of the chunked file transfer protocol spoken with the storage
//! service.
//!
//! Uploads split a file into fixed-size chunks, register its metadata, then
//! send the chunks one at a time, waiting for each acknowledgment and flagging
//! the final one. Downloads look the file up, pull byte ranges until the store
//! returns an empty range, and reassemble the result.
//!
//! [`StorageClient`] is the entry point for callers; the other modules are the
//! building blocks it is made of.

pub mod chunker;
pub mod client;
pub mod download;
pub mod error;
pub mod guard;
pub mod progress;
pub mod reassemble;
pub mod session;
pub mod telemetry;
pub mod upload;

// Re-export commonly used types
pub use chunker::{file_chunks, split_into_chunks};
pub use client::StorageClient;
pub use download::RangeFetcher;
pub use error::{TransferError, TransferResult};
pub use guard::SessionGuard;
pub use progress::{ProgressTracker, TransferId, TransferProgress, TransferState};
pub use reassemble::reassemble;
pub use session::TransferSession;
pub use upload::{UploadReport, UploadSequencer};

use bytes::Bytes;
use overworked_core::{PartialUploadPolicy, StorageBackend, StoredFile, TransferConfig};

pub const MIB: usize = 1024 * 1024;

/// Deterministic, non-repeating-per-chunk payload.
pub fn payload(len: usize) -> Bytes {
    Bytes::from(
        (0..len)
            .map(|i| ((i * 31 + i / 251) % 256) as u8)
            .collect::<Vec<u8>>(),
    )
}

pub fn file_props(name: &str) -> StoredFile {
    StoredFile::from_data(name, "application/octet-stream", Bytes::new())
}

pub fn test_config(chunk_size: usize) -> TransferConfig {
    TransferConfig {
        storage_backend: StorageBackend::Memory,
        ..Default::default()
    }
    .with_chunk_size(chunk_size)
}

pub fn keep_partial_config(chunk_size: usize) -> TransferConfig {
    test_config(chunk_size).with_partial_upload_policy(PartialUploadPolicy::Keep)
}

//! Chunk splitting
//!
//! Chunks are zero-copy slices of the source buffer. Concatenating them in
//! order yields the source exactly.

use crate::error::{TransferError, TransferResult};
use bytes::Bytes;
use overworked_core::{FileChunks, StoredFile};

/// Split `data` into ordered chunks of at most `chunk_size` bytes.
///
/// The last chunk may be shorter, no chunk is empty, and an empty buffer
/// yields no chunks at all. A chunk size of zero is rejected.
pub fn split_into_chunks(data: &Bytes, chunk_size: usize) -> TransferResult<Vec<Bytes>> {
    if chunk_size == 0 {
        return Err(TransferError::InvalidChunkSize(chunk_size));
    }

    let chunks = (0..data.len())
        .step_by(chunk_size)
        .map(|start| data.slice(start..(start + chunk_size).min(data.len())))
        .collect();

    Ok(chunks)
}

/// Split a file's payload and pair the chunks with its attributes.
pub fn file_chunks(file: &StoredFile, chunk_size: usize) -> TransferResult<FileChunks> {
    Ok(FileChunks {
        attributes: file.attributes(),
        chunks: split_into_chunks(&file.data, chunk_size)?,
    })
}

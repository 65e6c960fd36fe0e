//! Byte-range fetching
//!
//! Metadata is looked up first so an unknown id costs no range calls. Ranges
//! are then requested at increasing indices until the store returns an empty
//! one; the total length is never consulted.

use crate::error::TransferResult;
use bytes::{Bytes, BytesMut};
use overworked_core::StoredFileMeta;
use overworked_storage::RemoteStore;
use std::sync::Arc;
use std::time::Instant;

pub struct RangeFetcher {
    store: Arc<dyn RemoteStore>,
    chunk_size: usize,
}

impl RangeFetcher {
    pub fn new(store: Arc<dyn RemoteStore>, chunk_size: usize) -> Self {
        RangeFetcher { store, chunk_size }
    }

    /// Fetch metadata and the full payload of a file.
    ///
    /// Returns `Ok(None)` when the store does not know the id.
    pub async fn fetch(&self, file_id: &str) -> TransferResult<Option<(StoredFileMeta, Bytes)>> {
        let meta = match self.store.get_file_by_id(file_id).await? {
            Some(meta) => meta,
            None => {
                tracing::debug!(file_id = %file_id, "File not found");
                return Ok(None);
            }
        };

        let data = self.fetch_ranges(file_id).await?;
        Ok(Some((meta, data)))
    }

    /// Pull ranges `0, 1, 2, ...` until the first empty one.
    pub async fn fetch_ranges(&self, file_id: &str) -> TransferResult<Bytes> {
        let start = Instant::now();
        let mut buffer = BytesMut::new();
        let mut chunk_index = 0;

        loop {
            let range = self
                .store
                .get_bytes(file_id, self.chunk_size, chunk_index)
                .await?;
            if range.is_empty() {
                break;
            }

            tracing::debug!(
                file_id = %file_id,
                chunk_index = chunk_index,
                size_bytes = range.len(),
                "Range received"
            );
            buffer.extend_from_slice(&range);
            chunk_index += 1;
        }

        tracing::info!(
            file_id = %file_id,
            size_bytes = buffer.len(),
            range_count = chunk_index,
            duration_ms = start.elapsed().as_millis() as u64,
            "Download completed"
        );

        Ok(buffer.freeze())
    }
}

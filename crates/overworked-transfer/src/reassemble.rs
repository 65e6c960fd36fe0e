//! Rebuild a complete file record from fetched bytes.

use bytes::Bytes;
use overworked_core::{StoredFile, StoredFileMeta};

/// Attach `data` to `meta`.
///
/// Name, MIME type and timestamps come from the metadata unchanged. A size
/// mismatch is logged but does not reject the file; ranges are trusted in
/// the order they were fetched.
pub fn reassemble(data: Bytes, meta: StoredFileMeta) -> StoredFile {
    if meta.size != data.len() as u64 {
        tracing::warn!(
            file_id = %meta.id,
            expected_bytes = meta.size,
            received_bytes = data.len(),
            "Reassembled size differs from metadata"
        );
    }

    meta.with_data(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_meta(size: u64) -> StoredFileMeta {
        StoredFile::from_data("report.pdf", "application/pdf", Bytes::from(vec![0u8; size as usize]))
            .metadata()
    }

    #[test]
    fn test_reassemble_keeps_metadata() {
        let data = Bytes::from_static(b"%PDF-1.7 body");
        let mut meta = sample_meta(data.len() as u64);
        meta.id = "f-1".to_string();

        let file = reassemble(data.clone(), meta);

        assert_eq!(file.id, "f-1");
        assert_eq!(file.name, "report.pdf");
        assert_eq!(file.mime_type, "application/pdf");
        assert_eq!(file.data, data);
    }

    #[test]
    fn test_reassemble_tolerates_size_mismatch() {
        let file = reassemble(Bytes::from_static(b"abc"), sample_meta(10));
        assert_eq!(file.data.len(), 3);
        assert_eq!(file.size, 10);
    }
}

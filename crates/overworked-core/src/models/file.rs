//! Stored file records and their chunked representation.

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::access::{Access, Group, Principal};

/// A file as known to the remote store.
///
/// `data` is only populated on the upload path (before splitting) or after a
/// full download has been reassembled. It is never serialized: bytes travel
/// through chunk calls, the record itself only carries metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoredFile {
    /// Empty until assigned by the remote store
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    #[serde(skip)]
    pub data: Bytes,
    #[serde(default)]
    pub owner: Principal,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub allowed_users: Vec<(Principal, Access)>,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl StoredFile {
    /// Build an unregistered record around caller-supplied bytes.
    pub fn from_data(name: impl Into<String>, mime_type: impl Into<String>, data: Bytes) -> Self {
        StoredFile {
            name: name.into(),
            mime_type: mime_type.into(),
            size: data.len() as u64,
            data,
            ..Default::default()
        }
    }

    /// Copy of the record without its payload.
    pub fn metadata(&self) -> StoredFileMeta {
        StoredFileMeta {
            id: self.id.clone(),
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size: self.size,
            owner: self.owner.clone(),
            groups: self.groups.clone(),
            allowed_users: self.allowed_users.clone(),
            public: self.public,
            uploaded_at: self.uploaded_at,
        }
    }

    /// Same record with the payload dropped, ready to be registered remotely.
    pub fn without_data(&self) -> StoredFile {
        StoredFile {
            data: Bytes::new(),
            ..self.clone()
        }
    }

    pub fn attributes(&self) -> FileAttributes {
        FileAttributes {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            last_modified: self.uploaded_at,
        }
    }

    /// True once the remote store has received the final chunk.
    pub fn is_finalized(&self) -> bool {
        self.uploaded_at.is_some()
    }
}

/// Metadata-only view of a stored file, as returned by lookups.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoredFileMeta {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    #[serde(default)]
    pub owner: Principal,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub allowed_users: Vec<(Principal, Access)>,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl StoredFileMeta {
    /// Attach a fully reassembled payload.
    pub fn with_data(self, data: Bytes) -> StoredFile {
        StoredFile {
            id: self.id,
            name: self.name,
            mime_type: self.mime_type,
            size: self.size,
            data,
            owner: self.owner,
            groups: self.groups,
            allowed_users: self.allowed_users,
            public: self.public,
            uploaded_at: self.uploaded_at,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.uploaded_at.is_some()
    }
}

/// Non-binary attributes of a file being transferred.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileAttributes {
    pub name: String,
    pub mime_type: String,
    pub last_modified: Option<DateTime<Utc>>,
}

/// A file split for transfer. Chunk order is vector order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileChunks {
    pub attributes: FileAttributes,
    pub chunks: Vec<Bytes>,
}

impl FileChunks {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total number of payload bytes across all chunks.
    pub fn total_size(&self) -> u64 {
        self.chunks.iter().map(|c| c.len() as u64).sum()
    }

    /// Concatenate the chunks back into one buffer.
    pub fn concat(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.total_size() as usize);
        for chunk in &self.chunks {
            buf.extend_from_slice(chunk);
        }
        buf.freeze()
    }
}

//! Upload outcomes reported to the interface layer.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Coarse outcome of one file upload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileUploadResolveType {
    NotAuthorized,
    SuccessfullyUploaded,
    FailedToUpload,
    AlreadyUploaded,
}

impl FileUploadResolveType {
    pub fn is_success(&self) -> bool {
        matches!(self, FileUploadResolveType::SuccessfullyUploaded)
    }
}

impl Display for FileUploadResolveType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FileUploadResolveType::NotAuthorized => write!(f, "not_authorized"),
            FileUploadResolveType::SuccessfullyUploaded => write!(f, "successfully_uploaded"),
            FileUploadResolveType::FailedToUpload => write!(f, "failed_to_upload"),
            FileUploadResolveType::AlreadyUploaded => write!(f, "already_uploaded"),
        }
    }
}

/// `(file_id, resolution, message)` produced once per uploaded file.
///
/// `file_id` is empty when the remote store never assigned one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub file_id: String,
    pub resolution: FileUploadResolveType,
    pub message: String,
}

impl UploadOutcome {
    pub fn success(file_id: impl Into<String>) -> Self {
        UploadOutcome {
            file_id: file_id.into(),
            resolution: FileUploadResolveType::SuccessfullyUploaded,
            message: String::new(),
        }
    }

    pub fn new(
        file_id: impl Into<String>,
        resolution: FileUploadResolveType,
        message: impl Into<String>,
    ) -> Self {
        UploadOutcome {
            file_id: file_id.into(),
            resolution,
            message: message.into(),
        }
    }

    pub fn into_tuple(self) -> (String, FileUploadResolveType, String) {
        (self.file_id, self.resolution, self.message)
    }
}

//! HTTP backend for the storage service.
//!
//! Maps every remote store operation onto one REST call. Paths are relative to
//! the configured base URL, prefixed with `services/{service_id}` when a
//! service identifier is configured.

use crate::traits::{RemoteStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use overworked_core::{Principal, StoredFile, StoredFileMeta};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct AddFileResponse {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AddBytesResponse {
    accepted: bool,
}

#[derive(Debug, Serialize)]
struct DeleteFilesRequest<'a> {
    file_ids: &'a [String],
}

#[derive(Debug, Deserialize)]
struct DeleteFilesResponse {
    deleted: usize,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    principal: Option<Principal>,
}

/// Storage service reached over HTTP.
///
/// Clones share one session token, so a token replaced through
/// `set_session_token` applies to every clone.
#[derive(Clone, Debug)]
pub struct HttpStore {
    client: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl HttpStore {
    /// Create a new HttpStore
    ///
    /// # Arguments
    /// * `base_url` - Root URL of the storage service (e.g., "https://storage.example.com")
    /// * `service_id` - Optional service instance identifier, used as a path prefix
    /// * `token` - Session token sent as a bearer token on every call
    /// * `timeout` - Client-side timeout applied to every request
    pub fn new(
        base_url: &str,
        service_id: Option<&str>,
        token: Option<String>,
        timeout: Duration,
    ) -> StorageResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        let mut base_url = base_url.trim_end_matches('/').to_string();
        match service_id {
            Some(id) => {
                base_url = format!("{}/services/{}", base_url, urlencoding::encode(id));
            }
            None => {
                tracing::warn!("Storage service ID not defined, using unprefixed paths");
            }
        }

        Ok(HttpStore {
            client,
            base_url,
            token: Arc::new(RwLock::new(token)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn file_url(&self, file_id: &str, suffix: &str) -> StorageResult<String> {
        if file_id.is_empty() {
            return Err(StorageError::InvalidFileId("empty file id".to_string()));
        }
        Ok(self.build_url(&format!(
            "files/{}{}",
            urlencoding::encode(file_id),
            suffix
        )))
    }

    fn current_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match self.current_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> StorageResult<Response> {
        self.apply_auth(request)
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))
    }

    /// Turn non-success statuses into errors, keeping 404 for the caller to interpret.
    async fn check_status(response: Response) -> StorageResult<Response> {
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(StorageError::Unauthorized(error_text))
            }
            _ => Err(StorageError::BackendError(format!(
                "Storage request failed with status {}: {}",
                status, error_text
            ))),
        }
    }

    async fn json<T: serde::de::DeserializeOwned>(response: Response) -> StorageResult<T> {
        response
            .json()
            .await
            .map_err(|e| StorageError::BackendError(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl RemoteStore for HttpStore {
    async fn add_file(&self, file: &StoredFile) -> StorageResult<Option<String>> {
        let request = self.client.post(self.build_url("files")).json(file);
        let response = Self::check_status(self.send(request).await?).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::UploadFailed(
                "Storage service has no files endpoint".to_string(),
            ));
        }

        let body: AddFileResponse = Self::json(response).await?;
        tracing::debug!(name = %file.name, file_id = ?body.id, "Registered file over HTTP");
        Ok(body.id.filter(|id| !id.is_empty()))
    }

    async fn add_bytes(&self, file_id: &str, bytes: Bytes, done: bool) -> StorageResult<bool> {
        let size = bytes.len();
        let request = self
            .client
            .put(self.file_url(file_id, "/bytes")?)
            .query(&[("done", done)])
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes);
        let response = Self::check_status(self.send(request).await?).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }

        let body: AddBytesResponse = Self::json(response).await?;
        tracing::debug!(
            file_id = %file_id,
            size_bytes = size,
            done = done,
            accepted = body.accepted,
            "Sent chunk over HTTP"
        );
        Ok(body.accepted)
    }

    async fn get_file_by_id(&self, file_id: &str) -> StorageResult<Option<StoredFileMeta>> {
        let request = self.client.get(self.file_url(file_id, "")?);
        let response = Self::check_status(self.send(request).await?).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        Ok(Some(Self::json(response).await?))
    }

    async fn get_bytes(
        &self,
        file_id: &str,
        chunk_size: usize,
        chunk_index: usize,
    ) -> StorageResult<Bytes> {
        let request = self
            .client
            .get(self.file_url(file_id, "/bytes")?)
            .query(&[("chunk_size", chunk_size), ("chunk_index", chunk_index)]);
        let response = Self::check_status(self.send(request).await?).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Bytes::new());
        }

        response
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(format!("Failed to read range: {}", e)))
    }

    async fn delete_files(&self, file_ids: &[String]) -> StorageResult<usize> {
        let request = self
            .client
            .post(self.build_url("files/delete"))
            .json(&DeleteFilesRequest { file_ids });
        let response = Self::check_status(self.send(request).await?).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::DeleteFailed(
                "Storage service has no delete endpoint".to_string(),
            ));
        }

        let body: DeleteFilesResponse = Self::json(response).await?;
        Ok(body.deleted)
    }

    async fn verify_session(&self, token: &str) -> StorageResult<Option<Principal>> {
        let response = self
            .client
            .get(self.build_url("session"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body: SessionResponse = Self::json(response).await?;
                Ok(body.principal)
            }
            status => Err(StorageError::BackendError(format!(
                "Session check failed with status {}",
                status
            ))),
        }
    }

    fn set_session_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Http
    }
}

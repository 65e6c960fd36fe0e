#[cfg(feature = "storage-http")]
use crate::HttpStore;
#[cfg(feature = "storage-memory")]
use crate::MemoryStore;
use crate::{RemoteStore, StorageBackend, StorageError, StorageResult};
use overworked_core::TransferConfig;
use std::sync::Arc;

/// Create a remote store based on configuration
pub fn create_store(config: &TransferConfig) -> StorageResult<Arc<dyn RemoteStore>> {
    match config.storage_backend {
        #[cfg(feature = "storage-http")]
        StorageBackend::Http => {
            let base_url = config.api_url.as_deref().ok_or_else(|| {
                StorageError::ConfigError("STORAGE_API_URL not configured".to_string())
            })?;

            let store = HttpStore::new(
                base_url,
                config.service_id.as_deref(),
                config.session_token.clone(),
                config.request_timeout(),
            )?;
            tracing::info!(base_url = %store.base_url(), "Using HTTP storage backend");
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-http"))]
        StorageBackend::Http => Err(StorageError::ConfigError(
            "HTTP storage backend not available (storage-http feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-memory")]
        StorageBackend::Memory => {
            tracing::info!("Using in-memory storage backend");
            Ok(Arc::new(MemoryStore::new()))
        }

        #[cfg(not(feature = "storage-memory"))]
        StorageBackend::Memory => Err(StorageError::ConfigError(
            "Memory storage backend not available (storage-memory feature not enabled)"
                .to_string(),
        )),
    }
}

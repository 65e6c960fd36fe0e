#![allow(dead_code)]

pub mod fixtures;
pub mod store;

use overworked_core::TransferConfig;
use overworked_storage::RemoteStore;
use overworked_transfer::StorageClient;
use std::sync::Arc;
use store::RecordingStore;

/// Client wired to a recording store, with both handles returned.
pub fn setup_client(config: TransferConfig) -> (StorageClient, Arc<RecordingStore>) {
    let store = Arc::new(RecordingStore::new());
    let client = client_for(&store, config);
    (client, store)
}

pub fn client_for(store: &Arc<RecordingStore>, config: TransferConfig) -> StorageClient {
    let remote: Arc<dyn RemoteStore> = store.clone();
    StorageClient::new(remote, config)
}

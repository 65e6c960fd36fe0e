#[path = "helpers/mod.rs"]
mod helpers;

use bytes::Bytes;
use helpers::fixtures::{file_props, payload, test_config, MIB};
use helpers::setup_client;
use overworked_core::FileUploadResolveType;
use overworked_transfer::{split_into_chunks, TransferState};

#[tokio::test]
async fn test_three_mib_upload_and_download() {
    let (client, store) = setup_client(test_config(MIB));
    let data = payload(3 * MIB);

    let outcomes = client
        .upload_files(vec![(data.clone(), file_props("video.bin"))])
        .await;
    assert_eq!(outcomes.len(), 1);
    let (file_id, resolution, message) = outcomes[0].clone().into_tuple();
    assert_eq!(resolution, FileUploadResolveType::SuccessfullyUploaded);
    assert_eq!(message, "");

    // Three chunk calls, the third one flagged as last.
    let sends = store.add_bytes_calls();
    assert_eq!(sends.len(), 3);
    assert!(sends.iter().all(|(id, len, _)| id == &file_id && *len == MIB));
    let flags: Vec<bool> = sends.iter().map(|(_, _, done)| *done).collect();
    assert_eq!(flags, vec![false, false, true]);

    store.clear_calls();
    let fetched = client.get_file_by_id(&file_id).await.unwrap();

    // Three ranges with data plus the empty one that ends the loop.
    assert_eq!(store.get_bytes_count(), 4);
    assert_eq!(fetched.data, data);
    assert_eq!(fetched.name, "video.bin");
    assert_eq!(fetched.mime_type, "application/octet-stream");
    assert!(fetched.uploaded_at.is_some());
}

#[tokio::test]
async fn test_roundtrip_across_sizes() {
    let chunk_size = 1000;
    let (client, store) = setup_client(test_config(chunk_size));

    for len in [1, 999, 1000, 1001, 4500, 10_000] {
        store.clear_calls();
        let data = payload(len);
        let outcomes = client
            .upload_files(vec![(data.clone(), file_props("sample.bin"))])
            .await;
        let file_id = outcomes[0].file_id.clone();
        assert!(outcomes[0].resolution.is_success(), "len {}", len);

        let expected_chunks = len.div_ceil(chunk_size);
        let sends = store.add_bytes_calls();
        assert_eq!(sends.len(), expected_chunks, "len {}", len);
        assert_eq!(sends.iter().filter(|(_, _, done)| *done).count(), 1);
        assert!(sends.last().unwrap().2);

        let fetched = client.get_file_by_id(&file_id).await.unwrap();
        assert_eq!(fetched.data, data, "len {}", len);
    }
}

#[test]
fn test_chunk_count_matches_split() {
    let data = payload(10 * 1024 + 1);
    let chunks = split_into_chunks(&data, 1024).unwrap();
    assert_eq!(chunks.len(), 11);
    assert_eq!(chunks.last().unwrap().len(), 1);
    assert_eq!(Bytes::from(chunks.concat()), data);
}

#[tokio::test]
async fn test_empty_file_sends_single_final_call() {
    let (client, store) = setup_client(test_config(1024));

    let report = client.upload_file(Bytes::new(), file_props("empty.txt")).await;
    assert!(report.outcome.resolution.is_success());

    let sends = store.add_bytes_calls();
    assert_eq!(sends, vec![(report.outcome.file_id.clone(), 0, true)]);

    let progress = client.progress().get(report.transfer_id.unwrap()).unwrap();
    assert_eq!(progress.state, TransferState::Completed);
    assert_eq!(progress.fraction(), 1.0);

    let fetched = client.get_file_by_id(&report.outcome.file_id).await.unwrap();
    assert!(fetched.data.is_empty());
    assert!(fetched.uploaded_at.is_some());
}

#[tokio::test]
async fn test_unknown_file_makes_no_range_calls() {
    let (client, store) = setup_client(test_config(1024));

    assert!(client.get_file_by_id("does-not-exist").await.is_none());
    assert_eq!(store.get_bytes_count(), 0);
    assert_eq!(store.calls().len(), 1);
}

#[tokio::test]
async fn test_get_files_by_id_skips_missing() {
    let (client, _store) = setup_client(test_config(512));
    let first = payload(1500);
    let second = payload(10);

    let outcomes = client
        .upload_files(vec![
            (first.clone(), file_props("first.bin")),
            (second.clone(), file_props("second.bin")),
        ])
        .await;

    let ids = vec![
        outcomes[0].file_id.clone(),
        "missing".to_string(),
        outcomes[1].file_id.clone(),
    ];
    let files = client.get_files_by_id(&ids).await;

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].data, first);
    assert_eq!(files[1].data, second);
}

#[tokio::test]
async fn test_registration_sends_metadata_only() {
    let (client, store) = setup_client(test_config(1024));
    let mut props = file_props("notes.txt");
    props.data = Bytes::from_static(b"stale payload that must be ignored");

    let data = payload(2048);
    let report = client.upload_file(data.clone(), props).await;

    let received = store
        .memory()
        .received_bytes(&report.outcome.file_id)
        .unwrap();
    assert_eq!(received, data);
    assert_eq!(store.add_bytes_calls().len(), 2);
}

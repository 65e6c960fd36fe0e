#[path = "helpers/mod.rs"]
mod helpers;

use bytes::Bytes;
use helpers::fixtures::{file_props, keep_partial_config, payload, test_config};
use helpers::setup_client;
use overworked_core::FileUploadResolveType;
use overworked_transfer::TransferState;

#[tokio::test]
async fn test_registration_failure_sends_no_chunks() {
    let (client, store) = setup_client(test_config(1024));
    store.refuse_registration();

    let outcomes = client
        .upload_files(vec![(payload(4096), file_props("a.bin"))])
        .await;

    assert_eq!(outcomes[0].file_id, "");
    assert_eq!(outcomes[0].resolution, FileUploadResolveType::FailedToUpload);
    assert_eq!(outcomes[0].message, "Failed to register file.");
    assert!(store.add_bytes_calls().is_empty());
}

#[tokio::test]
async fn test_rejected_chunk_stops_sequence_and_deletes_partial() {
    let (client, store) = setup_client(test_config(1024));
    store.reject_chunk(1);

    let report = client.upload_file(payload(4096), file_props("a.bin")).await;
    let file_id = report.outcome.file_id.clone();

    assert_eq!(report.outcome.resolution, FileUploadResolveType::FailedToUpload);
    assert!(!file_id.is_empty());
    assert!(report.session.is_none());

    // Chunk 0 accepted, chunk 1 rejected, chunks 2 and 3 never sent.
    let sends = store.add_bytes_calls();
    assert_eq!(sends.len(), 2);
    assert!(sends.iter().all(|(_, _, done)| !done));

    assert_eq!(store.delete_calls(), vec![vec![file_id.clone()]]);
    assert_eq!(store.memory().file_count(), 0);

    let progress = client.progress().get(report.transfer_id.unwrap()).unwrap();
    assert_eq!(progress.state, TransferState::ChunkFailed { chunk: 1 });
    assert_eq!(progress.chunks_sent, 1);
}

#[tokio::test]
async fn test_transport_failure_on_last_chunk() {
    let (client, store) = setup_client(test_config(1024));
    store.fail_chunk(2);

    let report = client.upload_file(payload(3000), file_props("a.bin")).await;

    assert_eq!(report.outcome.resolution, FileUploadResolveType::FailedToUpload);
    assert_eq!(report.outcome.message, "Failed to access storage");
    assert_eq!(store.add_bytes_calls().len(), 3);
    assert_eq!(store.delete_calls().len(), 1);
}

#[tokio::test]
async fn test_kept_partial_upload_resumes_from_first_missing_chunk() {
    let (client, store) = setup_client(keep_partial_config(1024));
    let data = payload(5000);
    store.reject_chunk(2);

    let report = client.upload_file(data.clone(), file_props("a.bin")).await;
    assert_eq!(report.outcome.resolution, FileUploadResolveType::FailedToUpload);
    assert!(store.delete_calls().is_empty());

    let session = report.session.expect("partial upload should be kept");
    assert_eq!(session.file_id(), report.outcome.file_id);
    assert_eq!(session.total_chunks(), 5);
    assert_eq!(session.next_index(), 2);
    assert!(!session.is_complete());

    store.clear_failures();
    store.clear_calls();

    let resumed = client.resume_upload(session, data.clone()).await;
    assert_eq!(resumed.outcome.resolution, FileUploadResolveType::SuccessfullyUploaded);
    assert_eq!(resumed.outcome.file_id, report.outcome.file_id);

    // Only chunks 2, 3 and 4 go out on resume.
    let sends = store.add_bytes_calls();
    let lens: Vec<usize> = sends.iter().map(|(_, len, _)| *len).collect();
    assert_eq!(lens, vec![1024, 1024, 904]);
    let flags: Vec<bool> = sends.iter().map(|(_, _, done)| *done).collect();
    assert_eq!(flags, vec![false, false, true]);

    let fetched = client.get_file_by_id(&resumed.outcome.file_id).await.unwrap();
    assert_eq!(fetched.data, data);
}

#[tokio::test]
async fn test_resume_after_completion_is_already_uploaded() {
    let (client, store) = setup_client(keep_partial_config(1024));
    let data = payload(3000);
    store.fail_chunk(2);

    let report = client.upload_file(data.clone(), file_props("a.bin")).await;
    let session = report.session.unwrap();

    // Another writer finished the upload in the meantime.
    store.clear_failures();
    client.resume_upload(session.clone(), data.clone()).await;

    let again = client.resume_upload(session, data).await;
    assert_eq!(again.outcome.resolution, FileUploadResolveType::AlreadyUploaded);
    assert_eq!(again.outcome.message, "File is already uploaded.");
    assert!(again.session.is_none());
}

#[tokio::test]
async fn test_abort_kept_upload() {
    let (client, store) = setup_client(keep_partial_config(1024));
    store.reject_chunk(1);

    let report = client.upload_file(payload(3000), file_props("a.bin")).await;
    let session = report.session.unwrap();
    let file_id = session.file_id().to_string();

    assert!(client.abort_upload(session).await.unwrap());
    assert_eq!(store.delete_calls(), vec![vec![file_id.clone()]]);
    assert!(client.get_file_by_id(&file_id).await.is_none());
}

#[tokio::test]
async fn test_failed_file_does_not_affect_batch_siblings() {
    let (client, store) = setup_client(test_config(1024));
    store.reject_chunk(3);

    // Only the 4 KiB file reaches chunk index 3.
    let outcomes = client
        .upload_files(vec![
            (payload(100), file_props("small.bin")),
            (payload(4096), file_props("large.bin")),
            (payload(2048), file_props("medium.bin")),
        ])
        .await;

    let resolutions: Vec<FileUploadResolveType> = outcomes.iter().map(|o| o.resolution).collect();
    assert_eq!(
        resolutions,
        vec![
            FileUploadResolveType::SuccessfullyUploaded,
            FileUploadResolveType::FailedToUpload,
            FileUploadResolveType::SuccessfullyUploaded,
        ]
    );
}

#[tokio::test]
async fn test_resume_skips_chunk_applied_before_transport_error() {
    let (client, store) = setup_client(keep_partial_config(4));
    let data = Bytes::from_static(b"AAAABBBBCCCC");
    store.fail_chunk_after_apply(1);

    let report = client.upload_file(data.clone(), file_props("a.bin")).await;
    assert_eq!(report.outcome.resolution, FileUploadResolveType::FailedToUpload);
    let session = report.session.unwrap();
    assert_eq!(session.next_index(), 1);

    store.clear_failures();
    store.clear_calls();

    let resumed = client.resume_upload(session, data.clone()).await;
    assert_eq!(resumed.outcome.resolution, FileUploadResolveType::SuccessfullyUploaded);

    // Chunk 1 is already stored; only chunk 2 goes out.
    assert_eq!(
        store.add_bytes_calls(),
        vec![(resumed.outcome.file_id.clone(), 4, true)]
    );

    let fetched = client.get_file_by_id(&resumed.outcome.file_id).await.unwrap();
    assert_eq!(fetched.data, data);
}

#[tokio::test]
async fn test_resume_after_last_chunk_applied_is_already_uploaded() {
    let (client, store) = setup_client(keep_partial_config(4));
    let data = Bytes::from_static(b"AAAABBBBCC");
    store.fail_chunk_after_apply(2);

    let report = client.upload_file(data.clone(), file_props("a.bin")).await;
    let session = report.session.unwrap();

    store.clear_failures();
    store.clear_calls();

    let resumed = client.resume_upload(session, data.clone()).await;
    assert_eq!(resumed.outcome.resolution, FileUploadResolveType::AlreadyUploaded);
    assert!(store.add_bytes_calls().is_empty());

    let fetched = client.get_file_by_id(&resumed.outcome.file_id).await.unwrap();
    assert_eq!(fetched.data, data);
}

mod common;

use common::{JPEG, PNG, StubFetcher, harness};
use rolodex_core::{MediaMetadataUpdate, MediaSource, MediaType};
use rolodex_interface::MediaLedger;
use rolodex_storage::StorageProvider;
use std::time::Duration;

const URL: &str = "https://cdn.example.com/u/42/photo.jpg";

#[tokio::test]
async fn test_ingest_from_url_writes_bytes_and_row() {
    let h = harness(StubFetcher::default().with(URL, JPEG, Some("application/octet-stream")));

    let artifact = h
        .store
        .ingest_from_url(URL, 42, MediaSource::ScheduledCapture, None)
        .await
        .unwrap()
        .expect("ingested");

    assert_eq!(artifact.subject_id, 42);
    assert_eq!(artifact.mime_type, "image/jpeg");
    assert_eq!(artifact.media_type, MediaType::Image);
    assert_eq!(artifact.source_url.as_deref(), Some(URL));
    assert_eq!(artifact.file_size_bytes, JPEG.len() as i64);
    assert_eq!(artifact.sha256.as_deref(), Some(rolodex_storage::compute_sha256(JPEG).as_str()));
    assert!(!artifact.is_primary);

    // {subject}/{subject}_{millis}_{hash8}.{ext}
    let (dir, file) = artifact.relative_path.split_once('/').unwrap();
    assert_eq!(dir, "42");
    let parts: Vec<_> = file.trim_end_matches(".jpg").split('_').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "42");
    assert_eq!(parts[1].len(), 13);
    assert_eq!(parts[2].len(), 8);
    assert!(file.ends_with(".jpg"));

    assert_eq!(h.disk.read(&artifact.relative_path).await.unwrap(), JPEG);
    assert_eq!(h.store.read_bytes(artifact.id).await.unwrap(), JPEG);
}

#[tokio::test]
async fn test_placeholder_url_never_creates_rows() {
    let url = "https://cdn.example.com/static/default_profile_images/default_profile.png";
    let h = harness(StubFetcher::default().with(url, PNG, None));

    for _ in 0..3 {
        let result = h
            .store
            .ingest_from_url(url, 1, MediaSource::Profile, None)
            .await
            .unwrap();
        assert!(result.is_none());
    }
    assert!(h.ledger.is_empty().await);
    assert_eq!(h.fetcher.calls(), 0);
}

#[tokio::test]
async fn test_placeholder_sized_payload_is_rejected() {
    let placeholder = vec![0u8; 2_161];
    let h = harness(StubFetcher::default().with(URL, &placeholder, Some("image/png")));

    let result = h
        .store
        .ingest_from_url(URL, 1, MediaSource::Profile, None)
        .await
        .unwrap();
    assert!(result.is_none());
    assert!(h.ledger.is_empty().await);
}

#[tokio::test]
async fn test_same_url_is_ingested_once() {
    let h = harness(StubFetcher::default().with(URL, JPEG, None));

    let first = h
        .store
        .ingest_from_url(URL, 7, MediaSource::ScheduledCapture, None)
        .await
        .unwrap();
    let second = h
        .store
        .ingest_from_url(URL, 7, MediaSource::ScheduledCapture, None)
        .await
        .unwrap();

    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(h.store.list_for_subject(7).await.unwrap().len(), 1);
    assert_eq!(h.fetcher.calls(), 1);
}

#[tokio::test]
async fn test_same_bytes_from_another_url_are_skipped_per_subject() {
    let other = "https://mirror.example.com/photo.jpg";
    let h = harness(
        StubFetcher::default()
            .with(URL, JPEG, None)
            .with(other, JPEG, None),
    );

    assert!(
        h.store
            .ingest_from_url(URL, 7, MediaSource::External, None)
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        h.store
            .ingest_from_url(other, 7, MediaSource::External, None)
            .await
            .unwrap()
            .is_none()
    );
    // A different subject may hold the same bytes
    assert!(
        h.store
            .ingest_from_url(other, 8, MediaSource::External, None)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_fetch_failure_yields_none() {
    let h = harness(StubFetcher::default());
    let result = h
        .store
        .ingest_from_url(URL, 1, MediaSource::External, None)
        .await
        .unwrap();
    assert!(result.is_none());
    assert!(h.ledger.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_slow_fetch_times_out() {
    let h = harness(
        StubFetcher::default()
            .with(URL, JPEG, None)
            .slow(Duration::from_secs(60)),
    );
    let result = h
        .store
        .ingest_from_url(URL, 1, MediaSource::External, None)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_explicit_mime_wins() {
    let h = harness(StubFetcher::default().with(URL, JPEG, Some("image/gif")));
    let artifact = h
        .store
        .ingest_from_url(URL, 1, MediaSource::External, Some("video/mp4"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(artifact.mime_type, "video/mp4");
    assert_eq!(artifact.media_type, MediaType::Video);
    assert!(artifact.relative_path.ends_with(".mp4"));
}

#[tokio::test]
async fn test_upload_rejects_empty_payload() {
    let h = harness(StubFetcher::default());
    let err = h
        .store
        .ingest_upload(&[], "a.jpg", "image/jpeg", 1, MediaSource::ManualUpload)
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_upload_skips_placeholder_checks() {
    let h = harness(StubFetcher::default());
    let placeholder_sized = vec![1u8; 2_161];
    let artifact = h
        .store
        .ingest_upload(
            &placeholder_sized,
            "placeholder.png",
            "image/png",
            3,
            MediaSource::ManualUpload,
        )
        .await
        .unwrap();
    assert_eq!(artifact.original_filename.as_deref(), Some("placeholder.png"));
    assert!(artifact.relative_path.starts_with("3/3_"));
    assert!(artifact.relative_path.ends_with(".png"));
}

#[tokio::test]
async fn test_primary_is_exclusive_and_falls_back_to_most_recent() {
    let h = harness(StubFetcher::default());
    let older = h
        .store
        .ingest_upload(JPEG, "a.jpg", "image/jpeg", 5, MediaSource::ManualUpload)
        .await
        .unwrap();
    let newer = h
        .store
        .ingest_upload(PNG, "b.png", "image/png", 5, MediaSource::ManualUpload)
        .await
        .unwrap();

    // Capture time beats upload time
    let update = MediaMetadataUpdate {
        captured_at: Some(chrono::Utc::now() + chrono::Duration::days(1)),
        ..Default::default()
    };
    h.store.update_metadata(older.id, &update).await.unwrap();
    assert_eq!(h.store.get_primary(5).await.unwrap().unwrap().id, older.id);

    h.store.set_primary(older.id).await.unwrap();
    h.store.set_primary(newer.id).await.unwrap();
    let live = h.store.list_for_subject(5).await.unwrap();
    assert_eq!(live.iter().filter(|a| a.is_primary).count(), 1);
    assert_eq!(h.store.get_primary(5).await.unwrap().unwrap().id, newer.id);

    assert!(h.store.get_primary(6).await.unwrap().is_none());
}

#[tokio::test]
async fn test_soft_delete_keeps_bytes_and_row() {
    let h = harness(StubFetcher::default());
    let artifact = h
        .store
        .ingest_upload(JPEG, "a.jpg", "image/jpeg", 1, MediaSource::ManualUpload)
        .await
        .unwrap();
    h.store.set_primary(artifact.id).await.unwrap();

    assert!(h.store.soft_delete(artifact.id).await.unwrap());
    assert!(!h.store.soft_delete(artifact.id).await.unwrap());

    let row = h.store.get(artifact.id).await.unwrap().unwrap();
    assert!(row.deleted_at.is_some());
    assert!(!row.is_primary);
    assert!(h.store.list_for_subject(1).await.unwrap().is_empty());
    assert!(h.disk.exists(&artifact.relative_path).await.unwrap());
}

#[tokio::test]
async fn test_hard_delete_removes_bytes_once() {
    let h = harness(StubFetcher::default());
    let artifact = h
        .store
        .ingest_upload(JPEG, "a.jpg", "image/jpeg", 1, MediaSource::ManualUpload)
        .await
        .unwrap();

    assert!(h.store.hard_delete(artifact.id).await.unwrap());
    assert!(!h.disk.exists(&artifact.relative_path).await.unwrap());
    assert!(h.store.get(artifact.id).await.unwrap().is_none());
    assert!(!h.store.hard_delete(artifact.id).await.unwrap());
}

#[tokio::test]
async fn test_hard_delete_keeps_bytes_shared_with_another_row() {
    let h = harness(StubFetcher::default());
    let first = h
        .store
        .ingest_upload(JPEG, "a.jpg", "image/jpeg", 1, MediaSource::ManualUpload)
        .await
        .unwrap();
    h.store.soft_delete(first.id).await.unwrap();

    // A second row reuses the location once the first is no longer live
    let mut new = rolodex_core::NewMediaArtifact::new(
        1,
        first.storage_provider,
        first.relative_path.clone(),
        MediaSource::Imported,
        "image/jpeg",
        JPEG.len() as i64,
    );
    new.sha256 = first.sha256.clone();
    let second = h.ledger.insert(new).await.unwrap();

    assert!(h.store.hard_delete(second.id).await.unwrap());
    assert!(h.disk.exists(&first.relative_path).await.unwrap());
}

#[tokio::test]
async fn test_unknown_ids() {
    let h = harness(StubFetcher::default());
    let id = uuid::Uuid::new_v4();
    assert!(h.store.get(id).await.unwrap().is_none());
    assert!(h.store.set_primary(id).await.unwrap().is_none());
    assert!(!h.store.soft_delete(id).await.unwrap());
    assert!(h.store.set_favorite(id, true).await.unwrap_err().is_not_found());
    assert!(h.store.read_bytes(id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_photoset_marker_survives_delete() {
    let h = harness(StubFetcher::default());
    let artifact = h
        .store
        .ingest_upload(JPEG, "a.jpg", "image/jpeg", 1, MediaSource::FollowSnapshot)
        .await
        .unwrap();
    let update = MediaMetadataUpdate {
        photoset_id: Some("batch-2024-01".into()),
        ..Default::default()
    };
    h.store.update_metadata(artifact.id, &update).await.unwrap();

    assert!(!h.store.is_photoset_deleted(1, "batch-2024-01").await.unwrap());
    h.store.hard_delete(artifact.id).await.unwrap();
    assert!(h.store.is_photoset_deleted(1, "batch-2024-01").await.unwrap());

    let markers = h.store.deleted_photosets(1).await.unwrap();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].photoset_id, "batch-2024-01");
}

#[tokio::test]
async fn test_find_by_sha256() {
    let h = harness(StubFetcher::default());
    let artifact = h
        .store
        .ingest_upload(JPEG, "a.jpg", "image/jpeg", 1, MediaSource::ManualUpload)
        .await
        .unwrap();
    let found = h
        .store
        .find_by_sha256(artifact.sha256.as_deref().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, artifact.id);
    assert!(h.ledger.get(artifact.id).await.unwrap().is_some());
}

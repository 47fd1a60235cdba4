use rolodex_core::{
    MediaMetadataUpdate, MediaSource, NewMediaArtifact, ProviderKind, StorageLocation,
};
use rolodex_database::{MemoryLedger, MemorySubjectDirectory};
use rolodex_interface::{MediaLedger, SubjectDirectory};

fn new_artifact(subject_id: i64, path: &str) -> NewMediaArtifact {
    NewMediaArtifact::new(
        subject_id,
        ProviderKind::LocalDisk,
        path,
        MediaSource::ManualUpload,
        "image/jpeg",
        100,
    )
}

#[tokio::test]
async fn test_insert_rejects_duplicate_live_location() {
    let ledger = MemoryLedger::new();
    ledger.insert(new_artifact(1, "1/a.jpg")).await.unwrap();

    let err = ledger.insert(new_artifact(2, "1/a.jpg")).await.unwrap_err();
    assert!(err.is_conflict());

    // Same path on another provider is a different location
    let mut other = new_artifact(1, "1/a.jpg");
    other.storage_provider = ProviderKind::ObjectStore;
    assert!(ledger.insert(other).await.is_ok());
}

#[tokio::test]
async fn test_soft_deleted_location_can_be_reused() {
    let ledger = MemoryLedger::new();
    let first = ledger.insert(new_artifact(1, "1/a.jpg")).await.unwrap();
    assert!(ledger.soft_delete(first.id).await.unwrap());

    ledger.insert(new_artifact(1, "1/a.jpg")).await.unwrap();
    let location = StorageLocation::new(ProviderKind::LocalDisk, "1/a.jpg");
    assert_eq!(ledger.count_at_location(&location).await.unwrap(), 2);
}

#[tokio::test]
async fn test_set_primary_is_exclusive_per_subject() {
    let ledger = MemoryLedger::new();
    let a = ledger.insert(new_artifact(1, "1/a.jpg")).await.unwrap();
    let b = ledger.insert(new_artifact(1, "1/b.jpg")).await.unwrap();
    let other = ledger.insert(new_artifact(2, "2/c.jpg")).await.unwrap();

    ledger.set_primary(a.id).await.unwrap();
    ledger.set_primary(other.id).await.unwrap();
    let b = ledger.set_primary(b.id).await.unwrap().unwrap();
    assert!(b.is_primary);

    assert!(!ledger.get(a.id).await.unwrap().unwrap().is_primary);
    assert!(ledger.get(other.id).await.unwrap().unwrap().is_primary);
}

#[tokio::test]
async fn test_insert_never_adds_a_second_primary() {
    let ledger = MemoryLedger::new();
    let a = ledger.insert(new_artifact(1, "1/a.jpg")).await.unwrap();
    ledger.set_primary(a.id).await.unwrap();

    let b = ledger.insert(new_artifact(1, "1/b.jpg")).await.unwrap();
    assert!(!b.is_primary);

    let live = ledger.list_live_for_subject(1).await.unwrap();
    let primaries: Vec<_> = live.iter().filter(|x| x.is_primary).map(|x| x.id).collect();
    assert_eq!(primaries, vec![a.id]);
}

#[tokio::test]
async fn test_set_primary_on_deleted_artifact_is_none() {
    let ledger = MemoryLedger::new();
    let a = ledger.insert(new_artifact(1, "1/a.jpg")).await.unwrap();
    ledger.soft_delete(a.id).await.unwrap();
    assert!(ledger.set_primary(a.id).await.unwrap().is_none());
    assert!(ledger.set_primary(uuid::Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_soft_delete_clears_primary_and_records_photoset() {
    let ledger = MemoryLedger::new();
    let mut new = new_artifact(1, "1/a.jpg");
    new.photoset_id = Some("set-9".into());
    let a = ledger.insert(new).await.unwrap();
    ledger.set_primary(a.id).await.unwrap();

    assert!(ledger.soft_delete(a.id).await.unwrap());
    assert!(!ledger.soft_delete(a.id).await.unwrap());

    let row = ledger.get(a.id).await.unwrap().unwrap();
    assert!(row.deleted_at.is_some());
    assert!(!row.is_primary);
    assert!(ledger.is_photoset_deleted(1, "set-9").await.unwrap());
    assert!(!ledger.is_photoset_deleted(2, "set-9").await.unwrap());
    assert_eq!(ledger.deleted_photosets(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_hard_delete_removes_row_and_keeps_marker() {
    let ledger = MemoryLedger::new();
    let mut new = new_artifact(1, "1/a.jpg");
    new.photoset_id = Some("set-1".into());
    let a = ledger.insert(new).await.unwrap();

    let removed = ledger.hard_delete(a.id).await.unwrap().unwrap();
    assert_eq!(removed.id, a.id);
    assert!(ledger.get(a.id).await.unwrap().is_none());
    assert!(ledger.hard_delete(a.id).await.unwrap().is_none());
    assert!(ledger.is_photoset_deleted(1, "set-1").await.unwrap());
}

#[tokio::test]
async fn test_record_sha256_only_fills_missing_hash() {
    let ledger = MemoryLedger::new();
    let a = ledger.insert(new_artifact(1, "1/a.jpg")).await.unwrap();

    ledger.record_sha256(a.id, "aa").await.unwrap();
    ledger.record_sha256(a.id, "aa").await.unwrap();
    let err = ledger.record_sha256(a.id, "bb").await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(
        ledger.get(a.id).await.unwrap().unwrap().sha256.as_deref(),
        Some("aa")
    );
}

#[tokio::test]
async fn test_relocate_is_compare_and_set() {
    let ledger = MemoryLedger::new();
    let a = ledger.insert(new_artifact(1, "old/a.jpg")).await.unwrap();
    let from = a.location();
    let to = StorageLocation::new(ProviderKind::ObjectStore, "1/a.jpg");

    let moved = ledger.relocate(a.id, &from, &to).await.unwrap();
    assert_eq!(moved.location(), to);

    // Second attempt sees the row already moved
    let err = ledger.relocate(a.id, &from, &to).await.unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_relocate_refuses_occupied_target() {
    let ledger = MemoryLedger::new();
    let a = ledger.insert(new_artifact(1, "old/a.jpg")).await.unwrap();
    let mut occupant = new_artifact(1, "1/a.jpg");
    occupant.storage_provider = ProviderKind::ObjectStore;
    ledger.insert(occupant).await.unwrap();

    let to = StorageLocation::new(ProviderKind::ObjectStore, "1/a.jpg");
    assert!(ledger.relocate(a.id, &a.location(), &to).await.is_err());
    assert_eq!(ledger.get(a.id).await.unwrap().unwrap().location(), a.location());
}

#[tokio::test]
async fn test_reconcile_duplicate_moves_references_and_primary() {
    let ledger = MemoryLedger::new();
    let keep = ledger.insert(new_artifact(1, "1/a.jpg")).await.unwrap();
    let dup = ledger.insert(new_artifact(1, "1/b.jpg")).await.unwrap();
    ledger.set_primary(dup.id).await.unwrap();
    ledger.link_reference("polling_session_media", 10, dup.id).await;
    ledger.link_reference("polling_session_media", 11, dup.id).await;
    ledger.link_reference("polling_session_media", 12, keep.id).await;

    let outcome = ledger.reconcile_duplicate(dup.id, keep.id).await.unwrap();
    assert_eq!(outcome.references_moved, 2);
    assert!(outcome.primary_transferred);

    assert_eq!(ledger.count_references(keep.id).await.unwrap(), 3);
    assert_eq!(ledger.count_references(dup.id).await.unwrap(), 0);
    let dup_row = ledger.get(dup.id).await.unwrap().unwrap();
    assert!(!dup_row.is_live());
    assert!(!dup_row.is_primary);
    assert!(ledger.get(keep.id).await.unwrap().unwrap().is_primary);
}

#[tokio::test]
async fn test_reconcile_duplicate_across_subjects_keeps_primary_local() {
    let ledger = MemoryLedger::new();
    let keep = ledger.insert(new_artifact(1, "1/a.jpg")).await.unwrap();
    let dup = ledger.insert(new_artifact(2, "2/a.jpg")).await.unwrap();
    ledger.set_primary(dup.id).await.unwrap();

    let outcome = ledger.reconcile_duplicate(dup.id, keep.id).await.unwrap();
    assert!(!outcome.primary_transferred);
    assert!(!ledger.get(keep.id).await.unwrap().unwrap().is_primary);
}

#[tokio::test]
async fn test_reconcile_duplicate_validates_before_mutating() {
    let ledger = MemoryLedger::new();
    let keep = ledger.insert(new_artifact(1, "1/a.jpg")).await.unwrap();
    let dup = ledger.insert(new_artifact(1, "1/b.jpg")).await.unwrap();
    ledger.link_reference("notes", 1, dup.id).await;

    let err = ledger.reconcile_duplicate(keep.id, keep.id).await.unwrap_err();
    assert!(err.is_validation());

    ledger.soft_delete(keep.id).await.unwrap();
    let err = ledger.reconcile_duplicate(dup.id, keep.id).await.unwrap_err();
    assert!(err.is_not_found());

    // Nothing moved
    assert_eq!(ledger.references_to(dup.id).await.len(), 1);
    assert!(ledger.get(dup.id).await.unwrap().unwrap().is_live());
}

#[tokio::test]
async fn test_hash_groups_are_first_seen_ordered() {
    let ledger = MemoryLedger::new();
    let mut ids = Vec::new();
    for (path, hash) in [("1/a", "h1"), ("1/b", "h2"), ("1/c", "h1"), ("1/d", "h3")] {
        let mut new = new_artifact(1, path);
        new.sha256 = Some(hash.into());
        ids.push(ledger.insert(new).await.unwrap().id);
    }

    let groups = ledger.live_hash_groups().await.unwrap();
    assert_eq!(groups, vec![("h1".to_string(), vec![ids[0], ids[2]])]);

    ledger.soft_delete(ids[2]).await.unwrap();
    assert!(ledger.live_hash_groups().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_find_by_sha256_scopes_to_subject() {
    let ledger = MemoryLedger::new();
    let mut new = new_artifact(1, "1/a.jpg");
    new.sha256 = Some("abc".into());
    let a = ledger.insert(new).await.unwrap();

    assert_eq!(
        ledger.find_live_by_sha256("abc", None).await.unwrap().map(|a| a.id),
        Some(a.id)
    );
    assert!(ledger.find_live_by_sha256("abc", Some(2)).await.unwrap().is_none());
    assert!(ledger.find_live_by_sha256("abc", Some(1)).await.unwrap().is_some());
}

#[tokio::test]
async fn test_list_live_by_provider_pages_by_id() {
    let ledger = MemoryLedger::new();
    for i in 0..5 {
        ledger.insert(new_artifact(1, &format!("1/{}.jpg", i))).await.unwrap();
    }

    let first = ledger
        .list_live_by_provider(ProviderKind::LocalDisk, None, 3)
        .await
        .unwrap();
    assert_eq!(first.len(), 3);
    let rest = ledger
        .list_live_by_provider(ProviderKind::LocalDisk, first.last().map(|a| a.id), 3)
        .await
        .unwrap();
    assert_eq!(rest.len(), 2);
    assert!(rest.iter().all(|a| a.id > first[2].id));
}

#[tokio::test]
async fn test_update_metadata_and_favorite() {
    let ledger = MemoryLedger::new();
    let a = ledger.insert(new_artifact(1, "1/a.jpg")).await.unwrap();

    let update = MediaMetadataUpdate {
        title: Some("Beach".into()),
        ..Default::default()
    };
    let updated = ledger.update_metadata(a.id, &update).await.unwrap();
    assert_eq!(updated.title.as_deref(), Some("Beach"));

    assert!(ledger.set_favorite(a.id, true).await.unwrap().is_favorite);
    let err = ledger
        .set_favorite(uuid::Uuid::new_v4(), true)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_subject_directory_handle_lookup_ignores_case() {
    let subjects = MemorySubjectDirectory::with_subjects([(7, "JaneDoe"), (8, "other")]);
    assert_eq!(subjects.find_by_handle("janedoe").await.unwrap(), Some(7));
    assert_eq!(subjects.find_by_handle("nobody").await.unwrap(), None);
    assert!(subjects.exists(8).await.unwrap());
    assert!(!subjects.exists(9).await.unwrap());
}

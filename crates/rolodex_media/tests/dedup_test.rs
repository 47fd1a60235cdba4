use rolodex_core::{BatchOptions, MediaSource, NewMediaArtifact, ProviderKind};
use rolodex_database::MemoryLedger;
use rolodex_interface::MediaLedger;
use rolodex_media::DedupEngine;
use std::sync::Arc;
use uuid::Uuid;

async fn insert(ledger: &MemoryLedger, subject_id: i64, path: &str, sha256: &str) -> Uuid {
    let mut new = NewMediaArtifact::new(
        subject_id,
        ProviderKind::LocalDisk,
        path,
        MediaSource::ManualUpload,
        "image/jpeg",
        10,
    );
    new.sha256 = Some(sha256.to_string());
    ledger.insert(new).await.unwrap().id
}

#[tokio::test]
async fn test_survivor_is_most_referenced() {
    let ledger = Arc::new(MemoryLedger::new());
    let a = insert(&ledger, 1, "1/a", "h").await;
    let b = insert(&ledger, 1, "1/b", "h").await;
    let c = insert(&ledger, 1, "1/c", "h").await;
    ledger.link_reference("polling_session_media", 1, b).await;
    ledger.link_reference("polling_session_media", 2, b).await;
    ledger.link_reference("polling_session_media", 3, c).await;

    let engine = DedupEngine::new(ledger.clone(), 10);
    let groups = engine.find_duplicate_groups().await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].keep_id, b);
    assert_eq!(groups[0].duplicate_ids, vec![a, c]);
}

#[tokio::test]
async fn test_survivor_ties_go_to_first_seen() {
    let ledger = Arc::new(MemoryLedger::new());
    let a = insert(&ledger, 1, "1/a", "h").await;
    let b = insert(&ledger, 1, "1/b", "h").await;

    let engine = DedupEngine::new(ledger.clone(), 10);
    let groups = engine.find_duplicate_groups().await.unwrap();
    assert_eq!(groups[0].keep_id, a);
    assert_eq!(groups[0].duplicate_ids, vec![b]);
}

#[tokio::test]
async fn test_reconcile_all_leaves_one_live_artifact_per_hash() {
    let ledger = Arc::new(MemoryLedger::new());
    let a = insert(&ledger, 1, "1/a", "h1").await;
    let b = insert(&ledger, 1, "1/b", "h1").await;
    insert(&ledger, 2, "2/c", "h2").await;
    insert(&ledger, 2, "2/d", "h2").await;
    insert(&ledger, 2, "2/e", "h2").await;
    insert(&ledger, 3, "3/f", "h3").await;
    ledger.set_primary(b).await.unwrap();
    ledger.link_reference("notes", 9, b).await;

    let engine = DedupEngine::new(ledger.clone(), 10);

    let dry = engine.reconcile_all(&BatchOptions::dry_run()).await.unwrap();
    assert_eq!(dry.total_found, 3);
    assert_eq!(dry.processed, 3);
    assert_eq!(engine.find_duplicate_groups().await.unwrap().len(), 2);

    let report = engine.reconcile_all(&BatchOptions::execute()).await.unwrap();
    assert!(report.success());
    assert_eq!(report.processed, 3);
    assert!(engine.find_duplicate_groups().await.unwrap().is_empty());

    // b had the reference, so it survived and kept its primary flag
    assert!(!ledger.get(a).await.unwrap().unwrap().is_live());
    let survivor = ledger.get(b).await.unwrap().unwrap();
    assert!(survivor.is_live());
    assert!(survivor.is_primary);
}

#[tokio::test]
async fn test_reconcile_transfers_primary_within_subject() {
    let ledger = Arc::new(MemoryLedger::new());
    let keep = insert(&ledger, 1, "1/a", "h").await;
    let dup = insert(&ledger, 1, "1/b", "h").await;
    ledger.set_primary(dup).await.unwrap();
    ledger.link_reference("notes", 1, dup).await;

    let engine = DedupEngine::new(ledger.clone(), 10);
    let outcome = engine.reconcile(dup, keep).await.unwrap();
    assert_eq!(outcome.references_moved, 1);
    assert!(outcome.primary_transferred);
    assert!(ledger.get(keep).await.unwrap().unwrap().is_primary);
}

#[tokio::test]
async fn test_reconcile_errors() {
    let ledger = Arc::new(MemoryLedger::new());
    let keep = insert(&ledger, 1, "1/a", "h").await;
    let engine = DedupEngine::new(ledger.clone(), 10);

    assert!(engine.reconcile(keep, keep).await.unwrap_err().is_validation());
    assert!(
        engine
            .reconcile(Uuid::new_v4(), keep)
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
async fn test_max_items_caps_reconcile_all() {
    let ledger = Arc::new(MemoryLedger::new());
    for i in 0..4 {
        insert(&ledger, 1, &format!("1/{}", i), "h").await;
    }
    let engine = DedupEngine::new(ledger.clone(), 10);

    let report = engine
        .reconcile_all(&BatchOptions::execute().with_max_items(2))
        .await
        .unwrap();
    assert_eq!(report.processed, 2);
    let groups = engine.find_duplicate_groups().await.unwrap();
    assert_eq!(groups[0].duplicate_ids.len(), 1);
}

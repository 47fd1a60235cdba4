//! Tests for layered configuration and service wiring.

use rolodex::{
    MediaSource, MemoryLedger, MemorySubjectDirectory, ProviderKind, ReferenceColumn, Rolodex,
    RolodexConfig, StorageConfig,
};
use std::io::Write;
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};

fn toml_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_bundled_defaults() {
    let config = RolodexConfig::load_layered(&[]).unwrap();

    assert_eq!(config.storage.default_provider, ProviderKind::LocalDisk);
    assert_eq!(config.ingest.fetch_timeout_secs, 10);
    assert!(
        config
            .ingest
            .placeholder
            .url_patterns
            .contains(&"default_profile".to_string())
    );
    assert_eq!(config.ingest.placeholder.sizes.len(), 2);
    assert_eq!(config.ingest.placeholder.sizes[1].tolerance, 0);
    assert_eq!(
        config.dedup.reference_columns,
        vec![ReferenceColumn::new("polling_session_media", "media_id").unwrap()]
    );
    assert_eq!(config.reconcile.batch_size, 500);
    assert_eq!(config.reconcile.max_error_samples, 100);
}

#[test]
fn test_user_file_overrides_defaults() {
    let file = toml_file(
        r#"
        [storage]
        default_provider = "fast-volume"
        fast_volume_root = "/mnt/ssd/media"

        [reconcile]
        batch_size = 50
        "#,
    );

    let config = RolodexConfig::load_layered(&[file.path().to_path_buf()]).unwrap();
    assert_eq!(config.storage.default_provider, ProviderKind::FastVolume);
    assert_eq!(
        config.storage.fast_volume_root.as_deref(),
        Some(std::path::Path::new("/mnt/ssd/media"))
    );
    // Untouched keys keep their defaults
    assert_eq!(config.reconcile.max_error_samples, 100);
    assert_eq!(config.ingest.fetch_timeout_secs, 10);
}

#[test]
fn test_missing_optional_files_are_skipped() {
    let dir = TempDir::new().unwrap();
    let config = RolodexConfig::load_layered(&[dir.path().join("absent.toml")]).unwrap();
    assert_eq!(config.reconcile.batch_size, 500);
}

#[test]
fn test_explicit_file_must_exist() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");
    let err = RolodexConfig::load_with(Some(missing.as_path())).unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_invalid_reference_column_is_rejected() {
    let file = toml_file(
        r#"
        [storage]
        default_provider = "local-disk"

        [dedup]
        reference_columns = [{ table = "media; drop table x", column = "media_id" }]
        "#,
    );
    assert!(RolodexConfig::from_file(file.path()).is_err());
}

#[test]
fn test_zero_batch_size_is_rejected() {
    let file = toml_file(
        r#"
        [storage]
        default_provider = "local-disk"

        [reconcile]
        batch_size = 0
        "#,
    );
    assert!(RolodexConfig::from_file(file.path()).is_err());
}

#[test]
fn test_build_providers() {
    let disk = TempDir::new().unwrap();
    let ssd = TempDir::new().unwrap();
    let storage = StorageConfig {
        default_provider: ProviderKind::FastVolume,
        local_disk_root: Some(disk.path().to_path_buf()),
        fast_volume_root: Some(ssd.path().to_path_buf()),
        object_store: None,
    };

    let providers = storage.build_providers().unwrap();
    assert_eq!(providers.default_kind(), ProviderKind::FastVolume);
    assert!(providers.get(ProviderKind::LocalDisk).is_ok());
    assert!(providers.get(ProviderKind::ObjectStore).is_err());
}

#[test]
fn test_unconfigured_default_provider_is_rejected() {
    let storage = StorageConfig {
        default_provider: ProviderKind::ObjectStore,
        local_disk_root: None,
        fast_volume_root: None,
        object_store: None,
    };
    assert!(storage.build_providers().is_err());
}

#[tokio::test]
async fn test_services_share_one_ledger() {
    let disk = TempDir::new().unwrap();
    let mut config = RolodexConfig::load_layered(&[]).unwrap();
    config.storage.local_disk_root = Some(disk.path().to_path_buf());

    let ledger = Arc::new(MemoryLedger::new());
    let rolodex = Rolodex::new(
        &config,
        ledger.clone(),
        Arc::new(MemorySubjectDirectory::with_subjects([(7, "ada")])),
    )
    .unwrap();

    let first = rolodex
        .records
        .ingest_upload(b"same bytes", "a.jpg", "image/jpeg", 7, MediaSource::ManualUpload)
        .await
        .unwrap();
    rolodex
        .records
        .ingest_upload(b"same bytes", "b.jpeg", "image/jpeg", 7, MediaSource::ManualUpload)
        .await
        .unwrap();
    assert_eq!(ledger.len().await, 2);

    let options = rolodex.reconciler.config().options(false);
    let report = rolodex.dedup.reconcile_all(&options).await.unwrap();
    assert_eq!(report.processed, 1);

    let live = rolodex.records.list_for_subject(7).await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].id, first.id);
}

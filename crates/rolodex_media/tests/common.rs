//! Shared fixtures for record store and dedup tests.

#![allow(dead_code)]

use async_trait::async_trait;
use rolodex_core::ProviderKind;
use rolodex_database::MemoryLedger;
use rolodex_error::{HttpError, RolodexResult};
use rolodex_media::{
    FetchedMedia, IngestConfig, MediaFetcher, MediaRecordStore, PatternPlaceholderDetector,
};
use rolodex_storage::{FileSystemProvider, StorageProviders};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3, 4, 5, 6, 7, 8];
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n-png-body-";

/// Serves canned responses and counts calls.
#[derive(Default)]
pub struct StubFetcher {
    responses: HashMap<String, FetchedMedia>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn with(mut self, url: &str, bytes: &[u8], content_type: Option<&str>) -> Self {
        self.responses.insert(
            url.to_string(),
            FetchedMedia {
                bytes: bytes.to_vec(),
                content_type: content_type.map(str::to_string),
            },
        );
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> RolodexResult<FetchedMedia> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| HttpError::new(format!("{} returned 404 Not Found", url)).into())
    }
}

pub struct Harness {
    pub store: MediaRecordStore,
    pub ledger: Arc<MemoryLedger>,
    pub fetcher: Arc<StubFetcher>,
    pub disk: Arc<FileSystemProvider>,
    _dir: TempDir,
}

pub fn harness(fetcher: StubFetcher) -> Harness {
    let dir = TempDir::new().unwrap();
    let disk = Arc::new(FileSystemProvider::new(ProviderKind::LocalDisk, dir.path()).unwrap());
    let ledger = Arc::new(MemoryLedger::new());
    let fetcher = Arc::new(fetcher);
    let config = IngestConfig::default();

    let store = MediaRecordStore::new(
        ledger.clone(),
        StorageProviders::new(ProviderKind::LocalDisk).with(disk.clone()),
        fetcher.clone(),
        Arc::new(PatternPlaceholderDetector::new(&config.placeholder)),
        config,
    );

    Harness {
        store,
        ledger,
        fetcher,
        disk,
        _dir: dir,
    }
}

//! Media ingestion, CRUD and deduplication for Rolodex.
//!
//! [`MediaRecordStore`] turns URLs and uploads into stored bytes plus a ledger
//! row, and owns the read, update and delete paths. [`DedupEngine`] finds
//! artifacts with identical content and folds them into one survivor.
//!
//! # Example
//!
//! ```rust,no_run
//! use rolodex_core::{MediaSource, ProviderKind};
//! use rolodex_database::MemoryLedger;
//! use rolodex_media::{
//!     HttpFetcher, IngestConfig, MediaRecordStore, PatternPlaceholderDetector,
//! };
//! use rolodex_storage::{FileSystemProvider, StorageProviders};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = IngestConfig::default();
//! let disk = FileSystemProvider::new(ProviderKind::LocalDisk, "/var/lib/rolodex/media")?;
//! let store = MediaRecordStore::new(
//!     Arc::new(MemoryLedger::new()),
//!     StorageProviders::new(ProviderKind::LocalDisk).with(Arc::new(disk)),
//!     Arc::new(HttpFetcher::new(config.fetch_timeout(), &config.user_agent)?),
//!     Arc::new(PatternPlaceholderDetector::new(&config.placeholder)),
//!     config,
//! );
//!
//! let artifact = store
//!     .ingest_from_url("https://example.com/a.jpg", 42, MediaSource::Profile, None)
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dedup;
mod fetch;
pub mod mime;
mod placeholder;
mod record_store;

pub use config::IngestConfig;
pub use dedup::DedupEngine;
pub use fetch::{FetchedMedia, HttpFetcher, MediaFetcher};
pub use placeholder::{
    PatternPlaceholderDetector, PlaceholderConfig, PlaceholderDetector, PlaceholderSize,
};
pub use record_store::MediaRecordStore;

//! Rolodex media vault.
//!
//! Stores contact photos and videos across several storage backends, keeps a
//! ledger of where every artifact's bytes live, folds duplicate content into
//! one survivor, and reconciles legacy storage with the ledger.
//!
//! # Architecture
//!
//! - `rolodex_error` - Error types
//! - `rolodex_core` - Ledger records, batch options and reports
//! - `rolodex_interface` - `MediaLedger` and `SubjectDirectory` traits
//! - `rolodex_storage` - Local disk and object store backends
//! - `rolodex_database` - In-memory and PostgreSQL ledgers
//! - `rolodex_media` - Ingestion, CRUD and deduplication
//! - `rolodex_reconcile` - Legacy import, migration and cleanup jobs
//!
//! This crate re-exports everything and adds layered configuration.
//!
//! # Cargo Features
//!
//! - `database` - PostgreSQL ledger
//!
//! # Example
//!
//! ```rust,no_run
//! use rolodex::{MemoryLedger, MemorySubjectDirectory, Rolodex, RolodexConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RolodexConfig::load()?;
//! let rolodex = Rolodex::new(
//!     &config,
//!     Arc::new(MemoryLedger::new()),
//!     Arc::new(MemorySubjectDirectory::new()),
//! )?;
//! let groups = rolodex.dedup.find_duplicate_groups().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod observability;
mod services;

pub use config::{
    DatabaseConfig, DedupConfig, ObjectStoreConfig, RolodexConfig, StorageConfig,
};
pub use observability::{ObservabilityConfig, init_observability};
pub use services::Rolodex;

pub use rolodex_core::*;
pub use rolodex_database::{
    MediaLedger, MemoryLedger, MemorySubjectDirectory, ReferenceColumn, ReferenceLink,
    SubjectDirectory,
};
pub use rolodex_error::*;
pub use rolodex_media::{
    DedupEngine, FetchedMedia, HttpFetcher, IngestConfig, MediaFetcher, MediaRecordStore,
    PatternPlaceholderDetector, PlaceholderConfig, PlaceholderDetector, PlaceholderSize, mime,
};
pub use rolodex_reconcile::{
    OrphanReport, ParsedFilename, ReconcileConfig, Reconciler, TrackedPaths,
    parse_legacy_filename,
};
pub use rolodex_storage::{
    FileSystemProvider, ListPage, ObjectEntry, ObjectStoreProvider, StorageProvider,
    StorageProviders, WriteReceipt, basename, compute_sha256, validate_key,
};

#[cfg(feature = "database")]
pub use rolodex_database::{
    PgPool, PostgresMediaLedger, PostgresSubjectDirectory, establish_pool, run_migrations,
};

//! Media ledger implementations for Rolodex.
//!
//! The ledger is the single source of truth for which media exists and where
//! its bytes live. Two implementations of [`MediaLedger`] are provided:
//!
//! - [`MemoryLedger`]: a mutex-guarded in-process ledger used by tests and
//!   local tooling
//! - `PostgresMediaLedger` (feature `postgres`): Diesel-backed PostgreSQL ledger
//!
//! # Example
//!
//! ```rust
//! use rolodex_core::{MediaSource, NewMediaArtifact, ProviderKind};
//! use rolodex_database::MemoryLedger;
//! use rolodex_interface::MediaLedger;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ledger = MemoryLedger::new();
//! let artifact = ledger
//!     .insert(NewMediaArtifact::new(
//!         42,
//!         ProviderKind::LocalDisk,
//!         "42/avatar.jpg",
//!         MediaSource::Profile,
//!         "image/jpeg",
//!         1024,
//!     ))
//!     .await?;
//! assert!(ledger.get(artifact.id).await?.is_some());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod memory;
mod reference;

#[cfg(feature = "postgres")]
mod connection;
#[cfg(feature = "postgres")]
mod models;
#[cfg(feature = "postgres")]
mod postgres_ledger;
#[cfg(feature = "postgres")]
mod postgres_subjects;
#[cfg(feature = "postgres")]
pub mod schema;

pub use memory::{MemoryLedger, MemorySubjectDirectory, ReferenceLink};
pub use reference::ReferenceColumn;
pub use rolodex_interface::{MediaLedger, SubjectDirectory};

#[cfg(feature = "postgres")]
pub use connection::{PgPool, establish_pool, run_migrations};
#[cfg(feature = "postgres")]
pub use postgres_ledger::PostgresMediaLedger;
#[cfg(feature = "postgres")]
pub use postgres_subjects::PostgresSubjectDirectory;

use rolodex_error::DatabaseError;

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

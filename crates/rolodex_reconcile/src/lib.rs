//! Legacy import, orphan discovery and cross-backend migration.
//!
//! The [`Reconciler`] keeps storage and ledger in agreement:
//!
//! - [`Reconciler::discover_orphans`] counts objects no ledger row tracks
//! - [`Reconciler::import_orphans`] records legacy-named orphans
//! - [`Reconciler::import_untracked`] records leftovers of interrupted runs
//! - [`Reconciler::migrate`] moves artifacts between providers
//! - [`Reconciler::cleanup_migrated`] deletes migrated source objects
//! - [`Reconciler::backfill_hashes`] fills in missing content hashes
//!
//! Every job defaults to a dry run and reports through
//! [`BatchReport`](rolodex_core::BatchReport).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backfill;
mod cleanup;
mod config;
mod filename;
mod import;
mod migrate;
mod orphans;
mod reconciler;
mod tracked;

pub use config::ReconcileConfig;
pub use filename::{ParsedFilename, parse_legacy_filename};
pub use orphans::OrphanReport;
pub use reconciler::Reconciler;
pub use tracked::TrackedPaths;

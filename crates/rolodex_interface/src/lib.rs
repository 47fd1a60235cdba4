//! Repository traits for the Rolodex media vault.
//!
//! Services depend on these traits rather than on a database driver, so the
//! PostgreSQL ledger and the in-memory ledger used by tests are interchangeable.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod ledger;
mod subjects;

pub use ledger::MediaLedger;
pub use subjects::SubjectDirectory;

//! Storage providers for Rolodex media.
//!
//! Every backend (plain local disk, the fast local volume, the object store)
//! implements the same [`StorageProvider`] contract. The ledger decides which
//! provider an artifact lives on; providers hold no authoritative state.
//!
//! # Example
//!
//! ```rust
//! use rolodex_core::ProviderKind;
//! use rolodex_storage::{FileSystemProvider, StorageProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let disk = FileSystemProvider::new(ProviderKind::LocalDisk, "/tmp/rolodex-media")?;
//!
//! let receipt = disk.write("42/avatar.jpg", b"jpeg bytes", "image/jpeg").await?;
//! assert_eq!(receipt.relative_path, "42/avatar.jpg");
//!
//! let data = disk.read("42/avatar.jpg").await?;
//! assert_eq!(data, b"jpeg bytes");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod filesystem;
mod key;
mod object;
mod provider;
mod registry;

pub use filesystem::FileSystemProvider;
pub use key::{basename, compute_sha256, validate_key};
pub use object::ObjectStoreProvider;
pub use provider::{ListPage, ObjectEntry, StorageProvider, WriteReceipt};
pub use registry::StorageProviders;
pub use rolodex_error::{StorageError, StorageErrorKind};

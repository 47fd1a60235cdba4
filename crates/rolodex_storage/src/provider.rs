//! Storage provider trait definition.

use chrono::{DateTime, Utc};
use rolodex_core::ProviderKind;
use rolodex_error::RolodexResult;

/// Uniform byte store implemented once per backend.
///
/// Keys are `/`-separated relative paths. Callers pick unique keys; a provider
/// never silently replaces an existing object with different bytes.
#[async_trait::async_trait]
pub trait StorageProvider: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> ProviderKind;

    /// Store bytes under `key`, creating intermediate directories or prefixes.
    ///
    /// Writing identical bytes to an existing key succeeds; different bytes
    /// fail with `StorageErrorKind::AlreadyExists`.
    async fn write(&self, key: &str, data: &[u8], mime_type: &str)
    -> RolodexResult<WriteReceipt>;

    /// Read the bytes stored under `key`.
    ///
    /// Missing keys fail with `StorageErrorKind::NotFound`.
    async fn read(&self, key: &str) -> RolodexResult<Vec<u8>>;

    /// Delete the object at `key`.
    ///
    /// Deleting a missing key reports `StorageErrorKind::NotFound`, which callers
    /// treat as non-fatal.
    async fn delete(&self, key: &str) -> RolodexResult<()>;

    /// Whether an object exists at `key`.
    async fn exists(&self, key: &str) -> RolodexResult<bool>;

    /// List up to `limit` objects under the directory `prefix`, in key order,
    /// strictly after `start_after`.
    ///
    /// `next_marker` is set when more objects may follow; pass it back as
    /// `start_after` to fetch the next page.
    async fn list(
        &self,
        prefix: Option<&str>,
        limit: usize,
        start_after: Option<&str>,
    ) -> RolodexResult<ListPage>;

    /// Copy an object within this backend.
    async fn copy(&self, src_key: &str, dst_key: &str) -> RolodexResult<()>;
}

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Key the bytes were stored under
    pub relative_path: String,
    /// Number of bytes stored
    pub size_bytes: u64,
    /// Backend that stored them
    pub provider: ProviderKind,
}

/// One listed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Relative key
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub last_modified: DateTime<Utc>,
}

/// A page of listed objects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Objects in key order
    pub entries: Vec<ObjectEntry>,
    /// Continuation marker when more objects may follow
    pub next_marker: Option<String>,
}

impl ListPage {
    /// Build a page from `limit + 1` candidates: the extra one only signals that
    /// another page exists.
    pub(crate) fn from_overfetch(mut entries: Vec<ObjectEntry>, limit: usize) -> Self {
        if entries.len() > limit {
            entries.truncate(limit);
            let next_marker = entries.last().map(|e| e.key.clone());
            Self {
                entries,
                next_marker,
            }
        } else {
            Self {
                entries,
                next_marker: None,
            }
        }
    }
}

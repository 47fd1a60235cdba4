//! Filesystem-backed storage provider.
//!
//! Serves both the plain local disk and the fast local volume; the two differ
//! only in their root directory and the [`ProviderKind`] they report.

use crate::{ListPage, ObjectEntry, StorageProvider, WriteReceipt, validate_key};
use chrono::{DateTime, Utc};
use rolodex_core::ProviderKind;
use rolodex_error::{RolodexResult, StorageError, StorageErrorKind};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Filesystem storage backend.
///
/// Keys map directly onto paths below the base directory:
///
/// ```text
/// /srv/rolodex/media/
/// ├── 42/
/// │   ├── 42_1700000000000_1a2b3c4d.jpg
/// │   └── 42_1700000360000_99aa00ff.mp4
/// └── legacy_handle_1600000000000_deadbeef.jpg
/// ```
///
/// # Features
///
/// - **Atomic writes**: temp file + rename, so readers never see partial objects
/// - **No silent overwrite**: an existing key only accepts identical bytes
/// - **Ordered listing**: recursive walk sorted by key, paged by marker
pub struct FileSystemProvider {
    kind: ProviderKind,
    base_path: PathBuf,
}

impl FileSystemProvider {
    /// Create a new filesystem provider.
    ///
    /// Creates the base directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or accessed.
    #[tracing::instrument(skip(base_path))]
    pub fn new(kind: ProviderKind, base_path: impl Into<PathBuf>) -> RolodexResult<Self> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::info!(path = %base_path.display(), %kind, "Created filesystem storage");
        Ok(Self { kind, base_path })
    }

    /// Root directory of this provider.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn full_path(&self, key: &str) -> RolodexResult<PathBuf> {
        validate_key(key)?;
        Ok(key
            .split('/')
            .fold(self.base_path.clone(), |path, segment| path.join(segment)))
    }

    fn relative_key(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.base_path).ok()?;
        let segments: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(segments.join("/"))
    }

    fn is_temp_file(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.') && n.ends_with(".tmp"))
    }

    /// Collect every object under `dir`, recursively.
    async fn walk(&self, dir: PathBuf) -> RolodexResult<Vec<ObjectEntry>> {
        let mut entries = Vec::new();
        let mut pending = vec![dir];

        while let Some(dir) = pending.pop() {
            let mut read_dir = match tokio::fs::read_dir(&dir).await {
                Ok(rd) => rd,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(StorageError::new(StorageErrorKind::List(format!(
                        "{}: {}",
                        dir.display(),
                        e
                    )))
                    .into());
                }
            };

            while let Some(entry) = read_dir.next_entry().await.map_err(|e| {
                StorageError::new(StorageErrorKind::List(format!("{}: {}", dir.display(), e)))
            })? {
                let path = entry.path();
                let metadata = entry.metadata().await.map_err(|e| {
                    StorageError::new(StorageErrorKind::List(format!(
                        "{}: {}",
                        path.display(),
                        e
                    )))
                })?;

                if metadata.is_dir() {
                    pending.push(path);
                } else if metadata.is_file() && !Self::is_temp_file(&path) {
                    let Some(key) = self.relative_key(&path) else {
                        continue;
                    };
                    let last_modified = metadata
                        .modified()
                        .map(DateTime::<Utc>::from)
                        .unwrap_or_else(|_| Utc::now());
                    entries.push(ObjectEntry {
                        key,
                        size: metadata.len(),
                        last_modified,
                    });
                }
            }
        }

        Ok(entries)
    }
}

#[async_trait::async_trait]
impl StorageProvider for FileSystemProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    #[tracing::instrument(skip(self, data), fields(provider = %self.kind, size = data.len()))]
    async fn write(
        &self,
        key: &str,
        data: &[u8],
        mime_type: &str,
    ) -> RolodexResult<WriteReceipt> {
        let path = self.full_path(key)?;
        let receipt = WriteReceipt {
            relative_path: key.to_string(),
            size_bytes: data.len() as u64,
            provider: self.kind,
        };

        // An existing key is only acceptable if it already holds these bytes
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            let existing = self.read(key).await?;
            if existing == data {
                tracing::debug!(path = %path.display(), "Identical object already stored");
                return Ok(receipt);
            }
            return Err(StorageError::new(StorageErrorKind::AlreadyExists(key.to_string())).into());
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        // Write to temp file first, then rename for atomicity
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));
        tokio::fs::write(&temp_path, data).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })?;

        tracing::info!(
            path = %path.display(),
            size = data.len(),
            mime_type,
            "Stored media file"
        );

        Ok(receipt)
    }

    #[tracing::instrument(skip(self), fields(provider = %self.kind))]
    async fn read(&self, key: &str) -> RolodexResult<Vec<u8>> {
        let path = self.full_path(key)?;

        let data = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(key.to_string()))
            } else {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        })?;

        tracing::debug!(path = %path.display(), size = data.len(), "Read media file");
        Ok(data)
    }

    #[tracing::instrument(skip(self), fields(provider = %self.kind))]
    async fn delete(&self, key: &str) -> RolodexResult<()> {
        let path = self.full_path(key)?;

        tokio::fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(key.to_string()))
            } else {
                StorageError::new(StorageErrorKind::FileDelete(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        })?;

        tracing::info!(path = %path.display(), "Deleted media file");
        Ok(())
    }

    async fn exists(&self, key: &str) -> RolodexResult<bool> {
        let path = self.full_path(key)?;
        Ok(tokio::fs::try_exists(path).await.unwrap_or(false))
    }

    #[tracing::instrument(skip(self), fields(provider = %self.kind))]
    async fn list(
        &self,
        prefix: Option<&str>,
        limit: usize,
        start_after: Option<&str>,
    ) -> RolodexResult<ListPage> {
        let root = match prefix.map(|p| p.trim_end_matches('/')).filter(|p| !p.is_empty()) {
            Some(dir) => self.full_path(dir)?,
            None => self.base_path.clone(),
        };

        let mut entries = self.walk(root).await?;
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        let candidates: Vec<_> = entries
            .into_iter()
            .filter(|e| start_after.is_none_or(|marker| e.key.as_str() > marker))
            .take(limit.saturating_add(1))
            .collect();

        Ok(ListPage::from_overfetch(candidates, limit))
    }

    #[tracing::instrument(skip(self), fields(provider = %self.kind))]
    async fn copy(&self, src_key: &str, dst_key: &str) -> RolodexResult<()> {
        let data = self.read(src_key).await?;
        self.write(dst_key, &data, "application/octet-stream").await?;
        Ok(())
    }
}

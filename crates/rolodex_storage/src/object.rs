//! Object-store-backed storage provider.
//!
//! Wraps any [`object_store::ObjectStore`]: S3 in production,
//! [`object_store::memory::InMemory`] in tests.

use crate::{ListPage, ObjectEntry, StorageProvider, WriteReceipt, validate_key};
use futures::StreamExt;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use rolodex_core::ProviderKind;
use rolodex_error::{ConfigError, RolodexResult, StorageError, StorageErrorKind};
use std::sync::Arc;

/// Object storage backend.
///
/// Keys are stored below an optional bucket prefix, so several environments can
/// share one bucket: key `42/a.jpg` with prefix `media` becomes `media/42/a.jpg`.
pub struct ObjectStoreProvider {
    store: Arc<dyn ObjectStore>,
    prefix: Option<String>,
}

impl ObjectStoreProvider {
    /// Wrap an object store.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            prefix: None,
        }
    }

    /// Store every key below `prefix`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into().trim_matches('/').to_string();
        self.prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    /// Connect to an S3-compatible bucket.
    ///
    /// Credentials come from the standard `AWS_*` environment variables.
    #[tracing::instrument]
    pub fn s3(bucket: &str, region: Option<&str>, endpoint: Option<&str>) -> RolodexResult<Self> {
        let mut builder = object_store::aws::AmazonS3Builder::from_env().with_bucket_name(bucket);
        if let Some(region) = region {
            builder = builder.with_region(region);
        }
        if let Some(endpoint) = endpoint {
            builder = builder.with_endpoint(endpoint).with_allow_http(true);
        }
        let store = builder.build().map_err(|e| {
            ConfigError::new(format!("Failed to configure S3 bucket {}: {}", bucket, e))
        })?;

        tracing::info!(bucket, "Created object storage");
        Ok(Self::new(Arc::new(store)))
    }

    fn location(&self, key: &str) -> RolodexResult<ObjectPath> {
        validate_key(key)?;
        Ok(match &self.prefix {
            Some(prefix) => ObjectPath::from(format!("{}/{}", prefix, key)),
            None => ObjectPath::from(key),
        })
    }

    fn directory(&self, dir: Option<&str>) -> RolodexResult<Option<ObjectPath>> {
        let dir = dir.map(|d| d.trim_matches('/')).filter(|d| !d.is_empty());
        match (dir, &self.prefix) {
            (Some(dir), _) => self.location(dir).map(Some),
            (None, Some(prefix)) => Ok(Some(ObjectPath::from(prefix.as_str()))),
            (None, None) => Ok(None),
        }
    }

    fn relative_key(&self, location: &ObjectPath) -> String {
        let full = location.as_ref();
        match &self.prefix {
            Some(prefix) => full
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .unwrap_or(full)
                .to_string(),
            None => full.to_string(),
        }
    }

    fn map_error(
        key: &str,
        err: object_store::Error,
        kind: fn(String) -> StorageErrorKind,
    ) -> StorageError {
        match err {
            object_store::Error::NotFound { .. } => {
                StorageError::new(StorageErrorKind::NotFound(key.to_string()))
            }
            other => StorageError::new(kind(format!("{}: {}", key, other))),
        }
    }

    async fn head(&self, key: &str, location: &ObjectPath) -> RolodexResult<bool> {
        match self.store.head(location).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(Self::map_error(key, e, StorageErrorKind::FileRead).into()),
        }
    }
}

#[async_trait::async_trait]
impl StorageProvider for ObjectStoreProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::ObjectStore
    }

    #[tracing::instrument(skip(self, data), fields(size = data.len()))]
    async fn write(
        &self,
        key: &str,
        data: &[u8],
        mime_type: &str,
    ) -> RolodexResult<WriteReceipt> {
        let location = self.location(key)?;
        let receipt = WriteReceipt {
            relative_path: key.to_string(),
            size_bytes: data.len() as u64,
            provider: ProviderKind::ObjectStore,
        };

        if self.head(key, &location).await? {
            let existing = self.read(key).await?;
            if existing == data {
                tracing::debug!(%location, "Identical object already stored");
                return Ok(receipt);
            }
            return Err(StorageError::new(StorageErrorKind::AlreadyExists(key.to_string())).into());
        }

        self.store
            .put(&location, PutPayload::from(data.to_vec()))
            .await
            .map_err(|e| Self::map_error(key, e, StorageErrorKind::FileWrite))?;

        tracing::info!(%location, size = data.len(), mime_type, "Stored media object");
        Ok(receipt)
    }

    #[tracing::instrument(skip(self))]
    async fn read(&self, key: &str) -> RolodexResult<Vec<u8>> {
        let location = self.location(key)?;
        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| Self::map_error(key, e, StorageErrorKind::FileRead))?;
        let bytes = result
            .bytes()
            .await
            .map_err(|e| Self::map_error(key, e, StorageErrorKind::FileRead))?;

        tracing::debug!(%location, size = bytes.len(), "Read media object");
        Ok(bytes.to_vec())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, key: &str) -> RolodexResult<()> {
        let location = self.location(key)?;

        // Object stores treat deleting a missing key as success; report it instead
        if !self.head(key, &location).await? {
            return Err(StorageError::new(StorageErrorKind::NotFound(key.to_string())).into());
        }

        self.store
            .delete(&location)
            .await
            .map_err(|e| Self::map_error(key, e, StorageErrorKind::FileDelete))?;

        tracing::info!(%location, "Deleted media object");
        Ok(())
    }

    async fn exists(&self, key: &str) -> RolodexResult<bool> {
        let location = self.location(key)?;
        self.head(key, &location).await
    }

    #[tracing::instrument(skip(self))]
    async fn list(
        &self,
        prefix: Option<&str>,
        limit: usize,
        start_after: Option<&str>,
    ) -> RolodexResult<ListPage> {
        let directory = self.directory(prefix)?;
        let offset = start_after.map(|marker| self.location(marker)).transpose()?;

        let stream = match &offset {
            Some(offset) => self.store.list_with_offset(directory.as_ref(), offset),
            None => self.store.list(directory.as_ref()),
        };

        let metas: Vec<_> = stream.take(limit.saturating_add(1)).collect().await;
        let mut entries = Vec::with_capacity(metas.len());
        for meta in metas {
            let meta = meta.map_err(|e| {
                Self::map_error(prefix.unwrap_or(""), e, StorageErrorKind::List)
            })?;
            entries.push(ObjectEntry {
                key: self.relative_key(&meta.location),
                size: meta.size as u64,
                last_modified: meta.last_modified,
            });
        }
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(ListPage::from_overfetch(entries, limit))
    }

    #[tracing::instrument(skip(self))]
    async fn copy(&self, src_key: &str, dst_key: &str) -> RolodexResult<()> {
        let from = self.location(src_key)?;
        let to = self.location(dst_key)?;

        if self.head(dst_key, &to).await? {
            let (src, dst) = (self.read(src_key).await?, self.read(dst_key).await?);
            if src == dst {
                return Ok(());
            }
            return Err(
                StorageError::new(StorageErrorKind::AlreadyExists(dst_key.to_string())).into(),
            );
        }

        self.store
            .copy(&from, &to)
            .await
            .map_err(|e| Self::map_error(src_key, e, StorageErrorKind::FileWrite))?;
        tracing::info!(%from, %to, "Copied media object");
        Ok(())
    }
}

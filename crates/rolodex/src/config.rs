//! Layered configuration for Rolodex.
//!
//! Sources, later ones overriding earlier ones:
//! 1. Bundled defaults (`rolodex.toml` shipped with the crate)
//! 2. `~/.config/rolodex/rolodex.toml`
//! 3. `./rolodex.toml`
//! 4. Environment variables such as `ROLODEX__RECONCILE__BATCH_SIZE`

use config::{Config, Environment, File, FileFormat};
use rolodex_core::ProviderKind;
use rolodex_database::ReferenceColumn;
use rolodex_error::{ConfigError, RolodexError, RolodexResult};
use rolodex_media::IngestConfig;
use rolodex_reconcile::ReconcileConfig;
use rolodex_storage::{FileSystemProvider, ObjectStoreProvider, StorageProviders};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../rolodex.toml");

/// S3-compatible bucket settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    /// Bucket name
    pub bucket: String,
    /// AWS region
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Key prefix inside the bucket
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Which backends exist and which one receives new media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend for new ingests
    pub default_provider: ProviderKind,
    /// Root directory of the plain local disk backend
    #[serde(default)]
    pub local_disk_root: Option<PathBuf>,
    /// Root directory of the fast local volume
    #[serde(default)]
    pub fast_volume_root: Option<PathBuf>,
    /// Object store bucket
    #[serde(default)]
    pub object_store: Option<ObjectStoreConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            default_provider: ProviderKind::LocalDisk,
            local_disk_root: Some(PathBuf::from("media")),
            fast_volume_root: None,
            object_store: None,
        }
    }
}

impl StorageConfig {
    /// Construct every configured backend.
    ///
    /// # Errors
    ///
    /// Fails if a backend cannot be created or the default provider is not
    /// configured.
    #[instrument(skip(self))]
    pub fn build_providers(&self) -> RolodexResult<StorageProviders> {
        let mut providers = StorageProviders::new(self.default_provider);

        if let Some(root) = &self.local_disk_root {
            providers.register(Arc::new(FileSystemProvider::new(
                ProviderKind::LocalDisk,
                root,
            )?));
        }
        if let Some(root) = &self.fast_volume_root {
            providers.register(Arc::new(FileSystemProvider::new(
                ProviderKind::FastVolume,
                root,
            )?));
        }
        if let Some(bucket) = &self.object_store {
            let mut provider = ObjectStoreProvider::s3(
                &bucket.bucket,
                bucket.region.as_deref(),
                bucket.endpoint.as_deref(),
            )?;
            if let Some(prefix) = &bucket.prefix {
                provider = provider.with_prefix(prefix);
            }
            providers.register(Arc::new(provider));
        }

        if !providers.kinds().contains(&self.default_provider) {
            return Err(ConfigError::new(format!(
                "Default storage provider {} is not configured",
                self.default_provider
            ))
            .into());
        }
        debug!(kinds = ?providers.kinds(), "Built storage providers");
        Ok(providers)
    }
}

/// Deduplication settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Dependent-table columns holding artifact ids
    #[serde(default)]
    pub reference_columns: Vec<ReferenceColumn>,
}

/// Ledger database settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    #[serde(default)]
    pub url: Option<String>,
}

impl DatabaseConfig {
    /// The configured URL, else `DATABASE_URL` from the environment or `.env`.
    pub fn resolve_url(&self) -> Option<String> {
        self.url.clone().or_else(|| dotenvy::var("DATABASE_URL").ok())
    }
}

/// Top-level Rolodex configuration.
///
/// # Example
///
/// ```no_run
/// use rolodex::RolodexConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = RolodexConfig::load()?;
/// println!("New media goes to {}", config.storage.default_provider);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolodexConfig {
    /// Storage backends
    #[serde(default)]
    pub storage: StorageConfig,
    /// URL ingestion
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Deduplication
    #[serde(default)]
    pub dedup: DedupConfig,
    /// Batch jobs
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    /// Ledger database
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl RolodexConfig {
    /// Load with the standard precedence: bundled defaults, home config,
    /// `./rolodex.toml`, then environment.
    pub fn load() -> RolodexResult<Self> {
        Self::load_with(None)
    }

    /// Like [`load`](Self::load), with `extra` applied after
    /// `./rolodex.toml`. An explicitly named file must exist.
    #[instrument]
    pub fn load_with(extra: Option<&Path>) -> RolodexResult<Self> {
        let mut files = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            files.push(dir.join("rolodex/rolodex.toml"));
        }
        files.push(PathBuf::from("rolodex.toml"));
        if let Some(path) = extra {
            if !path.exists() {
                return Err(ConfigError::new(format!(
                    "Configuration file not found: {}",
                    path.display()
                ))
                .into());
            }
            files.push(path.to_path_buf());
        }
        Self::load_layered(&files)
    }

    /// Load bundled defaults overlaid with `files` in order (missing files
    /// are skipped), then environment variables.
    #[instrument]
    pub fn load_layered(files: &[PathBuf]) -> RolodexResult<Self> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));
        for path in files {
            debug!(path = %path.display(), "Adding optional config file");
            builder = builder.add_source(File::from(path.as_path()).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix("ROLODEX")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .map_err(|e| {
                RolodexError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                RolodexError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a single file with no defaults or environment.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> RolodexResult<Self> {
        let config: Self = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                RolodexError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                RolodexError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would only fail later.
    pub fn validate(&self) -> RolodexResult<()> {
        for column in &self.dedup.reference_columns {
            column.validate()?;
        }
        if self.reconcile.batch_size == 0 {
            return Err(ConfigError::new("reconcile.batch_size must be at least 1").into());
        }
        if let Some(bucket) = &self.storage.object_store
            && bucket.bucket.trim().is_empty()
        {
            return Err(ConfigError::new("storage.object_store.bucket is required").into());
        }
        Ok(())
    }
}

//! Wiring configuration into service instances.

use crate::RolodexConfig;
use rolodex_error::RolodexResult;
use rolodex_interface::{MediaLedger, SubjectDirectory};
use rolodex_media::{DedupEngine, HttpFetcher, MediaRecordStore, PatternPlaceholderDetector};
use rolodex_reconcile::Reconciler;
use std::sync::Arc;

/// The media services built from one configuration over one ledger.
#[derive(Debug, Clone)]
pub struct Rolodex {
    /// Ingestion and CRUD
    pub records: MediaRecordStore,
    /// Duplicate detection and reconciliation
    pub dedup: DedupEngine,
    /// Legacy import, migration and cleanup jobs
    pub reconciler: Reconciler,
}

impl Rolodex {
    /// Build every service over an existing ledger and subject directory.
    #[tracing::instrument(skip_all)]
    pub fn new(
        config: &RolodexConfig,
        ledger: Arc<dyn MediaLedger>,
        subjects: Arc<dyn SubjectDirectory>,
    ) -> RolodexResult<Self> {
        config.validate()?;
        let providers = config.storage.build_providers()?;
        let fetcher = HttpFetcher::new(config.ingest.fetch_timeout(), &config.ingest.user_agent)?;
        let placeholders = PatternPlaceholderDetector::new(&config.ingest.placeholder);

        let records = MediaRecordStore::new(
            ledger.clone(),
            providers.clone(),
            Arc::new(fetcher),
            Arc::new(placeholders),
            config.ingest.clone(),
        );
        let dedup = DedupEngine::new(ledger.clone(), config.reconcile.max_error_samples);
        let reconciler = Reconciler::new(ledger, providers, subjects, config.reconcile);

        tracing::info!(
            default_provider = %config.storage.default_provider,
            "Initialized media services"
        );
        Ok(Self {
            records,
            dedup,
            reconciler,
        })
    }

    /// Connect to PostgreSQL, apply pending migrations and build the
    /// services over the database ledger.
    ///
    /// # Errors
    ///
    /// Fails without a database URL (`database.url` or `DATABASE_URL`), or
    /// if the pool or migrations fail.
    #[cfg(feature = "database")]
    #[tracing::instrument(skip_all)]
    pub async fn connect(config: &RolodexConfig) -> RolodexResult<Self> {
        use rolodex_database::{
            PostgresMediaLedger, PostgresSubjectDirectory, establish_pool, run_migrations,
        };
        use rolodex_error::ConfigError;

        let url = config
            .database
            .resolve_url()
            .ok_or_else(|| ConfigError::new("database.url or DATABASE_URL must be set"))?;

        let pool = tokio::task::spawn_blocking(move || {
            let pool = establish_pool(&url)?;
            run_migrations(&pool)?;
            Ok::<_, rolodex_error::DatabaseError>(pool)
        })
        .await
        .map_err(|e| ConfigError::new(format!("Database setup task failed: {}", e)))??;

        let ledger = PostgresMediaLedger::new(pool.clone(), config.dedup.reference_columns.clone());
        Self::new(
            config,
            Arc::new(ledger),
            Arc::new(PostgresSubjectDirectory::new(pool)),
        )
    }
}

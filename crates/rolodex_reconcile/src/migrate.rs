//! Moving artifacts between storage backends.

use crate::Reconciler;
use rolodex_core::{BatchOptions, BatchReport, MediaArtifact, ProviderKind, StorageLocation};
use rolodex_error::{RolodexResult, StorageError, StorageErrorKind, ValidationError};
use rolodex_storage::{StorageProvider, basename, compute_sha256};

impl Reconciler {
    /// Copy every live artifact on `source` to `target` and repoint its row.
    ///
    /// Per artifact: read the bytes, verify the recorded hash, write to
    /// `{subject_id}/{basename}` on the target, then move the row with a
    /// compare-and-set so a concurrent change fails the item instead of
    /// being overwritten. Source bytes stay until `cleanup_migrated`.
    #[tracing::instrument(skip(self))]
    pub async fn migrate(
        &self,
        source: ProviderKind,
        target: ProviderKind,
        options: &BatchOptions,
    ) -> RolodexResult<BatchReport> {
        if source == target {
            return Err(ValidationError::new("target", "source and target are the same").into());
        }
        let from = self.providers.get(source)?;
        let to = self.providers.get(target)?;

        let mut report = BatchReport::new("migrate", options, self.config.max_error_samples);
        let mut after = None;
        'pages: loop {
            let page = self
                .ledger
                .list_live_by_provider(source, after, options.batch_size)
                .await?;
            let Some(last) = page.last() else {
                break;
            };
            after = Some(last.id);

            for artifact in &page {
                if options.limit_reached(report.total_found) {
                    break 'pages;
                }
                report.found();

                if options.dry_run {
                    report.record_processed(
                        artifact.relative_path.clone(),
                        artifact.file_size_bytes.max(0) as u64,
                    );
                    continue;
                }
                match self.migrate_one(artifact, &*from, &*to).await {
                    Ok(bytes) => report.record_processed(artifact.relative_path.clone(), bytes),
                    Err(e) => {
                        tracing::warn!(
                            artifact_id = %artifact.id,
                            key = %artifact.relative_path,
                            error = %e,
                            "Migration failed"
                        );
                        report.record_failure(&artifact.relative_path, e);
                    }
                }
            }
            tracing::info!(
                %source,
                %target,
                processed = report.processed,
                failed = report.failed,
                "Migrated batch"
            );
        }

        tracing::info!(
            %source,
            %target,
            found = report.total_found,
            processed = report.processed,
            failed = report.failed,
            bytes = report.bytes,
            dry_run = report.dry_run,
            "Migration finished"
        );
        Ok(report)
    }

    async fn migrate_one(
        &self,
        artifact: &MediaArtifact,
        from: &dyn StorageProvider,
        to: &dyn StorageProvider,
    ) -> RolodexResult<u64> {
        let data = from.read(&artifact.relative_path).await?;
        let actual = compute_sha256(&data);
        if let Some(expected) = &artifact.sha256
            && *expected != actual
        {
            return Err(StorageError::new(StorageErrorKind::HashMismatch(format!(
                "expected {}, read {}",
                expected, actual
            )))
            .into());
        }

        let target_key = format!("{}/{}", artifact.subject_id, basename(&artifact.relative_path));
        let receipt = to.write(&target_key, &data, &artifact.mime_type).await?;

        let destination = StorageLocation::new(to.kind(), receipt.relative_path);
        self.ledger
            .relocate(artifact.id, &artifact.location(), &destination)
            .await?;
        if artifact.sha256.is_none() {
            self.ledger.record_sha256(artifact.id, &actual).await?;
        }

        tracing::debug!(artifact_id = %artifact.id, to = %destination, "Migrated artifact");
        Ok(receipt.size_bytes)
    }
}

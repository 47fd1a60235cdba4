//! Filling in missing content hashes.

use crate::Reconciler;
use rolodex_core::{BatchOptions, BatchReport, ProviderKind};
use rolodex_error::RolodexResult;
use rolodex_storage::compute_sha256;

impl Reconciler {
    /// Hash the bytes of every live row on `provider` that has no hash yet.
    #[tracing::instrument(skip(self))]
    pub async fn backfill_hashes(
        &self,
        provider: ProviderKind,
        options: &BatchOptions,
    ) -> RolodexResult<BatchReport> {
        let storage = self.providers.get(provider)?;
        let mut report =
            BatchReport::new("backfill-hashes", options, self.config.max_error_samples);

        let mut after = None;
        'pages: loop {
            let page = self
                .ledger
                .list_live_by_provider(provider, after, options.batch_size)
                .await?;
            let Some(last) = page.last() else {
                break;
            };
            after = Some(last.id);

            for artifact in page.iter().filter(|a| a.sha256.is_none()) {
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
                let result = async {
                    let data = storage.read(&artifact.relative_path).await?;
                    self.ledger
                        .record_sha256(artifact.id, &compute_sha256(&data))
                        .await?;
                    Ok::<_, rolodex_error::RolodexError>(data.len() as u64)
                }
                .await;
                match result {
                    Ok(bytes) => report.record_processed(artifact.relative_path.clone(), bytes),
                    Err(e) => {
                        tracing::warn!(artifact_id = %artifact.id, error = %e, "Hashing failed");
                        report.record_failure(&artifact.relative_path, e);
                    }
                }
            }
        }

        tracing::info!(
            %provider,
            found = report.total_found,
            processed = report.processed,
            failed = report.failed,
            dry_run = report.dry_run,
            "Hash backfill finished"
        );
        Ok(report)
    }
}

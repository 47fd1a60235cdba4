//! Removing source objects that were migrated away.

use crate::Reconciler;
use rolodex_core::{BatchOptions, BatchReport, ProviderKind, SkipReason};
use rolodex_error::{RolodexResult, ValidationError};
use rolodex_storage::basename;
use std::collections::HashSet;

impl Reconciler {
    /// Delete objects on `source` that were migrated to `target`.
    ///
    /// An object is redundant when its basename appears among live rows on
    /// the target and no row, live or soft-deleted, still points at it on the
    /// source. A dry run reports the count and bytes that would be freed.
    #[tracing::instrument(skip(self))]
    pub async fn cleanup_migrated(
        &self,
        source: ProviderKind,
        target: ProviderKind,
        options: &BatchOptions,
    ) -> RolodexResult<BatchReport> {
        if source == target {
            return Err(ValidationError::new("target", "source and target are the same").into());
        }
        let storage = self.providers.get(source)?;
        let still_tracked = self.tracked_paths(source).await?;
        let migrated: HashSet<String> = self
            .ledger
            .live_paths(target)
            .await?
            .iter()
            .map(|path| basename(path).to_string())
            .collect();

        let mut report = BatchReport::new("cleanup", options, self.config.max_error_samples);
        let mut marker: Option<String> = None;
        'pages: loop {
            let page = storage
                .list(None, options.batch_size, marker.as_deref())
                .await?;
            for entry in page.entries {
                if options.limit_reached(report.total_found) {
                    break 'pages;
                }
                report.found();

                if still_tracked.contains(&entry.key) {
                    report.record_skip(SkipReason::StillReferenced);
                    continue;
                }
                if !migrated.contains(basename(&entry.key)) {
                    report.record_skip(SkipReason::NotMigrated);
                    continue;
                }

                if options.dry_run {
                    report.record_processed(entry.key, entry.size);
                    continue;
                }
                match storage.delete(&entry.key).await {
                    Ok(()) => report.record_processed(entry.key, entry.size),
                    Err(e) if e.is_not_found() => report.record_processed(entry.key, 0),
                    Err(e) => {
                        tracing::warn!(key = %entry.key, error = %e, "Delete failed");
                        report.record_failure(&entry.key, e);
                    }
                }
            }
            match page.next_marker {
                Some(next) => marker = Some(next),
                None => break,
            }
        }

        tracing::info!(
            %source,
            %target,
            found = report.total_found,
            removed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            bytes = report.bytes,
            dry_run = report.dry_run,
            "Cleanup finished"
        );
        Ok(report)
    }
}

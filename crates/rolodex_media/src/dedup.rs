//! Detection and reconciliation of byte-identical artifacts.

use rolodex_core::{BatchOptions, BatchReport, DuplicateGroup, ReconcileOutcome};
use rolodex_error::RolodexResult;
use rolodex_interface::MediaLedger;
use std::sync::Arc;
use uuid::Uuid;

/// Finds live artifacts sharing a content hash and retires all but one.
///
/// The survivor of a group is the artifact most referenced by dependent
/// tables; ties (including no references at all) go to the first-seen one.
#[derive(Clone)]
pub struct DedupEngine {
    ledger: Arc<dyn MediaLedger>,
    max_error_samples: usize,
}

impl std::fmt::Debug for DedupEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupEngine")
            .field("max_error_samples", &self.max_error_samples)
            .finish_non_exhaustive()
    }
}

impl DedupEngine {
    /// Create an engine. Reports keep at most `max_error_samples` errors.
    pub fn new(ledger: Arc<dyn MediaLedger>, max_error_samples: usize) -> Self {
        Self {
            ledger,
            max_error_samples,
        }
    }

    /// Every group of live artifacts sharing a hash, in first-seen order.
    #[tracing::instrument(skip(self))]
    pub async fn find_duplicate_groups(&self) -> RolodexResult<Vec<DuplicateGroup>> {
        let mut groups = Vec::new();
        for (sha256, ids) in self.ledger.live_hash_groups().await? {
            let Some(keep_id) = self.choose_survivor(&ids).await? else {
                continue;
            };
            let duplicate_ids = ids.into_iter().filter(|id| *id != keep_id).collect();
            groups.push(DuplicateGroup {
                sha256,
                keep_id,
                duplicate_ids,
            });
        }
        tracing::info!(groups = groups.len(), "Found duplicate groups");
        Ok(groups)
    }

    /// Most-referenced id; the earliest wins ties. `ids` is in first-seen order.
    /// `None` for an empty group.
    async fn choose_survivor(&self, ids: &[Uuid]) -> RolodexResult<Option<Uuid>> {
        let mut best: Option<(Uuid, u64)> = None;
        for id in ids {
            let references = self.ledger.count_references(*id).await?;
            if best.is_none_or(|(_, most)| references > most) {
                best = Some((*id, references));
            }
        }
        Ok(best.map(|(id, _)| id))
    }

    /// Repoint every reference from `duplicate_id` to `keep_id` and retire the
    /// duplicate, in one ledger transaction.
    ///
    /// # Errors
    ///
    /// `NotFound` if either artifact is unknown or already retired; a
    /// validation error if both ids are the same.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(
        &self,
        duplicate_id: Uuid,
        keep_id: Uuid,
    ) -> RolodexResult<ReconcileOutcome> {
        let outcome = self.ledger.reconcile_duplicate(duplicate_id, keep_id).await?;
        tracing::info!(
            references_moved = outcome.references_moved,
            primary_transferred = outcome.primary_transferred,
            "Reconciled duplicate"
        );
        Ok(outcome)
    }

    /// Find every duplicate group and reconcile each duplicate into its
    /// group's survivor. A dry run only counts.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile_all(&self, options: &BatchOptions) -> RolodexResult<BatchReport> {
        let mut report = BatchReport::new("dedup", options, self.max_error_samples);

        'groups: for group in self.find_duplicate_groups().await? {
            for duplicate_id in &group.duplicate_ids {
                if options.limit_reached(report.total_found) {
                    break 'groups;
                }
                report.found();

                let sample = format!("{} -> {}", duplicate_id, group.keep_id);
                if options.dry_run {
                    report.record_processed(sample, 0);
                    continue;
                }
                match self.reconcile(*duplicate_id, group.keep_id).await {
                    Ok(_) => report.record_processed(sample, 0),
                    Err(e) => {
                        tracing::warn!(%duplicate_id, error = %e, "Reconcile failed");
                        report.record_failure(&duplicate_id.to_string(), e);
                    }
                }
            }
        }

        tracing::info!(
            found = report.total_found,
            processed = report.processed,
            failed = report.failed,
            dry_run = report.dry_run,
            "Dedup finished"
        );
        Ok(report)
    }
}

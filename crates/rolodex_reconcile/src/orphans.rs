//! Read-only discovery of objects the ledger does not know about.

use crate::{Reconciler, TrackedPaths};
use rolodex_core::{BatchOptions, ProviderKind};
use rolodex_error::RolodexResult;
use rolodex_storage::ObjectEntry;
use serde::{Deserialize, Serialize};

/// What an orphan scan found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanReport {
    /// Scanned provider
    pub provider: ProviderKind,
    /// Objects listed
    pub total_scanned: u64,
    /// Objects with no ledger row
    pub orphans: u64,
    /// Total size of the orphans
    pub orphan_bytes: u64,
    /// Some orphan keys
    pub samples: Vec<String>,
}

impl Reconciler {
    /// Ledger paths of every row on a provider. Soft-deleted rows still own
    /// their bytes.
    pub(crate) async fn tracked_paths(
        &self,
        provider: ProviderKind,
    ) -> RolodexResult<TrackedPaths> {
        let paths = self.ledger.recorded_paths(provider).await?;
        tracing::debug!(%provider, paths = paths.len(), "Loaded tracked paths");
        Ok(TrackedPaths::new(paths))
    }

    /// Every object on `provider` with no ledger row, up to `max_items`
    /// listed objects.
    pub(crate) async fn list_untracked(
        &self,
        provider: ProviderKind,
        options: &BatchOptions,
    ) -> RolodexResult<(u64, Vec<ObjectEntry>)> {
        let storage = self.providers.get(provider)?;
        let tracked = self.tracked_paths(provider).await?;

        let mut scanned = 0u64;
        let mut untracked = Vec::new();
        let mut marker: Option<String> = None;
        'pages: loop {
            let page = storage
                .list(None, options.batch_size, marker.as_deref())
                .await?;
            for entry in page.entries {
                if options.limit_reached(scanned) {
                    break 'pages;
                }
                scanned += 1;
                if !tracked.contains(&entry.key) {
                    untracked.push(entry);
                }
            }
            tracing::info!(%provider, scanned, untracked = untracked.len(), "Scanned page");
            match page.next_marker {
                Some(next) => marker = Some(next),
                None => break,
            }
        }
        Ok((scanned, untracked))
    }

    /// Count objects on `provider` that no live ledger row accounts for.
    /// Never writes.
    #[tracing::instrument(skip(self))]
    pub async fn discover_orphans(
        &self,
        provider: ProviderKind,
        options: &BatchOptions,
    ) -> RolodexResult<OrphanReport> {
        let (total_scanned, orphans) = self.list_untracked(provider, options).await?;

        let report = OrphanReport {
            provider,
            total_scanned,
            orphans: orphans.len() as u64,
            orphan_bytes: orphans.iter().map(|e| e.size).sum(),
            samples: orphans
                .iter()
                .take(self.config.max_error_samples)
                .map(|e| e.key.clone())
                .collect(),
        };
        tracing::info!(
            %provider,
            scanned = report.total_scanned,
            orphans = report.orphans,
            bytes = report.orphan_bytes,
            "Orphan scan finished"
        );
        Ok(report)
    }
}

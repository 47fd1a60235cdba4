//! The reconciler service.

use crate::ReconcileConfig;
use rolodex_interface::{MediaLedger, SubjectDirectory};
use rolodex_storage::StorageProviders;
use std::sync::Arc;

/// Runs the legacy import, audit, migration and cleanup batch jobs.
///
/// Jobs run items sequentially. Two jobs against the same pair of backends
/// must not run at the same time.
#[derive(Clone)]
pub struct Reconciler {
    pub(crate) ledger: Arc<dyn MediaLedger>,
    pub(crate) providers: StorageProviders,
    pub(crate) subjects: Arc<dyn SubjectDirectory>,
    pub(crate) config: ReconcileConfig,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("providers", &self.providers)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Create a reconciler.
    pub fn new(
        ledger: Arc<dyn MediaLedger>,
        providers: StorageProviders,
        subjects: Arc<dyn SubjectDirectory>,
        config: ReconcileConfig,
    ) -> Self {
        Self {
            ledger,
            providers,
            subjects,
            config,
        }
    }

    /// Job settings.
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }
}

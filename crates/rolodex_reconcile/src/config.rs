//! Reconciler settings.

use rolodex_core::{BatchOptions, DEFAULT_BATCH_SIZE, DEFAULT_MAX_ERROR_SAMPLES};
use serde::{Deserialize, Serialize};

/// Defaults for batch jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Items fetched per page
    pub batch_size: usize,
    /// Error and sample lines kept per report
    pub max_error_samples: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_error_samples: DEFAULT_MAX_ERROR_SAMPLES,
        }
    }
}

impl ReconcileConfig {
    /// Batch options using the configured page size.
    pub fn options(&self, dry_run: bool) -> BatchOptions {
        BatchOptions {
            dry_run,
            ..BatchOptions::default()
        }
        .with_batch_size(self.batch_size)
    }
}

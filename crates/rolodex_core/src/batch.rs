//! Options and reports shared by every batch job.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Batch size used when none is configured.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Error samples kept per report when none is configured.
pub const DEFAULT_MAX_ERROR_SAMPLES: usize = 100;

/// How a batch job should run.
///
/// The default is a dry run: jobs only count what they would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOptions {
    /// Count without writing, deleting or inserting
    pub dry_run: bool,
    /// Items fetched per page
    pub batch_size: usize,
    /// Stop after examining this many items
    pub max_items: Option<usize>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            batch_size: DEFAULT_BATCH_SIZE,
            max_items: None,
        }
    }
}

impl BatchOptions {
    /// Dry run with default paging.
    pub fn dry_run() -> Self {
        Self::default()
    }

    /// Real run with default paging.
    pub fn execute() -> Self {
        Self {
            dry_run: false,
            ..Self::default()
        }
    }

    /// Set the page size. Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Cap the number of items examined.
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    /// Whether `examined` items already reach `max_items`.
    pub fn limit_reached(&self, examined: u64) -> bool {
        self.max_items.is_some_and(|max| examined >= max as u64)
    }
}

/// Why an item was left alone.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Filename does not follow the legacy naming scheme
    #[display("invalid-format")]
    InvalidFormat,
    /// No subject matches the filename or key
    #[display("no-person-match")]
    NoPersonMatch,
    /// A live ledger row already tracks the location
    #[display("already-exists")]
    AlreadyExists,
    /// The source object has not been migrated to the target
    #[display("not-migrated")]
    NotMigrated,
    /// A live ledger row still points at the source object
    #[display("still-referenced")]
    StillReferenced,
}

/// Outcome of one batch job run. Rendered as JSON by the operator CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Job name
    pub job: String,
    /// Whether this was a dry run
    pub dry_run: bool,
    /// Candidate items examined
    pub total_found: u64,
    /// Items acted on (or that would be, in a dry run)
    pub processed: u64,
    /// Items left alone, see `skip_reasons`
    pub skipped: u64,
    /// Items that failed, see `errors`
    pub failed: u64,
    /// Bytes of the processed items
    pub bytes: u64,
    /// Skip counts by reason
    pub skip_reasons: BTreeMap<SkipReason, u64>,
    /// Failure descriptions, `"{key}: {reason}"`
    pub errors: Vec<String>,
    /// Sample keys of processed items
    pub samples: Vec<String>,
    #[serde(skip, default = "default_sample_cap")]
    sample_cap: usize,
}

fn default_sample_cap() -> usize {
    DEFAULT_MAX_ERROR_SAMPLES
}

impl BatchReport {
    /// Empty report. At most `sample_cap` errors and samples are kept; the
    /// counters keep counting past the cap.
    pub fn new(job: impl Into<String>, options: &BatchOptions, sample_cap: usize) -> Self {
        Self {
            job: job.into(),
            dry_run: options.dry_run,
            total_found: 0,
            processed: 0,
            skipped: 0,
            failed: 0,
            bytes: 0,
            skip_reasons: BTreeMap::new(),
            errors: Vec::new(),
            samples: Vec::new(),
            sample_cap,
        }
    }

    /// No item failed.
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    /// Count an examined candidate.
    pub fn found(&mut self) {
        self.total_found += 1;
    }

    /// Count a processed item of `bytes` bytes and keep its key as a sample.
    pub fn record_processed(&mut self, key: impl Into<String>, bytes: u64) {
        self.processed += 1;
        self.bytes += bytes;
        if self.samples.len() < self.sample_cap {
            self.samples.push(key.into());
        }
    }

    /// Count a skipped item.
    pub fn record_skip(&mut self, reason: SkipReason) {
        self.skipped += 1;
        *self.skip_reasons.entry(reason).or_insert(0) += 1;
    }

    /// Count a failed item.
    pub fn record_failure(&mut self, key: &str, reason: impl std::fmt::Display) {
        self.failed += 1;
        if self.errors.len() < self.sample_cap {
            self.errors.push(format!("{}: {}", key, reason));
        }
    }

    /// Skips recorded for a reason.
    pub fn skips(&self, reason: SkipReason) -> u64 {
        self.skip_reasons.get(&reason).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_are_dry_run() {
        let options = BatchOptions::default();
        assert!(options.dry_run);
        assert_eq!(options.batch_size, DEFAULT_BATCH_SIZE);
        assert!(!options.limit_reached(1_000_000));
        assert!(BatchOptions::execute().with_max_items(2).limit_reached(2));
        assert_eq!(BatchOptions::execute().with_batch_size(0).batch_size, 1);
    }

    #[test]
    fn test_report_caps_samples_but_not_counters() {
        let mut report = BatchReport::new("job", &BatchOptions::execute(), 2);
        for i in 0..5 {
            report.record_failure(&format!("k{}", i), "boom");
            report.record_processed(format!("p{}", i), 10);
        }
        report.record_skip(SkipReason::InvalidFormat);

        assert_eq!(report.failed, 5);
        assert_eq!(report.errors, vec!["k0: boom", "k1: boom"]);
        assert_eq!(report.samples.len(), 2);
        assert_eq!(report.bytes, 50);
        assert_eq!(report.skips(SkipReason::InvalidFormat), 1);
        assert!(!report.success());
        assert!(!report.dry_run);
    }

    #[test]
    fn test_skip_reasons_serialize_kebab_case() {
        let mut report = BatchReport::new("import-orphans", &BatchOptions::dry_run(), 10);
        report.record_skip(SkipReason::NoPersonMatch);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["skip_reasons"]["no-person-match"], 1);
        assert!(json.get("sample_cap").is_none());
    }
}

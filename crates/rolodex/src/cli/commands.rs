//! CLI command definitions.

use clap::{Args, Parser, Subcommand};
use rolodex::{BatchOptions, ProviderKind, ReconcileConfig};
use std::path::PathBuf;

/// Rolodex - media storage reconciliation and deduplication
#[derive(Parser, Debug)]
#[command(name = "rolodex")]
#[command(about = "Media storage reconciliation and deduplication", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Extra configuration file, applied after ./rolodex.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count objects on a backend that no ledger row accounts for
    Orphans {
        /// Backend to scan (local-disk, fast-volume, object-store)
        provider: ProviderKind,

        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Record legacy-named orphans as metadata-only ledger rows
    ImportOrphans {
        /// Backend to scan
        provider: ProviderKind,

        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Record and hash objects left behind by interrupted writes
    ImportUntracked {
        /// Backend to scan
        provider: ProviderKind,

        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Copy live artifacts to another backend and repoint their rows
    Migrate {
        /// Backend to copy from
        source: ProviderKind,

        /// Backend to copy to
        target: ProviderKind,

        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Delete source objects already migrated to the target
    Cleanup {
        /// Backend to delete from
        source: ProviderKind,

        /// Backend the objects were migrated to
        target: ProviderKind,

        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Compute missing content hashes
    BackfillHashes {
        /// Backend holding the bytes
        provider: ProviderKind,

        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Fold duplicate content into one artifact per hash
    Dedup {
        #[command(flatten)]
        batch: BatchArgs,
    },
}

/// Options shared by every batch job. Jobs are dry runs unless `--execute`
/// is given.
#[derive(Args, Debug, Clone, Default)]
pub struct BatchArgs {
    /// Report what would change without changing anything (default)
    #[arg(long, conflicts_with = "execute")]
    pub dry_run: bool,

    /// Apply changes
    #[arg(long)]
    pub execute: bool,

    /// Items fetched per page
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Stop after examining this many items
    #[arg(long)]
    pub max_items: Option<usize>,
}

impl BatchArgs {
    /// Batch options, filling gaps from configuration.
    pub fn options(&self, config: &ReconcileConfig) -> BatchOptions {
        let mut options = config.options(!self.execute);
        if let Some(batch_size) = self.batch_size {
            options = options.with_batch_size(batch_size);
        }
        if let Some(max_items) = self.max_items {
            options = options.with_max_items(max_items);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_jobs_default_to_dry_run() {
        let cli = Cli::try_parse_from(["rolodex", "migrate", "local-disk", "s3"]).unwrap();
        let Commands::Migrate {
            source,
            target,
            batch,
        } = cli.command
        else {
            panic!("expected migrate");
        };
        assert_eq!(source, ProviderKind::LocalDisk);
        assert_eq!(target, ProviderKind::ObjectStore);

        let options = batch.options(&ReconcileConfig::default());
        assert!(options.dry_run);
        assert_eq!(options.batch_size, 500);
        assert_eq!(options.max_items, None);
    }

    #[test]
    fn test_execute_and_limits() {
        let cli = Cli::try_parse_from([
            "rolodex",
            "cleanup",
            "local-disk",
            "object-store",
            "--execute",
            "--batch-size",
            "50",
            "--max-items",
            "10",
        ])
        .unwrap();
        let Commands::Cleanup { batch, .. } = cli.command else {
            panic!("expected cleanup");
        };
        let options = batch.options(&ReconcileConfig::default());
        assert!(!options.dry_run);
        assert_eq!(options.batch_size, 50);
        assert_eq!(options.max_items, Some(10));
    }

    #[test]
    fn test_dry_run_conflicts_with_execute() {
        let result = Cli::try_parse_from(["rolodex", "dedup", "--dry-run", "--execute"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let result = Cli::try_parse_from(["rolodex", "orphans", "tape"]);
        assert!(result.is_err());
    }
}

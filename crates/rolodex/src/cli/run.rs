//! Batch job dispatch.

use super::Commands;
use rolodex::{BatchReport, Rolodex, RolodexConfig, RolodexResult};
use serde::Serialize;

/// Run one command against connected services and print its report as JSON.
#[tracing::instrument(skip_all)]
pub async fn run_command(
    command: Commands,
    rolodex: &Rolodex,
    config: &RolodexConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let jobs = &rolodex.reconciler;
    match command {
        Commands::Orphans { provider, batch } => {
            let report = jobs
                .discover_orphans(provider, &batch.options(&config.reconcile))
                .await?;
            print_json(&report)?;
        }
        Commands::ImportOrphans { provider, batch } => {
            let report = jobs
                .import_orphans(provider, &batch.options(&config.reconcile))
                .await;
            print_report(report)?;
        }
        Commands::ImportUntracked { provider, batch } => {
            let report = jobs
                .import_untracked(provider, &batch.options(&config.reconcile))
                .await;
            print_report(report)?;
        }
        Commands::Migrate {
            source,
            target,
            batch,
        } => {
            let report = jobs
                .migrate(source, target, &batch.options(&config.reconcile))
                .await;
            print_report(report)?;
        }
        Commands::Cleanup {
            source,
            target,
            batch,
        } => {
            let report = jobs
                .cleanup_migrated(source, target, &batch.options(&config.reconcile))
                .await;
            print_report(report)?;
        }
        Commands::BackfillHashes { provider, batch } => {
            let report = jobs
                .backfill_hashes(provider, &batch.options(&config.reconcile))
                .await;
            print_report(report)?;
        }
        Commands::Dedup { batch } => {
            let report = rolodex
                .dedup
                .reconcile_all(&batch.options(&config.reconcile))
                .await;
            print_report(report)?;
        }
    }
    Ok(())
}

fn print_report(
    report: RolodexResult<BatchReport>,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = report?;
    print_json(&report)?;
    if !report.success() {
        tracing::warn!(failed = report.failed, job = %report.job, "Job finished with failures");
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

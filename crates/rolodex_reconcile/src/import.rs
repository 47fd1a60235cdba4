//! Importing objects that exist in storage but not in the ledger.

use crate::{ParsedFilename, Reconciler, parse_legacy_filename};
use rolodex_core::{
    BatchOptions, BatchReport, MediaSource, NewMediaArtifact, ProviderKind, SkipReason,
    StorageLocation, SubjectId,
};
use rolodex_error::RolodexResult;
use rolodex_media::mime::resolve_mime;
use rolodex_storage::{ObjectEntry, basename, compute_sha256};

/// How an untracked object maps to a subject.
enum Resolution {
    Subject(SubjectId, ParsedFilename),
    Skip(SkipReason),
}

impl Reconciler {
    /// Resolve a subject from a legacy filename's handle.
    async fn resolve_by_filename(&self, key: &str) -> RolodexResult<Resolution> {
        let parsed = parse_legacy_filename(basename(key));
        let ParsedFilename::Parsed { subject, .. } = &parsed else {
            return Ok(Resolution::Skip(SkipReason::InvalidFormat));
        };
        let found = self.subjects.find_by_handle(subject).await?;
        Ok(match found {
            Some(id) => Resolution::Subject(id, parsed),
            None => Resolution::Skip(SkipReason::NoPersonMatch),
        })
    }

    /// Resolve `{subject_id}/{file}` keys by id, anything else by filename.
    async fn resolve_by_key(&self, key: &str) -> RolodexResult<Resolution> {
        if let Some((dir, file)) = key.split_once('/')
            && !file.contains('/')
            && let Ok(id) = dir.parse::<SubjectId>()
            && self.subjects.exists(id).await?
        {
            return Ok(Resolution::Subject(id, parse_legacy_filename(file)));
        }
        self.resolve_by_filename(key).await
    }

    /// Insert metadata-only ledger rows for orphaned legacy objects.
    ///
    /// Skips objects whose name does not follow the legacy scheme
    /// (`invalid-format`), whose handle matches no subject (`no-person-match`),
    /// or whose location already has a row, live or not (`already-exists`).
    /// Bytes are not read: the hash stays empty until `backfill_hashes`.
    #[tracing::instrument(skip(self))]
    pub async fn import_orphans(
        &self,
        provider: ProviderKind,
        options: &BatchOptions,
    ) -> RolodexResult<BatchReport> {
        let mut report =
            BatchReport::new("import-orphans", options, self.config.max_error_samples);
        let (_, orphans) = self.list_untracked(provider, options).await?;

        for entry in orphans {
            report.found();
            let resolved = match self.resolve_by_filename(&entry.key).await {
                Ok(Resolution::Subject(id, parsed)) => (id, parsed),
                Ok(Resolution::Skip(reason)) => {
                    tracing::debug!(key = %entry.key, %reason, "Skipping orphan");
                    report.record_skip(reason);
                    continue;
                }
                Err(e) => {
                    report.record_failure(&entry.key, e);
                    continue;
                }
            };

            match self
                .import_entry(provider, &entry, resolved, false, options.dry_run)
                .await
            {
                Ok(Some(reason)) => report.record_skip(reason),
                Ok(None) => report.record_processed(entry.key.clone(), entry.size),
                Err(e) => {
                    tracing::warn!(key = %entry.key, error = %e, "Import failed");
                    report.record_failure(&entry.key, e);
                }
            }
        }

        tracing::info!(
            %provider,
            found = report.total_found,
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            dry_run = report.dry_run,
            "Orphan import finished"
        );
        Ok(report)
    }

    /// Audit a provider for objects left behind by interrupted ingests or
    /// migrations and record them, hashing their bytes so deduplication can
    /// see them.
    #[tracing::instrument(skip(self))]
    pub async fn import_untracked(
        &self,
        provider: ProviderKind,
        options: &BatchOptions,
    ) -> RolodexResult<BatchReport> {
        let mut report =
            BatchReport::new("import-untracked", options, self.config.max_error_samples);
        let (_, untracked) = self.list_untracked(provider, options).await?;

        for entry in untracked {
            report.found();
            let resolved = match self.resolve_by_key(&entry.key).await {
                Ok(Resolution::Subject(id, parsed)) => (id, parsed),
                Ok(Resolution::Skip(reason)) => {
                    report.record_skip(reason);
                    continue;
                }
                Err(e) => {
                    report.record_failure(&entry.key, e);
                    continue;
                }
            };

            match self
                .import_entry(provider, &entry, resolved, true, options.dry_run)
                .await
            {
                Ok(Some(reason)) => report.record_skip(reason),
                Ok(None) => report.record_processed(entry.key.clone(), entry.size),
                Err(e) => {
                    tracing::warn!(key = %entry.key, error = %e, "Import failed");
                    report.record_failure(&entry.key, e);
                }
            }
        }

        tracing::info!(
            %provider,
            found = report.total_found,
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            dry_run = report.dry_run,
            "Untracked import finished"
        );
        Ok(report)
    }

    /// Insert a row for one object. Returns a skip reason if any row, live
    /// or soft-deleted, already points at the location.
    async fn import_entry(
        &self,
        provider: ProviderKind,
        entry: &ObjectEntry,
        (subject_id, parsed): (SubjectId, ParsedFilename),
        hash_bytes: bool,
        dry_run: bool,
    ) -> RolodexResult<Option<SkipReason>> {
        let location = StorageLocation::new(provider, entry.key.clone());
        if self.ledger.count_at_location(&location).await? > 0 {
            return Ok(Some(SkipReason::AlreadyExists));
        }
        if dry_run {
            return Ok(None);
        }

        let name = basename(&entry.key);
        let (mime_type, sha256, size) = if hash_bytes {
            let data = self.providers.get(provider)?.read(&entry.key).await?;
            (
                resolve_mime(None, &data, None, Some(name)),
                Some(compute_sha256(&data)),
                data.len() as u64,
            )
        } else {
            let mime = mime_guess::from_path(name)
                .first_or_octet_stream()
                .essence_str()
                .to_string();
            (mime, None, entry.size)
        };

        let mut new = NewMediaArtifact::new(
            subject_id,
            provider,
            entry.key.clone(),
            MediaSource::Imported,
            mime_type,
            size as i64,
        );
        new.original_filename = Some(name.to_string());
        new.captured_at = parsed.captured_at();
        new.sha256 = sha256;

        let artifact = self.ledger.insert(new).await?;
        tracing::debug!(
            artifact_id = %artifact.id,
            key = %entry.key,
            subject_id,
            "Imported object"
        );
        Ok(None)
    }
}

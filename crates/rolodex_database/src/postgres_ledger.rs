//! PostgreSQL implementation of [`MediaLedger`].

use crate::models::{CountRow, MediaArtifactRow, NewMediaArtifactRow, PhotosetMarkerRow};
use crate::schema::{deleted_photoset_markers, media_artifacts};
use crate::{DatabaseResult, PgPool, ReferenceColumn};
use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types;
use rolodex_core::{
    DeletedPhotosetMarker, MediaArtifact, MediaMetadataUpdate, NewMediaArtifact, ProviderKind,
    ReconcileOutcome, StorageLocation, SubjectId,
};
use rolodex_error::{DatabaseError, DatabaseErrorKind, RolodexResult, ValidationError};
use rolodex_interface::MediaLedger;
use uuid::Uuid;

/// Diesel-backed media ledger.
///
/// Blocking Diesel calls run on `spawn_blocking`. Multi-step writes run in a
/// single transaction and lock the rows they read with `FOR UPDATE`.
#[derive(Clone)]
pub struct PostgresMediaLedger {
    pool: PgPool,
    reference_columns: Vec<ReferenceColumn>,
}

impl std::fmt::Debug for PostgresMediaLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresMediaLedger")
            .field("reference_columns", &self.reference_columns)
            .finish_non_exhaustive()
    }
}

impl PostgresMediaLedger {
    /// Create a ledger over a pool. `reference_columns` lists the dependent
    /// tables whose foreign keys the deduplication engine counts and repoints.
    pub fn new(pool: PgPool, reference_columns: Vec<ReferenceColumn>) -> Self {
        Self {
            pool,
            reference_columns,
        }
    }

    /// Run a blocking closure against a pooled connection.
    async fn with_conn<T, F>(&self, f: F) -> RolodexResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> DatabaseResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        let result = tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| DatabaseError::new(DatabaseErrorKind::Connection(e.to_string())))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Query(e.to_string())))?;
        Ok(result?)
    }
}

fn into_artifacts(rows: Vec<MediaArtifactRow>) -> DatabaseResult<Vec<MediaArtifact>> {
    rows.into_iter().map(MediaArtifact::try_from).collect()
}

fn lock_row(conn: &mut PgConnection, id: Uuid) -> DatabaseResult<Option<MediaArtifact>> {
    media_artifacts::table
        .find(id)
        .select(MediaArtifactRow::as_select())
        .for_update()
        .first(conn)
        .optional()?
        .map(MediaArtifact::try_from)
        .transpose()
}

/// Lock every live row of a subject in id order and return their ids.
fn lock_subject_rows(conn: &mut PgConnection, subject_id: i64) -> DatabaseResult<Vec<Uuid>> {
    Ok(media_artifacts::table
        .filter(media_artifacts::subject_id.eq(subject_id))
        .filter(media_artifacts::deleted_at.is_null())
        .order(media_artifacts::id.asc())
        .select(media_artifacts::id)
        .for_update()
        .load(conn)?)
}

fn live_at(
    conn: &mut PgConnection,
    location: &StorageLocation,
) -> DatabaseResult<Option<MediaArtifact>> {
    media_artifacts::table
        .filter(media_artifacts::storage_provider.eq(location.provider.as_str()))
        .filter(media_artifacts::relative_path.eq(&location.relative_path))
        .filter(media_artifacts::deleted_at.is_null())
        .select(MediaArtifactRow::as_select())
        .first(conn)
        .optional()?
        .map(MediaArtifact::try_from)
        .transpose()
}

fn record_marker(conn: &mut PgConnection, artifact: &MediaArtifact) -> DatabaseResult<()> {
    if let Some(photoset_id) = &artifact.photoset_id {
        diesel::insert_into(deleted_photoset_markers::table)
            .values(PhotosetMarkerRow {
                subject_id: artifact.subject_id,
                photoset_id: photoset_id.clone(),
                deleted_at: Utc::now(),
            })
            .on_conflict_do_nothing()
            .execute(conn)?;
    }
    Ok(())
}

fn mark_deleted(conn: &mut PgConnection, id: Uuid) -> DatabaseResult<()> {
    diesel::update(media_artifacts::table.find(id))
        .set((
            media_artifacts::deleted_at.eq(Some(Utc::now())),
            media_artifacts::is_primary.eq(false),
        ))
        .execute(conn)?;
    Ok(())
}

#[async_trait]
impl MediaLedger for PostgresMediaLedger {
    #[tracing::instrument(
        skip(self, new),
        fields(subject_id = new.subject_id, path = %new.relative_path)
    )]
    async fn insert(&self, new: NewMediaArtifact) -> RolodexResult<MediaArtifact> {
        self.with_conn(move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                let location =
                    StorageLocation::new(new.storage_provider, new.relative_path.clone());
                if let Some(existing) = live_at(conn, &location)? {
                    return Err(DatabaseError::conflict(format!(
                        "{} already tracked by artifact {}",
                        location, existing.id
                    )));
                }

                let row = NewMediaArtifactRow::new(Uuid::new_v4(), new, Utc::now());
                let inserted: MediaArtifactRow = diesel::insert_into(media_artifacts::table)
                    .values(&row)
                    .returning(MediaArtifactRow::as_returning())
                    .get_result(conn)?;
                MediaArtifact::try_from(inserted)
            })
        })
        .await
    }

    #[tracing::instrument(skip(self, update))]
    async fn update_metadata(
        &self,
        id: Uuid,
        update: &MediaMetadataUpdate,
    ) -> RolodexResult<MediaArtifact> {
        let update = update.clone();
        self.with_conn(move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                let mut artifact = lock_row(conn, id)?
                    .ok_or_else(|| DatabaseError::not_found(format!("artifact {}", id)))?;
                update.apply_to(&mut artifact);

                diesel::update(media_artifacts::table.find(id))
                    .set((
                        media_artifacts::title.eq(&artifact.title),
                        media_artifacts::description.eq(&artifact.description),
                        media_artifacts::captured_at.eq(artifact.captured_at),
                        media_artifacts::photoset_id.eq(&artifact.photoset_id),
                    ))
                    .execute(conn)?;
                Ok(artifact)
            })
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn set_favorite(&self, id: Uuid, favorite: bool) -> RolodexResult<MediaArtifact> {
        self.with_conn(move |conn| {
            diesel::update(media_artifacts::table.find(id))
                .set(media_artifacts::is_favorite.eq(favorite))
                .returning(MediaArtifactRow::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| DatabaseError::not_found(format!("artifact {}", id)))
                .and_then(MediaArtifact::try_from)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn set_primary(&self, id: Uuid) -> RolodexResult<Option<MediaArtifact>> {
        self.with_conn(move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                // Concurrent calls for one subject must take row locks in the
                // same order, so the target is not locked on its own first.
                let subject_id: Option<i64> = media_artifacts::table
                    .find(id)
                    .filter(media_artifacts::deleted_at.is_null())
                    .select(media_artifacts::subject_id)
                    .first(conn)
                    .optional()?;
                let Some(subject_id) = subject_id else {
                    return Ok(None);
                };
                if !lock_subject_rows(conn, subject_id)?.contains(&id) {
                    return Ok(None);
                }

                diesel::update(
                    media_artifacts::table
                        .filter(media_artifacts::subject_id.eq(subject_id))
                        .filter(media_artifacts::deleted_at.is_null())
                        .filter(media_artifacts::id.ne(id)),
                )
                .set(media_artifacts::is_primary.eq(false))
                .execute(conn)?;

                let row: MediaArtifactRow = diesel::update(media_artifacts::table.find(id))
                    .set(media_artifacts::is_primary.eq(true))
                    .returning(MediaArtifactRow::as_returning())
                    .get_result(conn)?;
                MediaArtifact::try_from(row).map(Some)
            })
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn soft_delete(&self, id: Uuid) -> RolodexResult<bool> {
        self.with_conn(move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                let Some(artifact) = lock_row(conn, id)?.filter(MediaArtifact::is_live) else {
                    return Ok(false);
                };
                record_marker(conn, &artifact)?;
                mark_deleted(conn, id)?;
                Ok(true)
            })
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn hard_delete(&self, id: Uuid) -> RolodexResult<Option<MediaArtifact>> {
        self.with_conn(move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                let Some(artifact) = lock_row(conn, id)? else {
                    return Ok(None);
                };
                record_marker(conn, &artifact)?;
                diesel::delete(media_artifacts::table.find(id)).execute(conn)?;
                Ok(Some(artifact))
            })
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn record_sha256(&self, id: Uuid, sha256: &str) -> RolodexResult<()> {
        let sha256 = sha256.to_string();
        self.with_conn(move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                let artifact = lock_row(conn, id)?
                    .ok_or_else(|| DatabaseError::not_found(format!("artifact {}", id)))?;
                match artifact.sha256 {
                    None => {
                        diesel::update(media_artifacts::table.find(id))
                            .set(media_artifacts::sha256.eq(&sha256))
                            .execute(conn)?;
                        Ok(())
                    }
                    Some(existing) if existing == sha256 => Ok(()),
                    Some(existing) => Err(DatabaseError::conflict(format!(
                        "artifact {} already hashed as {}",
                        id, existing
                    ))),
                }
            })
        })
        .await
    }

    #[tracing::instrument(skip(self, from, to), fields(from = %from, to = %to))]
    async fn relocate(
        &self,
        id: Uuid,
        from: &StorageLocation,
        to: &StorageLocation,
    ) -> RolodexResult<MediaArtifact> {
        let from = from.clone();
        let to = to.clone();
        self.with_conn(move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                let artifact = lock_row(conn, id)?
                    .ok_or_else(|| DatabaseError::not_found(format!("artifact {}", id)))?;
                if artifact.location() != from {
                    return Err(DatabaseError::conflict(format!(
                        "artifact {} is at {}, expected {}",
                        id,
                        artifact.location(),
                        from
                    )));
                }
                if let Some(occupant) = live_at(conn, &to)?
                    && occupant.id != id
                {
                    return Err(DatabaseError::conflict(format!(
                        "{} already tracked by artifact {}",
                        to, occupant.id
                    )));
                }

                let row: MediaArtifactRow = diesel::update(media_artifacts::table.find(id))
                    .set((
                        media_artifacts::storage_provider.eq(to.provider.as_str()),
                        media_artifacts::relative_path.eq(&to.relative_path),
                    ))
                    .returning(MediaArtifactRow::as_returning())
                    .get_result(conn)?;
                MediaArtifact::try_from(row)
            })
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn reconcile_duplicate(
        &self,
        duplicate_id: Uuid,
        keep_id: Uuid,
    ) -> RolodexResult<ReconcileOutcome> {
        if duplicate_id == keep_id {
            return Err(ValidationError::new(
                "duplicate_id",
                "an artifact cannot be reconciled into itself",
            )
            .into());
        }

        let references = self.reference_columns.clone();
        self.with_conn(move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                let duplicate = lock_row(conn, duplicate_id)?
                    .filter(MediaArtifact::is_live)
                    .ok_or_else(|| {
                        DatabaseError::not_found(format!("live artifact {}", duplicate_id))
                    })?;
                let keep = lock_row(conn, keep_id)?
                    .filter(MediaArtifact::is_live)
                    .ok_or_else(|| DatabaseError::not_found(format!("live artifact {}", keep_id)))?;

                let mut references_moved = 0u64;
                for reference in &references {
                    let query = format!(
                        "UPDATE {table} SET {column} = $1 WHERE {column} = $2",
                        table = reference.table,
                        column = reference.column
                    );
                    references_moved += diesel::sql_query(query)
                        .bind::<sql_types::Uuid, _>(keep_id)
                        .bind::<sql_types::Uuid, _>(duplicate_id)
                        .execute(conn)? as u64;
                }

                let primary_transferred =
                    duplicate.is_primary && duplicate.subject_id == keep.subject_id;
                if primary_transferred {
                    diesel::update(media_artifacts::table.find(keep_id))
                        .set(media_artifacts::is_primary.eq(true))
                        .execute(conn)?;
                }

                record_marker(conn, &duplicate)?;
                mark_deleted(conn, duplicate_id)?;

                Ok(ReconcileOutcome {
                    duplicate_id,
                    keep_id,
                    references_moved,
                    primary_transferred,
                })
            })
        })
        .await
    }

    async fn get(&self, id: Uuid) -> RolodexResult<Option<MediaArtifact>> {
        self.with_conn(move |conn| {
            media_artifacts::table
                .find(id)
                .select(MediaArtifactRow::as_select())
                .first(conn)
                .optional()?
                .map(MediaArtifact::try_from)
                .transpose()
        })
        .await
    }

    async fn list_live_for_subject(
        &self,
        subject_id: SubjectId,
    ) -> RolodexResult<Vec<MediaArtifact>> {
        self.with_conn(move |conn| {
            let rows = media_artifacts::table
                .filter(media_artifacts::subject_id.eq(subject_id))
                .filter(media_artifacts::deleted_at.is_null())
                .order((
                    media_artifacts::uploaded_at.desc(),
                    media_artifacts::id.desc(),
                ))
                .select(MediaArtifactRow::as_select())
                .load(conn)?;
            into_artifacts(rows)
        })
        .await
    }

    async fn find_live_by_source_url(
        &self,
        subject_id: SubjectId,
        url: &str,
    ) -> RolodexResult<Option<MediaArtifact>> {
        let url = url.to_string();
        self.with_conn(move |conn| {
            media_artifacts::table
                .filter(media_artifacts::subject_id.eq(subject_id))
                .filter(media_artifacts::source_url.eq(&url))
                .filter(media_artifacts::deleted_at.is_null())
                .order((media_artifacts::created_at.asc(), media_artifacts::id.asc()))
                .select(MediaArtifactRow::as_select())
                .first(conn)
                .optional()?
                .map(MediaArtifact::try_from)
                .transpose()
        })
        .await
    }

    async fn find_live_by_sha256(
        &self,
        sha256: &str,
        subject_id: Option<SubjectId>,
    ) -> RolodexResult<Option<MediaArtifact>> {
        let sha256 = sha256.to_string();
        self.with_conn(move |conn| {
            let mut query = media_artifacts::table
                .select(MediaArtifactRow::as_select())
                .filter(media_artifacts::sha256.eq(&sha256))
                .filter(media_artifacts::deleted_at.is_null())
                .into_boxed();
            if let Some(subject_id) = subject_id {
                query = query.filter(media_artifacts::subject_id.eq(subject_id));
            }
            query
                .order((media_artifacts::created_at.asc(), media_artifacts::id.asc()))
                .first(conn)
                .optional()?
                .map(MediaArtifact::try_from)
                .transpose()
        })
        .await
    }

    async fn find_live_by_location(
        &self,
        location: &StorageLocation,
    ) -> RolodexResult<Option<MediaArtifact>> {
        let location = location.clone();
        self.with_conn(move |conn| live_at(conn, &location)).await
    }

    async fn count_at_location(&self, location: &StorageLocation) -> RolodexResult<u64> {
        let location = location.clone();
        self.with_conn(move |conn| {
            let count: i64 = media_artifacts::table
                .filter(media_artifacts::storage_provider.eq(location.provider.as_str()))
                .filter(media_artifacts::relative_path.eq(&location.relative_path))
                .count()
                .get_result(conn)?;
            Ok(count as u64)
        })
        .await
    }

    async fn live_paths(&self, provider: ProviderKind) -> RolodexResult<Vec<String>> {
        self.with_conn(move |conn| {
            Ok(media_artifacts::table
                .filter(media_artifacts::storage_provider.eq(provider.as_str()))
                .filter(media_artifacts::deleted_at.is_null())
                .select(media_artifacts::relative_path)
                .load(conn)?)
        })
        .await
    }

    async fn recorded_paths(&self, provider: ProviderKind) -> RolodexResult<Vec<String>> {
        self.with_conn(move |conn| {
            Ok(media_artifacts::table
                .filter(media_artifacts::storage_provider.eq(provider.as_str()))
                .select(media_artifacts::relative_path)
                .load(conn)?)
        })
        .await
    }

    async fn list_live_by_provider(
        &self,
        provider: ProviderKind,
        after: Option<Uuid>,
        limit: usize,
    ) -> RolodexResult<Vec<MediaArtifact>> {
        self.with_conn(move |conn| {
            let mut query = media_artifacts::table
                .select(MediaArtifactRow::as_select())
                .filter(media_artifacts::storage_provider.eq(provider.as_str()))
                .filter(media_artifacts::deleted_at.is_null())
                .into_boxed();
            if let Some(after) = after {
                query = query.filter(media_artifacts::id.gt(after));
            }
            let rows = query
                .order(media_artifacts::id.asc())
                .limit(limit as i64)
                .load(conn)?;
            into_artifacts(rows)
        })
        .await
    }

    async fn live_hash_groups(&self) -> RolodexResult<Vec<(String, Vec<Uuid>)>> {
        #[derive(QueryableByName)]
        struct HashMember {
            #[diesel(sql_type = sql_types::Text)]
            sha256: String,
            #[diesel(sql_type = sql_types::Uuid)]
            id: Uuid,
        }

        self.with_conn(|conn| {
            let members: Vec<HashMember> = diesel::sql_query(
                "SELECT sha256, id FROM media_artifacts
                 WHERE deleted_at IS NULL AND sha256 IN (
                     SELECT sha256 FROM media_artifacts
                     WHERE deleted_at IS NULL AND sha256 IS NOT NULL
                     GROUP BY sha256 HAVING COUNT(*) > 1
                 )
                 ORDER BY created_at, id",
            )
            .load(conn)?;

            let mut groups: Vec<(String, Vec<Uuid>)> = Vec::new();
            for member in members {
                match groups.iter_mut().find(|(hash, _)| *hash == member.sha256) {
                    Some((_, ids)) => ids.push(member.id),
                    None => groups.push((member.sha256, vec![member.id])),
                }
            }
            Ok(groups)
        })
        .await
    }

    async fn count_references(&self, id: Uuid) -> RolodexResult<u64> {
        let references = self.reference_columns.clone();
        self.with_conn(move |conn| {
            let mut total = 0u64;
            for reference in &references {
                let query = format!(
                    "SELECT COUNT(*) AS count FROM {} WHERE {} = $1",
                    reference.table, reference.column
                );
                let row: CountRow = diesel::sql_query(query)
                    .bind::<sql_types::Uuid, _>(id)
                    .get_result(conn)?;
                total += row.count as u64;
            }
            Ok(total)
        })
        .await
    }

    async fn is_photoset_deleted(
        &self,
        subject_id: SubjectId,
        photoset_id: &str,
    ) -> RolodexResult<bool> {
        let photoset_id = photoset_id.to_string();
        self.with_conn(move |conn| {
            Ok(diesel::select(diesel::dsl::exists(
                deleted_photoset_markers::table
                    .filter(deleted_photoset_markers::subject_id.eq(subject_id))
                    .filter(deleted_photoset_markers::photoset_id.eq(&photoset_id)),
            ))
            .get_result(conn)?)
        })
        .await
    }

    async fn deleted_photosets(
        &self,
        subject_id: SubjectId,
    ) -> RolodexResult<Vec<DeletedPhotosetMarker>> {
        self.with_conn(move |conn| {
            let rows = deleted_photoset_markers::table
                .filter(deleted_photoset_markers::subject_id.eq(subject_id))
                .order(deleted_photoset_markers::photoset_id.asc())
                .select(PhotosetMarkerRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(DeletedPhotosetMarker::from).collect())
        })
        .await
    }
}

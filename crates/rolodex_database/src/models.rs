//! Diesel row types and conversions to domain types.

use crate::schema::{deleted_photoset_markers, media_artifacts};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rolodex_core::{DeletedPhotosetMarker, MediaArtifact, MediaType, NewMediaArtifact};
use rolodex_error::{DatabaseError, DatabaseErrorKind};
use uuid::Uuid;

/// A `media_artifacts` row as stored.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = media_artifacts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MediaArtifactRow {
    pub id: Uuid,
    pub subject_id: i64,
    pub storage_provider: String,
    pub relative_path: String,
    pub source: String,
    pub source_url: Option<String>,
    pub original_filename: Option<String>,
    pub mime_type: String,
    pub media_type: String,
    pub file_size_bytes: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration_seconds: Option<f64>,
    pub sha256: Option<String>,
    pub captured_at: Option<DateTime<Utc>>,
    pub uploaded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub is_primary: bool,
    pub is_favorite: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub photoset_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl TryFrom<MediaArtifactRow> for MediaArtifact {
    type Error = DatabaseError;

    fn try_from(row: MediaArtifactRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let parse_err = move |e: rolodex_error::ValidationError| {
            DatabaseError::new(DatabaseErrorKind::Serialization(format!(
                "artifact {}: {}",
                id, e
            )))
        };

        Ok(Self {
            id,
            subject_id: row.subject_id,
            storage_provider: row.storage_provider.parse().map_err(parse_err)?,
            relative_path: row.relative_path,
            source: row.source.parse().map_err(parse_err)?,
            source_url: row.source_url,
            original_filename: row.original_filename,
            mime_type: row.mime_type,
            media_type: row.media_type.parse::<MediaType>().map_err(parse_err)?,
            file_size_bytes: row.file_size_bytes,
            width: row.width,
            height: row.height,
            duration_seconds: row.duration_seconds,
            sha256: row.sha256,
            captured_at: row.captured_at,
            uploaded_at: row.uploaded_at,
            created_at: row.created_at,
            is_primary: row.is_primary,
            is_favorite: row.is_favorite,
            deleted_at: row.deleted_at,
            photoset_id: row.photoset_id,
            title: row.title,
            description: row.description,
        })
    }
}

/// Insert values for `media_artifacts`.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = media_artifacts)]
pub struct NewMediaArtifactRow {
    pub id: Uuid,
    pub subject_id: i64,
    pub storage_provider: String,
    pub relative_path: String,
    pub source: String,
    pub source_url: Option<String>,
    pub original_filename: Option<String>,
    pub mime_type: String,
    pub media_type: String,
    pub file_size_bytes: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration_seconds: Option<f64>,
    pub sha256: Option<String>,
    pub captured_at: Option<DateTime<Utc>>,
    pub uploaded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub photoset_id: Option<String>,
    pub title: Option<String>,
}

impl NewMediaArtifactRow {
    /// Build insert values, assigning the id and timestamps.
    pub fn new(id: Uuid, new: NewMediaArtifact, now: DateTime<Utc>) -> Self {
        Self {
            id,
            subject_id: new.subject_id,
            storage_provider: new.storage_provider.as_str().to_string(),
            relative_path: new.relative_path,
            source: new.source.as_str().to_string(),
            source_url: new.source_url,
            original_filename: new.original_filename,
            media_type: MediaType::from_mime(&new.mime_type).as_str().to_string(),
            mime_type: new.mime_type,
            file_size_bytes: new.file_size_bytes,
            width: new.width,
            height: new.height,
            duration_seconds: new.duration_seconds,
            sha256: new.sha256,
            captured_at: new.captured_at,
            uploaded_at: new.uploaded_at.unwrap_or(now),
            created_at: now,
            photoset_id: new.photoset_id,
            title: new.title,
        }
    }
}

/// A `deleted_photoset_markers` row.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = deleted_photoset_markers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PhotosetMarkerRow {
    pub subject_id: i64,
    pub photoset_id: String,
    pub deleted_at: DateTime<Utc>,
}

impl From<PhotosetMarkerRow> for DeletedPhotosetMarker {
    fn from(row: PhotosetMarkerRow) -> Self {
        Self {
            subject_id: row.subject_id,
            photoset_id: row.photoset_id,
            deleted_at: row.deleted_at,
        }
    }
}

/// Row result for `sql_query` counts.
#[derive(Debug, QueryableByName)]
pub struct CountRow {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub count: i64,
}

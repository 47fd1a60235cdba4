//! PostgreSQL implementation of [`SubjectDirectory`].

use crate::PgPool;
use crate::schema::subjects;
use async_trait::async_trait;
use diesel::prelude::*;
use rolodex_core::SubjectId;
use rolodex_error::{DatabaseError, DatabaseErrorKind, RolodexResult};
use rolodex_interface::SubjectDirectory;

diesel::define_sql_function!(fn lower(x: diesel::sql_types::Text) -> diesel::sql_types::Text);

/// Read-only view of the `subjects` table.
#[derive(Clone)]
pub struct PostgresSubjectDirectory {
    pool: PgPool,
}

impl PostgresSubjectDirectory {
    /// Create a directory over a pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubjectDirectory for PostgresSubjectDirectory {
    async fn find_by_handle(&self, handle: &str) -> RolodexResult<Option<SubjectId>> {
        let handle = handle.to_lowercase();
        let pool = self.pool.clone();

        let found = tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| DatabaseError::new(DatabaseErrorKind::Connection(e.to_string())))?;
            subjects::table
                .filter(lower(subjects::handle).eq(&handle))
                .order(subjects::id.asc())
                .select(subjects::id)
                .first::<i64>(&mut conn)
                .optional()
                .map_err(DatabaseError::from)
        })
        .await
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Query(e.to_string())))??;
        Ok(found)
    }

    async fn exists(&self, id: SubjectId) -> RolodexResult<bool> {
        let pool = self.pool.clone();

        let exists = tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| DatabaseError::new(DatabaseErrorKind::Connection(e.to_string())))?;
            diesel::select(diesel::dsl::exists(subjects::table.find(id)))
                .get_result::<bool>(&mut conn)
                .map_err(DatabaseError::from)
        })
        .await
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Query(e.to_string())))??;
        Ok(exists)
    }
}

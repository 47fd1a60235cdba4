//! Read-only access to subject (person) records.

use async_trait::async_trait;
use rolodex_core::SubjectId;
use rolodex_error::RolodexResult;

/// Resolves subjects for import jobs. Import never creates subjects.
#[async_trait]
pub trait SubjectDirectory: Send + Sync {
    /// Look up a subject by platform handle (case-insensitive).
    async fn find_by_handle(&self, handle: &str) -> RolodexResult<Option<SubjectId>>;

    /// Whether a subject with this id exists.
    async fn exists(&self, id: SubjectId) -> RolodexResult<bool>;
}

//! Top-level error wrapper types.

use crate::{ConfigError, DatabaseError, HttpError, StorageError, ValidationError};

/// Every error a Rolodex operation can surface.
///
/// # Examples
///
/// ```
/// use rolodex_error::{RolodexError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: RolodexError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum RolodexErrorKind {
    /// HTTP error
    #[from(HttpError)]
    Http(HttpError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Storage backend error
    #[from(StorageError)]
    Storage(StorageError),
    /// Ledger (database) error
    #[from(DatabaseError)]
    Database(DatabaseError),
    /// Malformed input
    #[from(ValidationError)]
    Validation(ValidationError),
}

/// Rolodex error with kind discrimination.
///
/// # Examples
///
/// ```
/// use rolodex_error::{RolodexResult, ConfigError};
///
/// fn might_fail() -> RolodexResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Rolodex Error: {}", _0)]
pub struct RolodexError(Box<RolodexErrorKind>);

impl RolodexError {
    /// Create a new error from a kind.
    pub fn new(kind: RolodexErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RolodexErrorKind {
        &self.0
    }

    /// Whether this error means the addressed record or object does not exist.
    ///
    /// The route layer maps this to a not-found response.
    pub fn is_not_found(&self) -> bool {
        match self.kind() {
            RolodexErrorKind::Storage(e) => e.is_not_found(),
            RolodexErrorKind::Database(e) => {
                matches!(e.kind, crate::DatabaseErrorKind::NotFound(_))
            }
            _ => false,
        }
    }

    /// Whether a write lost a race or would break a ledger invariant.
    pub fn is_conflict(&self) -> bool {
        match self.kind() {
            RolodexErrorKind::Storage(e) => {
                matches!(e.kind, crate::StorageErrorKind::AlreadyExists(_))
            }
            RolodexErrorKind::Database(e) => {
                matches!(e.kind, crate::DatabaseErrorKind::Conflict(_))
            }
            _ => false,
        }
    }

    /// Whether this error is the caller's fault (malformed input).
    pub fn is_validation(&self) -> bool {
        matches!(self.kind(), RolodexErrorKind::Validation(_))
    }
}

// Generic From implementation for any type that converts to RolodexErrorKind
impl<T> From<T> for RolodexError
where
    T: Into<RolodexErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Rolodex operations.
pub type RolodexResult<T> = std::result::Result<T, RolodexError>;

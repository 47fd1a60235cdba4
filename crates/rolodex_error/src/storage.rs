//! Storage error types.

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Failed to create storage directory
    #[display("Failed to create storage directory: {}", _0)]
    DirectoryCreation(String),
    /// Failed to write object
    #[display("Failed to write object: {}", _0)]
    FileWrite(String),
    /// Failed to read object
    #[display("Failed to read object: {}", _0)]
    FileRead(String),
    /// Failed to delete object
    #[display("Failed to delete object: {}", _0)]
    FileDelete(String),
    /// Failed to enumerate objects
    #[display("Failed to list objects: {}", _0)]
    List(String),
    /// Object not found at the specified key
    #[display("Media not found: {}", _0)]
    NotFound(String),
    /// A different object already occupies the key
    #[display("Key already holds different content: {}", _0)]
    AlreadyExists(String),
    /// Invalid storage key
    #[display("Invalid storage path: {}", _0)]
    InvalidPath(String),
    /// Stored bytes do not match the recorded hash
    #[display("Hash mismatch: {}", _0)]
    HashMismatch(String),
    /// Storage backend is unavailable or not configured
    #[display("Storage unavailable: {}", _0)]
    Unavailable(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use rolodex_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::NotFound("42/avatar.jpg".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// assert!(err.is_not_found());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether the error reports a missing object.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, StorageErrorKind::NotFound(_))
    }
}

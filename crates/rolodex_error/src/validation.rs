//! Input validation errors.

/// Malformed caller input (empty upload, reconciling an artifact with itself, ...).
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Validation Error: {} ({}) at line {} in {}", reason, field, line, file)]
pub struct ValidationError {
    /// Field or argument that failed validation
    pub field: String,
    /// Why it failed
    pub reason: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ValidationError {
    /// Create a new ValidationError at the current location.
    #[track_caller]
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            field: field.into(),
            reason: reason.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}

//! Foreign-key columns that point at media artifacts.

use rolodex_error::{ConfigError, RolodexResult};
use serde::{Deserialize, Serialize};

/// A `(table, column)` pair in a dependent table holding an artifact id.
///
/// The deduplication engine counts and repoints references through these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceColumn {
    /// Dependent table name
    pub table: String,
    /// Column holding the artifact id
    pub column: String,
}

impl ReferenceColumn {
    /// Create a reference column, validating both identifiers.
    ///
    /// Identifiers are interpolated into SQL, so only `[A-Za-z_][A-Za-z0-9_]*`
    /// is accepted.
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> RolodexResult<Self> {
        let reference = Self {
            table: table.into(),
            column: column.into(),
        };
        reference.validate()?;
        Ok(reference)
    }

    /// Check both identifiers.
    pub fn validate(&self) -> RolodexResult<()> {
        for ident in [&self.table, &self.column] {
            if !is_identifier(ident) {
                return Err(ConfigError::new(format!(
                    "Invalid SQL identifier in reference column: {:?}",
                    ident
                ))
                .into());
            }
        }
        Ok(())
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_validation() {
        assert!(ReferenceColumn::new("polling_session_media", "media_id").is_ok());
        assert!(ReferenceColumn::new("_t1", "c2").is_ok());
        assert!(ReferenceColumn::new("1table", "media_id").is_err());
        assert!(ReferenceColumn::new("t; DROP TABLE x", "media_id").is_err());
        assert!(ReferenceColumn::new("t", "").is_err());
    }
}

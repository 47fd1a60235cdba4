//! Key validation and hashing helpers shared by every backend.

use rolodex_error::{RolodexResult, StorageError, StorageErrorKind};
use sha2::{Digest, Sha256};

/// Compute the SHA-256 of data as lowercase hex.
pub fn compute_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Last `/`-separated segment of a key.
pub fn basename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Reject keys that could escape the provider root or are otherwise unusable.
pub fn validate_key(key: &str) -> RolodexResult<()> {
    let invalid = |reason: &str| -> RolodexResult<()> {
        Err(StorageError::new(StorageErrorKind::InvalidPath(format!(
            "{:?}: {}",
            key, reason
        )))
        .into())
    };

    if key.is_empty() {
        return invalid("empty key");
    }
    if key.starts_with('/') || key.starts_with('\\') {
        return invalid("absolute path");
    }
    if key.contains('\\') || key.contains('\0') {
        return invalid("illegal character");
    }
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return invalid("empty or relative segment");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("42/avatar.jpg").is_ok());
        assert!(validate_key("avatar.jpg").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("42/../../etc").is_err());
        assert!(validate_key("42//x.jpg").is_err());
        assert!(validate_key("42/").is_err());
    }

    #[test]
    fn test_compute_sha256() {
        assert_eq!(
            compute_sha256(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("42/sub/a.jpg"), "a.jpg");
        assert_eq!(basename("a.jpg"), "a.jpg");
    }
}

//! Matching storage keys against ledger paths.

use std::collections::HashSet;

/// Ledger paths on one provider, indexed for tracked-key lookups.
///
/// A key is tracked when some path equals it, or when one of the two is a
/// `/`-boundary suffix of the other. Legacy rows recorded paths with or
/// without a leading directory, so both directions count.
#[derive(Debug, Default, Clone)]
pub struct TrackedPaths {
    paths: HashSet<String>,
    suffixes: HashSet<String>,
}

impl TrackedPaths {
    /// Index a set of ledger paths.
    pub fn new<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut tracked = Self::default();
        for path in paths {
            tracked.insert(path);
        }
        tracked
    }

    /// Add one ledger path.
    pub fn insert(&mut self, path: String) {
        for suffix in boundary_suffixes(&path) {
            self.suffixes.insert(suffix.to_string());
        }
        self.paths.insert(path);
    }

    /// Whether a storage key is accounted for by some ledger path.
    pub fn contains(&self, key: &str) -> bool {
        // Covers equality and "path ends with /key"
        if self.suffixes.contains(key) {
            return true;
        }
        // "key ends with /path"
        boundary_suffixes(key)
            .skip(1)
            .any(|suffix| self.paths.contains(suffix))
    }

    /// Number of indexed paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether no path is indexed.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// `a/b/c`, `b/c`, `c`.
fn boundary_suffixes(path: &str) -> impl Iterator<Item = &str> {
    std::iter::once(path).chain(path.match_indices('/').map(move |(i, _)| &path[i + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_suffixes() {
        let suffixes: Vec<_> = boundary_suffixes("a/b/c.jpg").collect();
        assert_eq!(suffixes, vec!["a/b/c.jpg", "b/c.jpg", "c.jpg"]);
    }

    #[test]
    fn test_tracking_rules() {
        let tracked = TrackedPaths::new(["42/a.jpg".to_string(), "b.jpg".to_string()]);

        assert!(tracked.contains("42/a.jpg"));
        // Path ends with "/key"
        assert!(tracked.contains("a.jpg"));
        // Key ends with "/path"
        assert!(tracked.contains("legacy/b.jpg"));

        // Not on a boundary
        assert!(!tracked.contains("xa.jpg"));
        assert!(!tracked.contains("legacy/xb.jpg"));
        assert!(!tracked.contains("c.jpg"));
    }
}

//! Detection of platform stand-in images ("no avatar" and friends).

use serde::{Deserialize, Serialize};

/// Decides whether a URL or a payload is a known placeholder.
pub trait PlaceholderDetector: Send + Sync {
    /// Whether the URL points at a known placeholder image.
    fn is_placeholder_url(&self, url: &str) -> bool;

    /// Whether the downloaded bytes look like a known placeholder.
    fn is_placeholder_bytes(&self, data: &[u8]) -> bool;
}

/// A known placeholder payload size.
///
/// A payload matches when its length is within `tolerance` bytes of
/// `size_bytes`; a tolerance of zero means an exact match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderSize {
    /// Size of the placeholder payload
    pub size_bytes: u64,
    /// Allowed deviation in bytes
    #[serde(default)]
    pub tolerance: u64,
}

impl PlaceholderSize {
    /// Exact size match.
    pub fn exact(size_bytes: u64) -> Self {
        Self {
            size_bytes,
            tolerance: 0,
        }
    }

    /// Match within `tolerance` bytes.
    pub fn approximately(size_bytes: u64, tolerance: u64) -> Self {
        Self {
            size_bytes,
            tolerance,
        }
    }

    /// Whether a payload of `len` bytes matches.
    pub fn matches(&self, len: u64) -> bool {
        len.abs_diff(self.size_bytes) <= self.tolerance
    }
}

/// Placeholder URL patterns and payload sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderConfig {
    /// Case-insensitive substrings identifying placeholder URLs
    pub url_patterns: Vec<String>,
    /// Known placeholder payload sizes
    pub sizes: Vec<PlaceholderSize>,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            url_patterns: [
                "default_profile",
                "default-avatar",
                "no-avatar",
                "no_avatar",
                "blank-profile",
                "placeholder",
                "/static/images/no-image",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            sizes: vec![
                PlaceholderSize::approximately(7_315, 64),
                PlaceholderSize::exact(2_161),
            ],
        }
    }
}

impl PlaceholderConfig {
    /// A configuration that never matches.
    pub fn disabled() -> Self {
        Self {
            url_patterns: Vec::new(),
            sizes: Vec::new(),
        }
    }
}

/// [`PlaceholderDetector`] driven by a [`PlaceholderConfig`] table.
#[derive(Debug, Clone)]
pub struct PatternPlaceholderDetector {
    url_patterns: Vec<String>,
    sizes: Vec<PlaceholderSize>,
}

impl PatternPlaceholderDetector {
    /// Build a detector from a configuration table.
    pub fn new(config: &PlaceholderConfig) -> Self {
        Self {
            url_patterns: config
                .url_patterns
                .iter()
                .filter(|p| !p.is_empty())
                .map(|p| p.to_lowercase())
                .collect(),
            sizes: config.sizes.clone(),
        }
    }
}

impl Default for PatternPlaceholderDetector {
    fn default() -> Self {
        Self::new(&PlaceholderConfig::default())
    }
}

impl PlaceholderDetector for PatternPlaceholderDetector {
    fn is_placeholder_url(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        self.url_patterns.iter().any(|p| url.contains(p.as_str()))
    }

    fn is_placeholder_bytes(&self, data: &[u8]) -> bool {
        let len = data.len() as u64;
        self.sizes.iter().any(|size| size.matches(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_patterns_ignore_case() {
        let detector = PatternPlaceholderDetector::default();
        assert!(
            detector.is_placeholder_url("https://cdn.example.com/img/Default_Profile_400x400.png")
        );
        assert!(!detector.is_placeholder_url("https://cdn.example.com/img/abc123.jpg"));
    }

    #[test]
    fn test_size_tolerance() {
        let config = PlaceholderConfig {
            url_patterns: Vec::new(),
            sizes: vec![
                PlaceholderSize::approximately(1_000, 10),
                PlaceholderSize::exact(50),
            ],
        };
        let detector = PatternPlaceholderDetector::new(&config);
        assert!(detector.is_placeholder_bytes(&[0u8; 990]));
        assert!(detector.is_placeholder_bytes(&[0u8; 1_010]));
        assert!(!detector.is_placeholder_bytes(&[0u8; 1_011]));
        assert!(detector.is_placeholder_bytes(&[0u8; 50]));
        assert!(!detector.is_placeholder_bytes(&[0u8; 51]));
    }

    #[test]
    fn test_disabled_config_never_matches() {
        let detector = PatternPlaceholderDetector::new(&PlaceholderConfig::disabled());
        assert!(!detector.is_placeholder_url("https://x/placeholder.png"));
        assert!(!detector.is_placeholder_bytes(&[]));
    }
}

//! Ingestion settings.

use crate::PlaceholderConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for URL ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Hard cap on a single download, in seconds
    pub fetch_timeout_secs: u64,
    /// User agent sent with downloads
    pub user_agent: String,
    /// Placeholder URL patterns and sizes
    pub placeholder: PlaceholderConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 10,
            user_agent: format!("rolodex/{}", env!("CARGO_PKG_VERSION")),
            placeholder: PlaceholderConfig::default(),
        }
    }
}

impl IngestConfig {
    /// Download timeout.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}

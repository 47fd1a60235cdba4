//! Lookup of providers by kind.

use crate::StorageProvider;
use rolodex_core::ProviderKind;
use rolodex_error::{RolodexResult, StorageError, StorageErrorKind};
use std::collections::HashMap;
use std::sync::Arc;

/// The configured storage providers, keyed by kind, plus the kind new media is
/// written to.
#[derive(Clone)]
pub struct StorageProviders {
    providers: HashMap<ProviderKind, Arc<dyn StorageProvider>>,
    default_kind: ProviderKind,
}

impl StorageProviders {
    /// Create an empty registry; new writes go to `default_kind`.
    pub fn new(default_kind: ProviderKind) -> Self {
        Self {
            providers: HashMap::new(),
            default_kind,
        }
    }

    /// Register a provider under its own kind, replacing any previous one.
    pub fn with(mut self, provider: Arc<dyn StorageProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Register a provider under its own kind, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn StorageProvider>) {
        tracing::debug!(kind = %provider.kind(), "Registered storage provider");
        self.providers.insert(provider.kind(), provider);
    }

    /// Provider for a kind.
    ///
    /// # Errors
    ///
    /// `StorageErrorKind::Unavailable` if no provider of that kind is configured.
    pub fn get(&self, kind: ProviderKind) -> RolodexResult<Arc<dyn StorageProvider>> {
        self.providers.get(&kind).cloned().ok_or_else(|| {
            StorageError::new(StorageErrorKind::Unavailable(format!(
                "no {} provider configured",
                kind
            )))
            .into()
        })
    }

    /// Provider new media is written to.
    pub fn default_provider(&self) -> RolodexResult<Arc<dyn StorageProvider>> {
        self.get(self.default_kind)
    }

    /// Kind new media is written to.
    pub fn default_kind(&self) -> ProviderKind {
        self.default_kind
    }

    /// Configured kinds.
    pub fn kinds(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<_> = self.providers.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

impl std::fmt::Debug for StorageProviders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageProviders")
            .field("kinds", &self.kinds())
            .field("default_kind", &self.default_kind)
            .finish()
    }
}

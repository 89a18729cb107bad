//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::Store;
use crate::services::{
    AuthService, CatalogService, ModerationService, OnboardingService, ReadCache,
};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the store, the read cache, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    store: Arc<dyn Store>,
    cache: ReadCache,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The read cache lifetime comes from `config.cache_ttl`.
    #[must_use]
    pub fn new(config: ServerConfig, store: Arc<dyn Store>) -> Self {
        let cache = ReadCache::new(config.cache_ttl);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                cache,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the backing store.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Get a reference to the read cache.
    #[must_use]
    pub fn cache(&self) -> &ReadCache {
        &self.inner.cache
    }

    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.store())
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(self.store(), self.cache())
    }

    #[must_use]
    pub fn onboarding(&self) -> OnboardingService<'_> {
        OnboardingService::new(self.store(), self.cache())
    }

    #[must_use]
    pub fn moderation(&self) -> ModerationService<'_> {
        ModerationService::new(self.store(), self.cache(), self.config().cascade_mode)
    }
}

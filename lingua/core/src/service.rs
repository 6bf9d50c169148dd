//! Translation Service - The Context Object
//!
//! `TranslationService` owns every shared component of a running instance:
//! the cache, the descriptor table, the instance registry and the router.
//! Nothing lives in process-global state, so two services in one process
//! (or one per test) never see each other.
//!
//! # Request Flow
//!
//! ```text
//! translate(request)
//!   │
//!   ├── RequestValidator ── invalid ──► Err(ValidationError)
//!   │
//!   └── Router::translate ────────────► Ok(TranslationResult)
//!                                         (Failed results included)
//! ```
//!
//! The collaborators that actually translate are injected through
//! [`Collaborators`]; [`Collaborators::from_config`] builds the HTTP ones.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::backend::{
    BackendLoader, CompletionProvider, HostedModelClient, OllamaLoader, OpenAiProvider,
    RemoteModelApi,
};
use crate::cache::{CacheEntrySummary, CacheStats, TranslationCache};
use crate::config::{ConfigError, LinguaConfig};
use crate::error::TranslationError;
use crate::routing::{
    BackendDescriptor, BackendRegistry, DescriptorTable, PreloadReport, Router,
    RouterMetricsSnapshot,
};
use crate::translation::{LanguagePair, TranslateRequest, TranslationResult};
use crate::validation::RequestValidator;

/// The translating collaborators behind the router's trait seams
pub struct Collaborators {
    /// Initializes local backends
    pub loader: Arc<dyn BackendLoader>,
    /// Serves remote-api descriptors
    pub remote: Option<Arc<dyn RemoteModelApi>>,
    /// Last-resort fallback
    pub provider: Option<Arc<dyn CompletionProvider>>,
}

impl Collaborators {
    /// Only a local loader; no remote API, no provider
    pub fn local_only(loader: Arc<dyn BackendLoader>) -> Self {
        Self {
            loader,
            remote: None,
            provider: None,
        }
    }

    /// The HTTP collaborators described by `config`
    ///
    /// The provider is present only when enabled and its API key is set.
    #[must_use]
    pub fn from_config(config: &LinguaConfig) -> Self {
        let remote: Arc<dyn RemoteModelApi> = Arc::new(HostedModelClient::new(
            &config.hosted,
            config.routing.retry.clone(),
        ));
        let provider = OpenAiProvider::from_config(&config.provider)
            .map(|p| Arc::new(p) as Arc<dyn CompletionProvider>);

        Self {
            loader: Arc::new(OllamaLoader::new(config.local.clone())),
            remote: Some(remote),
            provider,
        }
    }
}

/// Point-in-time view of a running service
#[derive(Clone, Debug, Serialize)]
pub struct ServiceSnapshot {
    /// Cache statistics
    pub cache: CacheStats,
    /// Pairs with an initialized local backend
    pub loaded_backends: Vec<LanguagePair>,
    /// Number of initialized local backends
    pub loaded_count: usize,
    /// Local initializations attempted / failed
    pub init_attempts: u64,
    /// Local initializations that failed or timed out
    pub init_failures: u64,
    /// Every pair with a direct descriptor
    pub supported_pairs: Vec<LanguagePair>,
    /// Router counters and latency
    pub router: RouterMetricsSnapshot,
    /// Whether the external provider is configured
    pub provider_enabled: bool,
}

/// Cache statistics with the most-hit entries
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CacheReport {
    /// Counters and sizes
    pub stats: CacheStats,
    /// Most-hit entries, most hit first
    pub top: Vec<CacheEntrySummary>,
}

/// A running translation service
pub struct TranslationService {
    validator: RequestValidator,
    cache: Arc<TranslationCache>,
    table: Arc<DescriptorTable>,
    registry: Arc<BackendRegistry>,
    router: Router,
    preload: Vec<LanguagePair>,
}

impl TranslationService {
    /// Build a service from validated configuration and collaborators
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if the configuration is
    /// inconsistent (see [`LinguaConfig::validate`]).
    pub fn new(config: &LinguaConfig, collaborators: Collaborators) -> Result<Self, ConfigError> {
        config.validate()?;

        let table = Arc::new(
            DescriptorTable::from_config(&config.pairs)
                .map_err(|e| ConfigError::ValidationError(format!("pairs: {e}")))?,
        );
        let cache = Arc::new(TranslationCache::new(config.cache.clone()));
        let registry = Arc::new(BackendRegistry::new(
            collaborators.loader,
            Arc::clone(&table),
            config.routing.init_timeout(),
        ));

        let mut router = Router::new(
            &config.routing,
            Arc::clone(&table),
            Arc::clone(&registry),
            Arc::clone(&cache),
        );
        if let Some(remote) = collaborators.remote {
            router = router.with_remote(remote);
        }
        if let Some(provider) = collaborators.provider {
            router = router.with_provider(provider);
        }

        info!(
            pairs = table.len(),
            cache_size = config.cache.max_size,
            provider = router.provider_enabled(),
            "Translation service ready"
        );

        Ok(Self {
            validator: RequestValidator::new(config.validation.clone()),
            cache,
            table,
            registry,
            router,
            preload: config.routing.preload_pairs(),
        })
    }

    /// Build a service with the default HTTP collaborators
    ///
    /// # Errors
    ///
    /// See [`TranslationService::new`].
    pub fn from_config(config: &LinguaConfig) -> Result<Self, ConfigError> {
        Self::new(config, Collaborators::from_config(config))
    }

    /// Validate and route one request
    ///
    /// # Errors
    ///
    /// Only validation failures are errors. Every routing outcome, failed
    /// ones included, is an `Ok` result carrying its classified error.
    pub async fn translate(
        &self,
        request: &TranslateRequest,
    ) -> Result<TranslationResult, TranslationError> {
        if let Err(e) = self.validator.validate(request) {
            debug!(error = %e, "Request rejected");
            return Err(e);
        }
        Ok(self.router.translate(request).await)
    }

    /// Initialize the configured preload pairs
    pub async fn preload(&self) -> PreloadReport {
        self.registry.preload(&self.preload).await
    }

    /// Current statistics
    #[must_use]
    pub fn snapshot(&self) -> ServiceSnapshot {
        ServiceSnapshot {
            cache: self.cache.stats(),
            loaded_backends: self.registry.loaded_pairs(),
            loaded_count: self.registry.loaded_count(),
            init_attempts: self.registry.init_attempts(),
            init_failures: self.registry.init_failures(),
            supported_pairs: self.table.list_pairs().to_vec(),
            router: self.router.metrics().snapshot(),
            provider_enabled: self.router.provider_enabled(),
        }
    }

    /// Drop expired cache entries now; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired()
    }

    /// The most-accessed cached translations
    #[must_use]
    pub fn top_cached(&self, n: usize) -> Vec<CacheEntrySummary> {
        self.cache.top_entries(n)
    }

    /// Cache statistics plus the `top` most-hit entries
    #[must_use]
    pub fn cache_report(&self, top: usize) -> CacheReport {
        CacheReport {
            stats: self.cache.stats(),
            top: self.top_cached(top),
        }
    }

    /// Empty the result cache and reset its counters
    ///
    /// # Errors
    ///
    /// Returns [`TranslationError::Cache`] if the cache stayed busy past its
    /// lock timeout; nothing was cleared.
    pub fn clear_cache(&self) -> Result<(), TranslationError> {
        if self.cache.clear() {
            info!("Translation cache cleared");
            Ok(())
        } else {
            Err(TranslationError::cache("Cache busy, not cleared"))
        }
    }

    /// Direct descriptors in configuration order
    pub fn descriptors(&self) -> impl Iterator<Item = &BackendDescriptor> {
        self.table.descriptors()
    }

    /// Release every local backend and log final statistics
    pub fn shutdown(&self) {
        let stats = self.cache.stats();
        self.registry.release_all();
        info!(
            hits = stats.hits,
            misses = stats.misses,
            hit_rate = stats.hit_rate,
            evictions = stats.evictions,
            requests = self.router.metrics().requests(),
            "Translation service stopped"
        );
    }

    /// The result cache
    #[must_use]
    pub fn cache(&self) -> &Arc<TranslationCache> {
        &self.cache
    }

    /// The instance registry
    #[must_use]
    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    /// The router
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }
}

//! Translation Router
//!
//! Decides which backend answers a request and falls back when it cannot.
//!
//! # Decision Procedure
//!
//! ```text
//! source == target ──────────────────────────────► Direct (1.0), unchanged text
//!        │
//! no direct, no pivot path, no provider ─────────► Failed (unsupported pair)
//!        │
//! cache hit ─────────────────────────────────────► cached result
//!        │
//! direct descriptor ── local ─► registry.acquire ─► Local (0.9)
//!        │             remote ─► hosted API ──────► Api (0.85)
//!        │ (missing or failed)
//! pivot path ── hop 1 ─► hop 2 ──────────────────► Pivot (0.7, 2 hops)
//!        │ (missing or failed)
//! provider ── instruction + text ────────────────► OpenAi (0.8)
//!        │ (missing or failed)
//!        └───────────────────────────────────────► Failed (last error)
//! ```
//!
//! Every success is written to the cache before it is returned; failures
//! never are. The router only reads the descriptor table and leaves
//! instance lifecycle entirely to the registry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, info_span, warn, Instrument};

use crate::backend::{CompletionProvider, CompletionRequest, RemoteModelApi};
use crate::cache::TranslationCache;
use crate::error::TranslationError;
use crate::translation::{BackendKind, Method, TranslateRequest, TranslationResult};

use super::config::{ConfidenceConfig, RoutingConfig};
use super::fallback::{PivotPath, PivotPlanner};
use super::metrics::RouterMetrics;
use super::registry::BackendRegistry;
use super::table::{BackendDescriptor, DescriptorTable};

/// Backend identifier reported for same-language requests
pub const IDENTITY_BACKEND: &str = "identity";

/// Routes requests across local, remote and provider backends
pub struct Router {
    table: Arc<DescriptorTable>,
    registry: Arc<BackendRegistry>,
    cache: Arc<TranslationCache>,
    remote: Option<Arc<dyn RemoteModelApi>>,
    provider: Option<Arc<dyn CompletionProvider>>,
    planner: PivotPlanner,
    confidence: ConfidenceConfig,
    remote_timeout: Duration,
    metrics: Arc<RouterMetrics>,
}

impl Router {
    /// Create a router with no remote API and no provider
    pub fn new(
        config: &RoutingConfig,
        table: Arc<DescriptorTable>,
        registry: Arc<BackendRegistry>,
        cache: Arc<TranslationCache>,
    ) -> Self {
        let planner = PivotPlanner::new(&config.universal_pivot, &config.common_pivots);
        debug!(pairs = table.len(), pivots = ?planner.candidates(), "Router configured");
        Self {
            table,
            registry,
            cache,
            remote: None,
            provider: None,
            planner,
            confidence: config.confidence.clone(),
            remote_timeout: config.remote_timeout(),
            metrics: Arc::new(RouterMetrics::new()),
        }
    }

    /// Use this client for remote-api descriptors
    #[must_use]
    pub fn with_remote(mut self, remote: Arc<dyn RemoteModelApi>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Use this provider as the last fallback
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Override the bound on remote calls
    #[must_use]
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    /// Route one request
    ///
    /// Never fails: routing failures come back as a `Failed` result
    /// carrying the last classified error.
    pub async fn translate(&self, request: &TranslateRequest) -> TranslationResult {
        let span = info_span!(
            "translate",
            pair = %request.pair(),
            preference = request.preference.as_str()
        );

        async {
            let started = Instant::now();
            self.metrics.record_request();

            match self.route(request).await {
                Ok(result) => {
                    let elapsed = started.elapsed();
                    self.metrics.record_outcome(result.method, None, elapsed);
                    info!(
                        method = %result.method,
                        backend = result.backend.as_deref().unwrap_or("-"),
                        confidence = result.confidence,
                        cached = result.is_cached(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Translation complete"
                    );
                    result
                }
                Err(err) => {
                    let elapsed = started.elapsed();
                    self.metrics
                        .record_outcome(Method::Failed, Some(err.kind()), elapsed);
                    warn!(
                        kind = %err.kind(),
                        retryable = err.is_retryable(),
                        error = %err,
                        "Translation failed"
                    );
                    TranslationResult::failed(&err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn route(&self, request: &TranslateRequest) -> Result<TranslationResult, TranslationError> {
        let source = request.source_lang.as_str();
        let target = request.target_lang.as_str();

        let pair = request.pair();
        if pair.is_identity() {
            return Ok(TranslationResult::success(
                request.text.as_str(),
                1.0,
                IDENTITY_BACKEND,
                Method::Direct,
            ));
        }

        let preference = request.preference;
        let allowed = |d: &BackendDescriptor| preference.allows_kind(d.kind);
        let direct = self.table.lookup(source, target).filter(|d| allowed(*d));
        let pivot = self.planner.find(&self.table, source, target, allowed);
        let provider = self
            .provider
            .as_ref()
            .filter(|_| preference.allows_provider());

        if direct.is_none() && pivot.is_none() && provider.is_none() {
            return Err(TranslationError::unsupported_pair(&pair));
        }

        if let Some(hit) = self.cache.get(request) {
            self.metrics.record_cache_hit();
            return Ok(hit);
        }

        let mut last_error = None;

        if let Some(descriptor) = direct {
            match self.run_hop(descriptor, &request.text).await {
                Ok(text) => {
                    let result = TranslationResult::success(
                        text,
                        self.confidence.direct(descriptor.kind),
                        descriptor.backend_id.as_str(),
                        direct_method(descriptor.kind),
                    );
                    return Ok(self.store(request, result));
                }
                Err(e) => {
                    warn!(
                        backend = %descriptor.backend_id,
                        error = %e,
                        "Direct translation failed, trying fallbacks"
                    );
                    last_error = Some(e);
                }
            }
        }

        if let Some(path) = pivot {
            self.metrics.record_pivot_fallback();
            debug!(pivot = path.pivot, backend = %path.backend_id(), "Trying pivot path");
            match self.run_pivot(&path, &request.text).await {
                Ok(text) => {
                    let result =
                        TranslationResult::pivot(text, self.confidence.pivot, path.backend_id());
                    return Ok(self.store(request, result));
                }
                Err(e) => {
                    warn!(pivot = path.pivot, error = %e, "Pivot translation failed");
                    last_error = Some(e);
                }
            }
        }

        if let Some(provider) = provider {
            self.metrics.record_provider_fallback();
            debug!(provider = provider.name(), "Trying external provider");
            match self.run_provider(provider.as_ref(), request).await {
                Ok(text) => {
                    let result = TranslationResult::success(
                        text,
                        self.confidence.provider,
                        provider.name(),
                        Method::OpenAi,
                    );
                    return Ok(self.store(request, result));
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "Provider translation failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| TranslationError::unsupported_pair(&pair)))
    }

    /// Translate through one descriptor
    async fn run_hop(
        &self,
        descriptor: &BackendDescriptor,
        text: &str,
    ) -> Result<String, TranslationError> {
        let pair = &descriptor.pair;
        let translated = match descriptor.kind {
            BackendKind::Local => {
                let backend = self.registry.acquire(&pair.source, &pair.target).await?;
                backend
                    .translate(text)
                    .await
                    .map_err(|e| TranslationError::execution(pair, Some(backend.id()), &e))?
            }
            BackendKind::RemoteApi => {
                let remote = self.remote.as_ref().ok_or_else(|| {
                    TranslationError::backend_init(
                        descriptor.backend_id.as_str(),
                        "remote model API is not configured",
                    )
                })?;
                let call = remote.translate(&descriptor.backend_id, text);
                match tokio::time::timeout(self.remote_timeout, call).await {
                    Ok(result) => result?,
                    Err(_) => return Err(self.timed_out(remote.name())),
                }
            }
        };

        if translated.trim().is_empty() {
            return Err(TranslationError::execution(
                pair,
                Some(descriptor.backend_id.as_str()),
                "backend returned empty output",
            ));
        }
        Ok(translated)
    }

    /// Translate through both hops of a pivot path, sequentially
    async fn run_pivot(&self, path: &PivotPath<'_>, text: &str) -> Result<String, TranslationError> {
        let intermediate = self.run_hop(path.first, text).await?;
        debug!(pivot = path.pivot, "First pivot hop complete");
        self.run_hop(path.second, &intermediate).await
    }

    async fn run_provider(
        &self,
        provider: &dyn CompletionProvider,
        request: &TranslateRequest,
    ) -> Result<String, TranslationError> {
        let completion = CompletionRequest::translation(
            &request.source_lang,
            &request.target_lang,
            &request.context,
            &request.text,
        );
        let answer = match tokio::time::timeout(self.remote_timeout, provider.complete(&completion))
            .await
        {
            Ok(result) => result?,
            Err(_) => return Err(self.timed_out(provider.name())),
        };

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(TranslationError::provider(
                provider.name(),
                "returned an empty response",
            ));
        }
        Ok(answer.to_string())
    }

    fn timed_out(&self, endpoint: &str) -> TranslationError {
        TranslationError::network(
            endpoint,
            format!(
                "{endpoint} request timed out after {}ms",
                self.remote_timeout.as_millis()
            ),
        )
    }

    fn store(&self, request: &TranslateRequest, result: TranslationResult) -> TranslationResult {
        self.cache.set(request, &result);
        result
    }

    /// Whether an external provider is configured
    #[must_use]
    pub fn provider_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Routing metrics
    #[must_use]
    pub fn metrics(&self) -> &Arc<RouterMetrics> {
        &self.metrics
    }

    /// The descriptor table
    #[must_use]
    pub fn table(&self) -> &Arc<DescriptorTable> {
        &self.table
    }
}

fn direct_method(kind: BackendKind) -> Method {
    match kind {
        BackendKind::Local => Method::Local,
        BackendKind::RemoteApi => Method::Api,
    }
}
